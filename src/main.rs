use fixtral::{logger, server, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init()?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_startup_info(
        fixtral::APP_TITLE,
        fixtral::APP_DESCRIPTION,
        env!("CARGO_PKG_VERSION"),
        config.host_or_default(),
        config.port_or_default(),
    );
    logger::log_config_info(&config);

    let state = match server::AppState::from_config(&config) {
        Ok(state) => {
            log::info!("✅ Edit service ready ({})", state.edits.model_id());
            state
        }
        Err(e) => {
            log::error!("❌ Failed to initialize edit service: {}", e);
            return Err(e.into());
        }
    };

    server::run(config, state).await?;
    Ok(())
}
