pub mod routes;

use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use crate::{
    config::{Config, ImageConfig},
    edit::EditService,
    error::Result,
    fetch::ImageFetcher,
    gemini::{GeminiImageClient, ImageEditModel},
};

/// Shared, read-only per-worker state.
#[derive(Clone)]
pub struct AppState {
    pub edits: EditService,
    /// Serves `/api/image`; refuses redirects that leave the allow-list.
    pub optimizer_fetcher: ImageFetcher,
    pub images: ImageConfig,
}

impl AppState {
    pub fn new(config: &Config, model: Arc<dyn ImageEditModel>) -> Result<Self> {
        let fetcher = ImageFetcher::new(config.fetch_timeout)?;
        let optimizer_fetcher =
            ImageFetcher::with_allowed_hosts(config.fetch_timeout, config.images.clone())?;
        Ok(Self {
            edits: EditService::new(fetcher, model),
            optimizer_fetcher,
            images: config.images.clone(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let model = GeminiImageClient::new(&config.gemini)?;
        Self::new(config, Arc::new(model))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/edit", web::post().to(routes::execute_edit))
            .route("/image", web::get().to(routes::optimize_image)),
    );
}

pub async fn run(config: Config, state: AppState) -> std::io::Result<()> {
    let data = web::Data::new(state);
    let bind = (config.host_or_default().to_string(), config.port_or_default());

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
