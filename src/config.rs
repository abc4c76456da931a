use std::env;
use std::time::Duration;

use reqwest::Url;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Hosts the image optimizer may fetch from when nothing else is configured.
pub const DEFAULT_IMAGE_DOMAINS: &[&str] = &[
    "i.redd.it",
    "preview.redd.it",
    "external-preview.redd.it",
    "b.thumbs.redditmedia.com",
    "a.thumbs.redditmedia.com",
    "imgur.com",
    "i.imgur.com",
];

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub domains: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub fetch_timeout: Duration,
    pub gemini: GeminiConfig,
    pub auth: Option<AuthConfig>,
    pub images: ImageConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: None,
            base_url: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let model = env::var("GEMINI_MODEL").ok().filter(|m| !m.is_empty());
        let base_url = env::var("GEMINI_BASE_URL").ok().filter(|u| !u.is_empty());

        GeminiConfig {
            api_key,
            model,
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn base_url_or_default(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            url: None,
            anon_key: None,
        }
    }
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let url = env::var("AUTH_URL").ok();
        let anon_key = env::var("AUTH_ANON_KEY").ok();

        AuthConfig { url, anon_key }
    }

    pub fn with_credentials(mut self, url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.anon_key = Some(anon_key.into());
        self
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        ImageConfig {
            domains: DEFAULT_IMAGE_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl ImageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `IMAGE_DOMAINS` as a comma-separated list, keeping the defaults
    /// when the variable is unset or blank.
    pub fn from_env() -> Self {
        match env::var("IMAGE_DOMAINS") {
            Ok(raw) if !raw.trim().is_empty() => Self::with_domains(parse_domain_list(&raw)),
            _ => Self::default(),
        }
    }

    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ImageConfig {
            domains: domains
                .into_iter()
                .map(|d| d.into().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.');
        self.domains.iter().any(|d| d.eq_ignore_ascii_case(host))
    }

    pub fn is_allowed_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        parsed
            .host_str()
            .map_or(false, |host| self.is_allowed_host(host))
    }
}

fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            port: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            gemini: GeminiConfig::default(),
            auth: None,
            images: ImageConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let host = env::var("HOST").ok().filter(|h| !h.is_empty());
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let fetch_timeout = env::var("FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);

        let auth = AuthConfig::from_env();
        let auth = if auth.url.is_some() { Some(auth) } else { None };

        Config {
            host,
            port,
            fetch_timeout: Duration::from_secs(fetch_timeout),
            gemini: GeminiConfig::from_env(),
            auth,
            images: ImageConfig::from_env(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_auth(mut self, config: AuthConfig) -> Self {
        self.auth = Some(config);
        self
    }

    pub fn with_images(mut self, config: ImageConfig) -> Self {
        self.images = config;
        self
    }

    pub fn host_or_default(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}
