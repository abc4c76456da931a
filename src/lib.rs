pub mod auth;
pub mod config;
pub mod edit;
pub mod error;
pub mod fetch;
pub mod gemini;
pub mod imaging;
pub mod logger;
pub mod models;
#[cfg(feature = "server")]
pub mod server;

pub use auth::{AuthForm, AuthProvider, AuthTab, FormOutcome, HostedAuthClient};
pub use config::{AuthConfig, Config, GeminiConfig, ImageConfig};
pub use edit::EditService;
pub use error::{FixtralError, Result};
pub use fetch::{FetchedImage, ImageFetcher};
pub use gemini::{GeminiImageClient, ImageEditModel, InputImage};
pub use models::*;

pub const APP_TITLE: &str = "Fixtral - AI Photoshop Assistant";
pub const APP_DESCRIPTION: &str = "Automate image edits from Reddit's r/PhotoshopRequest using AI";
