use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtralError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Failed to fetch image: {0}")]
    FetchError(String),
    #[error("Host is not on the image allow-list: {0}")]
    HostNotAllowed(String),
    #[error("Image processing error: {0}")]
    ImageError(String),
    #[error("Generation error: {0}")]
    GenerationError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Auth error: {0}")]
    AuthError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<image::ImageError> for FixtralError {
    fn from(err: image::ImageError) -> Self {
        FixtralError::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for FixtralError {
    fn from(err: serde_json::Error) -> Self {
        FixtralError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FixtralError>;
