pub mod image_client;

use async_trait::async_trait;

use crate::{error::Result, models::GenerateContentResponse};

pub use image_client::GeminiImageClient;

/// Image bytes handed to a model together with the declared mime type.
#[derive(Debug, Clone)]
pub struct InputImage<'a> {
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
}

/// A generative model that takes an instruction plus an image and replies
/// with text and/or images.
#[async_trait]
pub trait ImageEditModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn edit(
        &self,
        instruction: &str,
        image: InputImage<'_>,
    ) -> Result<GenerateContentResponse>;
}
