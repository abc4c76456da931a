use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use crate::{
    error::{FixtralError, Result},
    fetch::ImageFetcher,
    gemini::{ImageEditModel, InputImage},
    imaging::{self, FALLBACK_JPEG_QUALITY},
    logger,
    models::{data_url, timestamp_now, EditMethod, EditResponse, ReplyPart},
};

pub const FALLBACK_NOTE: &str = "Used fallback image processing - Gemini did not generate new image";
pub const BOTH_FAILED_ERROR: &str = "Both Gemini and fallback processing failed";
pub const NO_IMAGE_TEXT: &str = "No image could be generated";

/// Runs one edit: download, normalize, ask the model, then fall back to a
/// local JPEG re-encode and finally to the model's text.
#[derive(Clone)]
pub struct EditService {
    fetcher: ImageFetcher,
    model: Arc<dyn ImageEditModel>,
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FixtralError::InternalError(format!("image task failed: {}", e)))?
}

impl EditService {
    pub fn new(fetcher: ImageFetcher, model: Arc<dyn ImageEditModel>) -> Self {
        Self { fetcher, model }
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub async fn execute(&self, image_url: &str, change_summary: &str) -> Result<EditResponse> {
        let req = Uuid::new_v4().simple().to_string();
        let req = &req[..8];
        let _timer = logger::timer(&format!("edit [req:{}]", req));

        log::info!("🎨 [req:{}] Executing edit with {}", req, self.model.model_id());
        log::info!("[req:{}] Image URL: {}", req, image_url);
        log::info!("[req:{}] Change summary: {}", req, change_summary);

        log::info!("📥 [req:{}] Downloading image...", req);
        let fetched = self.fetcher.fetch(image_url).await?;
        log::info!(
            "✅ [req:{}] Downloaded image, size: {} bytes, content-type: {}",
            req,
            fetched.bytes.len(),
            fetched.content_type
        );

        let original = Arc::new(fetched.bytes);

        let source = Arc::clone(&original);
        let prepared = match run_blocking(move || imaging::normalize(&source)).await {
            Ok((bytes, meta)) => {
                log::info!(
                    "🖼️ [req:{}] Image info: {} {}x{} {} channels",
                    req,
                    meta.format,
                    meta.width,
                    meta.height,
                    meta.channels
                );
                Arc::new(bytes)
            }
            Err(e) => {
                log::error!("❌ [req:{}] Normalization failed, sending original bytes: {}", req, e);
                Arc::clone(&original)
            }
        };

        log::info!("🤖 [req:{}] Sending to {}...", req, self.model.model_id());
        let reply = self
            .model
            .edit(
                change_summary,
                InputImage {
                    mime_type: &fetched.content_type,
                    bytes: &prepared,
                },
            )
            .await?;
        log::info!(
            "✅ [req:{}] Received response with {} parts",
            req,
            reply.part_count()
        );

        let mut generated_images = Vec::new();
        for part in reply.reply_parts() {
            match part {
                ReplyPart::Text(text) => log::info!("📝 [req:{}] Text response: {}", req, text),
                ReplyPart::Image { mime_type, data } => {
                    log::info!(
                        "✅ [req:{}] Generated image: {}, size: {} chars",
                        req,
                        mime_type,
                        data.len()
                    );
                    generated_images.push(data_url(mime_type, data));
                }
            }
        }

        if let Some(first) = generated_images.first().cloned() {
            log::info!("🎉 [req:{}] Generated {} image(s)", req, generated_images.len());
            return Ok(EditResponse {
                ok: true,
                edited: first,
                method: EditMethod::Gemini,
                has_image_data: true,
                generated_images,
                timestamp: timestamp_now(),
                note: None,
                error: None,
            });
        }

        log::warn!("⚠️ [req:{}] No images were generated, trying fallback processing...", req);
        let source = Arc::clone(&original);
        match run_blocking(move || imaging::reencode_jpeg(&source, FALLBACK_JPEG_QUALITY)).await {
            Ok(jpeg) => {
                let fallback = data_url("image/jpeg", &STANDARD.encode(&jpeg));
                log::info!("✅ [req:{}] Fallback processing completed", req);
                Ok(EditResponse {
                    ok: true,
                    edited: fallback.clone(),
                    method: EditMethod::LocalFallback,
                    has_image_data: true,
                    generated_images: vec![fallback],
                    timestamp: timestamp_now(),
                    note: Some(FALLBACK_NOTE.to_string()),
                    error: None,
                })
            }
            Err(e) => {
                log::error!("❌ [req:{}] Fallback processing failed: {}", req, e);
                let edited = reply
                    .checked_text()?
                    .unwrap_or_else(|| NO_IMAGE_TEXT.to_string());
                Ok(EditResponse {
                    ok: true,
                    edited,
                    method: EditMethod::TextResponse,
                    has_image_data: false,
                    generated_images: Vec::new(),
                    timestamp: timestamp_now(),
                    note: None,
                    error: Some(BOTH_FAILED_ERROR.to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::imaging::tests::{png_bytes, tiff_bytes};
    use crate::models::GenerateContentResponse;
    use async_trait::async_trait;
    use base64::Engine as _;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Replies with a canned body and remembers what it was sent.
    pub(crate) struct StubModel {
        reply: std::result::Result<serde_json::Value, String>,
        pub(crate) seen: Mutex<Vec<(String, String, Vec<u8>)>>,
    }

    impl StubModel {
        pub(crate) fn replying(body: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(body),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ImageEditModel for StubModel {
        fn model_id(&self) -> &str {
            "stub-model"
        }

        async fn edit(
            &self,
            instruction: &str,
            image: InputImage<'_>,
        ) -> Result<GenerateContentResponse> {
            self.seen.lock().unwrap().push((
                instruction.to_string(),
                image.mime_type.to_string(),
                image.bytes.to_vec(),
            ));
            match &self.reply {
                Ok(body) => Ok(serde_json::from_value(body.clone())?),
                Err(message) => Err(FixtralError::GenerationError(message.clone())),
            }
        }
    }

    pub(crate) fn image_reply() -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Done, removed the lamp post."},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}},
                    {"inlineData": {"data": "R0lGODlh"}}
                ]}
            }]
        })
    }

    pub(crate) fn text_only_reply() -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "I cannot edit this image."}]}
            }]
        })
    }

    async fn serve_image(body: Vec<u8>, content_type: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(body)
                    .insert_header("content-type", content_type),
            )
            .mount(&server)
            .await;
        server
    }

    fn service(model: Arc<StubModel>) -> EditService {
        EditService::new(ImageFetcher::new(Duration::from_secs(5)).unwrap(), model)
    }

    #[tokio::test]
    async fn test_model_image_is_returned() {
        let host = serve_image(png_bytes(8, 8), "image/png").await;
        let model = StubModel::replying(image_reply());

        let response = service(model.clone())
            .execute(&host.uri(), "remove the lamp post")
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.method, EditMethod::Gemini);
        assert!(response.has_image_data);
        assert_eq!(
            response.generated_images,
            vec![
                "data:image/png;base64,iVBORw0KGgo=".to_string(),
                "data:image/png;base64,R0lGODlh".to_string(),
            ]
        );
        assert_eq!(response.edited, response.generated_images[0]);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "remove the lamp post");
        assert_eq!(seen[0].1, "image/png");
        assert_eq!(image::guess_format(&seen[0].2).unwrap(), image::ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_falls_back_to_jpeg_reencode() {
        let host = serve_image(png_bytes(6, 4), "image/png").await;
        let response = service(StubModel::replying(text_only_reply()))
            .execute(&host.uri(), "make it pop")
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.method, EditMethod::LocalFallback);
        assert!(response.has_image_data);
        assert_eq!(response.generated_images.len(), 1);
        assert!(response.edited.starts_with("data:image/jpeg;base64,"));
        assert_eq!(response.note.as_deref(), Some(FALLBACK_NOTE));

        let encoded = response.edited.trim_start_matches("data:image/jpeg;base64,");
        let jpeg = STANDARD.decode(encoded).unwrap();
        let meta = imaging::inspect(&jpeg).unwrap();
        assert_eq!((meta.format.as_str(), meta.width, meta.height), ("jpeg", 6, 4));
    }

    #[tokio::test]
    async fn test_text_response_when_fallback_fails() {
        let host = serve_image(b"<html>not an image</html>".to_vec(), "text/html").await;
        let model = StubModel::replying(text_only_reply());

        let response = service(model.clone())
            .execute(&host.uri(), "make it pop")
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.method, EditMethod::TextResponse);
        assert!(!response.has_image_data);
        assert!(response.generated_images.is_empty());
        assert_eq!(response.edited, "I cannot edit this image.");
        assert_eq!(response.error.as_deref(), Some(BOTH_FAILED_ERROR));

        // normalization failed, so the original bytes went to the model
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].2, b"<html>not an image</html>".to_vec());
    }

    #[tokio::test]
    async fn test_text_response_default_message() {
        let host = serve_image(b"garbage".to_vec(), "image/jpeg").await;
        let response = service(StubModel::replying(serde_json::json!({"candidates": []})))
            .execute(&host.uri(), "anything")
            .await
            .unwrap();

        assert_eq!(response.method, EditMethod::TextResponse);
        assert_eq!(response.edited, NO_IMAGE_TEXT);
    }

    #[tokio::test]
    async fn test_blocked_prompt_without_fallback_is_an_error() {
        let host = serve_image(b"garbage".to_vec(), "image/jpeg").await;
        let blocked = serde_json::json!({"promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}});
        let err = service(StubModel::replying(blocked))
            .execute(&host.uri(), "anything")
            .await
            .unwrap_err();

        assert!(matches!(err, FixtralError::ResponseError(_)));
        assert!(err.to_string().contains("PROHIBITED_CONTENT"));
    }

    #[tokio::test]
    async fn test_blocked_prompt_still_gets_fallback() {
        let host = serve_image(png_bytes(3, 3), "image/png").await;
        let blocked = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let response = service(StubModel::replying(blocked))
            .execute(&host.uri(), "anything")
            .await
            .unwrap();

        assert_eq!(response.method, EditMethod::LocalFallback);
    }

    #[tokio::test]
    async fn test_tiff_source_gets_fallback() {
        let host = serve_image(tiff_bytes(5, 3), "image/tiff").await;
        let response = service(StubModel::replying(text_only_reply()))
            .execute(&host.uri(), "anything")
            .await
            .unwrap();

        assert_eq!(response.method, EditMethod::LocalFallback);
        assert!(response.edited.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let host = serve_image(png_bytes(2, 2), "image/png").await;
        let err = service(StubModel::failing("quota exceeded"))
            .execute(&host.uri(), "anything")
            .await
            .unwrap_err();

        assert!(matches!(err, FixtralError::GenerationError(_)));
    }
}
