use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;

use super::{ImageEditModel, InputImage};
use crate::{
    config::GeminiConfig,
    error::{FixtralError, Result},
    models::{Content, GenerateContentRequest, GenerateContentResponse, Part},
};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiImageClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| FixtralError::ConfigError("GEMINI_API_KEY is required".into()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            model: config.model_or_default().to_string(),
            base_url: config.base_url_or_default().to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(instruction: &str, image: &InputImage<'_>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::text(instruction),
                    Part::inline(image.mime_type, STANDARD.encode(image.bytes)),
                ],
            }],
        }
    }
}

#[async_trait]
impl ImageEditModel for GeminiImageClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn edit(
        &self,
        instruction: &str,
        image: InputImage<'_>,
    ) -> Result<GenerateContentResponse> {
        let payload = Self::build_request(instruction, &image);

        log::info!("Invoking model: {}", self.model);
        log::debug!(
            "Edit payload: {} instruction chars, {} image bytes ({})",
            instruction.len(),
            image.bytes.len(),
            image.mime_type
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FixtralError::GenerationError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FixtralError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            return Err(FixtralError::GenerationError(format!(
                "Gemini returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        serde_json::from_str(&body).map_err(|e| FixtralError::ResponseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReplyPart;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiImageClient {
        let config = GeminiConfig::new()
            .with_api_key("test_key")
            .with_base_url(server.uri());
        GeminiImageClient::new(&config).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let err = GeminiImageClient::new(&GeminiConfig::new()).err().unwrap();
        assert!(matches!(err, FixtralError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_edit_sends_instruction_and_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1beta/models/gemini-2.5-flash-image-preview:generateContent",
            ))
            .and(header("x-goog-api-key", "test_key"))
            .and(body_partial_json(json!({
                "contents": [{
                    "parts": [
                        {"text": "make it black and white"},
                        {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "BBBB"}}]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client
            .edit(
                "make it black and white",
                InputImage {
                    mime_type: "image/png",
                    bytes: &[1, 2, 3],
                },
            )
            .await
            .unwrap();

        assert_eq!(
            response.reply_parts(),
            vec![ReplyPart::Image {
                mime_type: "image/png",
                data: "BBBB"
            }]
        );
    }

    #[tokio::test]
    async fn test_edit_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .edit(
                "anything",
                InputImage {
                    mime_type: "image/jpeg",
                    bytes: &[0],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FixtralError::GenerationError(_)));
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("API key not valid"));
    }
}
