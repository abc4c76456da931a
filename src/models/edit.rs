use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub image_url: Option<String>,
    pub change_summary: Option<String>,
}

impl EditRequest {
    /// Returns `(image_url, change_summary)` when both are present and non-empty.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let image_url = self.image_url.as_deref().filter(|s| !s.is_empty())?;
        let change_summary = self.change_summary.as_deref().filter(|s| !s.is_empty())?;
        Some((image_url, change_summary))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EditMethod {
    #[serde(rename = "google_gemini")]
    Gemini,
    #[serde(rename = "sharp_fallback")]
    LocalFallback,
    #[serde(rename = "text_response")]
    TextResponse,
}

impl EditMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditMethod::Gemini => "google_gemini",
            EditMethod::LocalFallback => "sharp_fallback",
            EditMethod::TextResponse => "text_response",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub ok: bool,
    pub edited: String,
    pub method: EditMethod,
    pub has_image_data: bool,
    pub generated_images: Vec<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            timestamp: timestamp_now(),
        }
    }
}

/// Facts about a decoded image, logged before it is sent for editing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageMetadata {
    pub format: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn data_url(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}
