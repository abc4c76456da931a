use crate::error::{FixtralError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type", default)]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "inlineData",
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: Some(mime_type.into()),
                data: data.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

/// Finish reasons that mean the candidate's text was withheld.
pub const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One piece of a candidate's reply, in the order the model returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPart<'a> {
    Text(&'a str),
    Image { mime_type: &'a str, data: &'a str },
}

pub const DEFAULT_INLINE_MIME: &str = "image/png";

impl GenerateContentResponse {
    fn first_candidate_parts(&self) -> &[Part] {
        self.candidates
            .as_deref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Text wins over inline data when a part carries both; parts with
    /// neither are skipped.
    pub fn reply_parts(&self) -> Vec<ReplyPart<'_>> {
        self.first_candidate_parts()
            .iter()
            .filter_map(|part| match (&part.text, &part.inline_data) {
                (Some(text), _) if !text.is_empty() => Some(ReplyPart::Text(text)),
                (_, Some(inline)) => Some(ReplyPart::Image {
                    mime_type: inline
                        .mime_type
                        .as_deref()
                        .filter(|m| !m.is_empty())
                        .unwrap_or(DEFAULT_INLINE_MIME),
                    data: &inline.data,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn part_count(&self) -> usize {
        self.first_candidate_parts().len()
    }

    /// Concatenated text of the first candidate, if it has any.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .reply_parts()
            .into_iter()
            .filter_map(|part| match part {
                ReplyPart::Text(text) => Some(text),
                ReplyPart::Image { .. } => None,
            })
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Like [`text`](Self::text), but a blocked prompt or a candidate stopped
    /// for safety or recitation is an error rather than an empty reply.
    pub fn checked_text(&self) -> Result<Option<String>> {
        match self.candidates.as_deref().and_then(|c| c.first()) {
            Some(candidate) => {
                if let Some(reason) = candidate
                    .finish_reason
                    .as_deref()
                    .filter(|r| BLOCKED_FINISH_REASONS.contains(r))
                {
                    return Err(FixtralError::ResponseError(format!(
                        "Candidate was blocked due to {}",
                        reason
                    )));
                }
                Ok(self.text())
            }
            None => match &self.prompt_feedback {
                Some(feedback) => Err(FixtralError::ResponseError(format!(
                    "Text not available. Response was blocked due to {}",
                    feedback.block_reason.as_deref().unwrap_or("an unspecified reason")
                ))),
                None => Ok(None),
            },
        }
    }
}
