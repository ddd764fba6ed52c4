//! Assessment types
//!
//! The JSON shape here is the wire contract dictated to the remote model by
//! the prompt: three fixed global critiques plus per-element entries keyed by
//! the synthesized element id. Every field is defaulted so a partial reply
//! still parses; report rendering substitutes placeholders for blanks.

use serde::{Deserialize, Serialize};

/// Structured critique returned by the assessment model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(default)]
    pub typography: String,

    #[serde(default)]
    pub color_scheme: String,

    #[serde(default)]
    pub visual_hierarchy: String,

    #[serde(default)]
    pub elements: Vec<ElementCritique>,
}

/// Per-element critique entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementCritique {
    /// Element id as listed in the detection summary, e.g. `Button_1`.
    pub id: String,

    #[serde(default)]
    pub critique: String,

    #[serde(default)]
    pub notes: String,
}

/// Strip a surrounding markdown code fence from a model reply.
///
/// Models asked for raw JSON still occasionally wrap it in ```json fences.
pub fn strip_code_fences(text: &str) -> &str {
    let mut trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        trimmed = rest.trim_start();
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest.trim_start();
    }

    if let Some(rest) = trimmed.strip_suffix("```") {
        trimmed = rest.trim_end();
    }

    trimmed
}

/// Parse a model reply into an [`Assessment`].
pub fn parse_assessment(text: &str) -> Result<Assessment, AssessmentError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| AssessmentError::Parse(e.to_string()))
}

/// Assessment error types
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("Assessment request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Assessment API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Assessment reply carried no content")]
    EmptyReply,

    #[error("Assessment reply is not valid JSON: {0}")]
    Parse(String),

    #[error("Failed to encode image for assessment: {0}")]
    Image(String),
}

impl AssessmentError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Http(_) | Self::Api { .. } | Self::EmptyReply | Self::Parse(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "ASSESSOR_UNREACHABLE",
            Self::Api { .. } => "ASSESSOR_ERROR",
            Self::EmptyReply => "ASSESSOR_EMPTY_REPLY",
            Self::Parse(_) => "ASSESSOR_BAD_JSON",
            Self::Image(_) => "IMAGE_ENCODE_FAILED",
        }
    }
}
