//! Analysis record types

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::Serialize;
use uuid::Uuid;

use crate::assessment::Assessment;
use crate::detection::DetectedElement;

/// One uploaded screenshot and everything the pipeline derived from it.
///
/// Image payloads are behind `Arc` so store reads stay cheap; records are
/// transient and never touch durable storage.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub id: Uuid,

    /// Original upload file name, used in the report header.
    pub file_name: String,

    /// Decoded screenshot, flattened to RGB.
    pub image: Arc<RgbImage>,

    /// Detections with synthesized ids, empty until detection runs.
    pub elements: Vec<DetectedElement>,

    /// Annotated JPEG produced by the detection step.
    pub annotated_jpeg: Option<Arc<Vec<u8>>>,

    /// Parsed critique, set by the assessment step.
    pub assessment: Option<Assessment>,

    pub status: AnalysisStatus,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl Analysis {
    pub fn new(file_name: String, image: RgbImage, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            file_name,
            image: Arc::new(image),
            elements: Vec::new(),
            annotated_jpeg: None,
            assessment: None,
            status: AnalysisStatus::Uploaded,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(ttl_minutes),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Pipeline status of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Screenshot stored, nothing derived yet
    Uploaded,
    /// Elements detected and annotated image rendered
    Detected,
    /// Critique stored, report available
    Assessed,
    /// Record past its TTL, pending sweep
    Expired,
}

/// Analysis error types
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analysis not found: {0}")]
    NotFound(String),

    #[error("Analysis expired: {0}")]
    Expired(String),

    #[error("Analysis {id}: {required} required before {operation}")]
    NotReady {
        id: String,
        operation: &'static str,
        required: &'static str,
    },

    #[error("Too many active analyses (max: {0})")]
    TooManyActive(usize),
}

impl AnalysisError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Expired(_) => StatusCode::GONE,
            Self::NotReady { .. } => StatusCode::CONFLICT,
            Self::TooManyActive(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ANALYSIS_NOT_FOUND",
            Self::Expired(_) => "ANALYSIS_EXPIRED",
            Self::NotReady { .. } => "ANALYSIS_NOT_READY",
            Self::TooManyActive(_) => "TOO_MANY_ANALYSES",
        }
    }
}
