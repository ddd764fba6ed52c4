//! Detector providers
//!
//! The hosted endpoint speaks the serverless inference protocol: the model id
//! in the path, the api key as a query parameter, and the image as a base64
//! body. The provider trait keeps the route handlers testable without a
//! network.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use super::types::{DetectionError, Prediction};
use crate::config::DetectionConfig;

/// Detector provider trait
#[async_trait]
pub trait DetectorProvider: Send + Sync {
    /// Locate UI elements in a JPEG-encoded screenshot.
    async fn detect(&self, jpeg: &[u8]) -> Result<Vec<Prediction>, DetectionError>;
}

#[derive(Debug, Deserialize)]
struct DetectionResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

/// Hosted object-detection provider
pub struct RemoteDetector {
    client: reqwest::Client,
    config: DetectionConfig,
}

impl RemoteDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.model_id
        )
    }
}

#[async_trait]
impl DetectorProvider for RemoteDetector {
    async fn detect(&self, jpeg: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(jpeg);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("api_key", self.config.api_key.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(image_base64)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DetectionError::Api { status, body });
        }

        let result: DetectionResponse = response
            .json()
            .await
            .map_err(|e| DetectionError::Decode(e.to_string()))?;

        let min_confidence = self.config.min_confidence;
        let kept: Vec<Prediction> = result
            .predictions
            .into_iter()
            .filter(|p| p.confidence >= min_confidence)
            .collect();

        tracing::debug!(
            predictions = kept.len(),
            min_confidence = min_confidence as f64,
            "Detection response parsed"
        );

        Ok(kept)
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockDetector {
    pub predictions: Vec<Prediction>,
}

#[cfg(test)]
#[async_trait]
impl DetectorProvider for MockDetector {
    async fn detect(&self, _jpeg: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        Ok(self.predictions.clone())
    }
}
