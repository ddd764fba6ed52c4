//! Assessor providers

use async_trait::async_trait;
use base64::Engine;

use super::prompt::build_prompt;
use super::types::{parse_assessment, Assessment, AssessmentError};
use crate::config::AssessmentConfig;
use crate::detection::DetectedElement;

/// Assessor provider trait
#[async_trait]
pub trait AssessorProvider: Send + Sync {
    /// Produce a structured critique for an annotated JPEG screenshot.
    async fn assess(
        &self,
        jpeg: &[u8],
        elements: &[DetectedElement],
    ) -> Result<Assessment, AssessmentError>;
}

/// Hosted multimodal assessment provider (generateContent protocol)
pub struct GeminiAssessor {
    client: reqwest::Client,
    config: AssessmentConfig,
}

impl GeminiAssessor {
    pub fn new(config: AssessmentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl AssessorProvider for GeminiAssessor {
    async fn assess(
        &self,
        jpeg: &[u8],
        elements: &[DetectedElement],
    ) -> Result<Assessment, AssessmentError> {
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(jpeg);
        let prompt = build_prompt(elements);

        let request = serde_json::json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "image/jpeg", "data": image_base64 } },
                    { "text": prompt }
                ]
            }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AssessmentError::Api { status, body });
        }

        let result: serde_json::Value = response.json().await?;

        let text = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(AssessmentError::EmptyReply)?;

        let assessment = parse_assessment(text)?;

        tracing::debug!(
            element_critiques = assessment.elements.len(),
            "Assessment reply parsed"
        );

        Ok(assessment)
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockAssessor {
    pub assessment: Assessment,
}

#[cfg(test)]
#[async_trait]
impl AssessorProvider for MockAssessor {
    async fn assess(
        &self,
        _jpeg: &[u8],
        _elements: &[DetectedElement],
    ) -> Result<Assessment, AssessmentError> {
        Ok(self.assessment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_model_and_action() {
        let assessor = GeminiAssessor::new(AssessmentConfig {
            api_url: "https://generativelanguage.googleapis.com/".to_string(),
            api_key: "key".to_string(),
            model: "gemini-2.5-flash".to_string(),
        });
        assert_eq!(
            assessor.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
