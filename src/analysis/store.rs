//! Analysis store
//!
//! In-memory, RwLock-protected map of live analyses. Clone-shared like the
//! rest of the application state; expiry is enforced both on access and by a
//! periodic sweep task.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbImage;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{Analysis, AnalysisError, AnalysisStatus};
use crate::assessment::Assessment;
use crate::detection::DetectedElement;

/// Sweep cadence for expired records.
const CLEANUP_INTERVAL_SECS: u64 = 300;

#[derive(Clone)]
pub struct AnalysisStore {
    inner: Arc<AnalysisStoreInner>,
}

struct AnalysisStoreInner {
    analyses: RwLock<HashMap<Uuid, Analysis>>,
    ttl_minutes: i64,
    max_active: usize,
}

impl AnalysisStore {
    pub fn new(ttl_minutes: i64, max_active: usize) -> Self {
        Self {
            inner: Arc::new(AnalysisStoreInner {
                analyses: RwLock::new(HashMap::new()),
                ttl_minutes,
                max_active,
            }),
        }
    }

    /// Create a record for a freshly uploaded screenshot.
    pub async fn create(
        &self,
        file_name: String,
        image: RgbImage,
    ) -> Result<Analysis, AnalysisError> {
        let mut analyses = self.inner.analyses.write().await;

        if self.inner.max_active > 0 {
            let active = analyses.values().filter(|a| !a.is_expired()).count();
            if active >= self.inner.max_active {
                return Err(AnalysisError::TooManyActive(self.inner.max_active));
            }
        }

        let analysis = Analysis::new(file_name, image, self.inner.ttl_minutes);
        analyses.insert(analysis.id, analysis.clone());

        tracing::info!(
            analysis_id = %analysis.id,
            file_name = %analysis.file_name,
            width = analysis.width(),
            height = analysis.height(),
            "Created analysis"
        );

        Ok(analysis)
    }

    /// Get a live analysis by id. Expired records answer `Expired`.
    pub async fn get(&self, id: Uuid) -> Result<Analysis, AnalysisError> {
        let analyses = self.inner.analyses.read().await;
        let analysis = analyses
            .get(&id)
            .ok_or_else(|| AnalysisError::NotFound(id.to_string()))?;

        if analysis.is_expired() {
            return Err(AnalysisError::Expired(id.to_string()));
        }

        Ok(analysis.clone())
    }

    /// Store a detection run: elements plus the annotated JPEG.
    ///
    /// Re-running detection replaces the previous run and clears any stored
    /// assessment, since its element ids no longer apply.
    pub async fn set_detections(
        &self,
        id: Uuid,
        elements: Vec<DetectedElement>,
        annotated_jpeg: Vec<u8>,
    ) -> Result<Analysis, AnalysisError> {
        let mut analyses = self.inner.analyses.write().await;
        let analysis = analyses
            .get_mut(&id)
            .ok_or_else(|| AnalysisError::NotFound(id.to_string()))?;

        if analysis.is_expired() {
            analysis.status = AnalysisStatus::Expired;
            return Err(AnalysisError::Expired(id.to_string()));
        }

        analysis.elements = elements;
        analysis.annotated_jpeg = Some(Arc::new(annotated_jpeg));
        analysis.assessment = None;
        analysis.status = AnalysisStatus::Detected;

        Ok(analysis.clone())
    }

    /// Store the parsed critique.
    pub async fn set_assessment(
        &self,
        id: Uuid,
        assessment: Assessment,
    ) -> Result<Analysis, AnalysisError> {
        let mut analyses = self.inner.analyses.write().await;
        let analysis = analyses
            .get_mut(&id)
            .ok_or_else(|| AnalysisError::NotFound(id.to_string()))?;

        if analysis.is_expired() {
            analysis.status = AnalysisStatus::Expired;
            return Err(AnalysisError::Expired(id.to_string()));
        }

        analysis.assessment = Some(assessment);
        analysis.status = AnalysisStatus::Assessed;

        Ok(analysis.clone())
    }

    /// Discard a record.
    pub async fn remove(&self, id: Uuid) -> Result<Analysis, AnalysisError> {
        let mut analyses = self.inner.analyses.write().await;
        let analysis = analyses
            .remove(&id)
            .ok_or_else(|| AnalysisError::NotFound(id.to_string()))?;

        tracing::info!(
            analysis_id = %id,
            file_name = %analysis.file_name,
            "Discarded analysis"
        );

        Ok(analysis)
    }

    pub async fn count(&self) -> usize {
        self.inner.analyses.read().await.len()
    }

    /// Remove expired records. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut analyses = self.inner.analyses.write().await;
        let before = analyses.len();
        analyses.retain(|_, a| !a.is_expired());
        let removed = before - analyses.len();

        if removed > 0 {
            tracing::info!(count = removed, "Cleaned up expired analyses");
        }

        removed
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(CLEANUP_INTERVAL_SECS));

            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        })
    }
}
