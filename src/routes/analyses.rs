//! Analyses API
//!
//! One resource per uploaded screenshot, driven through the pipeline by the
//! browser form:
//! - POST /api/v1/analyses - upload a screenshot
//! - GET /api/v1/analyses/:id - pipeline status
//! - POST /api/v1/analyses/:id/detect - run element detection + annotation
//! - GET /api/v1/analyses/:id/annotated - annotated JPEG
//! - POST /api/v1/analyses/:id/assess - run the UX critique
//! - GET /api/v1/analyses/:id/report - download the PDF report
//! - DELETE /api/v1/analyses/:id - discard the analysis

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::{AnalysisError, AnalysisStatus};
use crate::annotate::encode_jpeg;
use crate::assessment::Assessment;
use crate::detection::{assign_element_ids, DetectedElement, DetectionError};
use crate::error::{AppError, Result};
use crate::report;
use crate::state::AppState;

/// Create the analyses router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(create_analysis))
        .route("/:id", get(get_analysis).delete(delete_analysis))
        .route("/:id/detect", post(run_detection))
        .route("/:id/annotated", get(annotated_image))
        .route("/:id/assess", post(run_assessment))
        .route("/:id/report", get(download_report))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCreatedResponse {
    pub analysis_id: Uuid,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub status: AnalysisStatus,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStatusResponse {
    pub analysis_id: Uuid,
    pub file_name: String,
    pub status: AnalysisStatus,
    pub width: u32,
    pub height: u32,
    pub element_count: usize,
    pub has_assessment: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRunResponse {
    pub analysis_id: Uuid,
    pub element_count: usize,
    pub elements: Vec<DetectedElement>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/analyses
///
/// Multipart upload of a screenshot under the `file` field.
async fn create_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisCreatedResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" && name != "image" {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "screenshot".to_string());

        if let Some(content_type) = field.content_type() {
            if !is_supported_image(content_type) {
                return Err(AppError::UnsupportedMedia(content_type.to_string()));
            }
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {e}")))?;

        let decoded = image::load_from_memory(&data)
            .map_err(|e| AppError::BadRequest(format!("Failed to decode image: {e}")))?;

        // JPEG downstream cannot carry alpha; flatten on ingest
        let image = decoded.to_rgb8();

        let analysis = state.store().create(file_name, image).await?;

        return Ok(Json(AnalysisCreatedResponse {
            analysis_id: analysis.id,
            file_name: analysis.file_name.clone(),
            width: analysis.width(),
            height: analysis.height(),
            status: analysis.status,
            expires_at: analysis.expires_at,
        }));
    }

    Err(AppError::BadRequest(
        "No file provided. Use field name 'file' or 'image'".to_string(),
    ))
}

/// GET /api/v1/analyses/:id
async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisStatusResponse>> {
    let analysis = state.store().get(id).await?;

    Ok(Json(AnalysisStatusResponse {
        analysis_id: analysis.id,
        file_name: analysis.file_name.clone(),
        status: analysis.status,
        width: analysis.width(),
        height: analysis.height(),
        element_count: analysis.elements.len(),
        has_assessment: analysis.assessment.is_some(),
        created_at: analysis.created_at,
        expires_at: analysis.expires_at,
    }))
}

/// POST /api/v1/analyses/:id/detect
///
/// Runs the hosted detector, synthesizes element ids, and renders the
/// annotated image. Zero detections is reported as `NO_ELEMENTS` and leaves
/// the record re-runnable.
async fn run_detection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DetectionRunResponse>> {
    let analysis = state.store().get(id).await?;

    let jpeg = encode_jpeg(&analysis.image)
        .map_err(|e| DetectionError::Image(e.to_string()))?;

    let predictions = state.detector().detect(&jpeg).await?;
    if predictions.is_empty() {
        tracing::warn!(analysis_id = %id, "No UI elements detected");
        return Err(DetectionError::NoElements.into());
    }

    let elements = assign_element_ids(predictions);
    let annotated = state.annotator().render(&analysis.image, &elements);
    let annotated_jpeg =
        encode_jpeg(&annotated).map_err(|e| DetectionError::Image(e.to_string()))?;

    let updated = state
        .store()
        .set_detections(id, elements, annotated_jpeg)
        .await?;

    tracing::info!(
        analysis_id = %id,
        elements = updated.elements.len(),
        "Detection complete"
    );

    Ok(Json(DetectionRunResponse {
        analysis_id: id,
        element_count: updated.elements.len(),
        elements: updated.elements,
    }))
}

/// GET /api/v1/analyses/:id/annotated
async fn annotated_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let analysis = state.store().get(id).await?;

    let jpeg = analysis.annotated_jpeg.ok_or(AnalysisError::NotReady {
        id: id.to_string(),
        operation: "annotated image",
        required: "a detection run",
    })?;

    Response::builder()
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(jpeg.as_ref().clone()))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// POST /api/v1/analyses/:id/assess
///
/// Sends the annotated screenshot and the detection summary to the hosted
/// assessment model and stores the parsed critique.
async fn run_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assessment>> {
    let analysis = state.store().get(id).await?;

    if analysis.elements.is_empty() {
        return Err(AnalysisError::NotReady {
            id: id.to_string(),
            operation: "assessment",
            required: "a detection run",
        }
        .into());
    }
    let jpeg = analysis
        .annotated_jpeg
        .as_ref()
        .ok_or(AnalysisError::NotReady {
            id: id.to_string(),
            operation: "assessment",
            required: "an annotated image",
        })?;

    let assessment = state.assessor().assess(jpeg, &analysis.elements).await?;

    state.store().set_assessment(id, assessment.clone()).await?;

    tracing::info!(
        analysis_id = %id,
        element_critiques = assessment.elements.len(),
        "Assessment complete"
    );

    Ok(Json(assessment))
}

/// GET /api/v1/analyses/:id/report
async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let analysis = state.store().get(id).await?;

    if analysis.assessment.is_none() {
        return Err(AnalysisError::NotReady {
            id: id.to_string(),
            operation: "report generation",
            required: "a stored assessment",
        }
        .into());
    }

    let pdf = report::render_report(&analysis)?;
    let file_name = report::report_file_name(&analysis);

    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(Body::from(pdf))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// DELETE /api/v1/analyses/:id
async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.store().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helpers
// ============================================================================

fn is_supported_image(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/png" | "image/jpeg" | "image/jpg" | "image/webp"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_image_types() {
        assert!(is_supported_image("image/png"));
        assert!(is_supported_image("image/jpeg"));
        assert!(is_supported_image("image/webp"));
        assert!(!is_supported_image("application/pdf"));
        assert!(!is_supported_image("text/html"));
    }
}
