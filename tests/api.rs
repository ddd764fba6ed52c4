//! End-to-end API tests
//!
//! Drives the router with stub providers in place of the hosted endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use uilens_server::assessment::{Assessment, AssessmentError, AssessorProvider, ElementCritique};
use uilens_server::config::Config;
use uilens_server::detection::{
    BoundingBox, DetectedElement, DetectionError, DetectorProvider, Prediction,
};
use uilens_server::routes;
use uilens_server::state::AppState;

// ============================================================================
// Stub providers
// ============================================================================

struct StubDetector {
    predictions: Vec<Prediction>,
}

#[async_trait]
impl DetectorProvider for StubDetector {
    async fn detect(&self, _jpeg: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        Ok(self.predictions.clone())
    }
}

struct FailingDetector;

#[async_trait]
impl DetectorProvider for FailingDetector {
    async fn detect(&self, _jpeg: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        Err(DetectionError::Api {
            status: 500,
            body: "inference backend down".to_string(),
        })
    }
}

struct StubAssessor {
    assessment: Assessment,
}

#[async_trait]
impl AssessorProvider for StubAssessor {
    async fn assess(
        &self,
        _jpeg: &[u8],
        _elements: &[DetectedElement],
    ) -> Result<Assessment, AssessmentError> {
        Ok(self.assessment.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn prediction(class: &str) -> Prediction {
    Prediction {
        class: class.to_string(),
        confidence: 0.92,
        bbox: BoundingBox {
            x: 80.0,
            y: 40.0,
            width: 60.0,
            height: 24.0,
        },
    }
}

fn stub_assessment() -> Assessment {
    Assessment {
        typography: "RATING: Good. Consistent type scale.".to_string(),
        color_scheme: "RATING: Fair. Weak link contrast.".to_string(),
        visual_hierarchy: "RATING: Good. One clear primary action.".to_string(),
        elements: vec![ElementCritique {
            id: "Button_1".to_string(),
            critique: "RATING: Good. Obvious affordance.".to_string(),
            notes: "Increase the hit area on mobile.".to_string(),
        }],
    }
}

fn test_app(detector: Arc<dyn DetectorProvider>, assessor: Arc<dyn AssessorProvider>) -> Router {
    let state = AppState::new(Config::default(), detector, assessor);
    routes::router(state)
}

fn default_app() -> Router {
    test_app(
        Arc::new(StubDetector {
            predictions: vec![prediction("Button"), prediction("Input")],
        }),
        Arc::new(StubAssessor {
            assessment: stub_assessment(),
        }),
    )
}

fn test_png() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(160, 80, image::Rgb([230, 230, 230]));
    let mut buffer = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .unwrap();
    buffer
}

/// Hand-rolled multipart body; keeps the tests free of client-side helpers.
fn multipart_body(file_name: &str, content_type: &str, data: &[u8]) -> (Vec<u8>, String) {
    let boundary = "uilens-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (body, format!("multipart/form-data; boundary={boundary}"))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload(app: &Router) -> String {
    let (body, content_type) = multipart_body("landing.png", "image/png", &test_png());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/analyses")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    json["analysisId"].as_str().unwrap().to_string()
}

async fn post_empty(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn health_reports_version() {
    let app = default_app();
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "uilens-server");
}

#[tokio::test]
async fn index_serves_the_form() {
    let app = default_app();
    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("/api/v1/analyses"));
}

#[tokio::test]
async fn full_pipeline_upload_detect_assess_report() {
    let app = default_app();
    let id = upload(&app).await;

    // Upload created the record
    let response = get(&app, &format!("/api/v1/analyses/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "uploaded");
    assert_eq!(json["width"], 160);

    // Detection synthesizes per-class ids
    let response = post_empty(&app, &format!("/api/v1/analyses/{id}/detect")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["elementCount"], 2);
    assert_eq!(json["elements"][0]["id"], "Button_1");
    assert_eq!(json["elements"][1]["id"], "Input_1");

    // Annotated image is a JPEG
    let response = get(&app, &format!("/api/v1/analyses/{id}/annotated")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

    // Assessment returns the critique
    let response = post_empty(&app, &format!("/api/v1/analyses/{id}/assess")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["typography"].as_str().unwrap().starts_with("RATING:"));
    assert_eq!(json["elements"][0]["id"], "Button_1");

    // Report downloads as an attached PDF
    let response = get(&app, &format!("/api/v1/analyses/{id}/report")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"ui-assessment-"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn unknown_analysis_is_404() {
    let app = default_app();
    let response = get(
        &app,
        "/api/v1/analyses/00000000-0000-0000-0000-000000000000",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "ANALYSIS_NOT_FOUND");
}

#[tokio::test]
async fn assessment_before_detection_is_409() {
    let app = default_app();
    let id = upload(&app).await;

    let response = post_empty(&app, &format!("/api/v1/analyses/{id}/assess")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["error"], "ANALYSIS_NOT_READY");
}

#[tokio::test]
async fn report_before_assessment_is_409() {
    let app = default_app();
    let id = upload(&app).await;

    let response = post_empty(&app, &format!("/api/v1/analyses/{id}/detect")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, &format!("/api/v1/analyses/{id}/report")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn zero_detections_is_422_and_rerunnable() {
    let app = test_app(
        Arc::new(StubDetector {
            predictions: vec![],
        }),
        Arc::new(StubAssessor {
            assessment: stub_assessment(),
        }),
    );
    let id = upload(&app).await;

    let response = post_empty(&app, &format!("/api/v1/analyses/{id}/detect")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "NO_ELEMENTS");

    // The record survives for another run
    let response = get(&app, &format!("/api/v1/analyses/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "uploaded");
}

#[tokio::test]
async fn detector_failures_surface_as_bad_gateway() {
    let app = test_app(
        Arc::new(FailingDetector),
        Arc::new(StubAssessor {
            assessment: stub_assessment(),
        }),
    );
    let id = upload(&app).await;

    let response = post_empty(&app, &format!("/api/v1/analyses/{id}/detect")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "DETECTOR_ERROR");
}

#[tokio::test]
async fn unsupported_upload_type_is_415() {
    let app = default_app();
    let (body, content_type) = multipart_body("report.pdf", "application/pdf", b"%PDF-1.4");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/analyses")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn undecodable_image_is_400() {
    let app = default_app();
    let (body, content_type) = multipart_body("broken.png", "image/png", b"not actually a png");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/analyses")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_discards_the_analysis() {
    let app = default_app();
    let id = upload(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/analyses/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app, &format!("/api/v1/analyses/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
