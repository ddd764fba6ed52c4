//! Detection types
//!
//! Bounding boxes arrive center-based from the detector and stay that way in
//! memory; corner math happens at the consumers (drawing, cropping).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Center-based bounding box in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Center x
    pub x: f32,
    /// Center y
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Corner coordinates `(x_min, y_min, x_max, y_max)`, unclamped.
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.x - self.width / 2.0,
            self.y - self.height / 2.0,
            self.x + self.width / 2.0,
            self.y + self.height / 2.0,
        )
    }

    /// Corner coordinates clamped into an `image_width` x `image_height`
    /// image. The result always satisfies `min <= max` on both axes.
    pub fn clamped_corners(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let (x_min, y_min, x_max, y_max) = self.corners();
        let clamp = |v: f32, max: u32| -> u32 { (v.max(0.0) as u32).min(max) };
        (
            clamp(x_min, image_width),
            clamp(y_min, image_height),
            clamp(x_max, image_width),
            clamp(y_max, image_height),
        )
    }
}

/// Raw prediction from the remote detector.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub class: String,
    pub confidence: f32,
    #[serde(flatten)]
    pub bbox: BoundingBox,
}

/// A prediction with its synthesized identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedElement {
    /// Synthesized id, e.g. `Button_1`. Per-class counter, first-seen order.
    pub id: String,
    pub class: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Assign per-class sequential ids (`Button_1`, `Button_2`, `Input_1`, ...)
/// in first-seen order. These ids are the join key between detections and
/// per-element critique entries.
pub fn assign_element_ids(predictions: Vec<Prediction>) -> Vec<DetectedElement> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    predictions
        .into_iter()
        .map(|p| {
            let count = counts.entry(p.class.clone()).or_insert(0);
            *count += 1;
            DetectedElement {
                id: format!("{}_{}", p.class, count),
                class: p.class,
                confidence: p.confidence,
                bbox: p.bbox,
            }
        })
        .collect()
}

/// Human-readable form of an element id for report rendering.
pub fn display_name(element_id: &str) -> String {
    element_id.replace('_', " ")
}

/// Detection error types
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Detection request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Detection API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed detection response: {0}")]
    Decode(String),

    #[error("Failed to encode image for detection: {0}")]
    Image(String),

    #[error("No UI elements detected")]
    NoElements,
}

impl DetectionError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Http(_) | Self::Api { .. } | Self::Decode(_) => StatusCode::BAD_GATEWAY,
            Self::Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoElements => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "DETECTOR_UNREACHABLE",
            Self::Api { .. } => "DETECTOR_ERROR",
            Self::Decode(_) => "DETECTOR_BAD_RESPONSE",
            Self::Image(_) => "IMAGE_ENCODE_FAILED",
            Self::NoElements => "NO_ELEMENTS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(class: &str, confidence: f32) -> Prediction {
        Prediction {
            class: class.to_string(),
            confidence,
            bbox: BoundingBox {
                x: 100.0,
                y: 50.0,
                width: 40.0,
                height: 20.0,
            },
        }
    }

    #[test]
    fn ids_are_per_class_sequential() {
        let elements = assign_element_ids(vec![
            prediction("Button", 0.9),
            prediction("Input", 0.8),
            prediction("Button", 0.7),
        ]);

        let ids: Vec<&str> = elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["Button_1", "Input_1", "Button_2"]);
    }

    #[test]
    fn ids_are_unique() {
        let elements = assign_element_ids(vec![
            prediction("Button", 0.9),
            prediction("Button", 0.9),
            prediction("Button", 0.9),
        ]);

        let mut ids: Vec<&str> = elements.iter().map(|e| e.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn display_name_drops_underscores() {
        assert_eq!(display_name("Button_1"), "Button 1");
        assert_eq!(display_name("Nav_Bar_2"), "Nav Bar 2");
    }

    #[test]
    fn corners_from_center_box() {
        let bbox = BoundingBox {
            x: 100.0,
            y: 50.0,
            width: 40.0,
            height: 20.0,
        };
        assert_eq!(bbox.corners(), (80.0, 40.0, 120.0, 60.0));
    }

    #[test]
    fn clamped_corners_stay_in_bounds() {
        // Box hanging over the top-left corner
        let bbox = BoundingBox {
            x: 5.0,
            y: 5.0,
            width: 40.0,
            height: 40.0,
        };
        let (x_min, y_min, x_max, y_max) = bbox.clamped_corners(200, 100);
        assert_eq!((x_min, y_min), (0, 0));
        assert!(x_max <= 200 && y_max <= 100);

        // Box entirely outside the image
        let outside = BoundingBox {
            x: 500.0,
            y: 500.0,
            width: 10.0,
            height: 10.0,
        };
        let (x_min, y_min, x_max, y_max) = outside.clamped_corners(200, 100);
        assert_eq!((x_min, y_min, x_max, y_max), (200, 100, 200, 100));
    }

    #[test]
    fn prediction_deserializes_flat_wire_format() {
        let json = r#"{
            "x": 320.5, "y": 240.0, "width": 120.0, "height": 48.0,
            "class": "Button", "confidence": 0.93, "class_id": 3
        }"#;
        let p: Prediction = serde_json::from_str(json).unwrap();
        assert_eq!(p.class, "Button");
        assert_eq!(p.bbox.width, 120.0);
    }
}
