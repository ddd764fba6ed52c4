//! UI element detection
//!
//! Delegates object detection to a hosted inference endpoint and turns the
//! raw predictions into elements with stable human-readable identifiers.

mod provider;
mod types;

pub use provider::{DetectorProvider, RemoteDetector};
pub use types::{
    assign_element_ids, display_name, BoundingBox, DetectedElement, DetectionError, Prediction,
};
