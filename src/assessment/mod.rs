//! Automated UX assessment
//!
//! Sends the annotated screenshot and a detection summary to a hosted
//! multimodal model and parses the structured critique it returns.

mod prompt;
mod provider;
mod types;

pub use prompt::build_prompt;
pub use provider::{AssessorProvider, GeminiAssessor};
pub use types::{
    parse_assessment, strip_code_fences, Assessment, AssessmentError, ElementCritique,
};
