//! Analysis pipeline state
//!
//! One `Analysis` record per uploaded screenshot, held in memory for the
//! duration of a browser session:
//! - In-memory store with RwLock protection
//! - Status progression upload -> detect -> assess
//! - Automatic expiry cleanup

mod store;
mod types;

pub use store::AnalysisStore;
pub use types::{Analysis, AnalysisError, AnalysisStatus};
