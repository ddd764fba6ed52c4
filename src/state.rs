//! Application state management

use std::sync::Arc;

use crate::analysis::AnalysisStore;
use crate::annotate::Annotator;
use crate::assessment::AssessorProvider;
use crate::config::Config;
use crate::detection::DetectorProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    detector: Arc<dyn DetectorProvider>,
    assessor: Arc<dyn AssessorProvider>,
    annotator: Annotator,
    store: AnalysisStore,
}

impl AppState {
    /// Create application state with the given providers.
    ///
    /// Providers are trait objects so tests can substitute stubs for the
    /// hosted endpoints.
    pub fn new(
        config: Config,
        detector: Arc<dyn DetectorProvider>,
        assessor: Arc<dyn AssessorProvider>,
    ) -> Self {
        let annotator = Annotator::from_config(&config.annotate);
        let store = AnalysisStore::new(
            config.analysis.session_ttl_minutes,
            config.analysis.max_active,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                detector,
                assessor,
                annotator,
                store,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn detector(&self) -> &dyn DetectorProvider {
        self.inner.detector.as_ref()
    }

    pub fn assessor(&self) -> &dyn AssessorProvider {
        self.inner.assessor.as_ref()
    }

    pub fn annotator(&self) -> &Annotator {
        &self.inner.annotator
    }

    pub fn store(&self) -> &AnalysisStore {
        &self.inner.store
    }
}
