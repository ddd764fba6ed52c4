//! Configuration management for uilens-server

use std::env;

/// Font locations tried when `ANNOTATE_FONT_PATH` is not set.
const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub detection: DetectionConfig,
    pub assessment: AssessmentConfig,
    pub annotate: AnnotateConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Hosted object-detection endpoint (Roboflow-style serverless inference).
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub api_url: String,
    pub api_key: String,
    /// Combined model identifier, e.g. `ui-elements/2`.
    pub model_id: String,
    /// Predictions below this confidence are discarded (0.0 keeps all).
    pub min_confidence: f32,
}

/// Hosted multimodal assessment endpoint (Gemini-style generateContent).
#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AnnotateConfig {
    /// Candidate font files, tried in order. Labels degrade to box-only
    /// drawing when none of them loads.
    pub font_paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Minutes an analysis stays retrievable after upload.
    pub session_ttl_minutes: i64,
    /// Upper bound for uploaded screenshot size in bytes.
    pub max_upload_bytes: usize,
    /// Maximum number of live analyses held in memory.
    pub max_active: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            detection: DetectionConfig {
                api_url: "https://serverless.roboflow.com".to_string(),
                api_key: String::new(),
                model_id: "ui-elements/1".to_string(),
                min_confidence: 0.0,
            },
            assessment: AssessmentConfig {
                api_url: "https://generativelanguage.googleapis.com".to_string(),
                api_key: String::new(),
                model: "gemini-2.5-flash".to_string(),
            },
            annotate: AnnotateConfig {
                font_paths: DEFAULT_FONT_CANDIDATES
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            analysis: AnalysisConfig {
                session_ttl_minutes: 60,
                max_upload_bytes: 20 * 1024 * 1024,
                max_active: 32,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        let mut font_paths: Vec<String> = Vec::new();
        if let Ok(path) = env::var("ANNOTATE_FONT_PATH") {
            font_paths.push(path);
        }
        font_paths.extend(defaults.annotate.font_paths.clone());

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| defaults.server.host.clone()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| defaults.server.port.to_string())
                    .parse()
                    .unwrap_or(defaults.server.port),
            },
            detection: DetectionConfig {
                api_url: env::var("DETECTION_API_URL")
                    .unwrap_or_else(|_| defaults.detection.api_url.clone()),
                api_key: env::var("DETECTION_API_KEY")?,
                model_id: env::var("DETECTION_MODEL_ID")
                    .unwrap_or_else(|_| defaults.detection.model_id.clone()),
                min_confidence: env::var("DETECTION_MIN_CONFIDENCE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.detection.min_confidence),
            },
            assessment: AssessmentConfig {
                api_url: env::var("ASSESSMENT_API_URL")
                    .unwrap_or_else(|_| defaults.assessment.api_url.clone()),
                api_key: env::var("ASSESSMENT_API_KEY")?,
                model: env::var("ASSESSMENT_MODEL")
                    .unwrap_or_else(|_| defaults.assessment.model.clone()),
            },
            annotate: AnnotateConfig { font_paths },
            analysis: AnalysisConfig {
                session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.analysis.session_ttl_minutes),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.analysis.max_upload_bytes),
                max_active: env::var("MAX_ACTIVE_ANALYSES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.analysis.max_active),
            },
        })
    }
}
