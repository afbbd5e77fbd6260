use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Directory containing the ONNX face-shape model and its metadata.
    pub model_dir: PathBuf,
    /// Whether to load and consult the image classifier at all.
    pub model_enabled: bool,
    /// Upper bound on one image-classifier call; slower calls count as absent.
    pub model_timeout: Duration,
    /// Hairstyle catalog TOML. `None` uses the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    /// Classifier calibration TOML. `None` uses the built-in calibration.
    pub calibration_path: Option<PathBuf>,
    /// Recommendation count when a caller passes 0.
    pub default_limit: usize,
}

impl Config {
    /// Load configuration from `CONTOUR_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("CONTOUR_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| contour_core::default_model_dir());

        Self {
            model_dir,
            model_enabled: std::env::var("CONTOUR_MODEL_ENABLED")
                .map(|v| v != "0")
                .unwrap_or(true),
            model_timeout: Duration::from_millis(env_u64("CONTOUR_MODEL_TIMEOUT_MS", 3000)),
            catalog_path: env_path("CONTOUR_CATALOG_PATH"),
            calibration_path: env_path("CONTOUR_CALIBRATION_PATH"),
            default_limit: env_usize("CONTOUR_DEFAULT_LIMIT", 5),
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
