//! Classifier calibration loaded from TOML.
//!
//! Every section is optional; omitted sections keep the built-in defaults.
//!
//! ```toml
//! [weights]
//! lw = 2.5
//! angle = 0.05
//!
//! [calibration]
//! scale = 3.0
//! floor = 0.65
//! ceiling = 0.95
//!
//! [roles]
//! chin = 152
//!
//! [[profiles]]
//! shape = "oval"
//! ideal_ratio_lw = 1.25
//! ideal_ratio_fj = 0.78
//! ideal_ratio_cj = 1.04
//! ideal_jaw_angle = 130.0
//! ```

use crate::geometric::{ClassifierWeights, ConfidenceCalibration, GeometricClassifier};
use crate::landmarks::LandmarkRoles;
use crate::profiles::{ProfileError, ProfileTable, ShapeProfile, DEFAULT_PROFILES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read calibration {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("bad calibration TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid profile table: {0}")]
    Profiles(#[from] ProfileError),
    #[error("invalid calibration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub roles: LandmarkRoles,
    pub weights: ClassifierWeights,
    pub calibration: ConfidenceCalibration,
    pub profiles: Vec<ShapeProfile>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            roles: LandmarkRoles::default(),
            weights: ClassifierWeights::default(),
            calibration: ConfidenceCalibration::default(),
            profiles: DEFAULT_PROFILES.to_vec(),
        }
    }
}

impl CalibrationConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&src)?;
        tracing::info!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "calibration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        if [w.lw, w.fj, w.cj, w.angle].iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::Invalid(
                "weights must be finite and non-negative".into(),
            ));
        }

        let c = &self.calibration;
        if !(c.scale.is_finite() && c.scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scale must be positive, got {}",
                c.scale
            )));
        }
        if !(0.0 <= c.floor && c.floor <= c.ceiling && c.ceiling <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "need 0 <= floor <= ceiling <= 1, got floor {} ceiling {}",
                c.floor, c.ceiling
            )));
        }

        ProfileTable::new(self.profiles.clone())?;
        Ok(())
    }

    pub fn profile_table(&self) -> Result<ProfileTable, ConfigError> {
        Ok(ProfileTable::new(self.profiles.clone())?)
    }

    /// Build the geometric classifier this configuration describes.
    pub fn classifier(&self) -> Result<GeometricClassifier, ConfigError> {
        Ok(GeometricClassifier::new(
            Arc::new(self.profile_table()?),
            self.weights,
            self.calibration,
        ))
    }
}
