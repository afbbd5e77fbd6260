//! Geometric face-shape classifier.
//!
//! Nearest-profile search under a weighted L1 distance over the three ratios
//! and the jaw angle. The jaw angle is in degrees, so its weight is scaled
//! down to keep its contribution comparable to the ratio terms.

use crate::profiles::{ProfileTable, ShapeProfile};
use crate::types::{ClassificationResult, FaceMeasurements, Method};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-term weights of the profile distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierWeights {
    pub lw: f64,
    pub fj: f64,
    pub cj: f64,
    pub angle: f64,
}

impl Default for ClassifierWeights {
    fn default() -> Self {
        Self {
            lw: 2.5,
            fj: 1.5,
            cj: 1.0,
            angle: 0.05,
        }
    }
}

/// Maps a best-match distance to a reported confidence.
///
/// `confidence = clamp(1 - distance / scale, floor, ceiling)`. The defaults
/// (3.0, 0.65, 0.95) are empirical calibration values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceCalibration {
    pub scale: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for ConfidenceCalibration {
    fn default() -> Self {
        Self {
            scale: 3.0,
            floor: 0.65,
            ceiling: 0.95,
        }
    }
}

impl ConfidenceCalibration {
    pub fn confidence(&self, distance: f64) -> f64 {
        (1.0 - distance / self.scale).clamp(self.floor, self.ceiling)
    }
}

/// Weighted-distance classifier over an injected profile table.
#[derive(Debug, Clone)]
pub struct GeometricClassifier {
    profiles: Arc<ProfileTable>,
    weights: ClassifierWeights,
    calibration: ConfidenceCalibration,
}

impl Default for GeometricClassifier {
    fn default() -> Self {
        Self::new(
            Arc::new(ProfileTable::default()),
            ClassifierWeights::default(),
            ConfidenceCalibration::default(),
        )
    }
}

impl GeometricClassifier {
    pub fn new(
        profiles: Arc<ProfileTable>,
        weights: ClassifierWeights,
        calibration: ConfidenceCalibration,
    ) -> Self {
        Self {
            profiles,
            weights,
            calibration,
        }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Weighted L1 distance between measurements and one profile.
    pub fn distance(&self, m: &FaceMeasurements, p: &ShapeProfile) -> f64 {
        let w = &self.weights;
        w.lw * (m.ratio_lw - p.ideal_ratio_lw).abs()
            + w.fj * (m.ratio_fj - p.ideal_ratio_fj).abs()
            + w.cj * (m.ratio_cj - p.ideal_ratio_cj).abs()
            + w.angle * (m.jaw_angle - p.ideal_jaw_angle).abs()
    }

    /// Classify measurements against every profile.
    ///
    /// The minimum-distance profile wins. On an exact tie the profile
    /// declared first in the table wins.
    pub fn classify(&self, m: &FaceMeasurements) -> ClassificationResult {
        let mut best = self.profiles.first();
        let mut best_distance = self.distance(m, best);
        let mut scores = BTreeMap::new();

        for profile in self.profiles.iter() {
            let d = self.distance(m, profile);
            scores.insert(profile.shape, d);
            // Strict comparison: an equal later profile never displaces an earlier one.
            if d < best_distance {
                best = profile;
                best_distance = d;
            }
        }

        let confidence = self.calibration.confidence(best_distance);

        tracing::debug!(
            shape = %best.shape,
            distance = best_distance,
            confidence,
            "geometric classification"
        );

        ClassificationResult {
            method: Method::Geometric,
            shape: best.shape,
            confidence,
            measurements: Some(*m),
            scores: Some(scores),
        }
    }
}
