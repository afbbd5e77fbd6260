use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Categorical face-shape label.
///
/// Declaration order is significant: it is the tie-break order wherever two
/// shapes score identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceShape {
    Oval,
    Round,
    Square,
    Heart,
    Diamond,
    Oblong,
}

impl FaceShape {
    pub const ALL: [FaceShape; 6] = [
        FaceShape::Oval,
        FaceShape::Round,
        FaceShape::Square,
        FaceShape::Heart,
        FaceShape::Diamond,
        FaceShape::Oblong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaceShape::Oval => "oval",
            FaceShape::Round => "round",
            FaceShape::Square => "square",
            FaceShape::Heart => "heart",
            FaceShape::Diamond => "diamond",
            FaceShape::Oblong => "oblong",
        }
    }
}

impl fmt::Display for FaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown face shape: {0:?} (expected one of oval, round, square, heart, diamond, oblong)")]
pub struct ParseShapeError(pub String);

impl FromStr for FaceShape {
    type Err = ParseShapeError;

    /// Case-insensitive, so classifier labels like `"Heart"` parse too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FaceShape::ALL
            .into_iter()
            .find(|shape| shape.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseShapeError(s.to_string()))
    }
}

/// Geometric quantities derived from one landmark set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceMeasurements {
    pub face_length: f64,
    pub face_width: f64,
    pub forehead_width: f64,
    pub jaw_width: f64,
    /// Angle at the chin between the two jaw corners, in degrees.
    pub jaw_angle: f64,
    /// face_length / face_width
    pub ratio_lw: f64,
    /// forehead_width / jaw_width
    pub ratio_fj: f64,
    /// face_width / jaw_width
    pub ratio_cj: f64,
}

/// Which classifier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Geometric,
    Model,
}

impl Method {
    /// Tie-break rank for the selector: lower wins an exact confidence tie.
    pub fn priority(&self) -> u8 {
        match self {
            Method::Geometric => 0,
            Method::Model => 1,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Geometric => f.write_str("geometric"),
            Method::Model => f.write_str("model"),
        }
    }
}

/// One classifier's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub method: Method,
    pub shape: FaceShape,
    /// Certainty in [0, 1].
    pub confidence: f64,
    /// Measurements the geometric classifier worked from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<FaceMeasurements>,
    /// Per-shape scores: profile distances (geometric) or class probabilities (model).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<FaceShape, f64>>,
}

/// The selector's decision plus every result it considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub chosen: ClassificationResult,
    /// Every produced result, in the order the classifiers completed.
    pub all_results: Vec<ClassificationResult>,
}
