//! Reference profiles: the ideal measurements for each face shape.

use crate::types::FaceShape;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("profile table is empty")]
    Empty,
    #[error("profile for {0} declared more than once")]
    Duplicate(FaceShape),
    #[error("profile for {0} has a non-finite value")]
    NonFinite(FaceShape),
}

/// Ideal ratios and jaw angle for one shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeProfile {
    pub shape: FaceShape,
    pub ideal_ratio_lw: f64,
    pub ideal_ratio_fj: f64,
    pub ideal_ratio_cj: f64,
    /// Degrees.
    pub ideal_jaw_angle: f64,
}

const fn profile(shape: FaceShape, lw: f64, fj: f64, cj: f64, angle: f64) -> ShapeProfile {
    ShapeProfile {
        shape,
        ideal_ratio_lw: lw,
        ideal_ratio_fj: fj,
        ideal_ratio_cj: cj,
        ideal_jaw_angle: angle,
    }
}

/// Calibrated defaults. Declaration order is the distance tie-break order.
pub const DEFAULT_PROFILES: [ShapeProfile; 6] = [
    profile(FaceShape::Oval, 1.25, 0.78, 1.04, 130.0),
    profile(FaceShape::Round, 1.10, 0.80, 1.05, 145.0),
    profile(FaceShape::Square, 1.15, 0.78, 1.03, 95.0),
    profile(FaceShape::Heart, 1.20, 0.90, 1.08, 125.0),
    profile(FaceShape::Diamond, 1.35, 0.72, 1.02, 130.0),
    profile(FaceShape::Oblong, 1.50, 0.75, 1.04, 130.0),
];

/// Validated, ordered, non-empty set of shape profiles.
///
/// Built once at startup and shared read-only; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProfileTable {
    profiles: Vec<ShapeProfile>,
}

impl ProfileTable {
    pub fn new(profiles: Vec<ShapeProfile>) -> Result<Self, ProfileError> {
        if profiles.is_empty() {
            return Err(ProfileError::Empty);
        }
        for (i, p) in profiles.iter().enumerate() {
            let values = [p.ideal_ratio_lw, p.ideal_ratio_fj, p.ideal_ratio_cj, p.ideal_jaw_angle];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ProfileError::NonFinite(p.shape));
            }
            if profiles[..i].iter().any(|q| q.shape == p.shape) {
                return Err(ProfileError::Duplicate(p.shape));
            }
        }
        Ok(Self { profiles })
    }

    /// First profile in declaration order. Always present.
    pub fn first(&self) -> &ShapeProfile {
        &self.profiles[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeProfile> {
        self.profiles.iter()
    }

    pub fn get(&self, shape: FaceShape) -> Option<&ShapeProfile> {
        self.profiles.iter().find(|p| p.shape == shape)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            profiles: DEFAULT_PROFILES.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_valid() {
        let table = ProfileTable::new(DEFAULT_PROFILES.to_vec()).unwrap();
        assert_eq!(table, ProfileTable::default());
        assert_eq!(table.len(), 6);
        assert_eq!(table.first().shape, FaceShape::Oval);
    }

    #[test]
    fn test_default_table_covers_every_shape() {
        let table = ProfileTable::default();
        for shape in FaceShape::ALL {
            assert!(table.get(shape).is_some(), "{shape} missing");
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(ProfileTable::new(vec![]), Err(ProfileError::Empty));
    }

    #[test]
    fn test_rejects_duplicate_shape() {
        let dup = vec![DEFAULT_PROFILES[0], DEFAULT_PROFILES[1], DEFAULT_PROFILES[0]];
        assert_eq!(ProfileTable::new(dup), Err(ProfileError::Duplicate(FaceShape::Oval)));
    }

    #[test]
    fn test_rejects_nan() {
        let mut bad = DEFAULT_PROFILES[3];
        bad.ideal_jaw_angle = f64::NAN;
        assert_eq!(ProfileTable::new(vec![bad]), Err(ProfileError::NonFinite(FaceShape::Heart)));
    }
}
