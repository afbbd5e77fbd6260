//! Feature extraction: landmark set → face measurements.
//!
//! Distances are plain Euclidean norms over whatever coordinates the detector
//! supplied. The jaw angle is measured at the chin between the two jaw-corner
//! vectors.

use crate::landmarks::{LandmarkRoles, LandmarkSet, Point};
use crate::types::FaceMeasurements;
use thiserror::Error;

/// Distances at or below this are treated as collapsed geometry.
const DEGENERATE_EPSILON: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("landmark {id} ({role}) missing from landmark set; role map does not match detector topology")]
    MissingLandmark { role: &'static str, id: u32 },
    #[error("degenerate geometry: {0} is zero-length or not finite")]
    DegenerateGeometry(&'static str),
}

/// Resolved role points for one face.
struct RolePoints {
    forehead_top: Point,
    chin: Point,
    left_cheek: Point,
    right_cheek: Point,
    left_forehead: Point,
    right_forehead: Point,
    left_jaw: Point,
    right_jaw: Point,
}

impl RolePoints {
    fn resolve(landmarks: &LandmarkSet, roles: &LandmarkRoles) -> Result<Self, FeatureError> {
        let get = |role: &'static str, id: u32| {
            landmarks
                .get(id)
                .copied()
                .ok_or(FeatureError::MissingLandmark { role, id })
        };

        Ok(Self {
            forehead_top: get("forehead_top", roles.forehead_top)?,
            chin: get("chin", roles.chin)?,
            left_cheek: get("left_cheek", roles.left_cheek)?,
            right_cheek: get("right_cheek", roles.right_cheek)?,
            left_forehead: get("left_forehead", roles.left_forehead)?,
            right_forehead: get("right_forehead", roles.right_forehead)?,
            left_jaw: get("left_jaw", roles.left_jaw)?,
            right_jaw: get("right_jaw", roles.right_jaw)?,
        })
    }
}

/// Reject lengths that cannot be divided by or measured from.
fn measurable(name: &'static str, length: f64) -> Result<f64, FeatureError> {
    if length.is_finite() && length > DEGENERATE_EPSILON {
        Ok(length)
    } else {
        Err(FeatureError::DegenerateGeometry(name))
    }
}

/// Angle ABC in degrees, with B as the vertex.
///
/// The cosine is clamped to [-1, 1] before `acos`, so collinear inputs yield
/// exactly 0° or 180° instead of NaN from rounding error. Returns `None` when
/// either arm has zero length.
pub fn angle_at(a: &Point, b: &Point, c: &Point) -> Option<f64> {
    let ba = a.sub(b);
    let bc = c.sub(b);
    let norm_ba = ba.norm();
    let norm_bc = bc.norm();
    if !(norm_ba > DEGENERATE_EPSILON && norm_bc > DEGENERATE_EPSILON) {
        return None;
    }

    let cosine = (ba.dot(&bc) / (norm_ba * norm_bc)).clamp(-1.0, 1.0);
    Some(cosine.acos().to_degrees())
}

/// Compute face measurements from a landmark set.
///
/// Every length is validated, not only the denominators, so all three ratios
/// come out strictly positive.
pub fn extract(
    landmarks: &LandmarkSet,
    roles: &LandmarkRoles,
) -> Result<FaceMeasurements, FeatureError> {
    let p = RolePoints::resolve(landmarks, roles)?;

    let face_length = measurable("face length", p.forehead_top.distance(&p.chin))?;
    let face_width = measurable("face width", p.left_cheek.distance(&p.right_cheek))?;
    let forehead_width =
        measurable("forehead width", p.left_forehead.distance(&p.right_forehead))?;
    let jaw_width = measurable("jaw width", p.left_jaw.distance(&p.right_jaw))?;

    let jaw_angle = angle_at(&p.left_jaw, &p.chin, &p.right_jaw)
        .ok_or(FeatureError::DegenerateGeometry("jaw angle arm"))?;

    let measurements = FaceMeasurements {
        face_length,
        face_width,
        forehead_width,
        jaw_width,
        jaw_angle,
        ratio_lw: face_length / face_width,
        ratio_fj: forehead_width / jaw_width,
        ratio_cj: face_width / jaw_width,
    };

    tracing::debug!(
        ratio_lw = measurements.ratio_lw,
        ratio_fj = measurements.ratio_fj,
        ratio_cj = measurements.ratio_cj,
        jaw_angle = measurements.jaw_angle,
        "face measurements extracted"
    );

    Ok(measurements)
}
