//! Landmark sets and the semantic role map used to measure them.
//!
//! The detector emits points keyed by stable integer IDs. Which IDs carry
//! which anatomical meaning is fixed configuration (`LandmarkRoles`) and must
//! match the detector's topology.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A 2-D or 3-D keypoint. 2-D detectors leave `z` at 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance between two points.
    pub fn distance(&self, other: &Point) -> f64 {
        self.sub(other).norm()
    }
}

/// A single identified landmark, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// Wire layouts accepted for a landmark set.
///
/// `Dense` is the detector's native layout: the array index is the ID and
/// each row is `[x, y]` or `[x, y, z]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRepr {
    Dense(Vec<Vec<f64>>),
    Keyed(Vec<Landmark>),
}

/// Landmark points produced by the external detector, ordered by ID.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "LandmarkRepr", into = "Vec<Landmark>")]
pub struct LandmarkSet {
    points: BTreeMap<u32, Point>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a dense point list where the index is the ID.
    pub fn from_dense(points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            points: points
                .into_iter()
                .enumerate()
                .map(|(i, p)| (i as u32, p))
                .collect(),
        }
    }

    /// Insert or replace the point for `id`.
    pub fn insert(&mut self, id: u32, point: Point) {
        self.points.insert(id, point);
    }

    pub fn get(&self, id: u32) -> Option<&Point> {
        self.points.get(&id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Point)> {
        self.points.iter().map(|(id, p)| (*id, p))
    }
}

impl FromIterator<Landmark> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = Landmark>>(iter: I) -> Self {
        Self {
            points: iter
                .into_iter()
                .map(|l| (l.id, Point::new(l.x, l.y, l.z)))
                .collect(),
        }
    }
}

impl TryFrom<LandmarkRepr> for LandmarkSet {
    type Error = String;

    fn try_from(repr: LandmarkRepr) -> Result<Self, Self::Error> {
        match repr {
            LandmarkRepr::Keyed(landmarks) => Ok(landmarks.into_iter().collect()),
            LandmarkRepr::Dense(rows) => {
                let mut points = Vec::with_capacity(rows.len());
                for (i, row) in rows.iter().enumerate() {
                    let point = match row.as_slice() {
                        [x, y] => Point::new(*x, *y, 0.0),
                        [x, y, z] => Point::new(*x, *y, *z),
                        _ => {
                            return Err(format!(
                                "landmark {i}: expected [x, y] or [x, y, z], got {} values",
                                row.len()
                            ))
                        }
                    };
                    points.push(point);
                }
                Ok(Self::from_dense(points))
            }
        }
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(set: LandmarkSet) -> Self {
        set.points
            .into_iter()
            .map(|(id, p)| Landmark { id, x: p.x, y: p.y, z: p.z })
            .collect()
    }
}

/// Mapping from the anatomical roles the extractor measures to landmark IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkRoles {
    pub forehead_top: u32,
    pub chin: u32,
    pub left_cheek: u32,
    pub right_cheek: u32,
    pub left_forehead: u32,
    pub right_forehead: u32,
    pub left_jaw: u32,
    pub right_jaw: u32,
}

/// Role IDs for the 468-point face-mesh topology.
pub const FACE_MESH_ROLES: LandmarkRoles = LandmarkRoles {
    forehead_top: 10,
    chin: 152,
    left_cheek: 234,
    right_cheek: 454,
    left_forehead: 103,
    right_forehead: 332,
    left_jaw: 132,
    right_jaw: 361,
};

impl Default for LandmarkRoles {
    fn default() -> Self {
        FACE_MESH_ROLES
    }
}

impl LandmarkRoles {
    /// Every (role name, ID) pair, in a fixed order.
    pub fn entries(&self) -> [(&'static str, u32); 8] {
        [
            ("forehead_top", self.forehead_top),
            ("chin", self.chin),
            ("left_cheek", self.left_cheek),
            ("right_cheek", self.right_cheek),
            ("left_forehead", self.left_forehead),
            ("right_forehead", self.right_forehead),
            ("left_jaw", self.left_jaw),
            ("right_jaw", self.right_jaw),
        ]
    }
}
