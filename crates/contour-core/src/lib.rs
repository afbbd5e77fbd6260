//! contour-core — Face-shape classification and hairstyle recommendation.
//!
//! Landmark geometry and an optional image classifier each propose a face
//! shape; a deterministic selector picks one, and the ranker turns it into
//! an ordered list of suitable hairstyles.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod explain;
pub mod features;
pub mod geometric;
pub mod landmarks;
pub mod model;
pub mod pipeline;
pub mod profiles;
pub mod ranker;
pub mod selector;
pub mod types;

pub use catalog::{Catalog, Difficulty, HairstyleEntry};
pub use classifier::{ClassifierError, OnnxShapeClassifier, ShapeClassifier};
pub use config::CalibrationConfig;
pub use explain::Explanations;
pub use features::FeatureError;
pub use geometric::GeometricClassifier;
pub use landmarks::{LandmarkRoles, LandmarkSet, Point};
pub use model::{ModelAdapter, ModelOutput};
pub use pipeline::{Analysis, AnalysisError, Analyzer, SetupError};
pub use profiles::{ProfileTable, ShapeProfile};
pub use ranker::{RankOptions, Ranker, Recommendation, SortBy};
pub use selector::{ConfidenceSelector, SelectionError, Selector};
pub use types::{ClassificationResult, FaceMeasurements, FaceShape, Method, SelectionOutcome};

/// Default directory for the image classifier model.
pub fn default_model_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("/usr/share/contour/models")
}
