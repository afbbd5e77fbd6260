//! Image face-shape classifier via ONNX Runtime.
//!
//! Runs a CNN exported from the training pipeline on a whole photo and
//! reports a per-class probability vector. The model expects RGB input
//! resized to `img_size`, scaled to [0, 1], in NHWC layout.

use crate::model::ModelOutput;
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MODEL_FILE: &str = "face_shape_model.onnx";
pub const METADATA_FILE: &str = "model_metadata.json";

const DEFAULT_IMG_SIZE: (u32, u32) = (128, 128);
const PIXEL_SCALE: f32 = 255.0;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model file not found: {0}; export the trained classifier to ONNX and place it in the model directory")]
    ModelNotFound(String),
    #[error("bad model metadata {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Anything that can predict a face shape from a photo.
///
/// Implementations may be slow or fail; callers treat any error as an
/// absent result.
pub trait ShapeClassifier: Send {
    fn predict(&mut self, image_path: &Path) -> Result<ModelOutput, ClassifierError>;
}

/// Sidecar metadata written next to the model at export time.
#[derive(Debug, Clone, Deserialize)]
struct ModelMetadata {
    /// Class name → output index.
    class_indices: BTreeMap<String, usize>,
    #[serde(default = "default_img_size")]
    img_size: (u32, u32),
}

fn default_img_size() -> (u32, u32) {
    DEFAULT_IMG_SIZE
}

impl Default for ModelMetadata {
    fn default() -> Self {
        let class_indices = [("heart", 0), ("oblong", 1), ("oval", 2), ("round", 3), ("square", 4)]
            .into_iter()
            .map(|(name, idx)| (name.to_string(), idx))
            .collect();
        Self {
            class_indices,
            img_size: DEFAULT_IMG_SIZE,
        }
    }
}

impl ModelMetadata {
    fn load(path: &Path) -> Result<Self, ClassifierError> {
        let bad = |reason: String| ClassifierError::Metadata {
            path: path.to_path_buf(),
            reason,
        };
        let src = std::fs::read_to_string(path).map_err(|e| bad(e.to_string()))?;
        let meta: Self = serde_json::from_str(&src).map_err(|e| bad(e.to_string()))?;
        if meta.class_indices.is_empty() {
            return Err(bad("class_indices is empty".into()));
        }
        if meta.img_size.0 == 0 || meta.img_size.1 == 0 {
            return Err(bad(format!("img_size {:?} has a zero side", meta.img_size)));
        }
        Ok(meta)
    }

    /// Output index → lowercase class label.
    fn labels(&self) -> BTreeMap<usize, String> {
        self.class_indices
            .iter()
            .map(|(name, &idx)| (idx, name.to_lowercase()))
            .collect()
    }
}

/// CNN face-shape classifier.
pub struct OnnxShapeClassifier {
    session: Session,
    labels: BTreeMap<usize, String>,
    img_size: (u32, u32),
}

impl OnnxShapeClassifier {
    /// Load `face_shape_model.onnx` and its metadata from `model_dir`.
    ///
    /// Missing metadata falls back to the five-class training layout.
    pub fn load(model_dir: &Path) -> Result<Self, ClassifierError> {
        let model_path = model_dir.join(MODEL_FILE);
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(
                model_path.to_string_lossy().into_owned(),
            ));
        }

        let metadata_path = model_dir.join(METADATA_FILE);
        let metadata = if metadata_path.exists() {
            ModelMetadata::load(&metadata_path)?
        } else {
            tracing::warn!(
                path = %metadata_path.display(),
                "model metadata missing; assuming default class layout"
            );
            ModelMetadata::default()
        };

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(&model_path)?;

        let labels = metadata.labels();
        tracing::info!(
            path = %model_path.display(),
            classes = ?labels.values().collect::<Vec<_>>(),
            img_size = ?metadata.img_size,
            "loaded face-shape classifier"
        );

        Ok(Self {
            session,
            labels,
            img_size: metadata.img_size,
        })
    }

    /// Resize an RGB image into a 1×H×W×3 tensor scaled to [0, 1].
    fn preprocess(image: &RgbImage, img_size: (u32, u32)) -> Array4<f32> {
        let (w, h) = img_size;
        let resized = image::imageops::resize(image, w, h, FilterType::Triangle);

        let mut tensor = Array4::<f32>::zeros((1, h as usize, w as usize, 3));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32 / PIXEL_SCALE;
            }
        }
        tensor
    }

    /// Pair raw scores with labels and name the arg-max.
    fn to_output(labels: &BTreeMap<usize, String>, scores: &[f32]) -> Result<ModelOutput, ClassifierError> {
        if scores.len() != labels.len() {
            return Err(ClassifierError::InferenceFailed(format!(
                "expected {} class scores, got {}",
                labels.len(),
                scores.len()
            )));
        }

        let mut probabilities = BTreeMap::new();
        let mut best: Option<(&str, f32)> = None;
        for (idx, label) in labels {
            let p = scores.get(*idx).copied().ok_or_else(|| {
                ClassifierError::InferenceFailed(format!("class index {idx} out of range"))
            })?;
            probabilities.insert(label.clone(), f64::from(p));
            if best.map_or(true, |(_, bp)| p > bp) {
                best = Some((label.as_str(), p));
            }
        }

        let shape_label = best.map(|(l, _)| l.to_string()).unwrap_or_default();
        Ok(ModelOutput {
            shape_label,
            probabilities,
        })
    }
}

impl ShapeClassifier for OnnxShapeClassifier {
    fn predict(&mut self, image_path: &Path) -> Result<ModelOutput, ClassifierError> {
        let image = image::open(image_path)?.to_rgb8();
        let input = Self::preprocess(&image, self.img_size);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceFailed(format!("class scores: {e}")))?;

        let output = Self::to_output(&self.labels, scores)?;
        tracing::debug!(label = %output.shape_label, "image classifier prediction");
        Ok(output)
    }
}
