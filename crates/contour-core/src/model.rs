//! Adapter for the external image classifier's output.
//!
//! The classifier reports a label and a per-class probability vector. The
//! adapter takes the arg-max class and its probability as-is. Anything it
//! cannot trust (failed call, malformed vector) becomes *no result*, never an
//! error: the selector carries on with whatever else is available.

use crate::types::{ClassificationResult, FaceShape, Method};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Classes the bundled image model was trained on.
pub const MODEL_CLASSES: [FaceShape; 5] = [
    FaceShape::Heart,
    FaceShape::Oblong,
    FaceShape::Oval,
    FaceShape::Round,
    FaceShape::Square,
];

const DEFAULT_SUM_TOLERANCE: f64 = 0.05;

/// Raw classifier output as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub shape_label: String,
    pub probabilities: BTreeMap<String, f64>,
}

/// Why an output was discarded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("probability vector is empty")]
    Empty,
    #[error("label {0:?} is not a known class")]
    UnknownLabel(String),
    #[error("label {0:?} appears more than once")]
    DuplicateLabel(String),
    #[error("probability for {label:?} is {value}, outside [0, 1]")]
    OutOfRange { label: String, value: f64 },
    #[error("probabilities sum to {0}, not 1")]
    BadSum(f64),
}

/// Turns classifier output into a `ClassificationResult`, or nothing.
#[derive(Debug, Clone)]
pub struct ModelAdapter {
    known: BTreeSet<FaceShape>,
    sum_tolerance: f64,
}

impl Default for ModelAdapter {
    fn default() -> Self {
        Self::new(MODEL_CLASSES, DEFAULT_SUM_TOLERANCE)
    }
}

impl ModelAdapter {
    pub fn new(known: impl IntoIterator<Item = FaceShape>, sum_tolerance: f64) -> Self {
        Self {
            known: known.into_iter().collect(),
            sum_tolerance,
        }
    }

    /// Parse and validate the probability vector.
    pub fn validate(&self, output: &ModelOutput) -> Result<BTreeMap<FaceShape, f64>, Rejection> {
        if output.probabilities.is_empty() {
            return Err(Rejection::Empty);
        }

        let mut parsed = BTreeMap::new();
        for (label, &value) in &output.probabilities {
            let shape: FaceShape = label
                .parse()
                .map_err(|_| Rejection::UnknownLabel(label.clone()))?;
            if !self.known.contains(&shape) {
                return Err(Rejection::UnknownLabel(label.clone()));
            }
            if !(0.0..=1.0).contains(&value) {
                // Also catches NaN
                return Err(Rejection::OutOfRange { label: label.clone(), value });
            }
            // "Oval" and "oval" are distinct map keys but the same class
            if parsed.insert(shape, value).is_some() {
                return Err(Rejection::DuplicateLabel(label.clone()));
            }
        }

        let sum: f64 = parsed.values().sum();
        if (sum - 1.0).abs() > self.sum_tolerance {
            return Err(Rejection::BadSum(sum));
        }

        Ok(parsed)
    }

    /// Adapt a successful classifier response.
    pub fn adapt(&self, output: &ModelOutput) -> Option<ClassificationResult> {
        let probabilities = match self.validate(output) {
            Ok(p) => p,
            Err(reason) => {
                tracing::warn!(%reason, "discarding malformed classifier output");
                return None;
            }
        };

        // Scan in declaration order; strict comparison keeps the first on ties.
        let mut best: Option<(FaceShape, f64)> = None;
        for shape in FaceShape::ALL {
            if let Some(&p) = probabilities.get(&shape) {
                if best.map_or(true, |(_, bp)| p > bp) {
                    best = Some((shape, p));
                }
            }
        }
        let (shape, confidence) = best?;

        if !shape.as_str().eq_ignore_ascii_case(output.shape_label.trim()) {
            tracing::debug!(
                reported = %output.shape_label,
                argmax = %shape,
                "classifier label disagrees with its own probabilities; using arg-max"
            );
        }

        Some(ClassificationResult {
            method: Method::Model,
            shape,
            confidence,
            measurements: None,
            scores: Some(probabilities),
        })
    }

    /// Adapt the outcome of a classifier call. A failed call yields no result.
    pub fn adapt_call<E: fmt::Display>(
        &self,
        call: Result<ModelOutput, E>,
    ) -> Option<ClassificationResult> {
        match call {
            Ok(output) => self.adapt(&output),
            Err(e) => {
                tracing::warn!(error = %e, "image classifier unavailable; continuing without it");
                None
            }
        }
    }
}
