//! End-to-end analysis: landmarks + classifier output → shape + hairstyles.

use crate::catalog::{Catalog, CatalogError};
use crate::config::{CalibrationConfig, ConfigError};
use crate::explain::Explanations;
use crate::features::{self, FeatureError};
use crate::geometric::GeometricClassifier;
use crate::landmarks::{LandmarkRoles, LandmarkSet};
use crate::model::{ModelAdapter, ModelOutput};
use crate::ranker::{RankOptions, Ranker, Recommendation};
use crate::selector::{ConfidenceSelector, SelectionError, Selector};
use crate::types::{ClassificationResult, FaceMeasurements, FaceShape, Method, SelectionOutcome};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The photo's landmarks cannot be measured. Retrying the same input
    /// gives the same answer.
    #[error("cannot analyze this photo: {0}")]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("bad explanation TOML: {0}")]
    Explanations(#[from] toml::de::Error),
}

/// Result of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub face_shape: FaceShape,
    pub confidence: f64,
    pub method: Method,
    /// From the geometric result, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurements: Option<FaceMeasurements>,
    #[serde(flatten)]
    pub outcome: SelectionOutcome,
    pub recommendations: Vec<Recommendation>,
}

/// Stateless analysis engine. Cheap to clone; all tables are shared.
#[derive(Debug, Clone)]
pub struct Analyzer {
    roles: LandmarkRoles,
    geometric: GeometricClassifier,
    adapter: ModelAdapter,
    ranker: Ranker,
}

impl Analyzer {
    pub fn new(
        roles: LandmarkRoles,
        geometric: GeometricClassifier,
        adapter: ModelAdapter,
        ranker: Ranker,
    ) -> Self {
        Self {
            roles,
            geometric,
            adapter,
            ranker,
        }
    }

    /// Assemble from a calibration and the read-only tables.
    pub fn from_parts(
        calibration: &CalibrationConfig,
        catalog: Arc<Catalog>,
        explanations: Arc<Explanations>,
    ) -> Result<Self, SetupError> {
        Ok(Self::new(
            calibration.roles,
            calibration.classifier()?,
            ModelAdapter::default(),
            Ranker::new(catalog, explanations),
        ))
    }

    /// Default calibration, built-in catalog and explanations.
    pub fn builtin() -> Result<Self, SetupError> {
        Self::from_parts(
            &CalibrationConfig::default(),
            Arc::new(Catalog::builtin()?),
            Arc::new(Explanations::builtin()?),
        )
    }

    pub fn geometric(&self) -> &GeometricClassifier {
        &self.geometric
    }

    pub fn adapter(&self) -> &ModelAdapter {
        &self.adapter
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Feature extraction followed by geometric classification.
    pub fn classify_landmarks(
        &self,
        landmarks: &LandmarkSet,
    ) -> Result<ClassificationResult, FeatureError> {
        let measurements = features::extract(landmarks, &self.roles)?;
        Ok(self.geometric.classify(&measurements))
    }

    /// Adapt external classifier output; malformed output yields `None`.
    pub fn classify_model_output(&self, output: &ModelOutput) -> Option<ClassificationResult> {
        self.adapter.adapt(output)
    }

    /// Select among already-produced results (in completion order) and rank.
    pub fn conclude(
        &self,
        results: Vec<ClassificationResult>,
        opts: &RankOptions,
    ) -> Result<Analysis, AnalysisError> {
        let outcome = ConfidenceSelector.select(results)?;
        let measurements = outcome
            .all_results
            .iter()
            .find(|r| r.method == Method::Geometric)
            .and_then(|r| r.measurements);
        let chosen = &outcome.chosen;
        let recommendations = self.ranker.recommend(chosen.shape, opts);

        Ok(Analysis {
            face_shape: chosen.shape,
            confidence: chosen.confidence,
            method: chosen.method,
            measurements,
            recommendations,
            outcome,
        })
    }

    /// Run the whole pipeline synchronously.
    ///
    /// `landmarks` is `None` when the detector produced nothing; `model` is
    /// `None` when the image classifier failed or was not consulted. Landmark
    /// sets that are present but unmeasurable fail the request.
    pub fn analyze(
        &self,
        landmarks: Option<&LandmarkSet>,
        model: Option<&ModelOutput>,
        opts: &RankOptions,
    ) -> Result<Analysis, AnalysisError> {
        let mut results = Vec::with_capacity(2);
        if let Some(set) = landmarks {
            results.push(self.classify_landmarks(set)?);
        }
        if let Some(result) = model.and_then(|m| self.classify_model_output(m)) {
            results.push(result);
        }
        self.conclude(results, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::face;
    use crate::ranker::request_limit;

    fn model(probs: &[(&str, f64)]) -> ModelOutput {
        ModelOutput {
            shape_label: probs[0].0.to_string(),
            probabilities: probs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_geometric_only() {
        let analyzer = Analyzer::builtin().unwrap();
        // Oblong proportions: long face, jaw ~130°
        let landmarks = face(150.0, 100.0, 72.0, 96.0, 25.0);
        let analysis = analyzer.analyze(Some(&landmarks), None, &RankOptions::default()).unwrap();
        assert_eq!(analysis.method, Method::Geometric);
        assert_eq!(analysis.outcome.all_results.len(), 1);
        assert!(analysis.measurements.is_some());
        assert!((0.65..=0.95).contains(&analysis.confidence));
        for rec in &analysis.recommendations {
            assert!(rec.hairstyle.suits(analysis.face_shape));
        }
    }

    #[test]
    fn test_confident_model_overrides_geometric() {
        let analyzer = Analyzer::builtin().unwrap();
        let landmarks = face(150.0, 100.0, 72.0, 96.0, 25.0);
        let out = model(&[("heart", 0.97), ("oval", 0.03)]);
        let analysis = analyzer
            .analyze(Some(&landmarks), Some(&out), &RankOptions::default())
            .unwrap();
        assert_eq!(analysis.method, Method::Model);
        assert_eq!(analysis.face_shape, FaceShape::Heart);
        assert_eq!(analysis.outcome.all_results.len(), 2);
        assert_eq!(analysis.outcome.all_results[0].method, Method::Geometric);
        // Measurements still reported from the geometric run
        assert!(analysis.measurements.is_some());
    }

    #[test]
    fn test_malformed_model_output_is_ignored() {
        let analyzer = Analyzer::builtin().unwrap();
        let landmarks = face(150.0, 100.0, 72.0, 96.0, 25.0);
        let out = model(&[("heart", 0.97), ("oval", 0.5)]);
        let analysis = analyzer
            .analyze(Some(&landmarks), Some(&out), &RankOptions::default())
            .unwrap();
        assert_eq!(analysis.method, Method::Geometric);
        assert_eq!(analysis.outcome.all_results.len(), 1);
    }

    #[test]
    fn test_model_only() {
        let analyzer = Analyzer::builtin().unwrap();
        let out = model(&[("square", 0.55), ("round", 0.45)]);
        let analysis = analyzer.analyze(None, Some(&out), &RankOptions::default()).unwrap();
        assert_eq!(analysis.face_shape, FaceShape::Square);
        assert!(analysis.measurements.is_none());
    }

    #[test]
    fn test_nothing_available() {
        let analyzer = Analyzer::builtin().unwrap();
        let err = analyzer.analyze(None, None, &RankOptions::default()).unwrap_err();
        assert_eq!(err, AnalysisError::Selection(SelectionError::NoClassificationAvailable));
    }

    #[test]
    fn test_unmeasurable_landmarks_fail_request() {
        let analyzer = Analyzer::builtin().unwrap();
        let out = model(&[("oval", 1.0)]);
        let err = analyzer
            .analyze(Some(&LandmarkSet::new()), Some(&out), &RankOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Feature(FeatureError::MissingLandmark { .. })));
    }

    #[test]
    fn test_full_pipeline_is_deterministic() {
        let analyzer = Analyzer::builtin().unwrap();
        let landmarks = face(128.0, 100.0, 80.0, 95.0, 28.0);
        let out = model(&[("oval", 0.4), ("round", 0.35), ("heart", 0.25)]);
        let opts = RankOptions::with_limit(request_limit(Some(3)));

        let first = analyzer.analyze(Some(&landmarks), Some(&out), &opts).unwrap();
        for _ in 0..10 {
            let again = analyzer.analyze(Some(&landmarks), Some(&out), &opts).unwrap();
            assert_eq!(again, first);
        }
        assert!(first.recommendations.len() <= 3);
    }

    #[test]
    fn test_analysis_json_shape() {
        let analyzer = Analyzer::builtin().unwrap();
        let landmarks = face(125.0, 100.0, 78.0, 96.0, 30.0);
        let analysis = analyzer.analyze(Some(&landmarks), None, &RankOptions::default()).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        for key in ["face_shape", "confidence", "method", "measurements", "chosen", "all_results", "recommendations"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["method"], "geometric");
    }
}
