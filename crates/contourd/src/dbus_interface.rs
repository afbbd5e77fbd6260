use crate::analysis::HybridAnalyzer;
use contour_core::ranker::request_limit;
use contour_core::{AnalysisError, FaceShape, LandmarkSet, RankOptions};
use std::path::PathBuf;
use zbus::fdo;
use zbus::interface;

/// D-Bus interface for the Contour analysis daemon.
///
/// Bus name: org.contour.Contour1
/// Object path: /org/contour/Contour1
pub struct ContourService {
    hybrid: HybridAnalyzer,
    default_limit: usize,
}

impl ContourService {
    pub fn new(hybrid: HybridAnalyzer, default_limit: usize) -> Self {
        Self {
            hybrid,
            default_limit,
        }
    }

    fn rank_options(&self, limit: u32) -> RankOptions {
        let requested = if limit == 0 {
            self.default_limit as i64
        } else {
            i64::from(limit)
        };
        RankOptions::with_limit(request_limit(Some(requested)))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> fdo::Result<String> {
    serde_json::to_string(value).map_err(|e| fdo::Error::Failed(format!("serialize: {e}")))
}

fn map_analysis_error(e: AnalysisError) -> fdo::Error {
    match e {
        AnalysisError::Feature(_) => fdo::Error::InvalidArgs(e.to_string()),
        AnalysisError::Selection(_) => fdo::Error::Failed(e.to_string()),
    }
}

#[interface(name = "org.contour.Contour1")]
impl ContourService {
    /// Classify a face and recommend hairstyles.
    ///
    /// `landmarks_json` and `image_path` may be empty to mean absent; a
    /// `limit` of 0 uses the daemon default.
    async fn analyze(
        &self,
        landmarks_json: &str,
        image_path: &str,
        limit: u32,
    ) -> fdo::Result<String> {
        tracing::info!(
            has_landmarks = !landmarks_json.is_empty(),
            has_image = !image_path.is_empty(),
            limit,
            "analyze requested"
        );

        let landmarks = if landmarks_json.trim().is_empty() {
            None
        } else {
            let set: LandmarkSet = serde_json::from_str(landmarks_json)
                .map_err(|e| fdo::Error::InvalidArgs(format!("landmarks: {e}")))?;
            Some(set)
        };
        let image = (!image_path.is_empty()).then(|| PathBuf::from(image_path));

        let analysis = self
            .hybrid
            .analyze(landmarks, image, &self.rank_options(limit))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "analysis failed");
                map_analysis_error(e)
            })?;

        tracing::info!(
            shape = %analysis.face_shape,
            method = %analysis.method,
            confidence = analysis.confidence,
            "analysis complete"
        );
        to_json(&analysis)
    }

    /// Recommend hairstyles for an already-known face shape.
    async fn recommend(&self, face_shape: &str, limit: u32) -> fdo::Result<String> {
        let shape = face_shape
            .parse::<FaceShape>()
            .map_err(|e| fdo::Error::InvalidArgs(e.to_string()))?;
        let recommendations = self
            .hybrid
            .analyzer()
            .ranker()
            .recommend(shape, &self.rank_options(limit));

        to_json(&serde_json::json!({
            "face_shape": shape,
            "count": recommendations.len(),
            "recommendations": recommendations,
        }))
    }

    /// Ideal proportions the geometric classifier compares against.
    async fn profiles(&self) -> fdo::Result<String> {
        to_json(self.hybrid.analyzer().geometric().profiles())
    }

    /// Return daemon status information.
    async fn status(&self) -> fdo::Result<String> {
        let catalog = self.hybrid.analyzer().ranker().catalog();
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "hairstyles": catalog.len(),
            "face_shapes": catalog.face_shapes(),
            "model_loaded": self.hybrid.model_loaded(),
            "default_limit": self.default_limit,
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_core::{Analyzer, FeatureError, SelectionError};
    use std::time::Duration;

    fn service(default_limit: usize) -> ContourService {
        let hybrid = HybridAnalyzer::new(Analyzer::builtin().unwrap(), None, Duration::from_secs(1));
        ContourService::new(hybrid, default_limit)
    }

    #[test]
    fn test_zero_limit_uses_default() {
        assert_eq!(service(3).rank_options(0).limit.get(), 3);
        assert_eq!(service(3).rank_options(7).limit.get(), 7);
    }

    #[test]
    fn test_out_of_range_limit_falls_back() {
        assert_eq!(service(5).rank_options(500).limit.get(), 5);
        // A bad configured default falls back too
        assert_eq!(service(0).rank_options(0).limit.get(), 5);
    }

    #[test]
    fn test_error_mapping() {
        let bad_input = map_analysis_error(AnalysisError::Feature(FeatureError::DegenerateGeometry("face length")));
        assert!(matches!(bad_input, fdo::Error::InvalidArgs(_)));

        let nothing = map_analysis_error(AnalysisError::Selection(SelectionError::NoClassificationAvailable));
        assert!(matches!(nothing, fdo::Error::Failed(_)));
    }

    #[tokio::test]
    async fn test_recommend_rejects_unknown_shape() {
        let err = service(5).recommend("triangle", 0).await.unwrap_err();
        assert!(matches!(err, fdo::Error::InvalidArgs(_)));
    }

    #[tokio::test]
    async fn test_recommend_payload() {
        let json = service(5).recommend("Oval", 2).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["face_shape"], "oval");
        assert_eq!(value["count"], 2);
        assert_eq!(value["recommendations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_landmark_json() {
        let err = service(5).analyze("{not json", "", 0).await.unwrap_err();
        assert!(matches!(err, fdo::Error::InvalidArgs(_)));
    }

    #[tokio::test]
    async fn test_analyze_without_inputs_fails() {
        let err = service(5).analyze("", "", 0).await.unwrap_err();
        assert!(matches!(err, fdo::Error::Failed(_)));
    }

    #[tokio::test]
    async fn test_status_reports_catalog() {
        let json = service(5).status().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["model_loaded"], false);
        assert!(value["hairstyles"].as_u64().unwrap() > 0);
    }
}
