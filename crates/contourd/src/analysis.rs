use crate::engine::{EngineError, EngineHandle};
use contour_core::{
    Analysis, AnalysisError, Analyzer, ClassificationResult, FeatureError, LandmarkSet,
    RankOptions,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;

type ClassifierTask = Result<Option<ClassificationResult>, FeatureError>;

/// Runs the geometric and image classifiers concurrently for one request.
///
/// Results are collected in completion order. A model call that errors or
/// exceeds `model_timeout` counts as absent; unmeasurable landmarks fail
/// the request without waiting for the model.
#[derive(Clone)]
pub struct HybridAnalyzer {
    analyzer: Analyzer,
    engine: Option<EngineHandle>,
    model_timeout: Duration,
}

impl HybridAnalyzer {
    pub fn new(analyzer: Analyzer, engine: Option<EngineHandle>, model_timeout: Duration) -> Self {
        Self {
            analyzer,
            engine,
            model_timeout,
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn model_loaded(&self) -> bool {
        self.engine.is_some()
    }

    pub async fn analyze(
        &self,
        landmarks: Option<LandmarkSet>,
        image_path: Option<PathBuf>,
        opts: &RankOptions,
    ) -> Result<Analysis, AnalysisError> {
        let mut tasks: JoinSet<ClassifierTask> = JoinSet::new();

        if let Some(set) = landmarks {
            let analyzer = self.analyzer.clone();
            tasks.spawn_blocking(move || analyzer.classify_landmarks(&set).map(Some));
        }

        match (self.engine.clone(), image_path) {
            (Some(engine), Some(path)) => {
                let adapter = self.analyzer.adapter().clone();
                let limit = self.model_timeout;
                tasks.spawn(async move {
                    let call = match tokio::time::timeout(limit, engine.classify(path)).await {
                        Ok(call) => call,
                        Err(_) => Err(EngineError::Timeout(limit)),
                    };
                    Ok(adapter.adapt_call(call))
                });
            }
            (None, Some(path)) => {
                tracing::debug!(path = %path.display(), "no image classifier loaded; ignoring image");
            }
            _ => {}
        }

        let mut results = Vec::with_capacity(2);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some(result))) => results.push(result),
                Ok(Ok(None)) => {}
                // Remaining tasks are aborted when `tasks` drops
                Ok(Err(e)) => return Err(e.into()),
                Err(e) => tracing::warn!(error = %e, "classifier task did not complete"),
            }
        }

        self.analyzer.conclude(results, opts)
    }
}
