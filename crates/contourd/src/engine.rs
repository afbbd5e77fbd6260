use contour_core::{ClassifierError, ModelOutput, ShapeClassifier};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
    #[error("classifier did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Messages sent from request handlers to the engine thread.
enum EngineRequest {
    Classify {
        image_path: PathBuf,
        reply: oneshot::Sender<Result<ModelOutput, ClassifierError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Run the image classifier on one photo.
    pub async fn classify(&self, image_path: PathBuf) -> Result<ModelOutput, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Classify {
                image_path,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        Ok(reply_rx.await.map_err(|_| EngineError::ChannelClosed)??)
    }
}

/// Spawn the image classifier on a dedicated OS thread.
///
/// Inference needs `&mut` access to the session, so a single thread owns
/// the classifier and serves requests in arrival order.
pub fn spawn_engine<C>(mut classifier: C) -> Result<EngineHandle, EngineError>
where
    C: ShapeClassifier + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("contour-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Classify { image_path, reply } => {
                        let result = classifier.predict(&image_path);
                        if let Err(e) = &result {
                            tracing::debug!(path = %image_path.display(), error = %e, "classify failed");
                        }
                        // Caller may have timed out and dropped the receiver
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}
