//! Hybrid selection across independent classifiers.

use crate::types::{ClassificationResult, SelectionOutcome};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no classification available: every classifier failed or was absent")]
    NoClassificationAvailable,
}

/// Strategy for picking one result out of several classifiers' output.
pub trait Selector {
    /// `results` must be in completion order; the outcome preserves it.
    fn select(&self, results: Vec<ClassificationResult>) -> Result<SelectionOutcome, SelectionError>;
}

/// Highest confidence wins.
///
/// Exact ties go to the method with the better [`Method::priority`]
/// (geometric before model); a tie on that too goes to whichever result
/// completed first.
///
/// [`Method::priority`]: crate::types::Method::priority
pub struct ConfidenceSelector;

impl Selector for ConfidenceSelector {
    fn select(&self, results: Vec<ClassificationResult>) -> Result<SelectionOutcome, SelectionError> {
        let mut best_idx: Option<usize> = None;

        for (i, candidate) in results.iter().enumerate() {
            let better = match best_idx {
                None => true,
                Some(b) => {
                    let best = &results[b];
                    candidate.confidence > best.confidence
                        || (candidate.confidence == best.confidence
                            && candidate.method.priority() < best.method.priority())
                }
            };
            if better {
                best_idx = Some(i);
            }
        }

        let idx = best_idx.ok_or(SelectionError::NoClassificationAvailable)?;
        let chosen = results[idx].clone();

        tracing::info!(
            shape = %chosen.shape,
            confidence = chosen.confidence,
            method = %chosen.method,
            candidates = results.len(),
            "face shape selected"
        );

        Ok(SelectionOutcome {
            chosen,
            all_results: results,
        })
    }
}
