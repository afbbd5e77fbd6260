//! Recommendation ranking: face shape → ordered hairstyle suggestions.

use crate::catalog::{Catalog, Difficulty, HairstyleEntry};
use crate::explain::Explanations;
use crate::types::FaceShape;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_LIMIT: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

/// Largest limit an outside caller may request.
pub const MAX_REQUEST_LIMIT: usize = 20;

/// Normalize a caller-supplied limit. Anything outside 1..=20 falls back to
/// the default.
pub fn request_limit(requested: Option<i64>) -> NonZeroUsize {
    requested
        .filter(|n| (1..=MAX_REQUEST_LIMIT as i64).contains(n))
        .and_then(|n| NonZeroUsize::new(n as usize))
        .unwrap_or(DEFAULT_LIMIT)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Most popular first.
    #[default]
    Popularity,
    /// Easiest first, then most popular.
    Difficulty,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popularity" => Ok(SortBy::Popularity),
            "difficulty" => Ok(SortBy::Difficulty),
            _ => Err(format!("unknown sort key {s:?} (expected popularity or difficulty)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankOptions {
    pub limit: NonZeroUsize,
    pub sort_by: SortBy,
    pub min_popularity: Option<u32>,
    pub difficulty: Option<Difficulty>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            sort_by: SortBy::Popularity,
            min_popularity: None,
            difficulty: None,
        }
    }
}

impl RankOptions {
    pub fn with_limit(limit: NonZeroUsize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

fn by_popularity(a: &HairstyleEntry, b: &HairstyleEntry) -> Ordering {
    b.popularity.cmp(&a.popularity).then_with(|| a.id.cmp(&b.id))
}

/// Filter and order catalog entries for one shape.
///
/// Entries suitable for `shape` (and passing the optional filters) are sorted
/// and truncated to `opts.limit`. Ties always fall through to ascending id,
/// so the order is fully reproducible. No matches is an empty list.
pub fn rank<'a>(catalog: &'a Catalog, shape: FaceShape, opts: &RankOptions) -> Vec<&'a HairstyleEntry> {
    let mut matches: Vec<&HairstyleEntry> = catalog
        .entries()
        .iter()
        .filter(|h| h.suits(shape))
        .filter(|h| opts.min_popularity.map_or(true, |min| h.popularity >= min))
        .filter(|h| opts.difficulty.map_or(true, |d| h.difficulty == d))
        .collect();

    match opts.sort_by {
        SortBy::Popularity => matches.sort_by(|a, b| by_popularity(a, b)),
        SortBy::Difficulty => {
            matches.sort_by(|a, b| a.difficulty.cmp(&b.difficulty).then_with(|| by_popularity(a, b)))
        }
    }

    matches.truncate(opts.limit.get());
    matches
}

/// A ranked hairstyle with the reason it suits the shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub hairstyle: HairstyleEntry,
    pub reason: String,
}

/// Ranks the injected catalog and attaches explanations.
#[derive(Debug, Clone)]
pub struct Ranker {
    catalog: Arc<Catalog>,
    explanations: Arc<Explanations>,
}

impl Ranker {
    pub fn new(catalog: Arc<Catalog>, explanations: Arc<Explanations>) -> Self {
        Self {
            catalog,
            explanations,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn recommend(&self, shape: FaceShape, opts: &RankOptions) -> Vec<Recommendation> {
        let ranked = rank(&self.catalog, shape, opts);
        tracing::debug!(%shape, count = ranked.len(), limit = opts.limit.get(), "hairstyles ranked");

        ranked
            .into_iter()
            .map(|h| Recommendation {
                reason: self.explanations.reason(h, shape),
                hairstyle: h.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn entry(id: &str, shapes: &[FaceShape], popularity: u32, difficulty: Difficulty) -> HairstyleEntry {
        HairstyleEntry {
            id: id.into(),
            name: id.to_uppercase(),
            description: String::new(),
            reason_template: None,
            suitable_shapes: shapes.iter().copied().collect(),
            popularity,
            difficulty,
            tags: BTreeSet::new(),
            image_url: None,
        }
    }

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn ids(list: &[&HairstyleEntry]) -> Vec<String> {
        list.iter().map(|h| h.id.clone()).collect()
    }

    #[test]
    fn test_popularity_order_and_limit() {
        let catalog = Catalog::new(vec![
            entry("a", &[FaceShape::Oval], 10, Difficulty::Easy),
            entry("b", &[FaceShape::Oval], 30, Difficulty::Easy),
            entry("c", &[FaceShape::Oval], 20, Difficulty::Easy),
        ])
        .unwrap();
        let ranked = rank(&catalog, FaceShape::Oval, &RankOptions::with_limit(limit(2)));
        let pops: Vec<u32> = ranked.iter().map(|h| h.popularity).collect();
        assert_eq!(pops, vec![30, 20]);
    }

    #[test]
    fn test_filters_by_shape() {
        let catalog = Catalog::new(vec![
            entry("a", &[FaceShape::Oval], 10, Difficulty::Easy),
            entry("b", &[FaceShape::Round], 90, Difficulty::Easy),
            entry("c", &[FaceShape::Round, FaceShape::Oval], 50, Difficulty::Easy),
        ])
        .unwrap();
        let ranked = rank(&catalog, FaceShape::Oval, &RankOptions::default());
        assert_eq!(ids(&ranked), vec!["c", "a"]);
    }

    #[test]
    fn test_popularity_tie_breaks_by_id() {
        let catalog = Catalog::new(vec![
            entry("zeta", &[FaceShape::Heart], 50, Difficulty::Easy),
            entry("alpha", &[FaceShape::Heart], 50, Difficulty::Easy),
            entry("mid", &[FaceShape::Heart], 50, Difficulty::Easy),
        ])
        .unwrap();
        let ranked = rank(&catalog, FaceShape::Heart, &RankOptions::default());
        assert_eq!(ids(&ranked), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_fewer_matches_than_limit() {
        let catalog = Catalog::new(vec![entry("a", &[FaceShape::Square], 1, Difficulty::Easy)]).unwrap();
        let ranked = rank(&catalog, FaceShape::Square, &RankOptions::with_limit(limit(10)));
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let catalog = Catalog::new(vec![entry("a", &[FaceShape::Square], 1, Difficulty::Easy)]).unwrap();
        assert!(rank(&catalog, FaceShape::Diamond, &RankOptions::default()).is_empty());
    }

    #[test]
    fn test_sort_by_difficulty() {
        let catalog = Catalog::new(vec![
            entry("h", &[FaceShape::Oval], 99, Difficulty::Hard),
            entry("m", &[FaceShape::Oval], 50, Difficulty::Medium),
            entry("e1", &[FaceShape::Oval], 10, Difficulty::Easy),
            entry("e2", &[FaceShape::Oval], 40, Difficulty::Easy),
        ])
        .unwrap();
        let opts = RankOptions { sort_by: SortBy::Difficulty, ..RankOptions::default() };
        assert_eq!(ids(&rank(&catalog, FaceShape::Oval, &opts)), vec!["e2", "e1", "m", "h"]);
    }

    #[test]
    fn test_optional_filters() {
        let catalog = Catalog::new(vec![
            entry("a", &[FaceShape::Oval], 90, Difficulty::Hard),
            entry("b", &[FaceShape::Oval], 60, Difficulty::Easy),
            entry("c", &[FaceShape::Oval], 20, Difficulty::Easy),
        ])
        .unwrap();

        let popular = RankOptions { min_popularity: Some(50), ..RankOptions::default() };
        assert_eq!(ids(&rank(&catalog, FaceShape::Oval, &popular)), vec!["a", "b"]);

        let easy = RankOptions { difficulty: Some(Difficulty::Easy), ..RankOptions::default() };
        assert_eq!(ids(&rank(&catalog, FaceShape::Oval, &easy)), vec!["b", "c"]);
    }

    #[test]
    fn test_request_limit() {
        assert_eq!(request_limit(None), DEFAULT_LIMIT);
        assert_eq!(request_limit(Some(0)), DEFAULT_LIMIT);
        assert_eq!(request_limit(Some(21)), DEFAULT_LIMIT);
        assert_eq!(request_limit(Some(-3)), DEFAULT_LIMIT);
        assert_eq!(request_limit(Some(1)).get(), 1);
        assert_eq!(request_limit(Some(20)).get(), 20);
    }

    #[test]
    fn test_ranker_attaches_reasons() {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let explanations = Arc::new(Explanations::builtin().unwrap());
        let ranker = Ranker::new(catalog, explanations);

        let recs = ranker.recommend(FaceShape::Round, &RankOptions::default());
        assert!(!recs.is_empty() && recs.len() <= 5);
        for rec in &recs {
            assert!(rec.hairstyle.suits(FaceShape::Round));
            assert!(!rec.reason.is_empty());
        }
        // Descending popularity
        assert!(recs.windows(2).all(|w| w[0].hairstyle.popularity >= w[1].hairstyle.popularity));
    }

    #[test]
    fn test_recommendation_json_is_flat() {
        let rec = Recommendation {
            hairstyle: entry("a", &[FaceShape::Oval], 5, Difficulty::Medium),
            reason: "because".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["difficulty"], "medium");
        assert_eq!(json["reason"], "because");
    }
}
