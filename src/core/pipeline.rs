use std::sync::Arc;

use crate::core::refiner::{sort_by_score, RankRefiner, RefineSource};
use crate::core::scoring::score_catalog;
use crate::models::{Candidate, MatchWeights, QueryAttributes, ScoredCandidate, SuggestQuery};
use crate::services::{CatalogStore, StoreError};

/// Upper bound on suggestions returned per request
pub const MAX_SUGGESTIONS: usize = 5;

/// Result of one suggestion pass
#[derive(Debug, Clone)]
pub struct Suggestions {
    pub tribes: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    pub source: RefineSource,
}

/// Suggestion orchestrator
///
/// # Pipeline Stages
/// 1. Heuristic scoring of every tribe
/// 2. Optional model re-ranking (pass-through when unavailable)
/// 3. Stable sort by score, descending
/// 4. Truncation to [`MAX_SUGGESTIONS`]
#[derive(Clone)]
pub struct SuggestionPipeline {
    catalog: Arc<dyn CatalogStore>,
    refiner: RankRefiner,
    weights: MatchWeights,
}

impl SuggestionPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        refiner: RankRefiner,
        weights: MatchWeights,
    ) -> Self {
        Self {
            catalog,
            refiner,
            weights,
        }
    }

    /// Fetch the catalog and rank it against the query
    pub async fn suggest(&self, query: &SuggestQuery) -> Result<Suggestions, StoreError> {
        let candidates = self.catalog.list_candidates().await?;
        Ok(self.rank(candidates, query).await)
    }

    /// Rank a given catalog; an empty catalog yields no suggestions
    pub async fn rank(&self, candidates: Vec<Candidate>, query: &SuggestQuery) -> Suggestions {
        let total_candidates = candidates.len();
        let attributes = QueryAttributes::from(query);

        let scored = score_catalog(candidates, &attributes, &self.weights);
        let refined = self.refiner.refine(scored, query).await;
        if refined.is_degraded() {
            tracing::debug!("Keeping heuristic order ({:?})", refined.source);
        }

        let mut tribes = refined.candidates;
        sort_by_score(&mut tribes);
        tribes.truncate(MAX_SUGGESTIONS);

        tracing::debug!(
            "Ranked {} tribes, returning {} ({:?})",
            total_candidates,
            tribes.len(),
            refined.source
        );

        Suggestions {
            tribes,
            total_candidates,
            source: refined.source,
        }
    }
}
