use crate::models::{Candidate, MatchWeights, QueryAttributes, ScoredCandidate};

/// Calculate a heuristic relevance score for a tribe against query attributes
///
/// Scoring formula (default weights):
/// score = (
///     2.0 * interests found in name or description +
///     1.5 * skills found in name or description +
///     1.0 * non-empty locations found in location
/// )
///
/// Matching is plain lowercase substring containment, with no stemming or
/// word boundaries, so results stay reproducible across runs.
pub fn heuristic_score(
    candidate: &Candidate,
    query: &QueryAttributes,
    weights: &MatchWeights,
) -> f64 {
    let name = candidate.name.to_lowercase();
    let description = candidate.description.to_lowercase();
    let location = candidate
        .location
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let mentions = |token: &str| name.contains(token) || description.contains(token);

    let interest_hits = query.interests.iter().filter(|i| mentions(i.as_str())).count();
    let skill_hits = query.skills.iter().filter(|s| mentions(s.as_str())).count();
    let location_hits = query
        .locations
        .iter()
        .filter(|l| !l.is_empty() && location.contains(l.as_str()))
        .count();

    interest_hits as f64 * weights.interest
        + skill_hits as f64 * weights.skill
        + location_hits as f64 * weights.location
}

/// Score every tribe in the catalog, preserving catalog order
pub fn score_catalog(
    candidates: Vec<Candidate>,
    query: &QueryAttributes,
    weights: &MatchWeights,
) -> Vec<ScoredCandidate> {
    candidates
        .into_iter()
        .map(|candidate| {
            let score = heuristic_score(&candidate, query, weights);
            ScoredCandidate {
                candidate,
                score,
                explanation: None,
            }
        })
        .collect()
}
