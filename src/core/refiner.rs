use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ScoredCandidate, SuggestQuery, Turn};
use crate::services::{ResponseFormat, ServiceError, TextGenerationClient};

const RANKING_SYSTEM_PROMPT: &str = "You are helping match a user to tribes. \
Rank tribes by fit using interests, skills, and location. \
Return a JSON list of objects: {id, score (0-10), explanation}. Keep explanations short.";

/// One scored entry returned by the ranking service
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub id: i64,
    /// `None` when the service omitted a score; the heuristic score is kept
    pub score: Option<f64>,
    pub explanation: Option<String>,
}

/// Result of one ranking round trip, classified at the boundary
#[derive(Debug)]
pub enum RankingOutcome {
    Success(Vec<RankedEntry>),
    Malformed(String),
    ServiceError(ServiceError),
}

/// Where the scores of a refined list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineSource {
    Model,
    NotConfigured,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Refined {
    pub candidates: Vec<ScoredCandidate>,
    pub source: RefineSource,
}

impl Refined {
    pub fn is_degraded(&self) -> bool {
        self.source != RefineSource::Model
    }
}

/// Optional model-backed re-ranking on top of heuristic scores
///
/// Never fails: without a client, or on any service or parse problem, the
/// input list comes back untouched.
#[derive(Clone)]
pub struct RankRefiner {
    client: Option<Arc<dyn TextGenerationClient>>,
}

impl RankRefiner {
    pub fn new(client: Option<Arc<dyn TextGenerationClient>>) -> Self {
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub async fn refine(&self, scored: Vec<ScoredCandidate>, query: &SuggestQuery) -> Refined {
        let Some(client) = &self.client else {
            return Refined {
                candidates: scored,
                source: RefineSource::NotConfigured,
            };
        };

        match request_ranking(client.as_ref(), &scored, query).await {
            RankingOutcome::Success(entries) => {
                tracing::debug!(
                    "Ranking service scored {} of {} tribes",
                    entries.len(),
                    scored.len()
                );
                Refined {
                    candidates: apply_ranking(&scored, &entries),
                    source: RefineSource::Model,
                }
            }
            RankingOutcome::Malformed(reason) => {
                tracing::warn!("Ranking response malformed, keeping heuristic order: {}", reason);
                Refined {
                    candidates: scored,
                    source: RefineSource::Fallback,
                }
            }
            RankingOutcome::ServiceError(e) => {
                tracing::warn!("Ranking service unavailable, keeping heuristic order: {}", e);
                Refined {
                    candidates: scored,
                    source: RefineSource::Fallback,
                }
            }
        }
    }
}

async fn request_ranking(
    client: &dyn TextGenerationClient,
    scored: &[ScoredCandidate],
    query: &SuggestQuery,
) -> RankingOutcome {
    let payload = json!({
        "interests": query.interests,
        "skills": query.skills,
        "locations": query.locations,
        "tribes": scored
            .iter()
            .map(|s| json!({
                "id": s.candidate.id,
                "name": s.candidate.name,
                "description": s.candidate.description,
                "location": s.candidate.location,
            }))
            .collect::<Vec<_>>(),
    });

    match client
        .complete(
            RANKING_SYSTEM_PROMPT,
            &[Turn::user(payload.to_string())],
            ResponseFormat::Text,
        )
        .await
    {
        Ok(raw) => parse_ranking(&raw),
        Err(e) => RankingOutcome::ServiceError(e),
    }
}

/// Parse the raw ranking reply into typed entries
///
/// The body must be a JSON array; empty content reads as an empty one.
/// Items that are not objects or carry no usable id are skipped; a score
/// that is present but not a finite, non-negative number rejects the whole
/// reply.
pub fn parse_ranking(raw: &str) -> RankingOutcome {
    let raw = match raw.trim() {
        "" => "[]",
        trimmed => trimmed,
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return RankingOutcome::Malformed(format!("invalid JSON: {}", e)),
    };

    let Some(items) = value.as_array() else {
        return RankingOutcome::Malformed("expected a JSON array".to_string());
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let Some(obj) = item.as_object() else { continue };
        let Some(id) = obj.get("id").and_then(coerce_id) else { continue };

        let score = match obj.get("score") {
            None => None,
            Some(v) => match coerce_score(v) {
                Some(s) => Some(s),
                None => {
                    return RankingOutcome::Malformed(format!(
                        "non-numeric score for tribe {}: {}",
                        id, v
                    ))
                }
            },
        };

        let explanation = obj
            .get("explanation")
            .and_then(|e| e.as_str())
            .map(str::to_string);

        entries.push(RankedEntry { id, score, explanation });
    }

    RankingOutcome::Success(entries)
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    (score.is_finite() && score >= 0.0).then_some(score)
}

/// Overlay service scores onto the heuristic list and re-sort
///
/// Tribes the service did not mention keep their heuristic score and no
/// explanation. When the service repeats an id, the last entry wins.
pub fn apply_ranking(
    scored: &[ScoredCandidate],
    entries: &[RankedEntry],
) -> Vec<ScoredCandidate> {
    let lookup: HashMap<i64, &RankedEntry> = entries.iter().map(|e| (e.id, e)).collect();

    let mut merged: Vec<ScoredCandidate> = scored
        .iter()
        .map(|s| match lookup.get(&s.id()) {
            Some(entry) => s.rescored(entry.score.unwrap_or(s.score), entry.explanation.clone()),
            None => s.rescored(s.score, None),
        })
        .collect();

    sort_by_score(&mut merged);
    merged
}

/// Stable sort, highest score first; equal scores keep their relative order
pub fn sort_by_score(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
