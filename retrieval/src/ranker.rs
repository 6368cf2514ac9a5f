//! Hybrid ranking of behaviorally similar profiles.
//!
//! A single pass over the candidates: decode, compare against the target
//! fingerprint, gate on relevance, blend with credit-score proximity, then
//! sort and truncate. Ranking is pure and holds no state between calls.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use riskprint_embeddings::{codec, cosine_similarity};
use riskprint_profiles::{NumericScore, Profile, ProfileId};

use crate::config::{RankingKey, RankingPolicy};
use crate::error::{Result, RetrievalError};
use crate::rationale;

/// A ranked similarity match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub id: ProfileId,
    pub display_name: String,
    pub numeric_score: NumericScore,

    /// Blended score: `vector_similarity * w_vec + score_similarity * w_score`.
    pub similarity: f32,

    /// Cosine similarity of the two fingerprints.
    pub vector_similarity: f32,

    /// Credit-score proximity in `[0, 1]`.
    pub score_similarity: f32,

    /// Short explanation, when the policy asks for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl RankedMatch {
    fn key(&self, ranking_key: RankingKey) -> OrderedFloat<f32> {
        match ranking_key {
            RankingKey::FinalScore => OrderedFloat(self.similarity),
            RankingKey::VectorSimilarity => OrderedFloat(self.vector_similarity),
        }
    }
}

/// Ranks candidate profiles against a target.
#[derive(Debug, Clone)]
pub struct HybridRanker {
    policy: RankingPolicy,
    dimension: Option<usize>,
}

impl HybridRanker {
    /// Create a ranker, rejecting an inconsistent policy.
    pub fn new(policy: RankingPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            dimension: None,
        })
    }

    /// Require every fingerprint to have exactly `dimension` elements.
    ///
    /// Without this, candidates only need to match the target's length.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Rank `candidates` by similarity to `target`, returning at most
    /// `limit` matches.
    ///
    /// Candidates without a fingerprint, or sharing the target's identity,
    /// are not eligible and are skipped. A corrupt candidate fingerprint
    /// fails the whole call.
    pub fn rank(
        &self,
        target: &Profile,
        candidates: &[Profile],
        limit: usize,
    ) -> Result<Vec<RankedMatch>> {
        let target_bytes = target
            .embedding_bytes()
            .ok_or(RetrievalError::TargetNotEligible(target.id()))?;
        let target_vector = match self.dimension {
            Some(dimension) => codec::decode_with_dimension(target_bytes, dimension)?,
            None => codec::decode(target_bytes)?,
        };

        let mut matches = Vec::new();
        for candidate in candidates {
            let Some(bytes) = candidate.embedding_bytes() else {
                trace!("Skipping {}: no embedding", candidate.id());
                continue;
            };
            if candidate.id() == target.id() {
                continue;
            }

            let vector = codec::decode_with_dimension(bytes, target_vector.len())?;
            let vector_similarity = cosine_similarity(&vector, &target_vector)?;
            if !self.policy.is_relevant(vector_similarity) {
                continue;
            }

            let score_similarity = candidate.numeric_score().proximity(target.numeric_score());
            let similarity = vector_similarity * self.policy.vector_weight
                + score_similarity * self.policy.score_weight;

            matches.push(RankedMatch {
                id: candidate.id(),
                display_name: candidate.display_name().to_string(),
                numeric_score: candidate.numeric_score(),
                similarity,
                vector_similarity,
                score_similarity,
                rationale: self
                    .policy
                    .include_rationale
                    .then(|| rationale::explain(vector_similarity, score_similarity)),
            });
        }

        let ranking_key = self.policy.ranking_key;
        matches.sort_by(|a, b| {
            b.key(ranking_key)
                .cmp(&a.key(ranking_key))
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(
            "Ranked {} of {} candidates for {}, returning up to {limit}",
            matches.len(),
            candidates.len(),
            target.id()
        );

        matches.truncate(limit);
        Ok(matches)
    }
}
