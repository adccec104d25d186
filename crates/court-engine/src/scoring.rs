//! Rank bookable pairs by resource preference and historical success.
//!
//! Historical booking patterns are passed in as an explicit [`PatternContext`]
//! rather than loaded on first use. `NotLoaded` means "no history available"
//! and scores every slot with the neutral success rate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::search::SlotPair;
use crate::time::SlotTime;

/// Historical success rates per resource and start time, each in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternStats {
    #[serde(default)]
    pub success_rates: BTreeMap<String, BTreeMap<SlotTime, f64>>,
}

impl PatternStats {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn record(&mut self, resource: impl Into<String>, start: SlotTime, rate: f64) {
        self.success_rates
            .entry(resource.into())
            .or_default()
            .insert(start, rate);
    }

    /// Recorded rate, clamped into `[0, 1]`. NaN counts as missing.
    pub fn success_rate(&self, resource: &str, start: SlotTime) -> Option<f64> {
        self.success_rates
            .get(resource)?
            .get(&start)
            .copied()
            .filter(|rate| !rate.is_nan())
            .map(|rate| rate.clamp(0.0, 1.0))
    }
}

/// Booking-pattern knowledge handed to the scorer.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PatternContext {
    #[default]
    NotLoaded,
    Loaded(PatternStats),
}

impl PatternContext {
    pub fn is_loaded(&self) -> bool {
        matches!(self, PatternContext::Loaded(_))
    }

    pub fn success_rate(&self, resource: &str, start: SlotTime) -> Option<f64> {
        match self {
            PatternContext::NotLoaded => None,
            PatternContext::Loaded(stats) => stats.success_rate(resource, start),
        }
    }
}

/// A pair with its score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    pub pair: SlotPair,
    pub score: f64,
    pub preference_score: f64,
    pub history_score: f64,
}

/// Score and sort `pairs`, best first.
///
/// The preference score is `1 - index / len` for a resource in `preference`
/// and 0 otherwise. The history score is the recorded success rate for the
/// pair's first start, or `config.neutral_success_rate` when unknown. Equal
/// scores keep their input order.
pub fn rank_pairs(
    pairs: &[SlotPair],
    preference: &[String],
    context: &PatternContext,
    config: &ScoringConfig,
) -> Vec<ScoredPair> {
    let mut scored: Vec<ScoredPair> = pairs
        .iter()
        .map(|pair| {
            let preference_score = preference
                .iter()
                .position(|r| *r == pair.resource)
                .map_or(0.0, |idx| 1.0 - idx as f64 / preference.len() as f64);
            let history_score = context
                .success_rate(&pair.resource, pair.first_start)
                .unwrap_or(config.neutral_success_rate);
            ScoredPair {
                pair: pair.clone(),
                score: config.preference_weight * preference_score
                    + config.history_weight * history_score,
                preference_score,
                history_score,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// The best pair, if any.
pub fn choose_pair(
    pairs: &[SlotPair],
    preference: &[String],
    context: &PatternContext,
    config: &ScoringConfig,
) -> Option<ScoredPair> {
    rank_pairs(pairs, preference, context, config)
        .into_iter()
        .next()
}
