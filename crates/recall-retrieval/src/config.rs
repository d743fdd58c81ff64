use serde::{Deserialize, Serialize};

use recall_core::config::Config;
use recall_core::error::{Error, Result};

/// Which document attribute defines a "group" for group selection,
/// neighbor expansion and per-group caps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingKey {
    /// `Document::group_id`.
    #[default]
    Source,
    /// A metadata entry; documents without it fall back to `group_id`.
    Metadata(String),
}

/// Engine tunables, fixed at construction.
///
/// Read from the `retrieval` table of the layered config; every field has a
/// default so a partial table is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Result size used when the caller does not pass one.
    pub k: usize,
    /// Max ordering-key distance from a seed for a same-group passage to be pulled in.
    pub neighbor_window: usize,
    /// Group selection looks at the top `max(k * oversample_factor, k + oversample_pad)` candidates.
    pub oversample_factor: usize,
    pub oversample_pad: usize,
    pub grouping_key: GroupingKey,
    pub lexical_prefilter: bool,
    pub per_group_cap: Option<usize>,
    /// Share of `k` reserved for one-per-group picks before plain score filling.
    pub diversity_first_fraction: Option<f32>,
    /// When set, abstain unless the best score clears this quantile of the corpus scores plus `abstention_delta`.
    pub abstention_quantile: Option<f32>,
    pub abstention_delta: f32,
    /// Weight of focus-term hits in group selection; small so it only breaks near-ties.
    pub focus_bonus_weight: f32,
    /// Shortest token (and quoted phrase) that counts for focus-term matching.
    pub min_token_len: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 5,
            neighbor_window: 1,
            oversample_factor: 4,
            oversample_pad: 10,
            grouping_key: GroupingKey::Source,
            lexical_prefilter: true,
            per_group_cap: None,
            diversity_first_fraction: None,
            abstention_quantile: None,
            abstention_delta: 0.0,
            focus_bonus_weight: 0.05,
            min_token_len: 3,
        }
    }
}

impl RetrievalConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        let retrieval: Self = config.get_or_default("retrieval")?;
        retrieval.validate()?;
        Ok(retrieval)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be at least 1".into()));
        }
        if self.oversample_factor == 0 {
            return Err(Error::InvalidConfig("retrieval.oversample_factor must be at least 1".into()));
        }
        if self.per_group_cap == Some(0) {
            return Err(Error::InvalidConfig("retrieval.per_group_cap must be at least 1 when set".into()));
        }
        if self.min_token_len == 0 {
            return Err(Error::InvalidConfig("retrieval.min_token_len must be at least 1".into()));
        }
        check_unit("retrieval.diversity_first_fraction", self.diversity_first_fraction)?;
        check_unit("retrieval.abstention_quantile", self.abstention_quantile)?;
        if !self.abstention_delta.is_finite() {
            return Err(Error::InvalidConfig("retrieval.abstention_delta must be finite".into()));
        }
        if !self.focus_bonus_weight.is_finite() || self.focus_bonus_weight < 0.0 {
            return Err(Error::InvalidConfig("retrieval.focus_bonus_weight must be a non-negative number".into()));
        }
        if let GroupingKey::Metadata(key) = &self.grouping_key {
            if key.is_empty() {
                return Err(Error::InvalidConfig("retrieval.grouping_key metadata name is empty".into()));
            }
        }
        Ok(())
    }

    /// Size of the oversampled slice group selection works on.
    pub fn oversample_len(&self, k: usize) -> usize {
        k.saturating_mul(self.oversample_factor).max(k.saturating_add(self.oversample_pad))
    }
}

fn check_unit(name: &str, value: Option<f32>) -> Result<()> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => {
            Err(Error::InvalidConfig(format!("{name} must be within [0, 1], got {v}")))
        }
        _ => Ok(()),
    }
}
