use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response statistics for the target towards one partner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerPattern {
    /// Number of interaction records
    pub interaction_count: usize,
    /// Mean response length in characters
    pub avg_response_length: f64,
    /// Mean count of emphasis markers per response
    pub emoji_usage: f64,
    /// Most frequent (token, count) pairs
    pub common_words: Vec<(String, usize)>,
    /// Chat labels the interactions came from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// Pattern statistics keyed by partner name
pub type PatternSummary = BTreeMap<String, PartnerPattern>;

/// Partners ordered by interaction count, busiest first
pub fn rank_partners(summary: &PatternSummary) -> Vec<(&str, &PartnerPattern)> {
    let mut ranked: Vec<(&str, &PartnerPattern)> = summary
        .iter()
        .map(|(name, pattern)| (name.as_str(), pattern))
        .collect();
    ranked.sort_by(|a, b| b.1.interaction_count.cmp(&a.1.interaction_count));
    ranked
}
