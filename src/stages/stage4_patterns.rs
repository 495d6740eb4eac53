use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{InteractionLog, InteractionRecord, PartnerPattern, PatternSummary};

/// Configuration for pattern analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Partners with fewer interactions are left out of the summary
    pub min_interactions: usize,
    /// Substrings counted alongside `[` as emphasis markers
    pub emphasis_markers: Vec<String>,
    /// Number of entries kept in `common_words`
    pub top_tokens: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_interactions: 3,
            emphasis_markers: vec!["🐷".to_string(), "愚蠢".to_string()],
            top_tokens: 5,
        }
    }
}

/// Execute pattern analysis over the interaction log
pub fn analyze_patterns(interactions: &InteractionLog, config: &PatternConfig) -> PatternSummary {
    let summary: PatternSummary = interactions
        .iter()
        .filter(|(_, records)| !records.is_empty() && records.len() >= config.min_interactions)
        .map(|(partner, records)| (partner.clone(), summarize_partner(records, config)))
        .collect();

    info!(
        "Summarized {} of {} partners (min {} interactions)",
        summary.len(),
        interactions.len(),
        config.min_interactions
    );

    summary
}

fn summarize_partner(records: &[InteractionRecord], config: &PatternConfig) -> PartnerPattern {
    let responses: Vec<&str> = records.iter().map(|r| r.response.as_str()).collect();
    let count = responses.len() as f64;

    let total_chars: usize = responses.iter().map(|r| r.chars().count()).sum();
    let total_emphasis: usize = responses
        .iter()
        .map(|r| emphasis_count(r, &config.emphasis_markers))
        .sum();

    let mut groups: Vec<String> = Vec::new();
    for chat in records.iter().filter_map(|r| r.chat.as_ref()) {
        if !groups.contains(chat) {
            groups.push(chat.clone());
        }
    }

    PartnerPattern {
        interaction_count: records.len(),
        avg_response_length: total_chars as f64 / count,
        emoji_usage: total_emphasis as f64 / count,
        common_words: extract_common_words(&responses, config.top_tokens),
        groups,
    }
}

/// Occurrences of `[` plus each marker, non-overlapping
fn emphasis_count(response: &str, markers: &[String]) -> usize {
    response.matches('[').count()
        + markers
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| response.matches(m.as_str()).count())
            .sum::<usize>()
}

/// Most frequent elements longer than one character, taken from iterating
/// each response character by character.
///
/// Every element is a single `char`, so for real text the filter rejects
/// everything and the ranking is empty.
fn extract_common_words(responses: &[&str], top: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for element in responses
        .iter()
        .flat_map(|r| r.chars())
        .map(String::from)
        .filter(|e| e.chars().count() > 1)
    {
        match counts.iter_mut().find(|(seen, _)| *seen == element) {
            Some((_, count)) => *count += 1,
            None => counts.push((element, 1)),
        }
    }

    most_common(counts, top)
}

/// Sort by count descending, keeping first-seen order among ties
fn most_common(mut counts: Vec<(String, usize)>, top: usize) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(top);
    counts
}
