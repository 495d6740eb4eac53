use std::collections::HashMap;

use tracing::info;

use crate::models::{AliasedIdentity, ConversationBlock, IdentityMap};

/// Result of identity resolution
#[derive(Debug, Clone, Default)]
pub struct IdentityResolution {
    /// Canonical name per speaker id
    pub identity: IdentityMap,
    /// Ids observed under several names, in first-seen order
    pub aliases: Vec<AliasedIdentity>,
}

/// Per-id name counts in first-seen order
#[derive(Debug, Default)]
struct NameTally<'a> {
    counts: Vec<(&'a str, usize)>,
}

impl<'a> NameTally<'a> {
    fn observe(&mut self, name: &'a str) {
        match self.counts.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((name, 1)),
        }
    }

    /// Highest count wins; among equal counts the name seen first wins
    fn canonical(&self) -> Option<&'a str> {
        let mut best: Option<(&'a str, usize)> = None;
        for &(name, count) in &self.counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((name, count));
            }
        }
        best.map(|(name, _)| name)
    }
}

/// Execute identity resolution
///
/// Counts every (speaker id, display name) pair across all blocks and picks
/// the most frequent name for each id.
pub fn resolve_identities(blocks: &[ConversationBlock]) -> IdentityResolution {
    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, NameTally> = HashMap::new();

    for record in blocks.iter().flat_map(|b| b.records()) {
        if record.speaker_id.is_empty() || record.speaker_name.is_empty() {
            continue;
        }
        let tally = tallies.entry(record.speaker_id.as_str()).or_insert_with(|| {
            order.push(record.speaker_id.as_str());
            NameTally::default()
        });
        tally.observe(record.speaker_name.as_str());
    }

    let mut resolution = IdentityResolution::default();

    for speaker_id in order {
        let Some(tally) = tallies.get(speaker_id) else {
            continue;
        };
        let Some(canonical) = tally.canonical() else {
            continue;
        };

        if tally.counts.len() > 1 {
            info!(
                "Speaker {} has {} names {:?}, using {:?}",
                speaker_id,
                tally.counts.len(),
                tally.counts,
                canonical
            );
            resolution.aliases.push(AliasedIdentity {
                speaker_id: speaker_id.to_string(),
                name_counts: tally
                    .counts
                    .iter()
                    .map(|&(name, count)| (name.to_string(), count))
                    .collect(),
                canonical: canonical.to_string(),
            });
        }

        resolution.identity.insert(speaker_id, canonical);
    }

    resolution
}
