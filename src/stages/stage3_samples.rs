use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{
    ConversationBlock, IdentityMap, InteractionLog, InteractionRecord, MessageRecord, Partner,
    TrainingSample,
};
use crate::persona::{format_context_line, Persona, PersonaConfig};

/// Configuration for sample building
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Speaker id whose utterances become assistant messages
    pub target_id: String,
    /// Number of preceding same-block records used as context
    pub window: usize,
    pub persona: PersonaConfig,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            target_id: String::new(),
            window: 3,
            persona: PersonaConfig::default(),
        }
    }
}

/// Result of sample building
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    /// Samples in the order their utterances were encountered
    pub samples: Vec<TrainingSample>,
    /// Interaction records per partner name
    pub interactions: InteractionLog,
    /// Name the persona prompts were bound to
    pub persona_name: String,
}

impl SampleSet {
    /// Samples that carry a user message
    pub fn with_context_count(&self) -> usize {
        self.samples.iter().filter(|s| s.context.is_some()).count()
    }

    /// Total interaction records across all partners
    pub fn interaction_count(&self) -> usize {
        self.interactions.values().map(Vec::len).sum()
    }
}

/// Execute sample building
///
/// Every non-empty utterance of the target becomes one sample whose context
/// is the preceding `window` records of the same block. Context never
/// crosses a block boundary.
pub fn build_samples(
    blocks: &[ConversationBlock],
    identity: &IdentityMap,
    config: &SampleConfig,
) -> SampleSet {
    let persona = Persona::resolve(&config.persona, identity, &config.target_id);
    let target = config.target_id.as_str();

    let mut set = SampleSet {
        persona_name: persona.name().to_string(),
        ..Default::default()
    };

    for block in blocks {
        let records = block.records();
        for (index, record) in records.iter().enumerate() {
            if record.speaker_id != target || !record.has_text() {
                continue;
            }

            let context = &records[index.saturating_sub(config.window)..index];
            let partners = collect_partners(context, identity, target);
            let lines = render_context(context, identity);

            for partner in &partners {
                set.interactions
                    .entry(partner.name.clone())
                    .or_default()
                    .push(InteractionRecord {
                        context: lines.clone(),
                        response: record.text.clone(),
                        chat: block.chat().map(str::to_string),
                    });
            }

            let sample = TrainingSample {
                system: persona.system_prompt(block.chat()),
                context: if lines.is_empty() {
                    None
                } else {
                    Some(persona.user_prompt(&lines))
                },
                response: record.text.clone(),
                partners,
                timestamp: record.timestamp,
                chat: block.chat().map(str::to_string),
            };
            set.samples.push(sample);
        }
    }

    if let Some(first) = set.samples.first() {
        debug!("First sample: {:?}", first.messages());
    }
    info!(
        "Built {} samples ({} with context), {} interaction records across {} partners",
        set.samples.len(),
        set.with_context_count(),
        set.interaction_count(),
        set.interactions.len()
    );

    set
}

/// Distinct resolvable non-target speakers in the context, first-seen order
fn collect_partners(context: &[MessageRecord], identity: &IdentityMap, target: &str) -> Vec<Partner> {
    let mut partners: Vec<Partner> = Vec::new();
    for record in context {
        if record.speaker_id == target {
            continue;
        }
        let Some(name) = identity.get(&record.speaker_id) else {
            continue;
        };
        if !partners.iter().any(|p| p.speaker_id == record.speaker_id) {
            partners.push(Partner {
                speaker_id: record.speaker_id.clone(),
                name: name.to_string(),
            });
        }
    }
    partners
}

/// Context lines for records with text and a canonical name
fn render_context(context: &[MessageRecord], identity: &IdentityMap) -> Vec<String> {
    context
        .iter()
        .filter(|record| record.has_text())
        .filter_map(|record| {
            identity
                .get(&record.speaker_id)
                .map(|name| format_context_line(name, &record.text))
        })
        .collect()
}
