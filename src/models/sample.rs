use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Chat role of a corpus message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role/content pair in a training record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A line of the training corpus as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub messages: Vec<ChatMessage>,
}

impl CorpusRecord {
    /// Content of the first message with the given role
    pub fn content(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }

    /// System first, assistant last, at most one user message between them
    pub fn is_well_formed(&self) -> bool {
        let roles: Vec<Role> = self.messages.iter().map(|m| m.role).collect();
        matches!(
            roles.as_slice(),
            [Role::System, Role::Assistant] | [Role::System, Role::User, Role::Assistant]
        )
    }
}

/// A conversation partner appearing in a sample's context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partner {
    pub speaker_id: String,
    /// Canonical name from the identity map
    pub name: String,
}

/// A fine-tuning example built from one target utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSample {
    /// Persona instruction
    pub system: String,
    /// Rendered conversation history, absent when no usable context exists
    pub context: Option<String>,
    /// The target's utterance, verbatim
    pub response: String,
    /// Distinct partners from the context window, first-seen order
    pub partners: Vec<Partner>,
    /// When the target sent the utterance
    pub timestamp: NaiveDateTime,
    /// Chat label of the originating block
    pub chat: Option<String>,
}

impl TrainingSample {
    /// Messages in corpus order: system, optional user, assistant
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(3);
        messages.push(ChatMessage::new(Role::System, self.system.clone()));
        if let Some(context) = &self.context {
            messages.push(ChatMessage::new(Role::User, context.clone()));
        }
        messages.push(ChatMessage::new(Role::Assistant, self.response.clone()));
        messages
    }

    pub fn to_record(&self) -> CorpusRecord {
        CorpusRecord {
            messages: self.messages(),
        }
    }
}

/// One (context, response) occurrence attributed to a partner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRecord {
    /// Rendered context lines of the sample
    pub context: Vec<String>,
    /// The target's response
    pub response: String,
    /// Chat label of the originating block
    pub chat: Option<String>,
}

/// Interaction records keyed by partner canonical name
pub type InteractionLog = BTreeMap<String, Vec<InteractionRecord>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(context: Option<&str>) -> TrainingSample {
        TrainingSample {
            system: "persona".to_string(),
            context: context.map(str::to_string),
            response: "reply".to_string(),
            partners: vec![],
            timestamp: NaiveDateTime::parse_from_str("2024-01-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            chat: None,
        }
    }

    #[test]
    fn test_messages_without_context() {
        let messages = sample(None).messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "reply");
    }

    #[test]
    fn test_messages_with_context() {
        let record = sample(Some("Bob: hi")).to_record();
        let roles: Vec<Role> = record.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(record.content(Role::User), Some("Bob: hi"));
        assert!(record.is_well_formed());
    }

    #[test]
    fn test_malformed_role_sequence() {
        let record = CorpusRecord {
            messages: vec![
                ChatMessage::new(Role::User, "hi"),
                ChatMessage::new(Role::Assistant, "yo"),
            ],
        };
        assert!(!record.is_well_formed());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::new(Role::Assistant, "x")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"x"}"#);
    }
}
