use chrono::{NaiveDateTime, TimeDelta};

/// A single utterance scraped from a transcript export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// When the message was sent (second precision)
    pub timestamp: NaiveDateTime,
    /// Stable account identifier of the sender
    pub speaker_id: String,
    /// Display name as it appeared on this message
    pub speaker_name: String,
    /// Message body, possibly spanning several lines
    pub text: String,
    /// Group label in effect when the message was parsed
    pub group: Option<String>,
    /// Chat label in effect when the message was parsed
    pub chat: Option<String>,
}

impl MessageRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        speaker_id: impl Into<String>,
        speaker_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            speaker_id: speaker_id.into(),
            speaker_name: speaker_name.into(),
            text: text.into(),
            group: None,
            chat: None,
        }
    }

    /// Attach the section labels that were active at parse time
    pub fn with_labels(mut self, group: Option<String>, chat: Option<String>) -> Self {
        self.group = group;
        self.chat = chat;
        self
    }

    /// Whether the body has any non-whitespace content
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A run of messages with no gap at or above the segmentation threshold.
///
/// Always holds at least one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationBlock {
    records: Vec<MessageRecord>,
}

impl ConversationBlock {
    /// Wrap records into a block, rejecting an empty run
    pub fn new(records: Vec<MessageRecord>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Timestamp of the first record
    pub fn start(&self) -> NaiveDateTime {
        self.records[0].timestamp
    }

    /// Timestamp of the last record
    pub fn end(&self) -> NaiveDateTime {
        self.records[self.records.len() - 1].timestamp
    }

    pub fn duration(&self) -> TimeDelta {
        self.end() - self.start()
    }

    /// Chat label of the block's first record
    pub fn chat(&self) -> Option<&str> {
        self.records[0].chat.as_deref()
    }

    /// Group label of the block's first record
    pub fn group(&self) -> Option<&str> {
        self.records[0].group.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_empty_block_rejected() {
        assert!(ConversationBlock::new(vec![]).is_none());
    }

    #[test]
    fn test_block_bounds() {
        let block = ConversationBlock::new(vec![
            MessageRecord::new(ts("2024-01-01 10:00:00"), "111", "Alice", "hello")
                .with_labels(None, Some("Friends".to_string())),
            MessageRecord::new(ts("2024-01-01 10:20:00"), "222", "Bob", "hi"),
        ])
        .unwrap();

        assert_eq!(block.len(), 2);
        assert_eq!(block.start(), ts("2024-01-01 10:00:00"));
        assert_eq!(block.end(), ts("2024-01-01 10:20:00"));
        assert_eq!(block.duration(), TimeDelta::minutes(20));
        assert_eq!(block.chat(), Some("Friends"));
        assert_eq!(block.group(), None);
    }

    #[test]
    fn test_has_text() {
        let record = MessageRecord::new(ts("2024-01-01 10:00:00"), "111", "Alice", "  \n ");
        assert!(!record.has_text());
    }
}
