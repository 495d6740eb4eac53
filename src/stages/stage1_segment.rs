use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::models::{ConversationBlock, MessageRecord};

/// Configuration for conversation segmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// A gap of at least this many seconds starts a new block
    pub gap_seconds: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            gap_seconds: 1_800, // 30 minutes
        }
    }
}

impl SegmentConfig {
    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            gap_seconds: minutes.saturating_mul(60),
        }
    }

    pub fn gap(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.gap_seconds))
    }
}

/// Incremental splitter that closes a block whenever the time since the
/// previous record reaches the gap threshold
#[derive(Debug)]
pub struct BlockSegmenter {
    gap: TimeDelta,
    previous: Option<NaiveDateTime>,
    open: Vec<MessageRecord>,
}

impl BlockSegmenter {
    pub fn new(config: &SegmentConfig) -> Self {
        Self {
            gap: config.gap(),
            previous: None,
            open: Vec::new(),
        }
    }

    /// Add the next record, returning the block it closed, if any
    pub fn push(&mut self, record: MessageRecord) -> Option<ConversationBlock> {
        let splits = self
            .previous
            .is_some_and(|previous| record.timestamp - previous >= self.gap);

        let closed = if splits {
            ConversationBlock::new(std::mem::take(&mut self.open))
        } else {
            None
        };

        self.previous = Some(record.timestamp);
        self.open.push(record);
        closed
    }

    /// Close the trailing block
    pub fn finish(self) -> Option<ConversationBlock> {
        ConversationBlock::new(self.open)
    }
}

/// Split an ordered record stream into conversation blocks
pub fn segment_blocks<I>(records: I, config: &SegmentConfig) -> Vec<ConversationBlock>
where
    I: IntoIterator<Item = MessageRecord>,
{
    let mut segmenter = BlockSegmenter::new(config);
    let mut blocks: Vec<ConversationBlock> = records
        .into_iter()
        .filter_map(|record| segmenter.push(record))
        .collect();
    blocks.extend(segmenter.finish());
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::parse_transcript;

    fn record(time: &str, id: &str) -> MessageRecord {
        let timestamp =
            NaiveDateTime::parse_from_str(&format!("2024-01-01 {}", time), "%Y-%m-%d %H:%M:%S")
                .unwrap();
        MessageRecord::new(timestamp, id, format!("user{}", id), "text")
    }

    #[test]
    fn test_short_gap_stays_in_block() {
        let records = parse_transcript(
            "2024-01-01 10:00:00 Alice(111)\nhello\n2024-01-01 10:20:00 Bob(222)\nhi there",
        );
        let blocks = segment_blocks(records, &SegmentConfig::default());

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].len(), 2);
    }

    #[test]
    fn test_long_gap_splits() {
        let records = parse_transcript(
            "2024-01-01 10:00:00 Alice(111)\nhello\n2024-01-01 11:00:00 Bob(222)\nhi there",
        );
        let blocks = segment_blocks(records, &SegmentConfig::default());

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].records()[0].speaker_name, "Alice");
        assert_eq!(blocks[1].records()[0].speaker_name, "Bob");
    }

    #[test]
    fn test_gap_equal_to_threshold_splits() {
        let blocks = segment_blocks(
            vec![record("10:00:00", "1"), record("10:30:00", "2"), record("10:59:59", "3")],
            &SegmentConfig::default(),
        );

        let sizes: Vec<usize> = blocks.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![1, 2]);
    }

    #[test]
    fn test_boundary_law() {
        let config = SegmentConfig::from_minutes(10);
        let records = vec![
            record("09:00:00", "1"),
            record("09:05:00", "2"),
            record("09:20:00", "1"),
            record("09:21:00", "3"),
            record("09:09:00", "2"), // out of order: negative delta
            record("10:00:00", "1"),
        ];
        let blocks = segment_blocks(records.clone(), &config);

        let flattened: Vec<&MessageRecord> = blocks.iter().flat_map(|b| b.records()).collect();
        assert_eq!(flattened.len(), records.len());

        for block in &blocks {
            for pair in block.records().windows(2) {
                assert!(pair[1].timestamp - pair[0].timestamp < config.gap());
            }
        }
        for pair in blocks.windows(2) {
            assert!(pair[1].start() - pair[0].end() >= config.gap());
        }
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_blocks(Vec::new(), &SegmentConfig::default()).is_empty());
    }
}
