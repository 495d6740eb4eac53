use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::debug;

use crate::models::MessageRecord;

/// Timestamp prefix of a message header: `YYYY-MM-DD H:MM:SS` followed by whitespace
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{1,2}:\d{2}:\d{2})\s+").unwrap());

/// Sender part of a header: `<display name>(<numeric id>)` at end of line
static SENDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\((\d+)\)\s*$").unwrap());

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const GROUP_MARKERS: &[&str] = &["message group:", "消息分组:"];
const TARGET_MARKERS: &[&str] = &["message target:", "消息对象:"];
const DIVIDER_MARKER: &str = "====";
const LOG_TITLE_MARKERS: &[&str] = &["message log", "消息记录"];
const SYSTEM_MARKERS: &[&str] = &["system message", "系统消息"];

/// Sender fields captured from a header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingHeader<'a> {
    timestamp: &'a str,
    speaker_name: &'a str,
    speaker_id: &'a str,
}

/// What a trimmed line means while scanning for headers
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    GroupLabel(&'a str),
    ChatLabel(&'a str),
    Skip,
    Header(PendingHeader<'a>),
    Unmatched,
}

#[derive(Debug)]
enum ParseState<'a> {
    ScanningForHeader,
    ConsumingBody(PendingHeader<'a>),
}

/// Streaming parser over the lines of one transcript export.
///
/// Yields records in the order their headers appear. Lines that do not fit
/// the grammar are skipped, and headers whose timestamp is not a real
/// calendar date are dropped after their body has been consumed.
pub struct TranscriptParser<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    state: ParseState<'a>,
    group: Option<String>,
    chat: Option<String>,
    discarded: usize,
}

impl<'a> TranscriptParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self::from_lines(content.lines().collect())
    }

    pub fn from_lines(lines: Vec<&'a str>) -> Self {
        Self {
            lines,
            cursor: 0,
            state: ParseState::ScanningForHeader,
            group: None,
            chat: None,
            discarded: 0,
        }
    }

    /// Number of headers dropped because their timestamp did not parse
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Most recent group label seen
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Most recent chat label seen
    pub fn chat(&self) -> Option<&str> {
        self.chat.as_deref()
    }

    /// Consume body lines up to the next header, section marker or end of input
    fn consume_body(&mut self) -> String {
        let start = self.cursor;
        while let Some(&line) = self.lines.get(self.cursor) {
            if is_body_terminator(line.trim()) {
                break;
            }
            self.cursor += 1;
        }

        self.lines[start..self.cursor]
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    fn finish_record(&mut self, header: PendingHeader<'a>, text: String) -> Option<MessageRecord> {
        match NaiveDateTime::parse_from_str(header.timestamp, TIMESTAMP_FORMAT) {
            Ok(timestamp) => Some(
                MessageRecord::new(timestamp, header.speaker_id, header.speaker_name, text)
                    .with_labels(self.group.clone(), self.chat.clone()),
            ),
            Err(e) => {
                debug!(
                    "Dropping message from {}({}): invalid timestamp {:?}: {}",
                    header.speaker_name, header.speaker_id, header.timestamp, e
                );
                self.discarded += 1;
                None
            }
        }
    }
}

impl<'a> Iterator for TranscriptParser<'a> {
    type Item = MessageRecord;

    fn next(&mut self) -> Option<MessageRecord> {
        loop {
            match std::mem::replace(&mut self.state, ParseState::ScanningForHeader) {
                ParseState::ScanningForHeader => {
                    let line = *self.lines.get(self.cursor)?;
                    self.cursor += 1;

                    match classify_line(line.trim()) {
                        LineKind::GroupLabel(label) => self.group = non_empty(label),
                        LineKind::ChatLabel(label) => self.chat = non_empty(label),
                        LineKind::Header(header) => {
                            self.state = ParseState::ConsumingBody(header);
                        }
                        LineKind::Skip | LineKind::Unmatched => {}
                    }
                }
                ParseState::ConsumingBody(header) => {
                    let text = self.consume_body();
                    if let Some(record) = self.finish_record(header, text) {
                        return Some(record);
                    }
                }
            }
        }
    }
}

/// Parse a whole transcript into records
pub fn parse_transcript(content: &str) -> Vec<MessageRecord> {
    TranscriptParser::new(content).collect()
}

/// Classify a trimmed line, section markers taking priority over headers
fn classify_line(line: &str) -> LineKind<'_> {
    if let Some(label) = strip_any_prefix(line, GROUP_MARKERS) {
        return LineKind::GroupLabel(label);
    }
    if let Some(label) = strip_any_prefix(line, TARGET_MARKERS) {
        return LineKind::ChatLabel(label);
    }
    if line.is_empty()
        || line.starts_with(DIVIDER_MARKER)
        || LOG_TITLE_MARKERS.iter().any(|m| line.contains(m))
        || SYSTEM_MARKERS.iter().any(|m| line.starts_with(m))
    {
        return LineKind::Skip;
    }

    match parse_header(line) {
        Some(header) => LineKind::Header(header),
        None => LineKind::Unmatched,
    }
}

fn parse_header(line: &str) -> Option<PendingHeader<'_>> {
    let ts = HEADER_RE.captures(line)?;
    let timestamp = ts.get(1)?.as_str();
    let rest = &line[ts.get(0)?.end()..];

    let sender = SENDER_RE.captures(rest)?;
    Some(PendingHeader {
        timestamp,
        speaker_name: sender.get(1)?.as_str().trim(),
        speaker_id: sender.get(2)?.as_str(),
    })
}

/// Whether a trimmed line ends the body of the current message
fn is_body_terminator(line: &str) -> bool {
    HEADER_RE.is_match(line)
        || GROUP_MARKERS.iter().any(|m| line.starts_with(m))
        || TARGET_MARKERS.iter().any(|m| line.starts_with(m))
        || line.starts_with(DIVIDER_MARKER)
        || SYSTEM_MARKERS.iter().any(|m| line.starts_with(m))
}

fn strip_any_prefix<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| line.strip_prefix(p))
}

fn non_empty(label: &str) -> Option<String> {
    let label = label.trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_header_and_body() {
        let records = parse_transcript("2024-01-01 10:00:00 Alice(111)\nhello\n");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.speaker_id, "111");
        assert_eq!(record.speaker_name, "Alice");
        assert_eq!(record.text, "hello");
        assert_eq!(
            record.timestamp,
            NaiveDateTime::parse_from_str("2024-01-01 10:00:00", TIMESTAMP_FORMAT).unwrap()
        );
    }

    #[test]
    fn test_multiline_body_keeps_internal_blank_lines() {
        let content = "2024-01-01 10:00:00 Alice(111)\n\
                       first   \n\
                       \n\
                       third\n\
                       \n\
                       2024-01-01 10:01:00 Bob(222)\n\
                       reply";
        let records = parse_transcript(content);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "first\n\nthird");
        assert_eq!(records[0].text.lines().count(), 3);
        assert_eq!(records[1].text, "reply");
    }

    #[test]
    fn test_single_digit_hour() {
        let records = parse_transcript("2024-01-01 9:05:00 Alice(111)\nmorning");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp.format("%H:%M").to_string(), "09:05");
    }

    #[test]
    fn test_non_numeric_id_is_not_a_header() {
        let records = parse_transcript("2024-01-01 10:00:00 Alice(abc)\nhello");
        assert!(records.is_empty());
    }

    #[test]
    fn test_name_with_parentheses() {
        let records = parse_transcript("2024-01-01 10:00:00 Al (the great)(111)  \nhey");
        assert_eq!(records[0].speaker_name, "Al (the great)");
        assert_eq!(records[0].speaker_id, "111");
    }

    #[test]
    fn test_invalid_calendar_date_is_discarded_but_body_consumed() {
        let content = "2024-13-45 10:00:00 Alice(111)\n\
                       body of a bad header\n\
                       Carol(333)\n\
                       2024-01-01 10:01:00 Bob(222)\n\
                       kept";
        let mut parser = TranscriptParser::new(content);
        let records: Vec<_> = parser.by_ref().collect();

        assert_eq!(parser.discarded(), 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].speaker_name, "Bob");
        assert_eq!(records[0].text, "kept");
    }

    #[test]
    fn test_section_markers_skipped_and_labels_kept() {
        let content = "message log\n\
                       ================================\n\
                       message group: Friends\n\
                       ================================\n\
                       message target: Weekend Plans\n\
                       ================================\n\
                       \n\
                       2024-01-01 10:00:00 Alice(111)\n\
                       hello\n\
                       system message: Bob joined\n\
                       2024-01-01 10:01:00 Bob(222)\n\
                       hi";
        let records = parse_transcript(content);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "hello");
        assert_eq!(records[0].group.as_deref(), Some("Friends"));
        assert_eq!(records[0].chat.as_deref(), Some("Weekend Plans"));
        assert_eq!(records[1].chat.as_deref(), Some("Weekend Plans"));
    }

    #[test]
    fn test_chinese_markers() {
        let content = "消息记录\n消息分组:好友\n消息对象:周末\n2024-01-01 10:00:00 雷(3159852227)\n愚蠢";
        let records = parse_transcript(content);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].speaker_name, "雷");
        assert_eq!(records[0].group.as_deref(), Some("好友"));
        assert_eq!(records[0].chat.as_deref(), Some("周末"));
    }

    #[test]
    fn test_header_at_end_of_input_has_empty_text() {
        let records = parse_transcript("2024-01-01 10:00:00 Alice(111)");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "");
    }

    #[test]
    fn test_noise_lines_skipped() {
        let content = "random preamble\nAlice(111)\n2024-01-01 10:00:00\n2024-01-01 10:00:00 Alice(111)\nok";
        let records = parse_transcript(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "ok");
    }

    #[test]
    fn test_crlf_line_endings() {
        let records = parse_transcript("2024-01-01 10:00:00 Alice(111)\r\nline one\r\nline two\r\n");
        assert_eq!(records[0].text, "line one\nline two");
    }
}
