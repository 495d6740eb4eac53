use std::path::Path;

use tracing::warn;

use crate::error::{MimicError, Result};
use crate::models::{CorpusRecord, MessageRecord, PatternSummary};
use crate::stages::TranscriptParser;

/// Read a whole transcript export into memory
pub fn read_transcript(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| MimicError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a transcript file into records
pub fn parse_transcript_file(path: &Path) -> Result<Vec<MessageRecord>> {
    let content = read_transcript(path)?;
    Ok(TranscriptParser::new(&content).collect())
}

/// A corpus line that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number
    pub line_number: usize,
    pub message: String,
}

/// Records recovered from a corpus file
#[derive(Debug, Clone, Default)]
pub struct CorpusReadout {
    pub records: Vec<CorpusRecord>,
    pub malformed: Vec<MalformedLine>,
}

/// Read a JSON Lines training corpus, skipping lines that do not decode
pub fn read_corpus_file(path: &Path) -> Result<CorpusReadout> {
    let content = std::fs::read_to_string(path).map_err(|source| MimicError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_corpus(&content))
}

/// Decode JSON Lines corpus content; blank lines are ignored
pub fn parse_corpus(content: &str) -> CorpusReadout {
    let mut readout = CorpusReadout::default();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CorpusRecord>(line) {
            Ok(record) => readout.records.push(record),
            Err(e) => {
                warn!("Line {}: malformed corpus record: {}", index + 1, e);
                readout.malformed.push(MalformedLine {
                    line_number: index + 1,
                    message: e.to_string(),
                });
            }
        }
    }

    readout
}

/// Read a pattern summary written by a previous run
pub fn read_patterns_file(path: &Path) -> Result<PatternSummary> {
    let content = std::fs::read_to_string(path).map_err(|source| MimicError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| MimicError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_parse_corpus_reports_bad_lines() {
        let content = concat!(
            r#"{"messages":[{"role":"system","content":"s"},{"role":"assistant","content":"a"}]}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"messages":[{"role":"narrator","content":"x"}]}"#,
            "\n",
            r#"{"messages":[{"role":"system","content":"s"},{"role":"user","content":"u"},{"role":"assistant","content":"b"}]}"#,
            "\n",
        );

        let readout = parse_corpus(content);

        assert_eq!(readout.records.len(), 2);
        assert_eq!(readout.records[1].content(Role::User), Some("u"));
        let bad: Vec<usize> = readout.malformed.iter().map(|m| m.line_number).collect();
        assert_eq!(bad, vec![2, 4]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = parse_transcript_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, MimicError::ReadInput { .. }));
    }
}
