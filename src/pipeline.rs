//! End-to-end orchestration: transcript files in, samples and patterns out.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{MimicError, Result};
use crate::io::read_transcript;
use crate::models::{ConversationBlock, CorpusRecord, PatternSummary};
use crate::stages::{
    analyze_patterns, build_samples, resolve_identities, segment_blocks, IdentityResolution,
    SampleSet, SegmentConfig, TranscriptParser,
};

/// A transcript file that could not be loaded
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: MimicError,
}

/// Counts for one successfully loaded transcript file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub records: usize,
    pub blocks: usize,
    /// Headers dropped for an unparseable timestamp
    pub discarded: usize,
}

/// Blocks from every loadable file, in the order the files were given
#[derive(Debug, Default)]
pub struct LoadedTranscripts {
    pub blocks: Vec<ConversationBlock>,
    pub files: Vec<FileSummary>,
    pub failures: Vec<FileFailure>,
}

impl LoadedTranscripts {
    pub fn record_count(&self) -> usize {
        self.files.iter().map(|f| f.records).sum()
    }

    /// True when files were given but none of them could be read
    pub fn all_failed(&self) -> bool {
        self.files.is_empty() && !self.failures.is_empty()
    }
}

/// Parse and segment a single transcript file.
///
/// Blocks never span two files.
pub fn load_transcript(
    path: &Path,
    config: &SegmentConfig,
) -> Result<(Vec<ConversationBlock>, FileSummary)> {
    let content = read_transcript(path)?;
    let mut parser = TranscriptParser::new(&content);
    let blocks = segment_blocks(&mut parser, config);

    let summary = FileSummary {
        path: path.to_path_buf(),
        records: blocks.iter().map(ConversationBlock::len).sum(),
        blocks: blocks.len(),
        discarded: parser.discarded(),
    };
    Ok((blocks, summary))
}

/// Load every transcript, collecting per-file failures instead of aborting
pub fn load_transcripts(paths: &[PathBuf], config: &SegmentConfig) -> LoadedTranscripts {
    let mut loaded = LoadedTranscripts::default();

    for path in paths {
        match load_transcript(path, config) {
            Ok((blocks, summary)) => {
                info!(
                    "Parsed {} records into {} blocks from {:?} ({} dropped)",
                    summary.records, summary.blocks, path, summary.discarded
                );
                loaded.blocks.extend(blocks);
                loaded.files.push(summary);
            }
            Err(error) => {
                warn!("Skipping {:?}: {}", path, error);
                loaded.failures.push(FileFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    info!(
        "Loaded {} blocks ({} records) from {} of {} files",
        loaded.blocks.len(),
        loaded.record_count(),
        loaded.files.len(),
        paths.len()
    );
    loaded
}

/// Outputs of the resolve, sample and pattern stages
#[derive(Debug)]
pub struct PipelineOutput {
    pub resolution: IdentityResolution,
    pub samples: SampleSet,
    pub patterns: PatternSummary,
}

impl PipelineOutput {
    pub fn corpus_records(&self) -> Vec<CorpusRecord> {
        self.samples.samples.iter().map(|s| s.to_record()).collect()
    }
}

/// Run identity resolution, sample building and pattern analysis over
/// already segmented blocks
pub fn run_stages(blocks: &[ConversationBlock], config: &PipelineConfig) -> PipelineOutput {
    let resolution = resolve_identities(blocks);
    info!("Found {} users", resolution.identity.len());

    let target = config.samples.target_id.as_str();
    match resolution.identity.get(target) {
        Some(name) => info!("Target {} resolves to {:?}", target, name),
        None => warn!("Target {} never appears in the transcripts", target),
    }

    let samples = build_samples(blocks, &resolution.identity, &config.samples);
    let patterns = analyze_patterns(&samples.interactions, &config.patterns);

    PipelineOutput {
        resolution,
        samples,
        patterns,
    }
}
