use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{MimicError, Result};
use crate::io::{write_corpus, write_identity_map, write_patterns};
use crate::models::{IdentityMap, PatternSummary, TrainingSample};

pub const IDENTITY_MAP_FILE: &str = "identity_map.json";
pub const CORPUS_FILE: &str = "training_corpus.jsonl";
pub const PATTERNS_FILE: &str = "chat_patterns.json";

/// Destinations of the three output artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPaths {
    pub identity_map: PathBuf,
    pub corpus: PathBuf,
    pub patterns: PathBuf,
}

impl RenderPaths {
    /// Default file names inside an output directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            identity_map: dir.join(IDENTITY_MAP_FILE),
            corpus: dir.join(CORPUS_FILE),
            patterns: dir.join(PATTERNS_FILE),
        }
    }
}

/// Result of rendering
#[derive(Debug)]
pub struct RenderResult {
    pub paths: RenderPaths,
    pub samples_written: usize,
}

/// Execute rendering: write the identity map, the training corpus and the
/// pattern summary
pub fn execute_render(
    identity: &IdentityMap,
    samples: &[TrainingSample],
    patterns: &PatternSummary,
    paths: &RenderPaths,
) -> Result<RenderResult> {
    for path in [&paths.identity_map, &paths.corpus, &paths.patterns] {
        ensure_parent(path)?;
    }

    info!("Writing identity map to {:?}", paths.identity_map);
    write_identity_map(&paths.identity_map, identity)?;

    info!("Writing training corpus to {:?}", paths.corpus);
    let records: Vec<_> = samples.iter().map(TrainingSample::to_record).collect();
    let samples_written = write_corpus(&paths.corpus, &records)?;

    info!("Writing chat patterns to {:?}", paths.patterns);
    write_patterns(&paths.patterns, patterns)?;

    Ok(RenderResult {
        paths: paths.clone(),
        samples_written,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| MimicError::WriteOutput {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
