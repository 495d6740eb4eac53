use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{MimicError, Result};
use crate::models::{CorpusRecord, IdentityMap, PatternSummary};

/// Write the identity map as a pretty JSON object
pub fn write_identity_map(path: &Path, identity: &IdentityMap) -> Result<()> {
    write_json_pretty(path, identity)
}

/// Write the pattern summary as a pretty JSON object
pub fn write_patterns(path: &Path, patterns: &PatternSummary) -> Result<()> {
    write_json_pretty(path, patterns)
}

/// Write the training corpus, one JSON object per line.
///
/// Returns the number of records written.
pub fn write_corpus<'a, I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a CorpusRecord>,
{
    let mut writer = BufWriter::new(create(path)?);
    let mut written = 0;

    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(|source| MimicError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(|source| write_error(path, source))?;
        written += 1;
    }

    writer.flush().map_err(|source| write_error(path, source))?;
    Ok(written)
}

fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| MimicError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(|source| write_error(path, source))?;
    writer.flush().map_err(|source| write_error(path, source))
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| write_error(path, source))
}

fn write_error(path: &Path, source: std::io::Error) -> MimicError {
    MimicError::WriteOutput {
        path: path.to_path_buf(),
        source,
    }
}
