use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MimicError, Result};
use crate::stages::{PatternConfig, SampleConfig, SegmentConfig};

/// Settings for a full pipeline run.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// [segment]
/// gap_seconds = 3600
///
/// [samples]
/// target_id = "3159852227"
/// window = 5
///
/// [samples.persona]
/// group_context = "include"
///
/// [patterns]
/// min_interactions = 5
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segment: SegmentConfig,
    pub samples: SampleConfig,
    pub patterns: PatternConfig,
}

impl PipelineConfig {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MimicError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| MimicError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::GroupContext;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.segment.gap_seconds, 1_800);
        assert_eq!(config.samples.window, 3);
        assert_eq!(config.patterns.min_interactions, 3);
        assert_eq!(config.patterns.top_tokens, 5);
        assert_eq!(config.samples.persona.group_context, GroupContext::Omit);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [samples]
            target_id = "111"

            [samples.persona]
            name = "Ally"
            group_context = "include"
            "#,
        )
        .unwrap();

        assert_eq!(config.samples.target_id, "111");
        assert_eq!(config.samples.window, 3);
        assert_eq!(config.samples.persona.name.as_deref(), Some("Ally"));
        assert_eq!(config.samples.persona.group_context, GroupContext::Include);
        assert_eq!(config.samples.persona.history_header, "Conversation history:");
        assert_eq!(config.segment.gap_seconds, 1_800);
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mimic.toml");
        std::fs::write(&path, "[segment]\ngap_seconds = \"soon\"\n").unwrap();

        let err = PipelineConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, MimicError::Config { .. }));
    }
}
