pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod persona;
pub mod pipeline;
pub mod stages;

pub use config::PipelineConfig;
pub use error::{MimicError, Result};
pub use io::{parse_corpus, parse_transcript_file, read_corpus_file, read_patterns_file, CorpusReadout};
pub use models::{
    ChatMessage, ConversationBlock, CorpusRecord, IdentityMap, MessageRecord, PartnerPattern,
    PatternSummary, Role, TrainingSample,
};
pub use persona::{GroupContext, Persona, PersonaConfig};
pub use pipeline::{load_transcripts, run_stages, LoadedTranscripts, PipelineOutput};
pub use stages::{
    analyze_patterns, build_samples, execute_render, parse_transcript, resolve_identities,
    segment_blocks, PatternConfig, RenderPaths, SampleConfig, SegmentConfig, TranscriptParser,
};
