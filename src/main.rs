use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mimic::models::{rank_partners, Role};
use mimic::{
    execute_render, load_transcripts, read_corpus_file, read_patterns_file, run_stages,
    GroupContext, PipelineConfig, RenderPaths, SegmentConfig,
};

#[derive(Parser)]
#[command(name = "mimic")]
#[command(author, version, about = "Group-chat transcript to persona fine-tuning corpus pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the training corpus, identity map and chat patterns
    Process {
        /// Transcript files, processed in the order given
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Speaker id whose messages become assistant replies
        #[arg(short, long)]
        target: Option<String>,

        /// Directory for the output files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Number of preceding messages used as context
        #[arg(long)]
        window: Option<usize>,

        /// Silence (minutes) that starts a new conversation block
        #[arg(long)]
        gap_minutes: Option<u32>,

        /// Mention the originating chat in the system prompt
        #[arg(long)]
        group_context: bool,

        /// Persona name used in prompts (defaults to the target's canonical name)
        #[arg(long)]
        persona_name: Option<String>,

        /// Minimum interactions for a partner to appear in chat patterns
        #[arg(long)]
        min_interactions: Option<usize>,

        /// TOML file with pipeline settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report on transcripts without writing anything
    Analyze {
        /// Transcript files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Speaker id to count utterances for
        #[arg(short, long)]
        target: Option<String>,

        /// Silence (minutes) that starts a new conversation block
        #[arg(long)]
        gap_minutes: Option<u32>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Re-read a training corpus and report malformed lines
    Inspect {
        /// Training corpus (JSON Lines)
        #[arg(short, long)]
        corpus: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print chat patterns ordered by interaction count
    Patterns {
        /// Chat patterns file written by `process`
        #[arg(short, long)]
        patterns: PathBuf,

        /// Number of partners to show
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            target,
            output_dir,
            window,
            gap_minutes,
            group_context,
            persona_name,
            min_interactions,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = load_config(config.as_deref())?;
            if let Some(target) = target {
                config.samples.target_id = target;
            }
            if let Some(window) = window {
                config.samples.window = window;
            }
            if let Some(minutes) = gap_minutes {
                config.segment = SegmentConfig::from_minutes(minutes);
            }
            if group_context {
                config.samples.persona.group_context = GroupContext::Include;
            }
            if persona_name.is_some() {
                config.samples.persona.name = persona_name;
            }
            if let Some(min) = min_interactions {
                config.patterns.min_interactions = min;
            }
            process_transcripts(&input, &output_dir, &config)
        }
        Commands::Analyze {
            input,
            target,
            gap_minutes,
            verbose,
        } => {
            setup_logging(verbose);
            let segment = gap_minutes
                .map(SegmentConfig::from_minutes)
                .unwrap_or_default();
            analyze_transcripts(&input, target.as_deref(), &segment)
        }
        Commands::Inspect { corpus, verbose } => {
            setup_logging(verbose);
            inspect_corpus(&corpus)
        }
        Commands::Patterns { patterns, top } => {
            setup_logging(false);
            show_patterns(&patterns, top)
        }
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Loading settings from {:?}", path);
            PipelineConfig::from_file(path).context("Failed to load settings")
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn process_transcripts(inputs: &[PathBuf], output_dir: &Path, config: &PipelineConfig) -> Result<()> {
    if config.samples.target_id.trim().is_empty() {
        bail!("No target speaker id given (use --target or set samples.target_id)");
    }

    let loaded = load_transcripts(inputs, &config.segment);
    if loaded.all_failed() {
        bail!("None of the {} input files could be read", inputs.len());
    }

    let output = run_stages(&loaded.blocks, config);

    let paths = RenderPaths::in_dir(output_dir);
    let result = execute_render(
        &output.resolution.identity,
        &output.samples.samples,
        &output.patterns,
        &paths,
    )
    .context("Failed to write outputs")?;

    info!(
        "Complete: {} samples for {} ({} with context), patterns for {} partners",
        result.samples_written,
        output.samples.persona_name,
        output.samples.with_context_count(),
        output.patterns.len()
    );
    for (name, pattern) in rank_partners(&output.patterns).into_iter().take(5) {
        info!("  {}: {} interactions", name, pattern.interaction_count);
    }
    if let Some(first) = output.samples.samples.first() {
        match serde_json::to_string_pretty(&first.to_record()) {
            Ok(preview) => debug!("First sample:\n{}", preview),
            Err(e) => debug!("Could not render first sample: {}", e),
        }
    }

    if !loaded.failures.is_empty() {
        warn!(
            "{} of {} input files could not be read",
            loaded.failures.len(),
            inputs.len()
        );
    }

    Ok(())
}

fn analyze_transcripts(inputs: &[PathBuf], target: Option<&str>, segment: &SegmentConfig) -> Result<()> {
    let loaded = load_transcripts(inputs, segment);
    if loaded.all_failed() {
        bail!("None of the {} input files could be read", inputs.len());
    }
    let resolution = mimic::resolve_identities(&loaded.blocks);

    println!("Transcript Analysis");
    println!("===================");
    for file in &loaded.files {
        println!(
            "{}: {} records, {} blocks, {} dropped",
            file.path.display(),
            file.records,
            file.blocks,
            file.discarded
        );
    }
    for failure in &loaded.failures {
        println!("{}: unreadable ({})", failure.path.display(), failure.error);
    }
    println!("Total records: {}", loaded.record_count());
    println!("Total blocks: {}", loaded.blocks.len());
    println!("Speakers: {}", resolution.identity.len());
    println!();

    println!("Name Changes");
    println!("------------");
    if resolution.aliases.is_empty() {
        println!("None");
    }
    for alias in &resolution.aliases {
        println!(
            "{}: {:?} -> {}",
            alias.speaker_id, alias.name_counts, alias.canonical
        );
    }
    println!();

    let mut message_counts: HashMap<&str, usize> = HashMap::new();
    let mut chat_blocks: HashMap<&str, usize> = HashMap::new();
    for block in &loaded.blocks {
        *chat_blocks.entry(block.chat().unwrap_or("(none)")).or_default() += 1;
        for record in block.records() {
            *message_counts.entry(record.speaker_id.as_str()).or_default() += 1;
        }
    }

    println!("Speaker Statistics");
    println!("------------------");
    let mut speakers: Vec<(&str, usize)> = message_counts.into_iter().collect();
    speakers.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (speaker_id, count) in &speakers {
        let name = resolution.identity.get(speaker_id).unwrap_or("?");
        println!("{} ({}): {} messages", name, speaker_id, count);
    }
    println!();

    println!("Chats");
    println!("-----");
    let mut chats: Vec<(&str, usize)> = chat_blocks.into_iter().collect();
    chats.sort_by(|a, b| a.0.cmp(b.0));
    for (chat, blocks) in &chats {
        println!("{}: {} blocks", chat, blocks);
    }

    if let Some(target) = target {
        let utterances = loaded
            .blocks
            .iter()
            .flat_map(|b| b.records())
            .filter(|r| r.speaker_id == target && r.has_text())
            .count();
        println!();
        println!(
            "Target {} ({}): {} usable utterances",
            target,
            resolution.identity.get(target).unwrap_or("not found"),
            utterances
        );
    }

    Ok(())
}

fn inspect_corpus(corpus: &Path) -> Result<()> {
    info!("Inspecting corpus {:?}", corpus);
    let readout = read_corpus_file(corpus).context("Failed to read corpus")?;

    let with_context = readout
        .records
        .iter()
        .filter(|r| r.content(Role::User).is_some())
        .count();
    let badly_shaped = readout.records.iter().filter(|r| !r.is_well_formed()).count();
    let assistant_chars: usize = readout
        .records
        .iter()
        .filter_map(|r| r.content(Role::Assistant))
        .map(|c| c.chars().count())
        .sum();
    let avg_assistant = if readout.records.is_empty() {
        0.0
    } else {
        assistant_chars as f64 / readout.records.len() as f64
    };

    println!("Corpus Inspection");
    println!("=================");
    println!("Samples: {}", readout.records.len());
    println!("With context: {}", with_context);
    println!("Average reply length: {:.1} chars", avg_assistant);
    println!("Unexpected role order: {}", badly_shaped);
    println!("Malformed lines: {}", readout.malformed.len());
    for line in &readout.malformed {
        println!("  line {}: {}", line.line_number, line.message);
    }

    Ok(())
}

fn show_patterns(path: &Path, top: usize) -> Result<()> {
    let patterns = read_patterns_file(path).context("Failed to read chat patterns")?;

    println!("Chat Patterns");
    println!("=============");
    for (name, pattern) in rank_partners(&patterns).into_iter().take(top) {
        println!("{}", name);
        println!("  Interactions: {}", pattern.interaction_count);
        println!("  Avg reply length: {:.1} chars", pattern.avg_response_length);
        println!("  Emphasis per reply: {:.2}", pattern.emoji_usage);
        println!(
            "  Common words: {:?}",
            &pattern.common_words[..pattern.common_words.len().min(3)]
        );
        if !pattern.groups.is_empty() {
            println!("  Chats: {}", pattern.groups.join(", "));
        }
    }

    Ok(())
}
