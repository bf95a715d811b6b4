//! Continuity CLI
//!
//! Offline access to compaction, handoffs, session summaries and the review
//! tool. Every command prints one JSON document; failures print
//! `{"error": ...}` and exit 1.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use continuity_lib::handoff::{latest_session_summary, save_session_summary};
use continuity_lib::{
    compact_with, create_handoff, list_handoffs, mark_handled, read_handoff, read_transcript, CompactionStats,
    Config, HandoffRequest, Message, ReviewTool, TokioCommandRunner,
};

type CliResult = Result<String, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "continuity-cli")]
#[command(about = "Continuity CLI - handoffs and transcript compaction", long_about = None)]
struct Cli {
    /// Config file (defaults to $CONFIG_DIR/continuity/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Project root (defaults to config, then the current directory)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compact a JSONL transcript and print the kept messages
    Compact {
        /// Path to the transcript (.jsonl)
        transcript: PathBuf,
        /// Override the character budget
        #[arg(long)]
        budget: Option<usize>,
    },
    /// Summarize a JSONL transcript into a handoff document
    Handoff {
        /// Path to the transcript (.jsonl)
        transcript: PathBuf,
        /// Note recorded at the top of the handoff
        #[arg(long)]
        note: Option<String>,
    },
    /// Handoff pickup commands
    Pickup {
        #[command(subcommand)]
        action: PickupAction,
    },
    /// Session summary commands
    Summary {
        #[command(subcommand)]
        action: SummaryAction,
    },
    /// Run the review command over some context
    Review {
        /// Review instructions
        #[arg(long)]
        instructions: String,
        /// Conversation context, or @path to read it from a file
        #[arg(long)]
        context: String,
    },
}

#[derive(Subcommand)]
enum PickupAction {
    /// List handoffs, newest first
    List,
    /// Print a handoff and mark it handled
    Read {
        /// Handoff file name
        name: String,
    },
}

#[derive(Subcommand)]
enum SummaryAction {
    /// Print the most recent session summary
    Latest,
    /// Save a session summary read from a file
    Save {
        session_id: String,
        file: PathBuf,
    },
}

// ============ Output Types ============

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

#[derive(Serialize)]
struct CompactOutput {
    messages: Vec<Message>,
    stats: CompactionStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PickupOutput {
    name: String,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryOutput {
    summary: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedOutput {
    path: PathBuf,
}

#[derive(Serialize)]
struct ReviewOutput {
    output: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match load_config(&cli) {
        Ok(config) => run(cli.command, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(json) => println!("{}", json),
        Err(e) => {
            let error = ErrorOutput { error: e.to_string() };
            println!("{}", serde_json::to_string(&error).unwrap_or_else(|_| e.to_string()));
            std::process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ref dir) = cli.project_dir {
        config.project_dir = Some(dir.clone());
    }
    Ok(config)
}

async fn run(command: Commands, config: &Config) -> CliResult {
    let project_dir = config.project_dir();
    match command {
        Commands::Compact { transcript, budget } => handle_compact(&transcript, budget, config),
        Commands::Handoff { transcript, note } => handle_handoff(&transcript, note.as_deref(), &project_dir, config).await,
        Commands::Pickup { action } => handle_pickup(action, &project_dir),
        Commands::Summary { action } => handle_summary(action, &project_dir),
        Commands::Review { instructions, context } => handle_review(&instructions, &context, config).await,
    }
}

// ============ Handlers ============

fn handle_compact(transcript: &Path, budget: Option<usize>, config: &Config) -> CliResult {
    let mut compactor = config.compactor;
    if let Some(budget) = budget {
        compactor.char_budget = budget;
    }
    let parsed = read_transcript(transcript);
    let (messages, stats) = compact_with(&parsed.messages, &compactor);
    Ok(serde_json::to_string(&CompactOutput { messages, stats })?)
}

async fn handle_handoff(transcript: &Path, note: Option<&str>, project_dir: &Path, config: &Config) -> CliResult {
    let parsed = read_transcript(transcript);
    let request = HandoffRequest {
        project_dir,
        messages: &parsed.messages,
        todos: &parsed.todos,
        note,
    };
    let record = create_handoff(&request, &TokioCommandRunner, &config.summary_command, &config.compactor).await?;
    Ok(serde_json::to_string(&record)?)
}

fn handle_pickup(action: PickupAction, project_dir: &Path) -> CliResult {
    match action {
        PickupAction::List => {
            let entries = list_handoffs(project_dir)?;
            Ok(serde_json::to_string(&entries)?)
        }
        PickupAction::Read { name } => {
            let content = read_handoff(project_dir, &name)?;
            mark_handled(project_dir, &name)?;
            Ok(serde_json::to_string(&PickupOutput { name, content })?)
        }
    }
}

fn handle_summary(action: SummaryAction, project_dir: &Path) -> CliResult {
    match action {
        SummaryAction::Latest => {
            let summary = latest_session_summary(project_dir);
            Ok(serde_json::to_string(&SummaryOutput { summary })?)
        }
        SummaryAction::Save { session_id, file } => {
            let summary = std::fs::read_to_string(&file)?;
            let path = save_session_summary(project_dir, &session_id, &summary)?;
            Ok(serde_json::to_string(&SavedOutput { path })?)
        }
    }
}

async fn handle_review(instructions: &str, context: &str, config: &Config) -> CliResult {
    let context = match context.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => context.to_string(),
    };
    let tool = ReviewTool::new(Arc::new(TokioCommandRunner), config.review_command.clone());
    let output = tool.execute(instructions, &context).await?;
    Ok(serde_json::to_string(&ReviewOutput { output })?)
}
