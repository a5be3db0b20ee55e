//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use oev_core::workspace::TranslationDirection;

/// Default config path: .config/settings.toml (relative to current working directory)
pub const DEFAULT_CONFIG: &str = ".config/settings.toml";

#[derive(Debug, Parser)]
#[command(name = "openeduvoice", version)]
#[command(about = "Translate narrated slide decks: transcribe, translate, synthesize, reintegrate")]
pub struct Cli {
    /// Settings file (created with defaults when missing).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run pipeline steps on a deck.
    Run(RunArgs),
    /// Show the detected compute backend and the model plans.
    Probe(ProbeArgs),
    /// List step names in canonical order.
    Steps,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// The .pptx deck. Defaults to the last deck used.
    pub deck: Option<PathBuf>,

    /// Step to run; repeat for several. Runs in the given order.
    #[arg(long = "step", value_name = "NAME")]
    pub steps: Vec<String>,

    /// Run every step in canonical order.
    #[arg(long, conflicts_with = "steps")]
    pub all: bool,

    /// de-en or en-de. Defaults to the configured languages.
    #[arg(long)]
    pub direction: Option<TranslationDirection>,

    /// Speech synthesis language (e.g. English, German).
    #[arg(long)]
    pub tts_language: Option<String>,

    /// Confirm that AI generated output will be reviewed before use.
    #[arg(long)]
    pub acknowledge: bool,

    /// Only print outcome lines, not the full log.
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Speech model to plan for instead of the configured default.
    #[arg(long)]
    pub speech_model: Option<String>,

    /// Translation model to plan for instead of automatic selection.
    #[arg(long)]
    pub translation_model: Option<String>,
}
