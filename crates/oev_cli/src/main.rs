//! OpenEduVoice - command-line entry point
//!
//! Handles configuration loading, application-level logging and dispatch to
//! the subcommands. Runs execute on the tokio runtime; the async main task is
//! the controlling context that renders log, summary and progress.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::Parser;

use oev_core::backend::{plan_load, CapabilityProbe, LoadPolicy, SystemProbe};
use oev_core::config::{ConfigManager, ConfigSection, Settings};
use oev_core::logging::{init_tracing_with_file, LogConfig, LogSink, RunLoggerBuilder};
use oev_core::orchestrator::{create_standard_pipeline, Orchestrator, PipelineError, StepServices};
use oev_core::workspace::DeckJob;

mod cli;
mod console;

use cli::{Cli, Command, ProbeArgs, RunArgs};
use console::ConsoleObserver;

/// Exit code when the acknowledgement was not given.
const EXIT_NOT_ACKNOWLEDGED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first (needed for logs directory path)
    let mut config_manager = ConfigManager::new(&cli.config);
    if let Err(e) = config_manager.load_or_create() {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
    }

    let logs_dir = config_manager.logs_folder();
    let _log_guard =
        init_tracing_with_file(config_manager.settings().logging.level, &logs_dir);

    tracing::info!("OpenEduVoice starting");
    tracing::info!("Config: {}", cli.config.display());
    tracing::info!("Core version: {}", oev_core::version());

    if let Err(e) = config_manager.ensure_dirs_exist() {
        tracing::error!("Failed to create directories: {}", e);
        eprintln!("Warning: Failed to create directories: {}", e);
    }

    let result = match cli.command {
        Command::Run(args) => run(args, config_manager).await,
        Command::Probe(args) => {
            probe(&args, config_manager.settings());
            Ok(ExitCode::SUCCESS)
        }
        Command::Steps => {
            list_steps(config_manager.settings());
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs, mut config_manager: ConfigManager) -> anyhow::Result<ExitCode> {
    let deck = resolve_deck(args.deck.as_deref(), &config_manager.settings().paths.last_deck_path)?;
    let settings = Arc::new(config_manager.settings().clone());

    let pipeline = create_standard_pipeline(Arc::new(StepServices::from_settings(&settings)));
    let steps = if args.all {
        pipeline.steps()
    } else if args.steps.is_empty() {
        bail!("no steps selected; pass --step <NAME> (see `openeduvoice steps`) or --all");
    } else {
        pipeline.select(&args.steps)?
    };

    let tts_language = args
        .tts_language
        .clone()
        .unwrap_or_else(|| settings.speech.language.clone());
    let job = match args.direction {
        Some(direction) => DeckJob::new(&deck, direction, tts_language),
        None => DeckJob::with_languages(
            &deck,
            settings.translation.source_language.clone(),
            settings.translation.target_language.clone(),
            tts_language,
        ),
    };

    let observer = ConsoleObserver::new(args.quiet);
    let mut builder = RunLoggerBuilder::new(run_name(&deck))
        .log_dir(config_manager.logs_folder())
        .config(LogConfig {
            error_tail: settings.logging.error_tail as usize,
            show_timestamps: settings.logging.show_timestamps,
        })
        .output_callback(observer.output_callback());
    if let Some(callback) = observer.log_callback() {
        builder = builder.log_callback(callback);
    }
    let logger = builder.build();
    logger.log(&format!("Selected file: {}", deck.display()));

    config_manager.settings_mut().paths.last_deck_path = deck.display().to_string();
    if let Err(e) = config_manager.update_section(ConfigSection::Paths) {
        tracing::warn!("Could not remember deck path: {}", e);
    }

    let orchestrator = Orchestrator::new(logger, settings, Arc::new(job))
        .with_progress_callback(observer.progress_callback());

    let outcome = orchestrator.run(&steps, args.acknowledge).await;
    if let Some(path) = orchestrator.logger().log_path() {
        eprintln!("Log: {}", path.display());
    }
    orchestrator.logger().close();

    match outcome {
        Ok(report) if report.has_failures() => {
            if args.quiet {
                print_error_tail(&report.error_tail);
            }
            Ok(ExitCode::FAILURE)
        }
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(PipelineError::PreconditionNotMet { .. }) => Ok(ExitCode::from(EXIT_NOT_ACKNOWLEDGED)),
        Err(e) => Err(e.into()),
    }
}

/// The deck argument, or the last deck used.
fn resolve_deck(arg: Option<&Path>, last: &str) -> anyhow::Result<PathBuf> {
    let deck = match arg {
        Some(path) => path.to_path_buf(),
        None if !last.trim().is_empty() => PathBuf::from(last),
        None => bail!("no deck given and no previous deck recorded"),
    };
    if !deck
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pptx"))
    {
        tracing::warn!("{} does not look like a .pptx deck", deck.display());
    }
    deck.canonicalize()
        .with_context(|| format!("cannot open deck {}", deck.display()))
}

/// Recent log lines for a failed quiet run, where the log was not mirrored.
fn print_error_tail(tail: &[String]) {
    if tail.is_empty() {
        return;
    }
    eprintln!("--- last {} log lines ---", tail.len());
    for line in tail {
        eprintln!("{}", line);
    }
}

fn run_name(deck: &Path) -> String {
    deck.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string())
}

fn probe(args: &ProbeArgs, settings: &Settings) {
    let probe = SystemProbe::from_settings(&settings.backend);
    let accelerator = probe.probe();
    let support = probe.runtime_support();

    if accelerator.available {
        println!("Accelerator: available ({:.1} GiB)", accelerator.memory_gib);
    } else {
        println!("Accelerator: not available");
    }
    println!(
        "Runtime libraries: runtime={} blas={} dnn={}",
        support.has_runtime, support.has_blas, support.has_dnn
    );
    for dir in &support.library_dirs {
        println!("  {}", dir.display());
    }

    let configured_translation = Some(settings.translation.model.as_str())
        .filter(|model| !model.trim().is_empty());
    let plans = [
        (
            LoadPolicy::speech(&settings.transcription, &settings.backend),
            args.speech_model.as_deref(),
        ),
        (
            LoadPolicy::translation(&settings.translation, &settings.backend),
            args.translation_model.as_deref().or(configured_translation),
        ),
    ];
    for (policy, requested) in &plans {
        let plan = plan_load(policy, *requested, accelerator, &support);
        let cascade = plan
            .candidates
            .iter()
            .map(|precision| precision.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        println!(
            "{} model '{}' on {}: {}",
            plan.kind.label(),
            plan.model,
            plan.device,
            cascade
        );
        for notice in &plan.notices {
            println!("  [WARN] {}", notice);
        }
    }
}

fn list_steps(settings: &Settings) {
    let pipeline = create_standard_pipeline(Arc::new(StepServices::from_settings(settings)));
    for step in pipeline.steps() {
        println!("{:<40} {}", step.name(), step.description());
    }
}
