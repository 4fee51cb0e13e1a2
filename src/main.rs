//! vidpipe - interactive driver for an external video pipeline
//!
//! Entry point: parses arguments, sets up logging, loads configuration and
//! dispatches to the interactive sessions.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::Path;
use tracing::{info, level_filters::LevelFilter};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use vidpipe::cli::{Args, Commands};
use vidpipe::config::Config;
use vidpipe::error::VidpipeError;
use vidpipe::processor::{ProcessRequest, ProcessorFactory, Quality};
use vidpipe::session::{self, quick::QuickSettings};
use vidpipe::status;
use vidpipe::workflow::ScriptRunner;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let guard = setup_logging(args.verbose)?;

    let cwd = std::env::current_dir()?;
    let config = Config::load(args.config.as_deref(), &cwd)?;

    let run_id = Uuid::new_v4();
    info!(%run_id, "Starting vidpipe");

    let code = execute(args.command, config, run_id, &cwd).await?;
    info!(%run_id, "vidpipe finished with exit code {}", code);

    if code != 0 {
        // Flush the file appender before exiting
        drop(guard);
        std::process::exit(code);
    }
    Ok(())
}

async fn execute(command: Commands, config: Config, run_id: Uuid, cwd: &Path) -> Result<i32> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Demo { url, watermark, quality, no_subtitles, yes } => {
            let request = ProcessRequest {
                url: url.unwrap_or(config.demo.url),
                watermark: watermark.unwrap_or(config.demo.watermark),
                quality: parse_quality(quality.as_deref(), config.demo.quality)?,
                embed_subtitles: config.processor.embed_subtitles && !no_subtitles,
            };
            let processor = ProcessorFactory::create_processor(config.processor, run_id);
            let outcome = session::run_demo(processor.as_ref(), &request, yes, &mut input, &mut out).await?;
            Ok(outcome.exit_code())
        }
        Commands::Quick { watermark, quality } => {
            let settings = QuickSettings {
                samples: config.quick.samples,
                default_watermark: config.quick.watermark,
                watermark,
                quality: parse_quality(quality.as_deref(), config.quick.quality)?,
                embed_subtitles: config.processor.embed_subtitles,
            };
            let processor = ProcessorFactory::create_processor(config.processor, run_id);
            let outcome = session::run_quick(processor.as_ref(), &settings, &mut input, &mut out).await?;
            Ok(outcome.exit_code())
        }
        Commands::WorkflowTest { url, yes } => {
            let url = url.unwrap_or_else(|| config.workflow.url.clone());
            let runner = ScriptRunner::new(config.workflow.clone(), run_id);
            let outcome = session::run_workflow_test(&runner, &config.workflow, &url, yes, &mut input, &mut out).await?;
            Ok(outcome.exit_code())
        }
        Commands::Status { json } => {
            let report = status::run_checks(&config, cwd).await;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                report.print(&mut out)?;
            }
            Ok(if report.passed() { 0 } else { 1 })
        }
        Commands::Info => {
            session::show_info(&mut out)?;
            Ok(0)
        }
        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(VidpipeError::Config(format!(
                    "{} already exists; pass --force to overwrite",
                    output.display()
                )).into());
            }
            config.save_to_file(&output)?;
            writeln!(out, "Wrote configuration to {}", output.display())?;
            Ok(0)
        }
    }
}

fn parse_quality(requested: Option<&str>, default: Quality) -> Result<Quality> {
    match requested {
        Some(quality) => Ok(quality.parse()?),
        None => Ok(default),
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".vidpipe").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // File appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "vidpipe.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    // The console shares the terminal with the prompts, so keep it quiet unless asked
    let console_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let file_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(console_level);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(file_level);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(LevelFilter::DEBUG.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - file: {}", log_dir.join("vidpipe.log").display());

    Ok(guard)
}
