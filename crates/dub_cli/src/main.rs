//! Command-line front end for the dubbing engine.
//!
//! Runs the pace/retime/master pipeline against a prepared job
//! directory (timeline.json plus synthesized clips) and a source video.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use tracing_subscriber::EnvFilter;

use dub_core::config::ConfigManager;
use dub_core::logging::{JobLogger, LogCallback, LogConfig};
use dub_core::orchestrator::{standard_pipeline, Context, JobState};

struct Args {
    job_dir: PathBuf,
    source_video: PathBuf,
    config_path: PathBuf,
    verbose: bool,
}

fn print_usage() {
    eprintln!("Usage: auto-dub [OPTIONS] <JOB_DIR> <SOURCE_VIDEO>");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <JOB_DIR>       Job directory with timeline.json and clips/");
    eprintln!("  <SOURCE_VIDEO>  Source video file");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>  Config file [default: auto-dub.toml]");
    eprintln!("  -v, --verbose        Verbose logging");
    eprintln!("  -h, --help           Print help");
    eprintln!("  -V, --version        Print version");
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut positional = Vec::new();
    let mut config_path = PathBuf::from("auto-dub.toml");
    let mut verbose = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("auto-dub {}", dub_core::version());
                return Ok(None);
            }
            "-c" | "--config" => {
                let value = args.next().context("--config requires a path")?;
                config_path = PathBuf::from(value);
            }
            "-v" | "--verbose" => verbose = true,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => positional.push(PathBuf::from(other)),
        }
    }

    if positional.len() != 2 {
        print_usage();
        bail!("Expected <JOB_DIR> and <SOURCE_VIDEO>");
    }

    let source_video = positional.pop().unwrap();
    let job_dir = positional.pop().unwrap();
    Ok(Some(Args {
        job_dir,
        source_video,
        config_path,
        verbose,
    }))
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = ConfigManager::new(&args.config_path);
    config
        .load_or_create()
        .with_context(|| format!("Loading config from {}", args.config_path.display()))?;
    config.ensure_dirs_exist()?;

    let settings = config.settings().clone();

    if !args.job_dir.is_dir() {
        bail!("Job directory {} does not exist", args.job_dir.display());
    }

    let job_name = args
        .job_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string());

    let log_config = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::from_settings(&settings.logging)
    };
    let echo: LogCallback = Box::new(|line| println!("{}", line));
    let logger = Arc::new(JobLogger::new(
        &job_name,
        config.logs_folder(),
        log_config,
        Some(echo),
    )?);

    logger.info(&format!("auto-dub {} starting", dub_core::version()));
    logger.info(&format!("Job: {}", args.job_dir.display()));
    logger.info(&format!("Source video: {}", args.source_video.display()));

    let ctx = Context::new(
        settings,
        &job_name,
        args.job_dir.clone(),
        args.source_video,
        Arc::clone(&logger),
    );
    let mut state = JobState::load_or_new(&ctx.state_path(), &job_name);

    let pipeline = standard_pipeline();
    let result = pipeline.run(&ctx, &mut state)?;

    if !result.steps_skipped.is_empty() {
        logger.info(&format!(
            "Resumed job, skipped finished steps: {}",
            result.steps_skipped.join(", ")
        ));
    }
    logger.info(&format!(
        "Deliverables: {} and {}",
        ctx.final_audio_path().display(),
        ctx.video_plan_path().display()
    ));
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
