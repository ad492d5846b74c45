use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracking::{
    build_inventory, inventory::pending, Command, CommandLineArguments, DispatchArgs, Dispatcher,
    DryRunQueue, Executor, Logger, ModelPair, PythonEngine, SlurmQueue, TrackArgs,
    TrackingConfig, TrackingError,
};
use util::shell_quote;

mod tracking;
mod util;

fn main() -> Result<()> {
    let args = CommandLineArguments::parse();
    Logger::new(args.verbose).install()?;
    let config = match &args.config {
        Some(path) => TrackingConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrackingConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    match args.command.clone().unwrap_or_default() {
        Command::Dispatch(dispatch) => runtime.block_on(run_dispatch(&args, config, dispatch)),
        Command::Track(track) => runtime.block_on(run_track(config, track)),
        Command::Status => print_status(&config),
        Command::InitConfig { path } => {
            config.save(&path)?;
            println!("Configuration written to {}", path.display());
            Ok(())
        }
    }
}

async fn run_dispatch(
    args: &CommandLineArguments,
    config: TrackingConfig,
    dispatch: DispatchArgs,
) -> Result<()> {
    config.validate_directories()?;
    let config = config.with_resource_overrides(dispatch.memory, dispatch.time_limit);
    let inventory = build_inventory(&config.video_dir, &config.results_dir)?;
    let dispatcher = Dispatcher::new(&config, track_command(args.config.as_deref())?);

    if dispatch.local {
        let engine = PythonEngine::new(&config.python, true);
        let count = dispatcher
            .dispatch_pending(&inventory, Executor::Local(&engine))
            .await?;
        println!(
            "Tracked {} videos, predictions are in {}",
            count,
            config.results_dir.display()
        );
    } else if dispatch.dry_run {
        let count = dispatcher
            .dispatch_pending(&inventory, Executor::Cluster(&DryRunQueue))
            .await?;
        println!(
            "Wrote {} job scripts to {} without submitting them",
            count,
            config.jobs_dir.join("slurm").display()
        );
    } else {
        let count = dispatcher
            .dispatch_pending(&inventory, Executor::Cluster(&SlurmQueue::new()))
            .await?;
        println!(
            "All {} video tracking jobs submitted to HPC. Check progress with 'squeue -u <username>'",
            count
        );
    }
    Ok(())
}

async fn run_track(config: TrackingConfig, track: TrackArgs) -> Result<()> {
    if !config.results_dir.is_dir() {
        return Err(TrackingError::MissingDirectory {
            kind: "Results",
            path: config.results_dir.clone(),
        }
        .into());
    }
    let models = match (track.centroid_model, track.centered_instance_model) {
        (Some(centroid), Some(centered_instance)) => Some(ModelPair {
            centroid,
            centered_instance,
        }),
        _ => None,
    };
    let engine = PythonEngine::new(&config.python, !track.skip_setup);
    let artifact =
        tracking::engine::track(&engine, &config, &track.video, &track.session_type, models)
            .await?;
    println!("{}", artifact.path.display());
    Ok(())
}

fn print_status(config: &TrackingConfig) -> Result<()> {
    config.validate_directories()?;
    let inventory = build_inventory(&config.video_dir, &config.results_dir)?;
    for record in &inventory {
        println!(
            "{:<12} {:<22} {} {}",
            record.subject_id,
            record.session_type,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            match record.tracking_completed {
                true => "tracked",
                false => "pending",
            }
        );
    }
    let pending = pending(&inventory).count();
    println!(
        "{} sessions, {} tracked, {} pending",
        inventory.len(),
        inventory.len() - pending,
        pending
    );
    Ok(())
}

/// Command line that job scripts use to call back into this binary.
fn track_command(config: Option<&Path>) -> Result<String> {
    let exe = std::env::current_exe().context("Cannot locate own executable")?;
    let mut command = shell_quote(&exe.to_string_lossy());
    if let Some(config) = config {
        let config = std::fs::canonicalize(config)?;
        command.push_str(&format!(" --config {}", shell_quote(&config.to_string_lossy())));
    }
    Ok(command)
}
