use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pose tracking of behavioral videos on a SLURM cluster
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineArguments {
    /// Path to configuration json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Defaults to `dispatch`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan videos and submit a tracking job for every untracked session
    Dispatch(DispatchArgs),
    /// Track a single video with the pose estimation engine
    Track(TrackArgs),
    /// Print all sessions and their tracking state
    Status,
    /// Write the built-in configuration as json, to be edited and passed via --config
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

impl Default for Command {
    fn default() -> Self {
        Self::Dispatch(DispatchArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DispatchArgs {
    /// Run inference in this process instead of submitting jobs
    #[arg(long)]
    pub local: bool,
    /// Write job scripts without calling the scheduler
    #[arg(long, conflicts_with = "local")]
    pub dry_run: bool,
    /// Memory requested per job, e.g. 64G
    #[arg(long)]
    pub memory: Option<String>,
    /// Wall clock limit per job, e.g. 12:00:00
    #[arg(long)]
    pub time_limit: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// Raw video file
    pub video: PathBuf,
    /// Session type, selects the model pair
    pub session_type: String,
    /// Use this centroid model instead of resolving one
    #[arg(long, requires = "centered_instance_model")]
    pub centroid_model: Option<PathBuf>,
    /// Use this centered instance model instead of resolving one
    #[arg(long, requires = "centroid_model")]
    pub centered_instance_model: Option<PathBuf>,
    /// Do not run the environment setup lines, the caller already did
    #[arg(long)]
    pub skip_setup: bool,
}
