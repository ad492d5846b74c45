pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod job;
pub mod logger;
pub mod models;
pub mod queue;
pub mod session;

pub use cli::{Command, CommandLineArguments, DispatchArgs, TrackArgs};
pub use config::{PythonConfig, ResourceSpec, TrackingConfig};
pub use dispatcher::{Dispatcher, Executor};
pub use engine::{InferenceEngine, PredictionArtifact, PythonEngine, TrackRequest};
pub use error::{Result, TrackingError};
pub use inventory::build_inventory;
pub use job::TrackingJob;
pub use logger::Logger;
pub use models::{resolve_models, ModelPair, ModelRole};
pub use queue::{DryRunQueue, JobQueue, SlurmQueue, Submission};
pub use session::{SessionRecord, VideoName};
