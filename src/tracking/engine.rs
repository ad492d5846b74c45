use super::session::prediction_file_name;
use super::{resolve_models, ModelPair, PythonConfig, Result, TrackingConfig, TrackingError};
use crate::util::ScopedTimer;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Log target of lines printed by the inference process.
pub const ENGINE_LOG_TARGET: &str = "sleap";

const PREDICT_PROGRAM: &str = r#"
import sys
import sleap

video_path, centroid, centered_instance, output_path, batch_size = sys.argv[1:6]
video = sleap.load_video(video_path, grayscale=True)
predictor = sleap.load_model(
    [centroid, centered_instance],
    batch_size=int(batch_size),
    tracker="flow",
    tracker_max_instances=1,
    max_instances=1,
    progress_reporting="json",
)
predictions = predictor.predict(video)
predictions.export(output_path)
"#;

#[derive(Debug, Clone)]
pub struct TrackRequest {
    pub video_path: PathBuf,
    pub session_type: String,
    pub models: ModelPair,
    pub output_path: PathBuf,
}

/// Keypoint predictions written for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionArtifact {
    pub path: PathBuf,
}

/// Runs pose estimation over a whole video. Long running and GPU bound.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    async fn track(&self, request: &TrackRequest) -> Result<PredictionArtifact>;
}

/// Tracks `video_path` into the results directory. Models are resolved from
/// the session type unless a pair is given.
pub async fn track(
    engine: &dyn InferenceEngine,
    config: &TrackingConfig,
    video_path: &Path,
    session_type: &str,
    models: Option<ModelPair>,
) -> Result<PredictionArtifact> {
    let models = match models {
        Some(models) => models,
        None => resolve_models(session_type, config)?,
    };
    let generated = chrono::Local::now().naive_local();
    let request = TrackRequest {
        video_path: video_path.to_owned(),
        session_type: session_type.to_owned(),
        models,
        output_path: config
            .results_dir
            .join(prediction_file_name(video_path, generated)?),
    };
    log::info!("Tracking video {}", video_path.display());
    let timer = ScopedTimer::new(&format!("Tracked {}", video_path.display()));
    let artifact = engine.track(&request).await?;
    metrics::histogram!("latency.local_tracking", timer.elapsed());
    Ok(artifact)
}

/// Runs SLEAP through a Python interpreter in a shell that first executes
/// the configured environment setup lines.
pub struct PythonEngine {
    python: PythonConfig,
    run_setup: bool,
}

impl PythonEngine {
    pub fn new(python: &PythonConfig, run_setup: bool) -> Self {
        Self {
            python: python.clone(),
            run_setup,
        }
    }

    fn commandline(&self) -> String {
        let mut lines = match self.run_setup {
            true => self.python.setup.clone(),
            false => vec![],
        };
        lines.push(format!("exec {} - \"$@\" 2>&1", self.python.interpreter));
        lines.join(" && ")
    }
}

#[async_trait]
impl InferenceEngine for PythonEngine {
    async fn track(&self, request: &TrackRequest) -> Result<PredictionArtifact> {
        let engine_error = |message: String| TrackingError::Engine {
            video: request.video_path.clone(),
            message,
        };
        log::debug!(
            "{} session models: {}, {}",
            request.session_type,
            request.models.centroid.display(),
            request.models.centered_instance.display()
        );
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(self.commandline())
            .arg("sh")
            .arg(&request.video_path)
            .arg(&request.models.centroid)
            .arg(&request.models.centered_instance)
            .arg(&request.output_path)
            .arg(self.python.batch_size.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| engine_error("stdin not available".to_owned()))?;
        // an interpreter that dies early is reported through its exit status
        if let Err(e) = stdin.write_all(PREDICT_PROGRAM.as_bytes()).await {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }
        drop(stdin);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| engine_error("stdout not available".to_owned()))?;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            log::info!(target: ENGINE_LOG_TARGET, "{}", line);
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(engine_error(format!("interpreter exited with {}", status)));
        }
        if !request.output_path.is_file() {
            return Err(engine_error(format!(
                "no predictions written to {}",
                request.output_path.display()
            )));
        }
        Ok(PredictionArtifact {
            path: request.output_path.clone(),
        })
    }
}
