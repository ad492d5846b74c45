use super::{Result, TrackingError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Acknowledgment printed by the scheduler for a submitted script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub script: PathBuf,
    pub message: String,
}

/// An external batch queue. Submission does not wait for the job.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn submit(&self, script: &Path) -> Result<Submission>;
}

/// Submits scripts with `sbatch`.
pub struct SlurmQueue {
    sbatch: String,
}

impl SlurmQueue {
    pub fn new() -> Self {
        Self {
            sbatch: "sbatch".to_owned(),
        }
    }

    #[cfg(test)]
    fn with_command(sbatch: &str) -> Self {
        Self {
            sbatch: sbatch.to_owned(),
        }
    }
}

#[async_trait]
impl JobQueue for SlurmQueue {
    async fn submit(&self, script: &Path) -> Result<Submission> {
        let submission_error = |message: String| TrackingError::Submission {
            script: script.to_owned(),
            message,
        };
        let output = Command::new(&self.sbatch)
            .arg(script)
            .output()
            .await
            .map_err(|e| submission_error(format!("cannot run {}: {}", self.sbatch, e)))?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        match output.status.success() {
            true => Ok(Submission {
                script: script.to_owned(),
                message: stdout,
            }),
            false => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(submission_error(format!(
                    "{} exited with {}: {}",
                    self.sbatch,
                    output.status,
                    stderr.trim()
                )))
            }
        }
    }
}

/// Accepts every script without running anything.
pub struct DryRunQueue;

#[async_trait]
impl JobQueue for DryRunQueue {
    async fn submit(&self, script: &Path) -> Result<Submission> {
        Ok(Submission {
            script: script.to_owned(),
            message: "dry run, not submitted".to_owned(),
        })
    }
}
