use super::{ModelPair, ResourceSpec, Result, SessionRecord, TrackingError};
use crate::util::shell_quote;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const JOB_PREFIX: &str = "sleap_tracking";

/// Where a job's script and scheduler logs live, relative to the jobs directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub script: PathBuf,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl JobPaths {
    pub fn new(jobs_dir: &Path, job_name: &str) -> Self {
        Self {
            script: jobs_dir.join("slurm").join(format!("{}.sh", job_name)),
            stdout: jobs_dir.join("out").join(format!("{}.out", job_name)),
            stderr: jobs_dir.join("err").join(format!("{}.err", job_name)),
        }
    }

    pub fn create_dirs(&self) -> std::io::Result<()> {
        for path in [&self.script, &self.stdout, &self.stderr] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Everything needed to render the batch script of one session.
#[derive(Debug, Clone)]
pub struct TrackingJob<'a> {
    pub session: &'a SessionRecord,
    pub models: ModelPair,
    pub resources: &'a ResourceSpec,
}

impl<'a> TrackingJob<'a> {
    pub fn name(&self) -> String {
        format!("{}_{}", JOB_PREFIX, self.session.session_id())
    }

    pub fn paths(&self, jobs_dir: &Path) -> JobPaths {
        JobPaths::new(jobs_dir, &self.name())
    }

    /// Renders a SLURM batch script. `setup` activates the environment and
    /// `track_command` is the program that runs the tracking step.
    ///
    /// `#SBATCH` values are not shell words, so log paths with whitespace are
    /// rejected instead of quoted.
    pub fn render(
        &self,
        jobs_dir: &Path,
        setup: &[String],
        track_command: &str,
    ) -> Result<String> {
        let paths = self.paths(jobs_dir);
        for path in [&paths.stdout, &paths.stderr] {
            if path.to_string_lossy().chars().any(char::is_whitespace) {
                return Err(TrackingError::JobPath(path.clone()));
            }
        }
        let resources = self.resources;
        let mut script = String::from("#!/bin/bash\n");
        let directives = [
            format!("--job-name={}", self.name()),
            format!("--output={}", paths.stdout.display()),
            format!("--error={}", paths.stderr.display()),
            format!("--ntasks-per-node={}", resources.ntasks_per_node),
            format!("--cpus-per-task={}", resources.cpus_per_task),
            format!("-p {}", resources.partition),
            format!("--gres=gpu:{}", resources.gpus),
            format!("--mem={}", resources.memory),
            format!("--time={}", resources.time_limit),
        ];
        for directive in directives {
            let _ = writeln!(script, "#SBATCH {}", directive);
        }
        script.push('\n');
        for line in setup {
            let _ = writeln!(script, "{}", line);
        }
        if !setup.is_empty() {
            script.push('\n');
        }
        let _ = writeln!(
            script,
            "{} track {} {} --centroid-model {} --centered-instance-model {} --skip-setup",
            track_command,
            shell_quote(&self.session.video_path.to_string_lossy()),
            shell_quote(&self.session.session_type),
            shell_quote(&self.models.centroid.to_string_lossy()),
            shell_quote(&self.models.centered_instance.to_string_lossy()),
        );
        Ok(script)
    }
}
