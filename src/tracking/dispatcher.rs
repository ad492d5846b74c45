use super::inventory::pending;
use super::{
    engine, resolve_models, InferenceEngine, JobQueue, Result, SessionRecord, TrackingConfig,
    TrackingJob,
};

/// Where pending sessions are sent.
#[derive(Clone, Copy)]
pub enum Executor<'a> {
    /// Write a batch script per session and hand it to the queue
    Cluster(&'a dyn JobQueue),
    /// Run inference here, one session after the other
    Local(&'a dyn InferenceEngine),
}

pub struct Dispatcher<'a> {
    config: &'a TrackingConfig,
    /// Program invoked by job scripts to run the tracking step
    track_command: String,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a TrackingConfig, track_command: String) -> Self {
        Self {
            config,
            track_command,
        }
    }

    /// Sends every untracked session to `executor` and returns how many were
    /// sent. The first session whose models cannot be resolved aborts the
    /// run, sessions sent before it stay sent.
    ///
    /// Nothing remembers earlier runs: a session whose job has not written
    /// its predictions yet is sent again.
    pub async fn dispatch_pending(
        &self,
        inventory: &[SessionRecord],
        executor: Executor<'_>,
    ) -> Result<usize> {
        let sessions = pending(inventory).collect::<Vec<_>>();
        metrics::gauge!("count.pending_sessions", sessions.len() as f64);
        log::debug!(
            "{} of {} sessions need tracking",
            sessions.len(),
            inventory.len()
        );
        let mut count = 0;
        for session in sessions {
            let models = resolve_models(&session.session_type, self.config)?;
            match executor {
                Executor::Cluster(queue) => {
                    let job = TrackingJob {
                        session,
                        models,
                        resources: &self.config.resources,
                    };
                    let script = job.render(
                        &self.config.jobs_dir,
                        &self.config.python.setup,
                        &self.track_command,
                    )?;
                    let paths = job.paths(&self.config.jobs_dir);
                    paths.create_dirs()?;
                    std::fs::write(&paths.script, script)?;
                    log::info!("Submitting {} to HPC", session.video_path.display());
                    let submission = queue.submit(&paths.script).await?;
                    log::info!("{}: {}", submission.script.display(), submission.message);
                    metrics::counter!("count.submitted_jobs", 1);
                }
                Executor::Local(inference) => {
                    let artifact = engine::track(
                        inference,
                        self.config,
                        &session.video_path,
                        &session.session_type,
                        Some(models),
                    )
                    .await?;
                    log::info!("Predictions saved to {}", artifact.path.display());
                }
            }
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{
        build_inventory, DryRunQueue, PredictionArtifact, Submission, TrackRequest,
        TrackingError,
    };
    use async_trait::async_trait;
    use std::fs::{create_dir, File};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingQueue {
        scripts: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn submit(&self, script: &Path) -> Result<Submission> {
            self.scripts.lock().unwrap().push(script.to_owned());
            Ok(Submission {
                script: script.to_owned(),
                message: "Submitted batch job".to_owned(),
            })
        }
    }

    struct WritingEngine;

    #[async_trait]
    impl InferenceEngine for WritingEngine {
        async fn track(&self, request: &TrackRequest) -> Result<PredictionArtifact> {
            std::fs::write(&request.output_path, b"")?;
            Ok(PredictionArtifact {
                path: request.output_path.clone(),
            })
        }
    }

    struct Workspace {
        _root: TempDir,
        config: TrackingConfig,
    }

    impl Workspace {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let config = TrackingConfig {
                models_dir: root.path().join("models"),
                video_dir: root.path().join("video"),
                results_dir: root.path().join("results"),
                jobs_dir: root.path().join("jobs"),
                ..Default::default()
            };
            for dir in [&config.models_dir, &config.video_dir, &config.results_dir] {
                create_dir(dir).unwrap();
            }
            for model in [
                "C57B6_BigMaze_Neuropixel-1.230101_120000.centroid.n=800",
                "C57B6_BigMaze_Neuropixel-1.230101_120000.centered_instance.n=800",
                "C57B6_OpenField_Neuropixel-1.230101_120000.centroid.n=300",
                "C57B6_OpenField_Neuropixel-1.230101_120000.centered_instance.n=300",
            ] {
                create_dir(config.models_dir.join(model)).unwrap();
            }
            Self {
                _root: root,
                config,
            }
        }

        fn add_video(&self, name: &str) {
            File::create(self.config.video_dir.join(name)).unwrap();
        }

        fn add_result(&self, name: &str) {
            File::create(self.config.results_dir.join(name)).unwrap();
        }

        fn inventory(&self) -> Vec<SessionRecord> {
            build_inventory(&self.config.video_dir, &self.config.results_dir).unwrap()
        }

        async fn dispatch(&self, queue: &RecordingQueue) -> Result<usize> {
            Dispatcher::new(&self.config, "sleaptracker".to_owned())
                .dispatch_pending(&self.inventory(), Executor::Cluster(queue))
                .await
        }
    }

    #[tokio::test]
    async fn only_pending_sessions_are_submitted() {
        let workspace = Workspace::new();
        for video in [
            "mouse1.maze_2023-01-01-120000.mp4",
            "mouse1.open_field_2023-01-02-120000.mp4",
            "mouse2.maze_2023-01-03-120000.mp4",
            "mouse2.open_field_2023-01-04-120000.mp4",
            "mouse3.maze_2023-01-05-120000.mp4",
        ] {
            workspace.add_video(video);
        }
        for result in [
            "mouse1.maze_2023-01-01-120000.predicted_2023-02-01T00:00:00.000000.h5",
            "mouse2.maze_2023-01-03-120000.predicted_2023-02-01T00:00:00.000000.h5",
        ] {
            workspace.add_result(result);
        }

        let queue = RecordingQueue::default();
        assert_eq!(workspace.dispatch(&queue).await.unwrap(), 3);
        let scripts = queue.scripts.lock().unwrap();
        let names = scripts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "sleap_tracking_mouse1_open_field_2023-01-02T12:00:00.sh",
                "sleap_tracking_mouse2_open_field_2023-01-04T12:00:00.sh",
                "sleap_tracking_mouse3_maze_2023-01-05T12:00:00.sh",
            ]
        );
    }

    #[tokio::test]
    async fn end_to_end_until_predictions_land() {
        let workspace = Workspace::new();
        workspace.add_video("mouse1.maze_2023-01-01-120000.mp4");

        let queue = RecordingQueue::default();
        assert_eq!(workspace.dispatch(&queue).await.unwrap(), 1);
        let script = queue.scripts.lock().unwrap()[0].clone();
        assert!(script
            .to_string_lossy()
            .contains("mouse1_maze_2023-01-01T12:00:00"));
        let contents = std::fs::read_to_string(&script).unwrap();
        assert!(contents.starts_with("#!/bin/bash\n#SBATCH --job-name="));
        assert!(contents.contains("sleaptracker track '"));
        assert!(contents.contains("C57B6_BigMaze_Neuropixel-1.230101_120000.centroid.n=800"));
        assert!(workspace.config.jobs_dir.join("out").is_dir());
        assert!(workspace.config.jobs_dir.join("err").is_dir());

        workspace.add_result(
            "mouse1.maze_2023-01-01-120000.predicted_2023-01-02T03:04:05.000000.h5",
        );
        let inventory = workspace.inventory();
        assert!(inventory[0].tracking_completed);
        assert_eq!(workspace.dispatch(&queue).await.unwrap(), 0);
        assert_eq!(queue.scripts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dispatching_twice_submits_duplicates() {
        let workspace = Workspace::new();
        workspace.add_video("mouse1.maze_2023-01-01-120000.mp4");

        let queue = RecordingQueue::default();
        workspace.dispatch(&queue).await.unwrap();
        workspace.dispatch(&queue).await.unwrap();
        let scripts = queue.scripts.lock().unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0], scripts[1]);
    }

    #[tokio::test]
    async fn unresolved_models_abort_the_run() {
        let workspace = Workspace::new();
        workspace.add_video("mouse1.maze_2023-01-01-120000.mp4");
        workspace.add_video("mouse2.object_open_field_1_2023-01-02-120000.mp4");
        workspace.add_video("mouse3.maze_2023-01-03-120000.mp4");

        let queue = RecordingQueue::default();
        let err = workspace.dispatch(&queue).await.unwrap_err();
        assert!(matches!(
            err,
            TrackingError::ModelResolution { ref session_type, count: 0, .. }
                if session_type == "object_open_field_1"
        ));
        // sorted by path, so only mouse1 went out before the failure
        assert_eq!(queue.scripts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_writes_scripts_only() {
        let workspace = Workspace::new();
        workspace.add_video("mouse1.maze_2023-01-01-120000.mp4");
        workspace.add_video("mouse2.open_field_2023-01-02-120000.mp4");
        workspace.add_result(
            "mouse2.open_field_2023-01-02-120000.predicted_2023-01-03T00:00:00.000000.h5",
        );

        let dispatcher = Dispatcher::new(&workspace.config, "sleaptracker".to_owned());
        let count = dispatcher
            .dispatch_pending(&workspace.inventory(), Executor::Cluster(&DryRunQueue))
            .await
            .unwrap();
        assert_eq!(count, 1);
        let scripts = std::fs::read_dir(workspace.config.jobs_dir.join("slurm"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            scripts,
            ["sleap_tracking_mouse1_maze_2023-01-01T12:00:00.sh"]
        );
    }

    #[tokio::test]
    async fn local_run_closes_the_loop() {
        let workspace = Workspace::new();
        workspace.add_video("mouse1.maze_2023-01-01-120000.mp4");
        workspace.add_video("mouse2.open_field_2023-01-02-120000.mp4");

        let dispatcher = Dispatcher::new(&workspace.config, "sleaptracker".to_owned());
        let count = dispatcher
            .dispatch_pending(&workspace.inventory(), Executor::Local(&WritingEngine))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert!(!workspace.config.jobs_dir.exists());
        assert!(workspace
            .inventory()
            .iter()
            .all(|record| record.tracking_completed));
    }
}
