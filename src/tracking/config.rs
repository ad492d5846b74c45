use super::{Result, TrackingError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment in which the pose estimation library runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PythonConfig {
    /// Shell lines that activate the environment, run in order
    pub setup: Vec<String>,
    pub interpreter: String,
    pub batch_size: u32,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            setup: vec![
                "module load miniconda".to_owned(),
                "conda activate sleap".to_owned(),
            ],
            interpreter: "python3".to_owned(),
            batch_size: 16,
        }
    }
}

/// Resources requested from the scheduler for every tracking job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ResourceSpec {
    pub ntasks_per_node: u32,
    pub cpus_per_task: u32,
    pub partition: String,
    pub gpus: u32,
    pub memory: String,
    pub time_limit: String,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            ntasks_per_node: 1,
            cpus_per_task: 8,
            partition: "gpu".to_owned(),
            gpus: 1,
            memory: "128G".to_owned(),
            time_limit: "20:00:00".to_owned(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    /// One centroid and one centered instance model per session type
    pub models_dir: PathBuf,
    pub video_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Receives `slurm/`, `out/` and `err/`
    pub jobs_dir: PathBuf,
    /// Session type to the model name prefix of its model directories
    pub session_models: BTreeMap<String, String>,
    pub resources: ResourceSpec,
    pub python: PythonConfig,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        let session_models = [
            ("maze", "C57B6_BigMaze_Neuropixel-1"),
            ("open_field", "C57B6_OpenField_Neuropixel-1"),
            ("object_open_field_1", "C57B6_ObjectOpenField_Neuropixel-1"),
            ("object_open_field_2", "C57B6_ObjectOpenField_Neuropixel-1"),
        ]
        .into_iter()
        .map(|(session_type, model)| (session_type.to_owned(), model.to_owned()))
        .collect();
        Self {
            models_dir: PathBuf::from("mazeSLEAP/models"),
            video_dir: PathBuf::from("../data/raw_data/video"),
            results_dir: PathBuf::from("../data/preprocessed_data/SLEAP"),
            jobs_dir: PathBuf::from("mazeSLEAP/jobs"),
            session_models,
            resources: ResourceSpec::default(),
            python: PythonConfig::default(),
        }
    }
}

impl TrackingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Replaces memory and time limit, the two resources operators tune per run.
    pub fn with_resource_overrides(
        mut self,
        memory: Option<String>,
        time_limit: Option<String>,
    ) -> Self {
        if let Some(memory) = memory {
            self.resources.memory = memory;
        }
        if let Some(time_limit) = time_limit {
            self.resources.time_limit = time_limit;
        }
        self
    }

    /// Fails on the first input directory that does not exist.
    pub fn validate_directories(&self) -> Result<()> {
        let required = [
            ("Models", &self.models_dir),
            ("Video", &self.video_dir),
            ("Results", &self.results_dir),
        ];
        for (kind, path) in required {
            if !path.is_dir() {
                return Err(TrackingError::MissingDirectory {
                    kind,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn model_name(&self, session_type: &str) -> Result<&str> {
        self.session_models
            .get(session_type)
            .map(String::as_str)
            .ok_or_else(|| TrackingError::UnknownSessionType(session_type.to_owned()))
    }
}
