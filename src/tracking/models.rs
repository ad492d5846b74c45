use super::{Result, TrackingConfig, TrackingError};
use std::fmt;
use std::path::{Path, PathBuf};

/// The two stages of top-down pose estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Locates the animal in the frame
    Centroid,
    /// Locates body parts around the detected centroid
    CenteredInstance,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Centroid => "centroid",
            ModelRole::CenteredInstance => "centered_instance",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPair {
    pub centroid: PathBuf,
    pub centered_instance: PathBuf,
}

/// Finds the centroid and centered instance model for a session type.
///
/// Model directories are named `<model name>.<version>.<role>[.<more>]`.
/// Exactly one directory must match per role, anything else points at a
/// stale or duplicate model install.
pub fn resolve_models(session_type: &str, config: &TrackingConfig) -> Result<ModelPair> {
    let model_name = config.model_name(session_type)?;
    let model_dirs = list_model_dirs(&config.models_dir)?;
    let find = |role: ModelRole| -> Result<PathBuf> {
        let mut matches = model_dirs
            .iter()
            .filter(|(name, _)| matches_model(name, model_name, role))
            .map(|(_, path)| path);
        match (matches.next(), matches.next()) {
            (Some(path), None) => Ok(path.clone()),
            (first, _) => Err(TrackingError::ModelResolution {
                session_type: session_type.to_owned(),
                role,
                models_dir: config.models_dir.clone(),
                count: first.map_or(0, |_| 2 + matches.count()),
            }),
        }
    };
    Ok(ModelPair {
        centroid: find(ModelRole::Centroid)?,
        centered_instance: find(ModelRole::CenteredInstance)?,
    })
}

fn matches_model(dir_name: &str, model_name: &str, role: ModelRole) -> bool {
    let tokens = dir_name.split('.').collect::<Vec<_>>();
    tokens.len() >= 3 && tokens[0] == model_name && tokens[2] == role.as_str()
}

fn list_model_dirs(models_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = vec![];
    for entry in std::fs::read_dir(models_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            dirs.push((name.to_owned(), path.clone()));
        }
    }
    dirs.sort();
    Ok(dirs)
}
