use super::session::{result_timestamp_token, RESULT_EXTENSION, VIDEO_EXTENSION};
use super::{Result, SessionRecord, VideoName};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Reads both directories and returns one record per video, sorted by path.
///
/// Any video or prediction file that does not follow the naming convention
/// fails the whole scan.
pub fn build_inventory(video_dir: &Path, results_dir: &Path) -> Result<Vec<SessionRecord>> {
    let mut videos = vec![];
    for path in list_files(video_dir, VIDEO_EXTENSION)? {
        let video = VideoName::parse(&file_name(&path))?;
        videos.push((video, path));
    }
    let result_names = list_files(results_dir, RESULT_EXTENSION)?
        .iter()
        .map(|path| file_name(path))
        .collect::<Vec<_>>();
    let mut tokens = vec![];
    for name in &result_names {
        tokens.push(result_timestamp_token(name)?);
    }
    let mut inventory = join_completion(videos, tokens);
    inventory.sort_by(|a, b| a.video_path.cmp(&b.video_path));
    log::debug!(
        "Inventory: {} sessions, {} prediction files",
        inventory.len(),
        result_names.len()
    );
    Ok(inventory)
}

/// Marks each video completed when a prediction file carries its exact
/// timestamp token. Tokens are compared as strings, not as dates.
pub fn join_completion<'a, V, R>(videos: V, result_tokens: R) -> Vec<SessionRecord>
where
    V: IntoIterator<Item = (VideoName, PathBuf)>,
    R: IntoIterator<Item = &'a str>,
{
    let completed: HashSet<&str> = result_tokens.into_iter().collect();
    videos
        .into_iter()
        .map(|(video, path)| {
            let tracking_completed = completed.contains(video.timestamp_token.as_str());
            SessionRecord::new(video, path, tracking_completed)
        })
        .collect()
}

pub fn pending(inventory: &[SessionRecord]) -> impl Iterator<Item = &SessionRecord> {
    inventory.iter().filter(|record| !record.tracking_completed)
}

fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == extension) {
            files.push(path);
        }
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
