//! Filename conventions for raw videos and prediction files.
//!
//! Videos are named `<subject>.<session_type>_<timestamp>.mp4`, prediction
//! files `<video stem>.predicted_<generated>.h5`. The timestamp token of the
//! video is carried verbatim into the prediction file name and is the only
//! link between the two.

use super::{Result, TrackingError};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

pub const VIDEO_EXTENSION: &str = "mp4";
pub const RESULT_EXTENSION: &str = "h5";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";
const SESSION_ID_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Fields encoded in a raw video filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoName {
    pub subject_id: String,
    pub session_type: String,
    /// Timestamp token exactly as it appears in the filename
    pub timestamp_token: String,
    pub timestamp: NaiveDateTime,
}

impl VideoName {
    pub fn parse(file_name: &str) -> Result<Self> {
        let parse_error = |reason: &str| TrackingError::FilenameParse {
            name: file_name.to_owned(),
            reason: reason.to_owned(),
        };
        let mut dot_tokens = file_name.split('.');
        let subject_id = dot_tokens.next().unwrap_or_default();
        if subject_id.is_empty() {
            return Err(parse_error("missing subject id"));
        }
        let session_token = dot_tokens
            .next()
            .ok_or_else(|| parse_error("missing `.` after the subject id"))?;
        let (session_type, _) = session_token
            .rsplit_once('_')
            .ok_or_else(|| parse_error("missing `_` before the timestamp"))?;
        if session_type.is_empty() {
            return Err(parse_error("missing session type"));
        }
        let timestamp_token = file_name
            .rsplit('_')
            .next()
            .and_then(|last| last.split('.').next())
            .unwrap_or_default();
        let timestamp = parse_timestamp(file_name, timestamp_token)?;
        Ok(Self {
            subject_id: subject_id.to_owned(),
            session_type: session_type.to_owned(),
            timestamp_token: timestamp_token.to_owned(),
            timestamp,
        })
    }
}

/// Timestamp token of the video a prediction file was produced from. The
/// token must be a valid session timestamp, it is returned verbatim.
pub fn result_timestamp_token(file_name: &str) -> Result<&str> {
    let token = file_name
        .split('.')
        .nth(1)
        .and_then(|token| token.rsplit_once('_'))
        .map(|(_, token)| token)
        .ok_or_else(|| TrackingError::FilenameParse {
            name: file_name.to_owned(),
            reason: "no video timestamp in prediction file name".to_owned(),
        })?;
    parse_timestamp(file_name, token)?;
    Ok(token)
}

/// `<video stem>.predicted_<generated>.h5`
pub fn prediction_file_name(video_path: &Path, generated: NaiveDateTime) -> Result<String> {
    let stem = video_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| TrackingError::FilenameParse {
            name: video_path.display().to_string(),
            reason: "not a file name".to_owned(),
        })?;
    Ok(format!(
        "{}.predicted_{}.{}",
        stem,
        generated.format("%Y-%m-%dT%H:%M:%S%.6f"),
        RESULT_EXTENSION
    ))
}

fn parse_timestamp(file_name: &str, token: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).map_err(|source| {
        TrackingError::Timestamp {
            name: file_name.to_owned(),
            value: token.to_owned(),
            source,
        }
    })
}

/// One recorded session and whether its video has been tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub subject_id: String,
    pub session_type: String,
    pub timestamp: NaiveDateTime,
    pub video_path: PathBuf,
    pub tracking_completed: bool,
}

impl SessionRecord {
    pub fn new(video: VideoName, video_path: PathBuf, tracking_completed: bool) -> Self {
        let VideoName {
            subject_id,
            session_type,
            timestamp,
            ..
        } = video;
        Self {
            subject_id,
            session_type,
            timestamp,
            video_path,
            tracking_completed,
        }
    }

    /// `<subject>_<session_type>_<ISO timestamp>`, names scripts and logs.
    pub fn session_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.subject_id,
            self.session_type,
            self.timestamp.format(SESSION_ID_FORMAT)
        )
    }
}
