/*!
 * Write-once question-set snapshots.
 *
 * Before the pipeline mutates a lesson's quiz it writes the current active
 * rows to a JSON file under `<backup_dir>/<course_id>/`. Snapshot files are
 * created with `persist_noclobber` and never overwritten or deleted by the
 * tool; `restore` replays one back into the store question by question,
 * matching on question id.
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::errors::PipelineError;
use crate::store::models::QuestionRecord;
use crate::store::Repository;

/// Filename timestamp key, fixed-width so names sort chronologically
const TIMESTAMP_KEY_FORMAT: &str = "%Y%m%dT%H%M%S%3f";

/// One lesson's active question set at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSnapshot {
    /// Course the lesson belongs to
    pub course_id: String,
    /// Lesson whose questions were captured
    pub lesson_id: String,
    /// Capture time, RFC 3339
    pub created_at: String,
    /// Active questions in display order
    pub questions: Vec<QuestionRecord>,
}

impl BackupSnapshot {
    /// Capture the given rows under the current timestamp
    pub fn capture(course_id: &str, lesson_id: &str, questions: Vec<QuestionRecord>) -> Self {
        BackupSnapshot {
            course_id: course_id.to_string(),
            lesson_id: lesson_id.to_string(),
            created_at: Utc::now().to_rfc3339(),
            questions,
        }
    }
}

/// Snapshot directory rooted at the configured backup path
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Create a store over the given root directory.
    ///
    /// The directory is created lazily on the first write, so pointing at a
    /// not-yet-existing path is fine.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        BackupStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory snapshots are written under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a snapshot and return the created file path.
    ///
    /// The file lands as `<root>/<course_id>/<lesson_id>-<timestamp>.json`.
    /// Writing goes through a temp file in the same directory followed by
    /// `persist_noclobber`, so a name collision fails instead of replacing
    /// an earlier snapshot.
    pub fn write_snapshot(&self, snapshot: &BackupSnapshot) -> Result<PathBuf, PipelineError> {
        let dir = self.root.join(&snapshot.course_id);
        fs::create_dir_all(&dir).map_err(|e| {
            PipelineError::Backup(format!("Failed to create backup directory {:?}: {}", dir, e))
        })?;

        let key = Utc::now().format(TIMESTAMP_KEY_FORMAT);
        let path = dir.join(format!("{}-{}.json", snapshot.lesson_id, key));

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| PipelineError::Backup(format!("Failed to encode snapshot: {}", e)))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| {
            PipelineError::Backup(format!("Failed to create temp file in {:?}: {}", dir, e))
        })?;
        temp.write_all(json.as_bytes())
            .map_err(|e| PipelineError::Backup(format!("Failed to write snapshot: {}", e)))?;
        temp.persist_noclobber(&path).map_err(|e| {
            PipelineError::Backup(format!("Failed to persist snapshot {:?}: {}", path, e))
        })?;

        info!(
            "Backed up {} question(s) for lesson {} to {:?}",
            snapshot.questions.len(),
            snapshot.lesson_id,
            path
        );

        Ok(path)
    }

    /// Load a snapshot from an explicit path
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<BackupSnapshot, PipelineError> {
        let path = path.as_ref();

        let json = fs::read_to_string(path).map_err(|e| {
            PipelineError::Backup(format!("Failed to read snapshot {:?}: {}", path, e))
        })?;

        serde_json::from_str(&json).map_err(|e| {
            PipelineError::Backup(format!("Failed to decode snapshot {:?}: {}", path, e))
        })
    }

    /// Find the most recent snapshot for a lesson, if any.
    ///
    /// Filenames carry a fixed-width timestamp key, so the lexicographic
    /// maximum is the chronological latest.
    pub fn latest_for_lesson(
        &self,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<Option<PathBuf>, PipelineError> {
        let dir = self.root.join(course_id);
        if !dir.is_dir() {
            return Ok(None);
        }

        let prefix = format!("{}-", lesson_id);
        let mut latest: Option<PathBuf> = None;

        for entry in WalkDir::new(&dir).max_depth(1) {
            let entry = entry.map_err(|e| {
                PipelineError::Backup(format!("Failed to scan backup directory {:?}: {}", dir, e))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(&prefix) || !name.ends_with(".json") {
                continue;
            }

            let path = entry.path().to_path_buf();
            match &latest {
                Some(current) if current.file_name() >= path.file_name() => {}
                _ => latest = Some(path),
            }
        }

        debug!(
            "Latest snapshot for lesson {} in course {}: {:?}",
            lesson_id, course_id, latest
        );

        Ok(latest)
    }

    /// List every snapshot under a course, oldest first
    pub fn snapshots_for_course(&self, course_id: &str) -> Result<Vec<PathBuf>, PipelineError> {
        let dir = self.root.join(course_id);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&dir).max_depth(1) {
            let entry = entry.map_err(|e| {
                PipelineError::Backup(format!("Failed to scan backup directory {:?}: {}", dir, e))
            })?;

            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(".json")
            {
                paths.push(entry.path().to_path_buf());
            }
        }

        paths.sort();
        Ok(paths)
    }
}

/// Replay a snapshot into the store, matching rows by question id.
///
/// Returns the number of questions written back. A snapshot row whose id no
/// longer exists in the store is an identity drift, not a silent skip.
pub async fn restore_snapshot(
    repository: &Repository,
    snapshot: &BackupSnapshot,
) -> Result<usize, PipelineError> {
    let mut restored = 0usize;

    for question in &snapshot.questions {
        let matched = repository
            .replace_question(question)
            .await
            .map_err(|e| PipelineError::Store(e.to_string()))?;

        if matched == 0 {
            return Err(PipelineError::IdentityDrift(question.id.clone()));
        }

        restored += 1;
    }

    info!(
        "Restored {} question(s) for lesson {} from snapshot taken {}",
        restored, snapshot.lesson_id, snapshot.created_at
    );

    Ok(restored)
}
