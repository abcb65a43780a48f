//! Append-only workout log.
//!
//! Completed workouts are appended to a JSONL (JSON Lines) file with file
//! locking to ensure safe concurrent access.

use crate::{Result, WorkoutSession};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Workout sink trait for recording completed sessions
pub trait WorkoutSink {
    fn append(&mut self, workout: &WorkoutSession) -> Result<()>;
}

/// JSONL-based workout sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl WorkoutSink for JsonlSink {
    fn append(&mut self, workout: &WorkoutSession) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(workout)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended workout {} to log", workout.id);
        Ok(())
    }
}

/// Read all workouts from a log file, in the order they were appended
pub fn read_workouts(path: &Path) -> Result<Vec<WorkoutSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut workouts = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutSession>(&line) {
            Ok(workout) => workouts.push(workout),
            Err(e) => {
                // A torn or hand-edited line must not hide the rest of the history
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workouts from log", workouts.len());
    Ok(workouts)
}
