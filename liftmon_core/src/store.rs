//! File-backed implementation of the collaborator ports.
//!
//! Layout under the data directory:
//! - `profiles/<user>.json`: user progression
//! - `companions/<user>.json`: companion state
//! - `workouts/<user>.jsonl`: append-only workout log

use crate::history::{load_recent_workouts, summarize};
use crate::ports::{CompanionRepository, ProfileRepository, WorkoutRepository};
use crate::state::{load_record, save_record};
use crate::wal::{read_workouts, JsonlSink, WorkoutSink};
use crate::{
    CompanionState, Error, ProfileUpdate, Result, UserProgression, WorkoutSession, WorkoutSummary,
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

/// Local store rooted at a data directory
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn profile_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join("profiles")
            .join(format!("{}.json", file_key(user_id)?)))
    }

    pub fn companion_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join("companions")
            .join(format!("{}.json", file_key(user_id)?)))
    }

    pub fn workout_log_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join("workouts")
            .join(format!("{}.jsonl", file_key(user_id)?)))
    }

    /// Create a profile; fails if the user already has one
    pub fn create_profile(&self, profile: &UserProgression) -> Result<()> {
        let path = self.profile_path(&profile.user_id)?;
        if path.exists() {
            return Err(Error::Other(format!(
                "user '{}' already exists",
                profile.user_id
            )));
        }
        save_record(profile, &path)
    }

    /// Load a profile synchronously (for read-only front-end views)
    pub fn load_profile(&self, user_id: &str) -> Result<Option<UserProgression>> {
        load_record(&self.profile_path(user_id)?)
    }

    pub fn load_companion(&self, user_id: &str) -> Result<Option<CompanionState>> {
        load_record(&self.companion_path(user_id)?)
    }

    pub fn save_companion(&self, user_id: &str, companion: &CompanionState) -> Result<()> {
        save_record(companion, &self.companion_path(user_id)?)
    }

    /// Append a completed workout to the user's log
    pub fn record_workout(&self, user_id: &str, workout: &WorkoutSession) -> Result<()> {
        let mut sink = JsonlSink::new(self.workout_log_path(user_id)?);
        sink.append(workout)
    }

    pub fn all_workouts(&self, user_id: &str) -> Result<Vec<WorkoutSession>> {
        read_workouts(&self.workout_log_path(user_id)?)
    }
}

/// User ids become file names, so they are restricted to a safe alphabet
fn file_key(user_id: &str) -> Result<&str> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !user_id.starts_with('.');
    if valid {
        Ok(user_id)
    } else {
        Err(Error::Other(format!("invalid user id '{}'", user_id)))
    }
}

/// Store IO failures surface to the workflow as persistence errors
fn persistence(error: Error) -> Error {
    match error {
        Error::Persistence(_) | Error::NotFound(_) => error,
        other => Error::Persistence(other.to_string()),
    }
}

/// Run locking file IO on the blocking pool so it does not stall the runtime
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Persistence(format!("store task failed: {}", e)))?
        .map_err(persistence)
}

#[async_trait]
impl ProfileRepository for FileStore {
    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProgression>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        blocking(move || store.load_profile(&user_id)).await
    }

    async fn update_user_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        let path = self.profile_path(user_id).map_err(persistence)?;
        let user_id = user_id.to_string();
        let update = update.clone();
        blocking(move || {
            let mut profile: UserProgression = load_record(&path)?
                .ok_or_else(|| Error::NotFound(format!("profile for user '{}'", user_id)))?;
            profile.apply(&update);
            save_record(&profile, &path)
        })
        .await
    }
}

#[async_trait]
impl WorkoutRepository for FileStore {
    async fn get_recent_workouts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<WorkoutSession>> {
        let path = self.workout_log_path(user_id).map_err(persistence)?;
        blocking(move || load_recent_workouts(&path, limit)).await
    }

    async fn get_workout_summary(&self, user_id: &str) -> Result<Option<WorkoutSummary>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        let workouts = blocking(move || store.all_workouts(&user_id)).await?;
        Ok(summarize(&workouts, Utc::now().date_naive()))
    }
}

#[async_trait]
impl CompanionRepository for FileStore {
    async fn get_companion(&self, user_id: &str) -> Result<Option<CompanionState>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        blocking(move || store.load_companion(&user_id)).await
    }

    async fn persist_companion(&self, user_id: &str, companion: &CompanionState) -> Result<()> {
        let store = self.clone();
        let user_id = user_id.to_string();
        let companion = companion.clone();
        blocking(move || store.save_companion(&user_id, &companion)).await
    }
}
