//! Collaborator ports used by the progression orchestrator.
//!
//! Accounts, workout history and companions live in external stores. The
//! orchestrator depends only on these traits; `FileStore` is the local
//! implementation and tests plug in in-memory fakes.

use crate::{CompanionState, ProfileUpdate, Result, UserProgression, WorkoutSession, WorkoutSummary};
use async_trait::async_trait;

/// Read and update user progression records
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Returns `None` if the user has no profile
    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProgression>>;

    /// Apply field updates to an existing profile
    ///
    /// # Errors
    /// `Error::NotFound` if the profile does not exist, `Error::Persistence`
    /// if the write fails.
    async fn update_user_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()>;
}

/// Read workout history
#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    /// Up to `limit` sessions, most recent first
    async fn get_recent_workouts(&self, user_id: &str, limit: usize)
        -> Result<Vec<WorkoutSession>>;

    /// Returns `None` if the user has no recorded workouts
    async fn get_workout_summary(&self, user_id: &str) -> Result<Option<WorkoutSummary>>;
}

/// Read and persist a user's companion
#[async_trait]
pub trait CompanionRepository: Send + Sync {
    /// Returns `None` if the user has no companion yet
    async fn get_companion(&self, user_id: &str) -> Result<Option<CompanionState>>;

    async fn persist_companion(&self, user_id: &str, companion: &CompanionState) -> Result<()>;
}
