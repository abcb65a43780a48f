//! Workout-completion workflow.
//!
//! Scores a finished workout, levels the user, shares experience with the
//! companion and persists both records:
//!
//! Idle -> FetchingProfile -> FetchingHistory -> Scoring -> PersistingUser
//! -> PersistingCompanion -> Done
//!
//! Every fetch or persist step can fail and abort the workflow, except the
//! companion step: by then user progression is committed, so a companion
//! failure only drops the companion part of the result.
//!
//! Writes are plain read-modify-write. Two completions for the same user that
//! run concurrently can overwrite each other (last write wins).

use crate::companion::{apply_experience, companion_exp_share, CompanionCurve};
use crate::config::Config;
use crate::experience::{calculate_experience, BreakdownItem, ExperienceAward};
use crate::level_curve::level_for_total_exp;
use crate::ports::{CompanionRepository, ProfileRepository, WorkoutRepository};
use crate::species::{default_species, SpeciesTable};
use crate::{CompanionState, Error, ProfileUpdate, Result, UserProgression, WorkoutSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Step of the workout-completion workflow
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionStage {
    Idle,
    FetchingProfile,
    FetchingHistory,
    Scoring,
    PersistingUser,
    PersistingCompanion,
    Done,
}

impl fmt::Display for CompletionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompletionStage::Idle => "idle",
            CompletionStage::FetchingProfile => "fetching profile",
            CompletionStage::FetchingHistory => "fetching history",
            CompletionStage::Scoring => "scoring",
            CompletionStage::PersistingUser => "persisting user",
            CompletionStage::PersistingCompanion => "persisting companion",
            CompletionStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Companion part of a workout-completion result
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompanionProgress {
    pub name: String,
    pub species: String,
    pub previous_level: u32,
    pub new_level: u32,
    pub exp_gained: u64,
    pub evolved: bool,
    /// Display name of the species evolved into
    pub evolved_into: Option<String>,
}

/// Everything the front end shows after a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LevelUpResult {
    pub previous_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
    pub exp_gained: u64,
    /// Cumulative experience after this workout
    pub total_exp: u64,
    pub breakdown: Vec<BreakdownItem>,
    pub award: ExperienceAward,
    /// Absent when the companion could not be loaded or saved
    pub companion: Option<CompanionProgress>,
}

/// Runs the workout-completion workflow against the collaborator ports
pub struct ProgressionOrchestrator {
    profiles: Arc<dyn ProfileRepository>,
    workouts: Arc<dyn WorkoutRepository>,
    companions: Arc<dyn CompanionRepository>,
    curve: CompanionCurve,
    species: &'static SpeciesTable,
    recent_limit: usize,
    default_species: String,
}

impl ProgressionOrchestrator {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        workouts: Arc<dyn WorkoutRepository>,
        companions: Arc<dyn CompanionRepository>,
        config: &Config,
    ) -> Self {
        Self {
            profiles,
            workouts,
            companions,
            curve: CompanionCurve::from(&config.companion),
            species: default_species(),
            recent_limit: config.history.recent_limit.max(2),
            default_species: config.companion.default_species.clone(),
        }
    }

    /// Score a completed workout and update the user and companion
    ///
    /// The workout is expected to already be in the user's history; it is
    /// skipped when looking for the previous session.
    ///
    /// # Errors
    /// - `Error::InvalidWorkout` if the session is malformed
    /// - `Error::NotFound` if the user has no profile
    /// - any collaborator error from the history fetch or the profile update
    pub async fn process_workout_completion(
        &self,
        user_id: &str,
        workout: &WorkoutSession,
    ) -> Result<LevelUpResult> {
        self.process_workout_completion_at(user_id, workout, Utc::now())
            .await
    }

    /// Same as `process_workout_completion` with an explicit clock
    pub async fn process_workout_completion_at(
        &self,
        user_id: &str,
        workout: &WorkoutSession,
        now: DateTime<Utc>,
    ) -> Result<LevelUpResult> {
        let mut stage = CompletionStage::Idle;

        let violations = workout.validate();
        if !violations.is_empty() {
            return Err(failed(
                stage,
                user_id,
                Error::InvalidWorkout(violations.join("; ")),
            ));
        }

        advance(&mut stage, CompletionStage::FetchingProfile, user_id);
        let profile = match self.profiles.get_user_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                return Err(failed(
                    stage,
                    user_id,
                    Error::NotFound(format!("profile for user '{}'", user_id)),
                ))
            }
            Err(e) => return Err(failed(stage, user_id, e)),
        };

        // History and summary are independent reads
        advance(&mut stage, CompletionStage::FetchingHistory, user_id);
        let (recent, summary) = tokio::join!(
            self.workouts.get_recent_workouts(user_id, self.recent_limit),
            self.workouts.get_workout_summary(user_id),
        );
        let recent = recent.map_err(|e| failed(stage, user_id, e))?;
        let streak = summary
            .map_err(|e| failed(stage, user_id, e))?
            .map(|s| s.current_streak)
            .unwrap_or(0);
        let previous = recent.iter().find(|w| w.id != workout.id);

        advance(&mut stage, CompletionStage::Scoring, user_id);
        let award = calculate_experience(workout, previous, streak);
        let previous_level = level_for_total_exp(profile.current_exp);
        let total_exp = profile.current_exp.saturating_add(award.total);
        let new_level = level_for_total_exp(total_exp);

        advance(&mut stage, CompletionStage::PersistingUser, user_id);
        let update = ProfileUpdate {
            current_exp: Some(total_exp),
            level: Some(new_level),
            total_workouts: Some(profile.total_workouts.saturating_add(1)),
            last_active: Some(now),
        };
        self.profiles
            .update_user_profile(user_id, &update)
            .await
            .map_err(|e| failed(stage, user_id, e))?;

        if new_level > previous_level {
            tracing::info!(
                "User {} leveled up: {} -> {}",
                user_id,
                previous_level,
                new_level
            );
        }

        advance(&mut stage, CompletionStage::PersistingCompanion, user_id);
        let companion_exp = companion_exp_share(award.total, workout);
        let companion = match self
            .progress_companion(user_id, &profile, companion_exp, now)
            .await
        {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!(
                    "Companion progression for user {} dropped while {}: {}",
                    user_id,
                    stage,
                    e
                );
                None
            }
        };

        advance(&mut stage, CompletionStage::Done, user_id);
        tracing::info!(
            "Workout {} for user {} {}: +{} XP (level {})",
            workout.id,
            user_id,
            stage,
            award.total,
            new_level
        );

        Ok(LevelUpResult {
            previous_level,
            new_level,
            leveled_up: new_level > previous_level,
            exp_gained: award.total,
            total_exp,
            breakdown: award.breakdown.clone(),
            award,
            companion,
        })
    }

    /// Load (or create) the companion, apply experience and save it
    async fn progress_companion(
        &self,
        user_id: &str,
        profile: &UserProgression,
        exp_gain: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<CompanionProgress>> {
        let companion = match self.companions.get_companion(user_id).await? {
            Some(companion) => companion,
            None => {
                let species = profile
                    .selected_species
                    .as_deref()
                    .unwrap_or(&self.default_species);
                let Some(definition) = self.species.get(species) else {
                    return Err(Error::UnknownSpecies(species.to_string()));
                };
                tracing::info!(
                    "Creating {} companion for user {}",
                    definition.key,
                    user_id
                );
                CompanionState::new(
                    definition.key.clone(),
                    definition.display_name.clone(),
                    self.curve.initial_max_exp(),
                    now,
                )
            }
        };

        let outcome = apply_experience(&companion, exp_gain, &self.curve, self.species, now);
        self.companions
            .persist_companion(user_id, &outcome.companion)
            .await?;

        Ok(Some(CompanionProgress {
            name: outcome.companion.name.clone(),
            species: outcome.companion.species.clone(),
            previous_level: outcome.previous_level,
            new_level: outcome.new_level,
            exp_gained: outcome.exp_gained,
            evolved: outcome.evolved(),
            evolved_into: outcome.evolution.as_ref().map(|e| e.to_name.clone()),
        }))
    }
}

fn advance(stage: &mut CompletionStage, next: CompletionStage, user_id: &str) {
    tracing::debug!("Workout completion for user {}: {} -> {}", user_id, stage, next);
    *stage = next;
}

fn failed(stage: CompletionStage, user_id: &str, error: Error) -> Error {
    tracing::warn!(
        "Workout completion for user {} failed while {}: {}",
        user_id,
        stage,
        error
    );
    error
}
