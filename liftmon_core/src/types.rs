//! Core domain types for the Liftmon system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout sessions, exercises and sets
//! - User progression state
//! - Companion state and its species
//! - Field updates handed to the profile collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Workout Types
// ============================================================================

/// A single working set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutSet {
    /// 1-based position within the exercise
    pub set_number: u32,
    pub weight: u32,
    pub reps: u32,
    #[serde(default)]
    pub completed: bool,
    /// Free-text annotation of what was done last time (e.g. "60 x 8")
    #[serde(default)]
    pub previous: String,
}

impl WorkoutSet {
    /// Training volume of the set (weight x reps)
    pub fn volume(&self) -> u64 {
        u64::from(self.weight) * u64::from(self.reps)
    }
}

/// One exercise within a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutExercise {
    /// Free-text name, used to match the exercise across sessions
    pub name: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
    pub total_sets: u32,
    pub completed_sets: u32,
}

impl WorkoutExercise {
    /// The completed set with the highest volume, if any set was completed
    pub fn best_completed_set(&self) -> Option<&WorkoutSet> {
        self.sets
            .iter()
            .filter(|s| s.completed)
            .max_by_key(|s| s.volume())
    }
}

fn default_workout_type() -> String {
    "strength".into()
}

/// A completed training session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutSession {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
    pub duration_seconds: u32,
    #[serde(default = "Utc::now")]
    pub completed_at: DateTime<Utc>,
    /// Calendar date of the session (YYYY-MM-DD)
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_workout_type")]
    pub workout_type: String,
}

impl WorkoutSession {
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.total_sets).sum()
    }

    pub fn completed_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.completed_sets).sum()
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_seconds / 60
    }

    /// Find an exercise by its name
    pub fn exercise(&self, name: &str) -> Option<&WorkoutExercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    /// Check the structural invariants of the session
    ///
    /// Returns a list of violations (empty if the session is well-formed).
    /// The set counters must agree with the recorded sets, so scoring from the
    /// counters sees the same session as the per-set flags. Weights, reps and
    /// durations cannot be negative by construction.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for exercise in &self.exercises {
            if exercise.completed_sets > exercise.total_sets {
                errors.push(format!(
                    "Exercise '{}': completed sets {} > total sets {}",
                    exercise.name, exercise.completed_sets, exercise.total_sets
                ));
            }
            if exercise.total_sets as usize != exercise.sets.len() {
                errors.push(format!(
                    "Exercise '{}': total sets {} != recorded sets {}",
                    exercise.name,
                    exercise.total_sets,
                    exercise.sets.len()
                ));
            }
            let flagged = exercise.sets.iter().filter(|s| s.completed).count();
            if exercise.completed_sets as usize != flagged {
                errors.push(format!(
                    "Exercise '{}': completed sets {} != sets marked completed {}",
                    exercise.name, exercise.completed_sets, flagged
                ));
            }
            if exercise.sets.iter().any(|s| s.set_number == 0) {
                errors.push(format!(
                    "Exercise '{}': set numbers are 1-based",
                    exercise.name
                ));
            }
        }

        errors
    }
}

// ============================================================================
// User Progression
// ============================================================================

/// A user's leveling state, as stored on the account record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProgression {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Cumulative experience
    pub current_exp: u64,
    pub level: u32,
    pub total_workouts: u32,
    /// Species key of the companion the user picked, if any
    #[serde(default)]
    pub selected_species: Option<String>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

impl UserProgression {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: String::new(),
            current_exp: 0,
            level: 1,
            total_workouts: 0,
            selected_species: None,
            last_active: None,
        }
    }

    /// Apply a set of field updates in place
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(exp) = update.current_exp {
            self.current_exp = exp;
        }
        if let Some(level) = update.level {
            self.level = level;
        }
        if let Some(total) = update.total_workouts {
            self.total_workouts = total;
        }
        if let Some(at) = update.last_active {
            self.last_active = Some(at);
        }
    }
}

/// Field updates for a user profile; `None` leaves the field untouched
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    pub current_exp: Option<u64>,
    pub level: Option<u32>,
    pub total_workouts: Option<u32>,
    pub last_active: Option<DateTime<Utc>>,
}

/// Aggregated workout statistics for a user
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutSummary {
    pub current_streak: u32,
    pub total_sessions: u32,
}

// ============================================================================
// Companion Types
// ============================================================================

/// A companion's leveling state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompanionState {
    /// Species key (changes only through evolution)
    pub species: String,
    pub name: String,
    pub level: u32,
    /// Experience accumulated within the current level
    pub current_exp: u64,
    /// Experience required to leave the current level
    pub max_exp: u64,
    /// Lifetime experience
    pub total_exp: u64,
    pub is_selected: bool,
    pub acquired_at: DateTime<Utc>,
    #[serde(default)]
    pub last_exp_gain_at: Option<DateTime<Utc>>,
}

impl CompanionState {
    /// A freshly selected companion: level 1, no experience
    ///
    /// `max_exp` is the level-1 requirement of the companion curve in use.
    pub fn new(
        species: impl Into<String>,
        name: impl Into<String>,
        max_exp: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            species: species.into(),
            name: name.into(),
            level: 1,
            current_exp: 0,
            max_exp: max_exp.max(1),
            total_exp: 0,
            is_selected: true,
            acquired_at: now,
            last_exp_gain_at: None,
        }
    }
}
