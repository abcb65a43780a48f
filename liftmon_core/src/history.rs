//! Workout history queries.
//!
//! Recent-session lookup and training streaks, computed from the workout log.

use crate::{Result, WorkoutSession, WorkoutSummary};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use std::path::Path;

/// Load up to `limit` workouts from a log, newest first
pub fn load_recent_workouts(log_path: &Path, limit: usize) -> Result<Vec<WorkoutSession>> {
    let mut workouts = crate::wal::read_workouts(log_path)?;

    // Sort by completion time, newest first. The sort is stable, so for equal
    // timestamps the later log entry wins after the reverse.
    workouts.reverse();
    workouts.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    workouts.truncate(limit);

    tracing::debug!("Loaded {} recent workouts from {:?}", workouts.len(), log_path);
    Ok(workouts)
}

/// Calendar day a workout counts towards
///
/// Uses the recorded date string, falling back to the completion timestamp
/// when the string is missing or malformed.
pub fn workout_day(workout: &WorkoutSession) -> NaiveDate {
    NaiveDate::parse_from_str(&workout.date, "%Y-%m-%d")
        .unwrap_or_else(|_| workout.completed_at.date_naive())
}

/// Number of consecutive training days ending today or yesterday
///
/// A streak is still alive on a day the user has not trained yet.
pub fn current_streak(workouts: &[WorkoutSession], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = workouts.iter().map(workout_day).collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Summarize a user's workout log; `None` if nothing was ever logged
pub fn summarize(workouts: &[WorkoutSession], today: NaiveDate) -> Option<WorkoutSummary> {
    if workouts.is_empty() {
        return None;
    }
    Some(WorkoutSummary {
        current_streak: current_streak(workouts, today),
        total_sessions: workouts.len() as u32,
    })
}
