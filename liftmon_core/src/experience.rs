//! Experience scoring for completed workouts.
//!
//! A workout is scored as the sum of six components:
//! - Base award for showing up
//! - Completion-rate bonus above 70% of planned sets
//! - Perfect-workout bonus when every planned set was completed
//! - Improvement bonus against the previous session
//! - Duration bonus for sessions of five minutes or more
//! - Consistency bonus for an active streak

use crate::{WorkoutExercise, WorkoutSession};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BASE_EXP: u64 = 50;
pub const PERFECT_WORKOUT_BONUS: u64 = 25;
/// Awarded for the first workout ever and for each exercise not seen last time
pub const NEW_EXERCISE_BONUS: u64 = 15;
pub const WEIGHT_UNIT_BONUS: u64 = 5;
pub const REP_UNIT_BONUS: u64 = 2;
pub const EXTRA_SET_BONUS: u64 = 3;

/// Completion rate (in tenths) above which the completion bonus kicks in
const COMPLETION_THRESHOLD_TENTHS: i64 = 7;
const MIN_DURATION_SECONDS: u32 = 300;
const DURATION_EXP_PER_MINUTE: u64 = 2;
const MAX_DURATION_BONUS: u64 = 20;
const STREAK_EXP_PER_DAY: u64 = 10;
const MAX_STREAK_BONUS: u64 = 50;

/// Which component a breakdown line belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AwardComponent {
    Base,
    Completion,
    Perfect,
    Improvement,
    Duration,
    Consistency,
}

/// One human-readable line of an award breakdown
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakdownItem {
    pub component: AwardComponent,
    pub label: String,
    pub amount: u64,
}

impl fmt::Display for BreakdownItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: +{} XP", self.label, self.amount)
    }
}

/// Experience awarded for one workout
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperienceAward {
    pub total: u64,
    pub base: u64,
    pub completion_bonus: u64,
    pub improvement_bonus: u64,
    pub duration_bonus: u64,
    pub consistency_bonus: u64,
    pub perfect_bonus: u64,
    pub breakdown: Vec<BreakdownItem>,
}

impl ExperienceAward {
    /// Sum of the six named components
    pub fn component_sum(&self) -> u64 {
        self.base
            + self.completion_bonus
            + self.improvement_bonus
            + self.duration_bonus
            + self.consistency_bonus
            + self.perfect_bonus
    }
}

/// Score a completed workout
///
/// `previous` is the most recent earlier session (if any) and
/// `current_streak_days` the number of consecutive training days.
pub fn calculate_experience(
    current: &WorkoutSession,
    previous: Option<&WorkoutSession>,
    current_streak_days: u32,
) -> ExperienceAward {
    let total_sets = current.total_sets();
    let completed_sets = current.completed_sets();

    let base = BASE_EXP;
    let completion_bonus = completion_bonus(completed_sets, total_sets);
    let perfect_bonus = if total_sets > 0 && completed_sets >= total_sets {
        PERFECT_WORKOUT_BONUS
    } else {
        0
    };
    let improvement_bonus = improvement_bonus(current, previous);
    let duration_bonus = duration_bonus(current.duration_seconds);
    let consistency_bonus = consistency_bonus(current_streak_days);

    let mut breakdown = Vec::new();
    let mut push = |component, label: String, amount: u64| {
        if amount > 0 {
            breakdown.push(BreakdownItem {
                component,
                label,
                amount,
            });
        }
    };

    push(AwardComponent::Base, "Workout completed".into(), base);
    push(
        AwardComponent::Completion,
        format!("Completion rate ({}%)", completion_percent(completed_sets, total_sets)),
        completion_bonus,
    );
    push(AwardComponent::Perfect, "Perfect workout".into(), perfect_bonus);
    push(
        AwardComponent::Improvement,
        if previous.is_some() {
            "Progress & improvement".into()
        } else {
            "First workout".into()
        },
        improvement_bonus,
    );
    push(
        AwardComponent::Duration,
        format!("Duration ({} min)", current.duration_minutes()),
        duration_bonus,
    );
    push(
        AwardComponent::Consistency,
        format!("{}-day streak", current_streak_days),
        consistency_bonus,
    );

    let award = ExperienceAward {
        total: base
            + completion_bonus
            + improvement_bonus
            + duration_bonus
            + consistency_bonus
            + perfect_bonus,
        base,
        completion_bonus,
        improvement_bonus,
        duration_bonus,
        consistency_bonus,
        perfect_bonus,
        breakdown,
    };

    tracing::debug!(
        "Scored workout {}: {} XP ({} of {} sets, streak {})",
        current.id,
        award.total,
        completed_sets,
        total_sets,
        current_streak_days
    );

    award
}

fn completion_percent(completed_sets: u32, total_sets: u32) -> u64 {
    if total_sets == 0 {
        return 0;
    }
    u64::from(completed_sets) * 100 / u64::from(total_sets)
}

/// floor(base * (rate - 0.7)), computed in integers so 100% gives exactly 15
fn completion_bonus(completed_sets: u32, total_sets: u32) -> u64 {
    if total_sets == 0 {
        return 0;
    }
    let completed = i64::from(completed_sets);
    let total = i64::from(total_sets);
    let excess_tenths = completed * 10 - COMPLETION_THRESHOLD_TENTHS * total;
    if excess_tenths <= 0 {
        return 0;
    }
    (BASE_EXP as i64 * excess_tenths / (10 * total)) as u64
}

fn improvement_bonus(current: &WorkoutSession, previous: Option<&WorkoutSession>) -> u64 {
    let Some(previous) = previous else {
        return NEW_EXERCISE_BONUS;
    };

    current
        .exercises
        .iter()
        .map(|exercise| match previous.exercise(&exercise.name) {
            Some(prior) => exercise_improvement(exercise, prior),
            None => NEW_EXERCISE_BONUS,
        })
        .sum()
}

/// Improvement of one exercise over the same exercise last session
///
/// Every completed set that beats last session's best set by volume earns
/// points for the extra weight and extra reps; finishing more sets than last
/// time earns a flat amount per extra set.
fn exercise_improvement(current: &WorkoutExercise, prior: &WorkoutExercise) -> u64 {
    let (best_weight, best_reps, best_volume) = prior
        .best_completed_set()
        .map(|s| (s.weight, s.reps, s.volume()))
        .unwrap_or((0, 0, 0));

    let set_bonus: u64 = current
        .sets
        .iter()
        .filter(|s| s.completed && s.volume() > best_volume)
        .map(|s| {
            u64::from(s.weight.saturating_sub(best_weight)) * WEIGHT_UNIT_BONUS
                + u64::from(s.reps.saturating_sub(best_reps)) * REP_UNIT_BONUS
        })
        .sum();

    let extra_sets = current.completed_sets.saturating_sub(prior.completed_sets);

    set_bonus + u64::from(extra_sets) * EXTRA_SET_BONUS
}

fn duration_bonus(duration_seconds: u32) -> u64 {
    if duration_seconds < MIN_DURATION_SECONDS {
        return 0;
    }
    (u64::from(duration_seconds / 60) * DURATION_EXP_PER_MINUTE).min(MAX_DURATION_BONUS)
}

fn consistency_bonus(current_streak_days: u32) -> u64 {
    if current_streak_days <= 1 {
        return 0;
    }
    (u64::from(current_streak_days) * STREAK_EXP_PER_DAY).min(MAX_STREAK_BONUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkoutSet;
    use chrono::Utc;
    use uuid::Uuid;

    fn set(n: u32, weight: u32, reps: u32, completed: bool) -> WorkoutSet {
        WorkoutSet {
            set_number: n,
            weight,
            reps,
            completed,
            previous: String::new(),
        }
    }

    fn exercise(name: &str, sets: Vec<WorkoutSet>) -> WorkoutExercise {
        let completed = sets.iter().filter(|s| s.completed).count() as u32;
        WorkoutExercise {
            name: name.into(),
            total_sets: sets.len() as u32,
            completed_sets: completed,
            sets,
        }
    }

    fn session(exercises: Vec<WorkoutExercise>, duration_seconds: u32) -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            exercises,
            duration_seconds,
            completed_at: Utc::now(),
            date: "2024-01-15".into(),
            workout_type: "strength".into(),
        }
    }

    fn squat_3x5(weight: u32) -> WorkoutExercise {
        exercise(
            "Squat",
            vec![
                set(1, weight, 5, true),
                set(2, weight, 5, true),
                set(3, weight, 5, true),
            ],
        )
    }

    #[test]
    fn test_unchanged_perfect_workout_total() {
        let previous = session(vec![squat_3x5(100)], 400);
        let current = session(vec![squat_3x5(100)], 400);

        let award = calculate_experience(&current, Some(&previous), 0);

        assert_eq!(award.base, 50);
        assert_eq!(award.completion_bonus, 15);
        assert_eq!(award.perfect_bonus, 25);
        assert_eq!(award.duration_bonus, 12); // 6 whole minutes
        assert_eq!(award.improvement_bonus, 0);
        assert_eq!(award.consistency_bonus, 0);
        assert_eq!(award.total, 102);
        assert_eq!(award.breakdown.len(), 4);
    }

    #[test]
    fn test_first_workout_gets_flat_bonus() {
        let current = session(vec![squat_3x5(100), squat_3x5(80)], 0);
        let award = calculate_experience(&current, None, 0);
        assert_eq!(award.improvement_bonus, 15);
        assert_eq!(award.breakdown[3].label, "First workout");
    }

    #[test]
    fn test_completion_bonus_only_above_seventy_percent() {
        let mut sets: Vec<_> = (1..=10).map(|n| set(n, 50, 5, n <= 7)).collect();
        let seventy = session(vec![exercise("Row", sets.clone())], 0);
        assert_eq!(calculate_experience(&seventy, None, 0).completion_bonus, 0);

        sets[7].completed = true;
        let eighty = session(vec![exercise("Row", sets.clone())], 0);
        assert_eq!(calculate_experience(&eighty, None, 0).completion_bonus, 5);

        sets[8].completed = true;
        let ninety = session(vec![exercise("Row", sets)], 0);
        assert_eq!(calculate_experience(&ninety, None, 0).completion_bonus, 10);
    }

    #[test]
    fn test_completion_bonus_floors_fractional_rates() {
        // 5/6 = 0.8333.. -> floor(50 * 0.1333..) = 6
        assert_eq!(completion_bonus(5, 6), 6);
        assert_eq!(completion_bonus(0, 0), 0);
    }

    #[test]
    fn test_perfect_bonus_requires_every_set() {
        let perfect = session(vec![squat_3x5(100)], 0);
        assert_eq!(calculate_experience(&perfect, None, 0).perfect_bonus, 25);

        let mut sets = squat_3x5(100).sets;
        sets[2].completed = false;
        let missed = session(vec![exercise("Squat", sets)], 0);
        assert_eq!(calculate_experience(&missed, None, 0).perfect_bonus, 0);

        let empty = session(vec![], 0);
        assert_eq!(calculate_experience(&empty, None, 0).perfect_bonus, 0);
    }

    #[test]
    fn test_improvement_weight_and_reps() {
        let previous = session(vec![squat_3x5(100)], 0);
        let current = session(
            vec![exercise(
                "Squat",
                vec![
                    set(1, 105, 5, true), // +5 kg -> 25
                    set(2, 100, 7, true), // +2 reps -> 4
                    set(3, 100, 5, true), // equal volume, nothing
                ],
            )],
            0,
        );

        let award = calculate_experience(&current, Some(&previous), 0);
        assert_eq!(award.improvement_bonus, 29);
    }

    #[test]
    fn test_heavier_but_lower_volume_set_earns_nothing() {
        let previous = session(vec![squat_3x5(100)], 0);
        let current = session(
            vec![exercise("Squat", vec![set(1, 120, 3, true)])],
            0,
        );
        let award = calculate_experience(&current, Some(&previous), 0);
        assert_eq!(award.improvement_bonus, 0);
    }

    #[test]
    fn test_extra_completed_sets_and_new_exercise() {
        let previous = session(vec![exercise("Squat", vec![set(1, 100, 5, true)])], 0);
        let current = session(
            vec![
                exercise(
                    "Squat",
                    vec![set(1, 100, 5, true), set(2, 90, 5, true), set(3, 80, 5, true)],
                ),
                squat_3x5_named("Deadlift"),
            ],
            0,
        );

        let award = calculate_experience(&current, Some(&previous), 0);
        // Two extra completed sets (6) plus a new exercise (15)
        assert_eq!(award.improvement_bonus, 21);
    }

    fn squat_3x5_named(name: &str) -> WorkoutExercise {
        WorkoutExercise {
            name: name.into(),
            ..squat_3x5(60)
        }
    }

    #[test]
    fn test_duration_bonus_threshold_and_cap() {
        assert_eq!(duration_bonus(299), 0);
        assert_eq!(duration_bonus(300), 10);
        assert_eq!(duration_bonus(400), 12);
        assert_eq!(duration_bonus(3600), 20);
    }

    #[test]
    fn test_consistency_bonus() {
        assert_eq!(consistency_bonus(0), 0);
        assert_eq!(consistency_bonus(1), 0);
        assert_eq!(consistency_bonus(2), 20);
        assert_eq!(consistency_bonus(5), 50);
        assert_eq!(consistency_bonus(30), 50);
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let previous = session(vec![squat_3x5(100)], 900);
        for streak in 0..8 {
            for weight in [80, 100, 110] {
                let mut current = session(vec![squat_3x5(weight), squat_3x5_named("Press")], 0);
                current.exercises[0].sets[1].completed = weight != 100;
                current.exercises[0].completed_sets = current.exercises[0]
                    .sets
                    .iter()
                    .filter(|s| s.completed)
                    .count() as u32;
                current.duration_seconds = streak * 250;

                let award = calculate_experience(&current, Some(&previous), streak);
                assert_eq!(award.total, award.component_sum());
                let listed: u64 = award.breakdown.iter().map(|b| b.amount).sum();
                assert_eq!(award.total, listed);
            }
        }
    }

    #[test]
    fn test_breakdown_order_and_format() {
        let previous = session(vec![squat_3x5(100)], 0);
        let current = session(vec![squat_3x5(105)], 1800);

        let award = calculate_experience(&current, Some(&previous), 3);
        let components: Vec<_> = award.breakdown.iter().map(|b| b.component).collect();
        assert_eq!(
            components,
            vec![
                AwardComponent::Base,
                AwardComponent::Completion,
                AwardComponent::Perfect,
                AwardComponent::Improvement,
                AwardComponent::Duration,
                AwardComponent::Consistency,
            ]
        );
        assert_eq!(award.breakdown[0].to_string(), "Workout completed: +50 XP");
        assert_eq!(award.breakdown[5].to_string(), "3-day streak: +30 XP");
    }
}
