//! Companion progression.
//!
//! Companions level on a geometric curve: leaving level `n` costs
//! `base * multiplier^n` experience (level 1 costs a flat base amount).
//! A single award can cascade through several levels, and the first level-up
//! that satisfies the species' evolution gate swaps the species in place.

use crate::config::CompanionConfig;
use crate::species::SpeciesTable;
use crate::{CompanionState, WorkoutSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Share of the user's award (in percent) that the companion receives
const COMPANION_SHARE_PERCENT: u64 = 60;
const EXP_PER_EXERCISE: u64 = 2;
const LONG_SESSION_BONUS: u64 = 10;
const MEDIUM_SESSION_BONUS: u64 = 5;
const MIN_COMPANION_EXP: u64 = 5;

/// Per-level experience requirement of companions
#[derive(Clone, Debug, PartialEq)]
pub struct CompanionCurve {
    pub base_requirement: u64,
    pub multiplier: f64,
}

impl Default for CompanionCurve {
    fn default() -> Self {
        Self {
            base_requirement: 100,
            multiplier: 1.2,
        }
    }
}

impl From<&CompanionConfig> for CompanionCurve {
    fn from(config: &CompanionConfig) -> Self {
        Self {
            base_requirement: config.base_exp_requirement,
            multiplier: config.exp_multiplier,
        }
    }
}

impl CompanionCurve {
    /// Experience needed to leave level 1
    pub fn initial_max_exp(&self) -> u64 {
        self.base_requirement.max(1)
    }

    /// Experience needed to leave `level`
    ///
    /// Never zero, so a cascade always makes progress.
    pub fn max_exp_for_level(&self, level: u32) -> u64 {
        if level <= 1 {
            return self.initial_max_exp();
        }
        let exponent = i32::try_from(level).unwrap_or(i32::MAX);
        let required = self.base_requirement as f64 * self.multiplier.powi(exponent);
        if required >= u64::MAX as f64 {
            return u64::MAX;
        }
        (required as u64).max(1)
    }
}

/// A species change that happened during a level-up cascade
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvolutionEvent {
    pub from_species: String,
    pub to_species: String,
    pub to_name: String,
    pub at_level: u32,
}

/// Outcome of applying experience to a companion
#[derive(Clone, Debug, PartialEq)]
pub struct CompanionLevelUp {
    pub companion: CompanionState,
    pub previous_level: u32,
    pub new_level: u32,
    pub exp_gained: u64,
    pub evolution: Option<EvolutionEvent>,
}

impl CompanionLevelUp {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }

    pub fn evolved(&self) -> bool {
        self.evolution.is_some()
    }
}

/// Apply an experience award to a companion
///
/// Resolves every level-up the award pays for and evolves the companion at
/// most once. The returned state always satisfies `current_exp < max_exp`.
pub fn apply_experience(
    companion: &CompanionState,
    exp_gain: u64,
    curve: &CompanionCurve,
    species: &SpeciesTable,
    now: DateTime<Utc>,
) -> CompanionLevelUp {
    let mut state = companion.clone();
    let previous_level = state.level.max(1);
    let mut evolution = None;

    state.level = previous_level;
    state.total_exp = state.total_exp.saturating_add(exp_gain);
    state.current_exp = state.current_exp.saturating_add(exp_gain);
    state.last_exp_gain_at = Some(now);
    if state.max_exp == 0 {
        state.max_exp = curve.max_exp_for_level(state.level);
    }

    while state.current_exp >= state.max_exp {
        state.current_exp -= state.max_exp;
        state.level += 1;
        state.max_exp = curve.max_exp_for_level(state.level);

        tracing::debug!(
            "Companion {} reached level {} ({} / {} XP)",
            state.species,
            state.level,
            state.current_exp,
            state.max_exp
        );

        if evolution.is_none() {
            if let Some(target) = species.evolution_at(&state.species, state.level) {
                evolution = Some(EvolutionEvent {
                    from_species: state.species.clone(),
                    to_species: target.key.clone(),
                    to_name: target.display_name.clone(),
                    at_level: state.level,
                });
                state.species = target.key.clone();
                state.name = target.display_name.clone();
            }
        }
    }

    if let Some(event) = &evolution {
        tracing::info!(
            "Companion evolved from {} into {} at level {}",
            event.from_species,
            event.to_species,
            event.at_level
        );
    }
    if state.level > previous_level {
        tracing::info!(
            "Companion {} leveled up: {} -> {}",
            state.name,
            previous_level,
            state.level
        );
    }

    CompanionLevelUp {
        new_level: state.level,
        companion: state,
        previous_level,
        exp_gained: exp_gain,
        evolution,
    }
}

/// Experience a companion earns from a workout that paid `user_award` to its owner
///
/// 60% of the user's award, plus a little for every exercise and for longer
/// sessions, never less than 5.
pub fn companion_exp_share(user_award: u64, workout: &WorkoutSession) -> u64 {
    let share = user_award * COMPANION_SHARE_PERCENT / 100;
    let exercise_bonus = workout.exercises.len() as u64 * EXP_PER_EXERCISE;
    let duration_bonus = match workout.duration_minutes() {
        m if m >= 30 => LONG_SESSION_BONUS,
        m if m >= 15 => MEDIUM_SESSION_BONUS,
        _ => 0,
    };

    (share + exercise_bonus + duration_bonus).max(MIN_COMPANION_EXP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{build_default_species, default_species, Evolution, Species};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn fresh(species: &str) -> CompanionState {
        CompanionState::new(
            species,
            default_species().display_name(species),
            CompanionCurve::default().initial_max_exp(),
            now(),
        )
    }

    #[test]
    fn test_curve_values() {
        let curve = CompanionCurve::default();
        assert_eq!(curve.initial_max_exp(), 100);
        assert_eq!(curve.max_exp_for_level(1), 100);
        assert_eq!(curve.max_exp_for_level(2), 144);
        assert_eq!(curve.max_exp_for_level(3), 172);
        assert!(curve.max_exp_for_level(50) > curve.max_exp_for_level(49));
    }

    #[test]
    fn test_cascade_two_levels() {
        let companion = fresh("pikachu");
        let result = apply_experience(
            &companion,
            250,
            &CompanionCurve::default(),
            default_species(),
            now(),
        );

        assert_eq!(result.previous_level, 1);
        assert_eq!(result.new_level, 3);
        assert_eq!(result.companion.current_exp, 6);
        assert_eq!(result.companion.max_exp, 172);
        assert_eq!(result.companion.total_exp, 250);
        assert_eq!(result.companion.last_exp_gain_at, Some(now()));
        assert!(!result.evolved());
    }

    #[test]
    fn test_no_level_up_below_threshold() {
        let companion = fresh("bulbasaur");
        let result = apply_experience(
            &companion,
            99,
            &CompanionCurve::default(),
            default_species(),
            now(),
        );
        assert_eq!(result.new_level, 1);
        assert!(!result.leveled_up());
        assert_eq!(result.companion.current_exp, 99);
    }

    #[test]
    fn test_evolves_when_reaching_gate() {
        let curve = CompanionCurve::default();
        let mut companion = fresh("charmander");
        companion.level = 15;
        companion.max_exp = curve.max_exp_for_level(15);
        companion.current_exp = companion.max_exp - 1;

        let result = apply_experience(&companion, 1, &curve, default_species(), now());

        assert_eq!(result.new_level, 16);
        assert_eq!(result.companion.species, "charmeleon");
        assert_eq!(result.companion.name, "Charmeleon");
        assert_eq!(result.companion.current_exp, 0);
        let event = result.evolution.unwrap();
        assert_eq!(event.from_species, "charmander");
        assert_eq!(event.at_level, 16);
    }

    #[test]
    fn test_single_evolution_per_call() {
        // A chain that could evolve twice within one cascade
        let mut table = build_default_species();
        table.species.insert(
            "egg".into(),
            Species {
                key: "egg".into(),
                display_name: "Egg".into(),
                evolution: Some(Evolution {
                    target: "hatchling".into(),
                    level: 2,
                }),
            },
        );
        table.species.insert(
            "hatchling".into(),
            Species {
                key: "hatchling".into(),
                display_name: "Hatchling".into(),
                evolution: Some(Evolution {
                    target: "drake".into(),
                    level: 3,
                }),
            },
        );
        table.species.insert(
            "drake".into(),
            Species {
                key: "drake".into(),
                display_name: "Drake".into(),
                evolution: None,
            },
        );

        let companion = CompanionState::new("egg", "Egg", 100, now());
        let result = apply_experience(
            &companion,
            10_000,
            &CompanionCurve::default(),
            &table,
            now(),
        );

        assert!(result.new_level > 3);
        assert_eq!(result.companion.species, "hatchling");
        assert_eq!(result.evolution.unwrap().at_level, 2);
    }

    #[test]
    fn test_already_evolved_species_passes_old_gate() {
        let curve = CompanionCurve::default();
        let mut companion = fresh("machoke");
        companion.level = 40;
        companion.max_exp = curve.max_exp_for_level(40);

        let result = apply_experience(&companion, companion.max_exp, &curve, default_species(), now());
        assert_eq!(result.new_level, 41);
        assert!(!result.evolved());
    }

    #[test]
    fn test_cascade_terminates_with_valid_state() {
        let curve = CompanionCurve::default();
        for gain in [0, 1, 99, 100, 101, 5_000, 123_456, 10_000_000] {
            let result = apply_experience(&fresh("squirtle"), gain, &curve, default_species(), now());
            let c = &result.companion;
            assert!(c.current_exp < c.max_exp, "gain {}: {} >= {}", gain, c.current_exp, c.max_exp);
            assert!(c.level >= 1);
            assert_eq!(c.total_exp, gain);
        }
    }

    #[test]
    fn test_zero_max_exp_is_repaired() {
        let mut companion = fresh("pikachu");
        companion.max_exp = 0;
        let result = apply_experience(&companion, 10, &CompanionCurve::default(), default_species(), now());
        assert_eq!(result.new_level, 1);
        assert_eq!(result.companion.max_exp, 100);
    }

    #[test]
    fn test_configured_base_sets_level_one_requirement() {
        let curve = CompanionCurve {
            base_requirement: 200,
            multiplier: 1.2,
        };
        let companion = CompanionState::new("pikachu", "Pikachu", curve.initial_max_exp(), now());
        assert_eq!(companion.max_exp, 200);

        let result = apply_experience(&companion, 150, &curve, default_species(), now());
        assert_eq!(result.new_level, 1);
        assert_eq!(result.companion.current_exp, 150);

        // A repaired record gets the same requirement as a fresh one
        let mut broken = companion.clone();
        broken.max_exp = 0;
        let repaired = apply_experience(&broken, 0, &curve, default_species(), now());
        assert_eq!(repaired.companion.max_exp, companion.max_exp);

        let result = apply_experience(&companion, 250, &curve, default_species(), now());
        assert_eq!(result.new_level, 2);
        assert_eq!(result.companion.current_exp, 50);
        assert_eq!(result.companion.max_exp, 288);
    }

    fn workout(exercises: usize, duration_seconds: u32) -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            exercises: (0..exercises)
                .map(|i| crate::WorkoutExercise {
                    name: format!("Exercise {}", i),
                    sets: vec![],
                    total_sets: 0,
                    completed_sets: 0,
                })
                .collect(),
            duration_seconds,
            completed_at: now(),
            date: "2024-01-15".into(),
            workout_type: "strength".into(),
        }
    }

    #[test]
    fn test_companion_share() {
        // 60% of 102 = 61, 1 exercise = 2, 6 minutes = 0
        assert_eq!(companion_exp_share(102, &workout(1, 400)), 63);
        // 15 minutes adds 5
        assert_eq!(companion_exp_share(100, &workout(2, 900)), 69);
        // 30 minutes adds 10
        assert_eq!(companion_exp_share(100, &workout(0, 1800)), 70);
        // Floor of 5
        assert_eq!(companion_exp_share(0, &workout(0, 0)), 5);
    }
}
