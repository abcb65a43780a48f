#![forbid(unsafe_code)]

//! Core domain model and business logic for the Liftmon system.
//!
//! This crate provides:
//! - Domain types (workouts, user progression, companions)
//! - Experience scoring and the user level curve
//! - Companion leveling and evolution
//! - The workout-completion workflow over collaborator ports
//! - Local persistence (workout log, profile and companion records)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod species;
pub mod experience;
pub mod level_curve;
pub mod companion;
pub mod ports;
pub mod orchestrator;
pub mod wal;
pub mod state;
pub mod history;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use species::{default_species, Species, SpeciesTable};
pub use experience::{calculate_experience, BreakdownItem, ExperienceAward};
pub use companion::{apply_experience, CompanionCurve, CompanionLevelUp};
pub use orchestrator::{CompanionProgress, LevelUpResult, ProgressionOrchestrator};
pub use store::FileStore;
