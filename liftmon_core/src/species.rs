//! Companion species table.
//!
//! Each species has a display name and, optionally, an evolution target
//! unlocked at a given level. The table is plain data: adding a species or an
//! evolution line never touches the progression engine.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Level-gated evolution of one species into another
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evolution {
    pub target: String,
    pub level: u32,
}

/// A companion species definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Species {
    pub key: String,
    pub display_name: String,
    pub evolution: Option<Evolution>,
}

/// Species definitions keyed by species key
#[derive(Clone, Debug)]
pub struct SpeciesTable {
    pub species: HashMap<String, Species>,
}

/// Cached default table - built once and reused across all operations
static DEFAULT_SPECIES: Lazy<SpeciesTable> = Lazy::new(build_default_species);

/// Get a reference to the cached default species table
pub fn default_species() -> &'static SpeciesTable {
    &DEFAULT_SPECIES
}

fn line(key: &str, display_name: &str, evolves_to: Option<(&str, u32)>) -> Species {
    Species {
        key: key.into(),
        display_name: display_name.into(),
        evolution: evolves_to.map(|(target, level)| Evolution {
            target: target.into(),
            level,
        }),
    }
}

/// Builds the built-in species table
pub fn build_default_species() -> SpeciesTable {
    let entries = vec![
        // Grass line
        line("bulbasaur", "Bulbasaur", Some(("ivysaur", 16))),
        line("ivysaur", "Ivysaur", Some(("venusaur", 32))),
        line("venusaur", "Venusaur", None),
        // Fire line
        line("charmander", "Charmander", Some(("charmeleon", 16))),
        line("charmeleon", "Charmeleon", Some(("charizard", 36))),
        line("charizard", "Charizard", None),
        // Water line
        line("squirtle", "Squirtle", Some(("wartortle", 16))),
        line("wartortle", "Wartortle", Some(("blastoise", 36))),
        line("blastoise", "Blastoise", None),
        // Fighting line
        line("machop", "Machop", Some(("machoke", 28))),
        line("machoke", "Machoke", None),
        // No evolution
        line("pikachu", "Pikachu", None),
    ];

    SpeciesTable {
        species: entries.into_iter().map(|s| (s.key.clone(), s)).collect(),
    }
}

impl SpeciesTable {
    pub fn get(&self, key: &str) -> Option<&Species> {
        self.species.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.species.contains_key(key)
    }

    /// Display name for a species key, falling back to the key itself
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|s| s.display_name.as_str()).unwrap_or(key)
    }

    /// The evolution a species is eligible for at `level`, if any
    pub fn evolution_at(&self, key: &str, level: u32) -> Option<&Species> {
        let evolution = self.get(key)?.evolution.as_ref()?;
        if level < evolution.level {
            return None;
        }
        self.get(&evolution.target)
    }

    /// Species sorted by key, for stable listings
    pub fn sorted(&self) -> Vec<&Species> {
        let mut all: Vec<_> = self.species.values().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// Validate the table
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, species) in &self.species {
            if key != &species.key {
                errors.push(format!(
                    "Species '{}' stored under mismatched key '{}'",
                    species.key, key
                ));
            }
            if species.display_name.is_empty() {
                errors.push(format!("Species '{}' has empty display name", key));
            }

            if let Some(evolution) = &species.evolution {
                match self.species.get(&evolution.target) {
                    None => errors.push(format!(
                        "Species '{}' evolves into non-existent species '{}'",
                        key, evolution.target
                    )),
                    Some(target) => {
                        // A target evolving again must do so at a higher level
                        if let Some(next) = &target.evolution {
                            if next.level <= evolution.level {
                                errors.push(format!(
                                    "Species '{}' evolves at {} but its target '{}' evolves at {}",
                                    key, evolution.level, target.key, next.level
                                ));
                            }
                        }
                    }
                }
                if evolution.level < 2 {
                    errors.push(format!(
                        "Species '{}': evolution level {} is below 2",
                        key, evolution.level
                    ));
                }
            }
        }

        errors
    }
}
