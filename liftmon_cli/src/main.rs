use clap::{Parser, Subcommand};
use liftmon_core::level_curve::{exp_ceil_for_level, level_for_total_exp, level_progress};
use liftmon_core::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "liftmon")]
#[command(about = "Strength training progression with a companion that levels up", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user and pick a companion species
    Start {
        #[arg(long)]
        user: String,

        /// Species key (see `liftmon species`)
        #[arg(long)]
        species: Option<String>,

        /// Display name for the user
        #[arg(long)]
        name: Option<String>,
    },

    /// Log a completed workout from a JSON file and award experience
    Log {
        #[arg(long)]
        user: String,

        /// Path to the workout JSON
        #[arg(long)]
        workout: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show level and companion state
    Status {
        #[arg(long)]
        user: String,
    },

    /// List companion species and their evolutions
    Species,

    /// Write the current configuration to the config file if none exists
    InitConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    liftmon_core::logging::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    let store = FileStore::new(data_dir);

    match cli.command {
        Commands::Start {
            user,
            species,
            name,
        } => cmd_start(&store, &config, user, species, name),
        Commands::Log {
            user,
            workout,
            json,
        } => cmd_log(store, &config, &user, workout, json).await,
        Commands::Status { user } => cmd_status(&store, &user),
        Commands::Species => {
            cmd_species();
            Ok(())
        }
        Commands::InitConfig => cmd_init_config(&config),
    }
}

fn cmd_start(
    store: &FileStore,
    config: &Config,
    user: String,
    species: Option<String>,
    name: Option<String>,
) -> Result<()> {
    let species_key = species.unwrap_or_else(|| config.companion.default_species.clone());
    let definition = default_species()
        .get(&species_key)
        .ok_or_else(|| Error::UnknownSpecies(species_key.clone()))?;

    let mut profile = UserProgression::new(user.clone());
    profile.display_name = name.unwrap_or_else(|| user.clone());
    profile.selected_species = Some(definition.key.clone());
    store.create_profile(&profile)?;

    let curve = CompanionCurve::from(&config.companion);
    let companion = CompanionState::new(
        definition.key.clone(),
        definition.display_name.clone(),
        curve.initial_max_exp(),
        chrono::Utc::now(),
    );
    store.save_companion(&user, &companion)?;

    println!("✓ Welcome, {}!", profile.display_name);
    println!("  Your companion: {}", companion.name);
    Ok(())
}

async fn cmd_log(
    store: FileStore,
    config: &Config,
    user: &str,
    workout_path: PathBuf,
    json: bool,
) -> Result<()> {
    let contents = std::fs::read_to_string(&workout_path)?;
    let mut workout: WorkoutSession = serde_json::from_str(&contents)?;
    workout.user_id = user.to_string();
    if workout.date.is_empty() {
        workout.date = workout.completed_at.format("%Y-%m-%d").to_string();
    }

    let violations = workout.validate();
    if !violations.is_empty() {
        return Err(Error::InvalidWorkout(violations.join("; ")));
    }
    if store.load_profile(user)?.is_none() {
        return Err(Error::NotFound(format!(
            "user '{}' (run `liftmon start` first)",
            user
        )));
    }

    // The workout goes into history first; the orchestrator skips it when
    // looking for the previous session.
    store.record_workout(user, &workout)?;
    tracing::debug!("Recorded workout {} for {}", workout.id, user);

    let store = Arc::new(store);
    let orchestrator =
        ProgressionOrchestrator::new(store.clone(), store.clone(), store, config);
    let result = orchestrator.process_workout_completion(user, &workout).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        display_result(&result);
    }
    Ok(())
}

fn display_result(result: &LevelUpResult) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  WORKOUT COMPLETE  +{} XP", result.exp_gained);
    println!("╰─────────────────────────────────────────╯");
    println!();
    for item in &result.breakdown {
        println!("  → {}", item);
    }
    println!();

    if result.leveled_up {
        println!(
            "  ★ Level up! {} → {}",
            result.previous_level, result.new_level
        );
    } else {
        println!("  Level {}", result.new_level);
    }

    match &result.companion {
        Some(companion) => {
            println!();
            println!("  {} gained {} XP", companion.name, companion.exp_gained);
            if companion.new_level > companion.previous_level {
                println!(
                    "  ★ {} reached level {}",
                    companion.name, companion.new_level
                );
            }
            if let Some(evolved_into) = &companion.evolved_into {
                println!("  ✦ Your companion evolved into {}!", evolved_into);
            }
        }
        None => {
            println!();
            println!("  (companion progress unavailable this session)");
        }
    }
    println!();
}

fn cmd_status(store: &FileStore, user: &str) -> Result<()> {
    let profile = store
        .load_profile(user)?
        .ok_or_else(|| Error::NotFound(format!("user '{}'", user)))?;

    let level = level_for_total_exp(profile.current_exp);
    println!("{}", profile.display_name);
    println!(
        "  Level {} ({} XP, {:.0}% to level {}, next at {} XP)",
        level,
        profile.current_exp,
        level_progress(profile.current_exp) * 100.0,
        level + 1,
        exp_ceil_for_level(level)
    );
    println!("  Workouts: {}", profile.total_workouts);

    if let Some(companion) = store.load_companion(user)? {
        println!();
        println!(
            "  {} - level {} ({}/{} XP)",
            companion.name, companion.level, companion.current_exp, companion.max_exp
        );
        if let Some(evolution) = default_species()
            .get(&companion.species)
            .and_then(|s| s.evolution.as_ref())
        {
            println!(
                "  Evolves into {} at level {}",
                default_species().display_name(&evolution.target),
                evolution.level
            );
        }
    }
    Ok(())
}

fn cmd_init_config(config: &Config) -> Result<()> {
    let path = Config::default_config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    config.save()?;
    println!("✓ Wrote config to {}", path.display());
    Ok(())
}

fn cmd_species() {
    for species in default_species().sorted() {
        match &species.evolution {
            Some(evolution) => println!(
                "  {:<12} {:<12} → {} at level {}",
                species.key,
                species.display_name,
                default_species().display_name(&evolution.target),
                evolution.level
            ),
            None => println!("  {:<12} {}", species.key, species.display_name),
        }
    }
}
