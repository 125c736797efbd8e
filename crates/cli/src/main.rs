//! PromptVCS command-line tool.
//!
//! Manages prompt repositories, versions, branches, simulated merges,
//! teams and the local data store. Every mutating subcommand builds a
//! core command, runs it through the [`Session`] and prints the events.

mod account;
mod data;
mod history;
mod repo;
mod style;
mod team;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use promptvcs_core::config::AppConfig;
use promptvcs_core::models::short_id;
use promptvcs_core::{Event, Session};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// PromptVCS command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "promptvcs",
    version,
    about = "Version control for text prompts"
)]
struct Cli {
    /// Path to the TOML configuration file.
    /// Defaults to ~/.config/promptvcs/config.toml when it exists.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path. Defaults to the per-user config location.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration.
    Validate,

    /// Manage repositories.
    Repo {
        #[command(subcommand)]
        action: repo::RepoAction,
    },

    /// Manage versions of a repository.
    Version {
        #[command(subcommand)]
        action: history::VersionAction,
    },

    /// Manage branches of a repository.
    Branch {
        #[command(subcommand)]
        action: history::BranchAction,
    },

    /// Merge the other branch into the current one.
    Merge {
        repo: String,
        /// Complete a merge whose conflicts are all resolved.
        #[arg(long)]
        finalize: bool,
    },

    /// Inspect and resolve merge conflicts.
    Conflicts {
        #[command(subcommand)]
        action: history::ConflictsAction,
    },

    /// Manage repository collaborators.
    Collaborator {
        #[command(subcommand)]
        action: repo::CollaboratorAction,
    },

    /// Manage teams.
    Team {
        #[command(subcommand)]
        action: team::TeamAction,
    },

    /// Manage team members.
    Member {
        #[command(subcommand)]
        action: team::MemberAction,
    },

    /// Show or edit the user profile.
    Profile {
        #[command(subcommand)]
        action: account::ProfileAction,
    },

    /// Show or edit user settings.
    Settings {
        #[command(subcommand)]
        action: account::SettingsAction,
    },

    /// Show dashboard statistics.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Chart accuracy and speed over the latest versions.
    Chart {
        repo: String,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show recent activity, newest first.
    Activity {
        /// Maximum number of entries to show.
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Export everything to a JSON file.
    Export {
        /// Output path. Defaults to promptvcs-export-<date>.json.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace repositories and teams from an export file.
    Import {
        path: PathBuf,
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete all stored data.
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output, force } => {
            init_logging("warn");
            cmd_init(output, force)
        }
        Commands::Validate => {
            init_logging("warn");
            cmd_validate(cli.config.as_deref())
        }
        command => {
            let config = AppConfig::load(cli.config.as_deref())
                .context("failed to load configuration")?;
            init_logging(&config.logging.level);
            debug!(backend = %config.storage.backend, "configuration loaded");

            let mut session = Session::open(&config).context("failed to open data store")?;
            dispatch(&mut session, command)
        }
    }
}

fn dispatch(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Repo { action } => repo::run(session, action),
        Commands::Version { action } => history::run_version(session, action),
        Commands::Branch { action } => history::run_branch(session, action),
        Commands::Merge { repo, finalize } => history::run_merge(session, &repo, finalize),
        Commands::Conflicts { action } => history::run_conflicts(session, action),
        Commands::Collaborator { action } => repo::run_collaborator(session, action),
        Commands::Team { action } => team::run(session, action),
        Commands::Member { action } => team::run_member(session, action),
        Commands::Profile { action } => account::run_profile(session, action),
        Commands::Settings { action } => account::run_settings(session, action),
        Commands::Stats { json: true } => {
            println!("{}", serde_json::to_string_pretty(&session.stats())?);
            Ok(())
        }
        Commands::Stats { json: false } => data::cmd_stats(session),
        Commands::Chart { repo, json: true } => {
            println!("{}", serde_json::to_string_pretty(&session.chart(&repo)?)?);
            Ok(())
        }
        Commands::Chart { repo, json: false } => data::cmd_chart(session, &repo),
        Commands::Activity { limit } => data::cmd_activity(session, limit),
        Commands::Export { output } => data::cmd_export(session, output),
        Commands::Import { path, yes } => data::cmd_import(session, &path, yes),
        Commands::Clear { yes } => data::cmd_clear(session, yes),
        Commands::Init { .. } | Commands::Validate => {
            anyhow::bail!("configuration commands do not open the data store")
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: Option<PathBuf>, force: bool) -> Result<()> {
    let output = match output {
        Some(path) => path,
        None => AppConfig::default_path()
            .context("no per-user config directory on this platform; pass --output")?,
    };

    AppConfig::write_default(&output, force).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Pick a storage backend and data directory");
    println!(
        "  2. Validate with: promptvcs validate --config {}",
        output.display()
    );
    println!("  3. Create a repository: promptvcs repo create <name>");

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    match config_path.map(Path::to_path_buf).or_else(AppConfig::default_path) {
        Some(path) => println!("Validating configuration: {}", path.display()),
        None => println!("Validating built-in defaults"),
    }
    println!();

    let config = match AppConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("  [FAIL] {}", e);
            anyhow::bail!("configuration validation failed");
        }
    };
    println!("  [OK] TOML structure is valid");
    println!("  [OK] Environment overrides applied");
    println!("  [OK] All values are valid");

    println!();
    println!("Configuration summary:");
    println!("  Storage       : {}", config.storage.backend);
    println!("  Database      : {}", config.database_path().display());
    println!("  Log level     : {}", config.logging.level);
    println!("  Oracle        : {}", config.simulation.conflict_oracle);
    println!(
        "  Conflict prob : {}",
        config.simulation.conflict_probability
    );
    println!(
        "  Seed          : {}",
        config
            .simulation
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "random".into())
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// Ask before a destructive action unless `yes` was given.
pub(crate) fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("failed to read confirmation")
}

/// Print one line per event.
pub(crate) fn report(events: &[Event]) {
    for event in events {
        if let Some(line) = describe(event) {
            println!("{line}");
        }
    }
}

fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::RepositoryCreated(r) => {
            style::success(&format!("Created repository \"{}\" ({})", r.name, short_id(&r.id)))
        }
        Event::RepositoryUpdated(r) => style::success(&format!("Updated repository \"{}\"", r.name)),
        Event::RepositoryDeleted { name, .. } => {
            style::success(&format!("Deleted repository \"{name}\""))
        }
        Event::CollaboratorAdded { collaborator, .. } => {
            style::success(&format!("Added {} as {}", collaborator.email, collaborator.role))
        }
        Event::CollaboratorRemoved { collaborator, .. } => {
            style::success(&format!("Removed {}", collaborator.email))
        }
        Event::VersionCreated { version, .. } => style::success(&format!(
            "Committed {} on {} ({}% accuracy, {} ms, ${:.2})",
            version.short_id(),
            version.branch,
            version.performance.accuracy,
            version.performance.speed,
            version.performance.cost
        )),
        Event::VersionAmended { version, .. } => {
            style::success(&format!("Amended {}", version.short_id()))
        }
        Event::RolledBack {
            source_id, version, ..
        } => style::success(&format!(
            "Rolled back to {} as {} on {}",
            short_id(source_id),
            version.short_id(),
            version.branch
        )),
        Event::BranchCreated { name, .. } => style::success(&format!("Created branch {name}")),
        Event::BranchSwitched { name, .. } => style::success(&format!("Switched to {name}")),
        Event::MergeCompleted { .. } => style::success("Merged"),
        Event::ConflictDetected { conflict, .. } => style::warn(&format!(
            "Conflict {} between {}; resolve it with `promptvcs conflicts resolve`",
            short_id(&conflict.id),
            conflict.branches.join(" and ")
        )),
        Event::ConflictResolved { conflict, .. } => style::success(&format!(
            "Resolved {} ({})",
            short_id(&conflict.id),
            conflict
                .resolution
                .map(|r| r.to_string())
                .unwrap_or_default()
        )),
        Event::TeamCreated(t) => {
            style::success(&format!("Created team \"{}\" ({})", t.name, short_id(&t.id)))
        }
        Event::TeamUpdated(t) => style::success(&format!("Updated team \"{}\"", t.name)),
        Event::TeamDeleted { name, .. } => style::success(&format!("Deleted team \"{name}\"")),
        Event::MemberAdded { member, .. } => {
            style::success(&format!("Added {} as {}", member.email, member.role))
        }
        Event::MemberRemoved { member, .. } => {
            style::success(&format!("Removed {}", member.email))
        }
        Event::TeamRepositoryAdded { repo_id, .. } => {
            style::success(&format!("Shared {} with the team", short_id(repo_id)))
        }
        Event::TeamRepositoryRemoved { repo_id, .. } => {
            style::success(&format!("Unshared {}", short_id(repo_id)))
        }
        Event::AssignmentsSynced { team_ids, .. } => {
            style::success(&format!("Shared with {} team(s)", team_ids.len()))
        }
        Event::ProfileUpdated(p) => style::success(&format!("Profile saved for {}", p.email)),
        Event::SettingsUpdated(_) => style::success("Settings saved"),
        Event::DataImported { repositories, teams } => style::success(&format!(
            "Imported {repositories} repositories and {teams} teams"
        )),
        Event::DataCleared => style::success("All data cleared"),
        Event::ActivityRecorded(_) => return None,
    };
    Some(line)
}
