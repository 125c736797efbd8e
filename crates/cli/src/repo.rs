//! `promptvcs repo` and `promptvcs collaborator`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use promptvcs_core::ledger::VersionLedger;
use promptvcs_core::models::short_id;
use promptvcs_core::repository::{NewRepository, RepositoryUpdate};
use promptvcs_core::stats::average_accuracy;
use promptvcs_core::{Command, Session};

use crate::{confirm, report, style};

#[derive(Subcommand, Debug)]
pub enum RepoAction {
    /// List repositories.
    List,
    /// Show one repository.
    Show {
        /// Repository id, id prefix or name.
        repo: String,
    },
    /// Create a repository.
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        private: bool,
        /// Initial prompt text, committed as "Initial commit".
        #[arg(long, conflicts_with = "prompt_file")]
        prompt: Option<String>,
        /// Read the initial prompt from a file.
        #[arg(long)]
        prompt_file: Option<PathBuf>,
        /// Team to share the repository with (repeatable).
        #[arg(long = "team")]
        teams: Vec<String>,
    },
    /// Edit name, description or visibility.
    Edit {
        repo: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        private: Option<bool>,
    },
    /// Delete a repository. Team snapshots are kept.
    Delete {
        repo: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Set exactly which teams hold a snapshot of the repository.
    Teams {
        repo: String,
        /// Team id, id prefix or name (repeatable). None unshares everywhere.
        #[arg(long = "team")]
        teams: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CollaboratorAction {
    /// List collaborators.
    List { repo: String },
    /// Add a contributor.
    Add { repo: String, email: String },
    /// Remove a contributor.
    Remove { repo: String, email: String },
}

pub fn run(session: &mut Session, action: RepoAction) -> Result<()> {
    match action {
        RepoAction::List => list(session),
        RepoAction::Show { repo } => show(session, &repo),
        RepoAction::Create {
            name,
            description,
            private,
            prompt,
            prompt_file,
            teams,
        } => {
            let initial_prompt = match prompt_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => prompt,
            };
            let team_ids = team_ids(session, &teams)?;
            let events = session
                .execute(Command::CreateRepository {
                    new: NewRepository {
                        name,
                        description,
                        private,
                        initial_prompt,
                    },
                    team_ids,
                })
                .context("failed to create repository")?;
            report(&events);
            Ok(())
        }
        RepoAction::Edit {
            repo,
            name,
            description,
            private,
        } => {
            let id = session.repository(&repo)?.id.clone();
            let events = session
                .execute(Command::UpdateRepository {
                    id,
                    update: RepositoryUpdate {
                        name,
                        description,
                        private,
                    },
                })
                .context("failed to update repository")?;
            report(&events);
            Ok(())
        }
        RepoAction::Delete { repo, yes } => {
            let (id, name) = {
                let r = session.repository(&repo)?;
                (r.id.clone(), r.name.clone())
            };
            if !confirm(&format!("Delete repository \"{name}\"?"), yes)? {
                println!("{}", style::warn("Nothing deleted."));
                return Ok(());
            }
            let events = session
                .execute(Command::DeleteRepository { id })
                .context("failed to delete repository")?;
            report(&events);
            Ok(())
        }
        RepoAction::Teams { repo, teams } => {
            let repo_id = session.repository(&repo)?.id.clone();
            let team_ids = team_ids(session, &teams)?;
            let events = session
                .execute(Command::SyncTeamAssignments { repo_id, team_ids })
                .context("failed to update team access")?;
            report(&events);
            Ok(())
        }
    }
}

pub fn run_collaborator(session: &mut Session, action: CollaboratorAction) -> Result<()> {
    match action {
        CollaboratorAction::List { repo } => {
            let repo = session.repository(&repo)?;
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Email", "Role", "Added"]);
            for c in &repo.collaborators {
                table.add_row(vec![
                    Cell::new(&c.email),
                    Cell::new(c.role.to_string()),
                    Cell::new(c.added_at.format("%Y-%m-%d").to_string()),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        CollaboratorAction::Add { repo, email } => {
            let repo_id = session.repository(&repo)?.id.clone();
            let events = session
                .execute(Command::AddCollaborator { repo_id, email })
                .context("failed to add collaborator")?;
            report(&events);
            Ok(())
        }
        CollaboratorAction::Remove { repo, email } => {
            let repo_id = session.repository(&repo)?.id.clone();
            let events = session
                .execute(Command::RemoveCollaborator { repo_id, email })
                .context("failed to remove collaborator")?;
            report(&events);
            Ok(())
        }
    }
}

fn team_ids(session: &Session, keys: &[String]) -> Result<Vec<String>> {
    keys.iter()
        .map(|k| Ok(session.team(k)?.id.clone()))
        .collect()
}

fn list(session: &Session) -> Result<()> {
    let repos = session.state().repositories.list();
    if repos.is_empty() {
        println!("No repositories yet. Create one with `promptvcs repo create <name>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Branch", "Versions", "Avg accuracy", "Updated"]);
    for r in repos {
        let mut name = r.name.clone();
        if r.private {
            name.push_str(" (private)");
        }
        table.add_row(vec![
            Cell::new(short_id(&r.id)),
            Cell::new(name),
            Cell::new(&r.current_branch),
            Cell::new(r.versions.len()),
            Cell::new(format!("{}%", average_accuracy(r))),
            Cell::new(r.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn show(session: &Session, key: &str) -> Result<()> {
    let repo = session.repository(key)?;
    println!();
    println!("{}", style::header(&repo.name));
    if !repo.description.is_empty() {
        println!("{}", style::dim(&repo.description));
    }
    println!();
    println!("  ID            : {}", repo.id);
    println!("  Private       : {}", style::flag(repo.private));
    println!("  Branch        : {}", repo.current_branch);
    println!("  Branches      : {}", repo.branches.join(", "));
    println!("  Versions      : {}", repo.versions.len());
    println!("  Collaborators : {}", repo.collaborators.len());
    println!("  Conflicts     : {} unresolved", repo.unresolved_conflicts());
    println!(
        "  Performance   : {}% accuracy, {} ms, ${:.2}",
        repo.performance.accuracy, repo.performance.speed, repo.performance.cost
    );
    println!("  Created       : {}", repo.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Updated       : {}", repo.updated_at.format("%Y-%m-%d %H:%M"));

    let teams = session.state().teams.assigned_team_ids(&repo.id);
    if !teams.is_empty() {
        let names: Vec<String> = teams
            .iter()
            .filter_map(|id| session.team(id).ok().map(|t| t.name.clone()))
            .collect();
        println!("  Teams         : {}", names.join(", "));
    }

    if let Some(latest) = VersionLedger::latest(repo) {
        println!();
        println!(
            "{}",
            style::dim(&format!("Latest: {} {} ({})", latest.short_id(), latest.message, latest.branch))
        );
    }
    println!();
    Ok(())
}
