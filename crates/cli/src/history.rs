//! Versions, branches, merges and conflicts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use promptvcs_core::branch::BranchRegistry;
use promptvcs_core::conflict::{ConflictResolver, Merger};
use promptvcs_core::ledger::{VersionAmendment, VersionLedger};
use promptvcs_core::models::{short_id, ConflictResolution};
use promptvcs_core::{Command, Session};

use crate::{report, style};

#[derive(Subcommand, Debug)]
pub enum VersionAction {
    /// List versions, newest last.
    List {
        repo: String,
        /// Only versions committed on this branch.
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Show one version with its prompt text.
    Show { repo: String, version: String },
    /// Commit new prompt text on the current branch.
    Create {
        repo: String,
        #[arg(short, long)]
        message: String,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the prompt text from a file.
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Tag (repeatable).
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Change message, text or tags of an existing version.
    Amend {
        repo: String,
        version: String,
        #[arg(short, long)]
        message: Option<String>,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Replace the tags (repeatable).
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Commit a copy of an earlier version on the current branch.
    Rollback { repo: String, version: String },
    /// Line diff between two versions.
    Diff {
        repo: String,
        from: String,
        to: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BranchAction {
    /// List branches; the current one is starred.
    List { repo: String },
    /// Create a branch.
    Create { repo: String, name: String },
    /// Switch the current branch.
    Switch { repo: String, name: String },
}

#[derive(Subcommand, Debug)]
pub enum ConflictsAction {
    /// List the conflicts held by a repository.
    List { repo: String },
    /// Show a conflict with its diff.
    Show { repo: String, conflict: String },
    /// Resolve a conflict.
    Resolve {
        repo: String,
        conflict: String,
        /// Resolution: main, incoming or manual.
        #[arg(long)]
        accept: String,
    },
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

pub fn run_version(session: &mut Session, action: VersionAction) -> Result<()> {
    match action {
        VersionAction::List { repo, branch } => {
            let repo = session.repository(&repo)?;
            let versions = match &branch {
                Some(b) => VersionLedger::list_by_branch(repo, b),
                None => repo.versions.iter().collect(),
            };
            if versions.is_empty() {
                println!("No versions yet.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                "ID", "Message", "Branch", "Tags", "Author", "Accuracy", "Speed", "Cost", "Date",
            ]);
            for v in versions {
                table.add_row(vec![
                    Cell::new(v.short_id()),
                    Cell::new(&v.message),
                    Cell::new(&v.branch),
                    Cell::new(v.tags.join(", ")),
                    Cell::new(&v.author),
                    Cell::new(format!("{}%", v.performance.accuracy)),
                    Cell::new(format!("{} ms", v.performance.speed)),
                    Cell::new(format!("${:.2}", v.performance.cost)),
                    Cell::new(v.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        VersionAction::Show { repo, version } => {
            let repo = session.repository(&repo)?;
            let v = VersionLedger::find(repo, &version)?;
            println!();
            println!("{}", style::header(&format!("{} {}", v.short_id(), v.message)));
            println!("  ID       : {}", v.id);
            println!("  Branch   : {}", v.branch);
            println!("  Author   : {}", v.author);
            println!("  Date     : {}", v.timestamp.format("%Y-%m-%d %H:%M:%S"));
            if !v.tags.is_empty() {
                println!("  Tags     : {}", v.tags.join(", "));
            }
            println!(
                "  Metrics  : {}% accuracy, {} ms, ${:.2}",
                v.performance.accuracy, v.performance.speed, v.performance.cost
            );
            println!();
            println!("{}", v.content);
            println!();
            Ok(())
        }
        VersionAction::Create {
            repo,
            message,
            content,
            file,
            tags,
        } => {
            let content = read_content(content, file)?
                .context("prompt text required: pass --content or --file")?;
            let repo_id = session.repository(&repo)?.id.clone();
            let events = session
                .execute(Command::CreateVersion {
                    repo_id,
                    message,
                    content,
                    tags,
                })
                .context("failed to create version")?;
            report(&events);
            Ok(())
        }
        VersionAction::Amend {
            repo,
            version,
            message,
            content,
            file,
            tags,
        } => {
            let content = read_content(content, file)?;
            let (repo_id, version_id) = {
                let r = session.repository(&repo)?;
                (r.id.clone(), VersionLedger::find(r, &version)?.id.clone())
            };
            let amendment = VersionAmendment {
                message,
                content,
                tags: (!tags.is_empty()).then_some(tags),
            };
            let events = session
                .execute(Command::AmendVersion {
                    repo_id,
                    version_id,
                    amendment,
                })
                .context("failed to amend version")?;
            report(&events);
            Ok(())
        }
        VersionAction::Rollback { repo, version } => {
            let (repo_id, version_id) = {
                let r = session.repository(&repo)?;
                (r.id.clone(), VersionLedger::find(r, &version)?.id.clone())
            };
            let events = session
                .execute(Command::Rollback {
                    repo_id,
                    version_id,
                })
                .context("failed to roll back")?;
            report(&events);
            Ok(())
        }
        VersionAction::Diff { repo, from, to } => {
            let repo = session.repository(&repo)?;
            let a = VersionLedger::find(repo, &from)?;
            let b = VersionLedger::find(repo, &to)?;
            println!("{}", style::dim(&format!("--- {} ({})", a.short_id(), a.branch)));
            println!("{}", style::dim(&format!("+++ {} ({})", b.short_id(), b.branch)));
            for line in Merger::diff_lines(&a.content, &b.content) {
                println!("{}", style::diff_line(&line));
            }
            Ok(())
        }
    }
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match file {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Some(text))
        }
        None => Ok(content),
    }
}

// ---------------------------------------------------------------------------
// Branches and merging
// ---------------------------------------------------------------------------

pub fn run_branch(session: &mut Session, action: BranchAction) -> Result<()> {
    match action {
        BranchAction::List { repo } => {
            let repo = session.repository(&repo)?;
            for name in BranchRegistry::list_branches(repo) {
                let count = VersionLedger::list_by_branch(repo, name).len();
                println!(
                    "{} {}",
                    style::branch(name, *name == repo.current_branch),
                    style::dim(&format!("({count} versions)"))
                );
            }
            Ok(())
        }
        BranchAction::Create { repo, name } => {
            let repo_id = session.repository(&repo)?.id.clone();
            let events = session
                .execute(Command::CreateBranch { repo_id, name })
                .context("failed to create branch")?;
            report(&events);
            Ok(())
        }
        BranchAction::Switch { repo, name } => {
            let repo_id = session.repository(&repo)?.id.clone();
            let events = session
                .execute(Command::SwitchBranch { repo_id, name })
                .context("failed to switch branch")?;
            report(&events);
            Ok(())
        }
    }
}

/// Attempt a merge, or finalize one whose conflicts are resolved.
pub fn run_merge(session: &mut Session, repo: &str, finalize: bool) -> Result<()> {
    let repo_id = session.repository(repo)?.id.clone();
    let command = if finalize {
        Command::FinalizeMerge { repo_id }
    } else {
        Command::AttemptMerge { repo_id }
    };
    let events = session.execute(command).context("merge failed")?;
    report(&events);
    Ok(())
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

pub fn run_conflicts(session: &mut Session, action: ConflictsAction) -> Result<()> {
    match action {
        ConflictsAction::List { repo } => {
            let repo = session.repository(&repo)?;
            if repo.conflicts.is_empty() {
                println!();
                println!("{}", style::success("No conflicts"));
                println!();
                return Ok(());
            }

            println!();
            println!(
                "{}",
                style::header(&format!(
                    "Conflicts ({} unresolved of {})",
                    repo.unresolved_conflicts(),
                    repo.conflicts.len()
                ))
            );
            println!();

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["ID", "Branches", "Files", "Status", "Resolution"]);
            for c in &repo.conflicts {
                table.add_row(vec![
                    Cell::new(short_id(&c.id)),
                    Cell::new(c.branches.join(" <- ")),
                    Cell::new(c.files.join(", ")),
                    Cell::new(style::conflict_status(c.status)),
                    Cell::new(c.resolution.map(|r| r.to_string()).unwrap_or_else(|| "-".into())),
                ]);
            }
            println!("{table}");
            println!();
            Ok(())
        }
        ConflictsAction::Show { repo, conflict } => {
            let repo = session.repository(&repo)?;
            let c = ConflictResolver::find(repo, &conflict)?;
            println!();
            println!("{}", style::header(&format!("Conflict {}", short_id(&c.id))));
            println!("  Branches : {}", c.branches.join(" <- "));
            println!("  Files    : {}", c.files.join(", "));
            println!("  Status   : {}", style::conflict_status(c.status));
            if let Some(resolution) = c.resolution {
                println!("  Accepted : {resolution}");
            }
            if let Some(at) = c.resolved_at {
                println!("  Resolved : {}", at.format("%Y-%m-%d %H:%M"));
            }
            println!();
            for line in &c.diff {
                println!("{}", style::diff_line(line));
            }
            println!();
            Ok(())
        }
        ConflictsAction::Resolve {
            repo,
            conflict,
            accept,
        } => {
            let resolution = ConflictResolution::from_str_val(&accept).ok_or_else(|| {
                anyhow::anyhow!("invalid resolution '{accept}': use 'main', 'incoming' or 'manual'")
            })?;
            let (repo_id, conflict_id) = {
                let r = session.repository(&repo)?;
                (r.id.clone(), ConflictResolver::find(r, &conflict)?.id.clone())
            };
            let events = session
                .execute(Command::ResolveConflict {
                    repo_id,
                    conflict_id,
                    resolution,
                })
                .context("failed to resolve conflict")?;
            report(&events);
            Ok(())
        }
    }
}
