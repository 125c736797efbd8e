//! `promptvcs team` and `promptvcs member`.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use promptvcs_core::models::{short_id, MemberRole};
use promptvcs_core::team::{NewTeam, TeamUpdate};
use promptvcs_core::{Command, Session};

use crate::{confirm, report, style};

#[derive(Subcommand, Debug)]
pub enum TeamAction {
    /// List teams.
    List,
    /// Show a team with its members and repository snapshots.
    Show { team: String },
    /// Create a team. You join it as admin.
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        private: bool,
        /// Invite a member by email (repeatable).
        #[arg(short, long = "member")]
        members: Vec<String>,
    },
    /// Edit name, description or visibility.
    Edit {
        team: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        private: Option<bool>,
    },
    /// Delete a team.
    Delete {
        team: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Snapshot a repository into the team.
    AddRepo { team: String, repo: String },
    /// Drop a repository snapshot from the team.
    RemoveRepo {
        team: String,
        /// Repository id, id prefix or name of the snapshot.
        repo: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemberAction {
    /// List members of a team.
    List { team: String },
    /// Add a member.
    Add {
        team: String,
        email: String,
        /// Role: admin or member.
        #[arg(short, long, default_value = "member")]
        role: String,
    },
    /// Remove a member. The last admin cannot be removed.
    Remove { team: String, email: String },
}

pub fn run(session: &mut Session, action: TeamAction) -> Result<()> {
    match action {
        TeamAction::List => {
            let teams = session.state().teams.list();
            if teams.is_empty() {
                println!("No teams yet. Create one with `promptvcs team create <name>`.");
                return Ok(());
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["ID", "Name", "Private", "Members", "Repositories", "Updated"]);
            for t in teams {
                table.add_row(vec![
                    Cell::new(short_id(&t.id)),
                    Cell::new(&t.name),
                    Cell::new(style::flag(t.private)),
                    Cell::new(t.members.len()),
                    Cell::new(t.repositories.len()),
                    Cell::new(t.updated_at.format("%Y-%m-%d %H:%M").to_string()),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        TeamAction::Show { team } => {
            let team = session.team(&team)?;
            println!();
            println!("{}", style::header(&team.name));
            if !team.description.is_empty() {
                println!("{}", style::dim(&team.description));
            }
            println!();
            println!("  ID      : {}", team.id);
            println!("  Private : {}", style::flag(team.private));
            println!("  Created : {}", team.created_at.format("%Y-%m-%d %H:%M"));
            println!();
            println!("{}", style::header("Members"));
            for m in &team.members {
                println!("  {} ({})", m.email, m.role);
            }
            println!();
            println!("{}", style::header("Repositories"));
            if team.repositories.is_empty() {
                println!("  {}", style::dim("none"));
            }
            for s in &team.repositories {
                println!(
                    "  {} {} {}",
                    short_id(&s.id),
                    s.name,
                    style::dim(&format!(
                        "({} versions, added {})",
                        s.versions.len(),
                        s.added_at.format("%Y-%m-%d")
                    ))
                );
            }
            println!();
            Ok(())
        }
        TeamAction::Create {
            name,
            description,
            private,
            members,
        } => {
            let events = session
                .execute(Command::CreateTeam(NewTeam {
                    name,
                    description,
                    private,
                    member_emails: members,
                }))
                .context("failed to create team")?;
            report(&events);
            Ok(())
        }
        TeamAction::Edit {
            team,
            name,
            description,
            private,
        } => {
            let id = session.team(&team)?.id.clone();
            let events = session
                .execute(Command::UpdateTeam {
                    id,
                    update: TeamUpdate {
                        name,
                        description,
                        private,
                    },
                })
                .context("failed to update team")?;
            report(&events);
            Ok(())
        }
        TeamAction::Delete { team, yes } => {
            let (id, name) = {
                let t = session.team(&team)?;
                (t.id.clone(), t.name.clone())
            };
            if !confirm(&format!("Delete team \"{name}\"?"), yes)? {
                println!("{}", style::warn("Nothing deleted."));
                return Ok(());
            }
            let events = session
                .execute(Command::DeleteTeam { id })
                .context("failed to delete team")?;
            report(&events);
            Ok(())
        }
        TeamAction::AddRepo { team, repo } => {
            let team_id = session.team(&team)?.id.clone();
            let repo_id = session.repository(&repo)?.id.clone();
            let events = session
                .execute(Command::AddTeamRepository { team_id, repo_id })
                .context("failed to add repository to team")?;
            report(&events);
            Ok(())
        }
        TeamAction::RemoveRepo { team, repo } => {
            let (team_id, repo_id) = {
                let t = session.team(&team)?;
                // Snapshots outlive their repository, so match against the team's copies.
                let snapshot = t
                    .repositories
                    .iter()
                    .find(|s| s.id == repo || s.name == repo)
                    .or_else(|| t.repositories.iter().find(|s| s.id.starts_with(&repo)))
                    .with_context(|| format!("team \"{}\" holds no repository '{repo}'", t.name))?;
                (t.id.clone(), snapshot.id.clone())
            };
            let events = session
                .execute(Command::RemoveTeamRepository { team_id, repo_id })
                .context("failed to remove repository from team")?;
            report(&events);
            Ok(())
        }
    }
}

pub fn run_member(session: &mut Session, action: MemberAction) -> Result<()> {
    match action {
        MemberAction::List { team } => {
            let team = session.team(&team)?;
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Email", "Role", "Joined"]);
            for m in &team.members {
                table.add_row(vec![
                    Cell::new(&m.email),
                    Cell::new(m.role.to_string()),
                    Cell::new(m.joined_at.format("%Y-%m-%d").to_string()),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        MemberAction::Add { team, email, role } => {
            let role = MemberRole::from_str_val(&role)
                .ok_or_else(|| anyhow::anyhow!("invalid role '{role}': use 'admin' or 'member'"))?;
            let team_id = session.team(&team)?.id.clone();
            let events = session
                .execute(Command::AddMember {
                    team_id,
                    email,
                    role,
                })
                .context("failed to add member")?;
            report(&events);
            Ok(())
        }
        MemberAction::Remove { team, email } => {
            let team_id = session.team(&team)?.id.clone();
            let events = session
                .execute(Command::RemoveMember { team_id, email })
                .context("failed to remove member")?;
            report(&events);
            Ok(())
        }
    }
}
