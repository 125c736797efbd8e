//! Team store: teams, their members, and the repository snapshots they hold.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::VcsError;
use crate::models::{Member, MemberRole, Repository, RepositorySnapshot, Team};
use crate::repository::single;

/// Input for [`TeamStore::create`].
#[derive(Debug, Clone, Default)]
pub struct NewTeam {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub member_emails: Vec<String>,
}

impl NewTeam {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update for [`TeamStore::update`].
#[derive(Debug, Clone, Default)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub private: Option<bool>,
}

/// Owner of all teams.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamStore {
    teams: Vec<Team>,
}

impl TeamStore {
    pub fn from_vec(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    pub fn list(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Create a team. `current_user` always ends up an admin.
    pub fn create(&mut self, new: NewTeam, current_user: &str) -> Result<&Team, VcsError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(VcsError::invalid("name", "team name must not be empty"));
        }

        let now = Utc::now();
        let mut members: Vec<Member> = Vec::new();
        for email in new.member_emails.iter().map(|e| e.trim()) {
            if email.is_empty() || members.iter().any(|m| m.email == email) {
                continue;
            }
            let role = if email == current_user {
                MemberRole::Admin
            } else {
                MemberRole::Member
            };
            members.push(Member {
                email: email.to_string(),
                role,
                joined_at: now,
            });
        }
        if !members.iter().any(|m| m.email == current_user) {
            members.insert(
                0,
                Member {
                    email: current_user.to_string(),
                    role: MemberRole::Admin,
                    joined_at: now,
                },
            );
        }

        let team = Team {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: new.description.trim().to_string(),
            private: new.private,
            members,
            repositories: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        info!(team_id = %team.id, name = %team.name, members = team.members.len(), "created team");
        let idx = self.teams.len();
        self.teams.push(team);
        Ok(&self.teams[idx])
    }

    pub fn get(&self, id: &str) -> Result<&Team, VcsError> {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| VcsError::not_found("team", id))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Team, VcsError> {
        self.teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| VcsError::not_found("team", id))
    }

    /// Find a team by exact id, unambiguous id prefix, or exact name.
    pub fn resolve(&self, key: &str) -> Result<&Team, VcsError> {
        if let Ok(team) = self.get(key) {
            return Ok(team);
        }
        if !key.is_empty() {
            if let Some(t) = single(self.teams.iter().filter(|t| t.id.starts_with(key))) {
                return Ok(t);
            }
        }
        single(self.teams.iter().filter(|t| t.name == key))
            .ok_or_else(|| VcsError::not_found("team", key))
    }

    pub fn update(&mut self, id: &str, update: TeamUpdate) -> Result<&Team, VcsError> {
        if let Some(ref name) = update.name {
            if name.trim().is_empty() {
                return Err(VcsError::invalid("name", "team name must not be empty"));
            }
        }
        let team = self.get_mut(id)?;
        if let Some(name) = update.name {
            team.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            team.description = description.trim().to_string();
        }
        if let Some(private) = update.private {
            team.private = private;
        }
        team.updated_at = Utc::now();
        info!(team_id = %team.id, "updated team");
        Ok(team)
    }

    pub fn delete(&mut self, id: &str) -> Result<Team, VcsError> {
        let idx = self
            .teams
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| VcsError::not_found("team", id))?;
        let team = self.teams.remove(idx);
        info!(team_id = %team.id, name = %team.name, "deleted team");
        Ok(team)
    }

    pub fn add_member(&mut self, id: &str, email: &str, role: MemberRole) -> Result<Member, VcsError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(VcsError::invalid("email", "member email must not be empty"));
        }
        let team = self.get_mut(id)?;
        if team.members.iter().any(|m| m.email == email) {
            return Err(VcsError::exists("member", email));
        }
        let member = Member {
            email: email.to_string(),
            role,
            joined_at: Utc::now(),
        };
        team.members.push(member.clone());
        team.updated_at = Utc::now();
        debug!(team_id = %team.id, email, %role, "added member");
        Ok(member)
    }

    /// Remove a member. The last admin stays.
    pub fn remove_member(&mut self, id: &str, email: &str) -> Result<Member, VcsError> {
        let team = self.get_mut(id)?;
        let idx = team
            .members
            .iter()
            .position(|m| m.email == email)
            .ok_or_else(|| VcsError::not_found("member", email))?;
        if team.members[idx].role == MemberRole::Admin && team.admin_count() == 1 {
            return Err(VcsError::invalid("email", "a team needs at least one admin"));
        }
        let removed = team.members.remove(idx);
        team.updated_at = Utc::now();
        debug!(team_id = %team.id, email, "removed member");
        Ok(removed)
    }

    /// Snapshot `repo` into the team.
    pub fn add_repository(&mut self, id: &str, repo: &Repository) -> Result<&RepositorySnapshot, VcsError> {
        let team = self.get_mut(id)?;
        if team.repositories.iter().any(|s| s.id == repo.id) {
            return Err(VcsError::exists("team repository", &repo.id));
        }
        team.repositories.push(RepositorySnapshot::capture(repo));
        team.updated_at = Utc::now();
        info!(team_id = %team.id, repo_id = %repo.id, "snapshot added to team");
        let idx = team.repositories.len() - 1;
        Ok(&team.repositories[idx])
    }

    pub fn remove_repository(&mut self, id: &str, repo_id: &str) -> Result<RepositorySnapshot, VcsError> {
        let team = self.get_mut(id)?;
        let idx = team
            .repositories
            .iter()
            .position(|s| s.id == repo_id)
            .ok_or_else(|| VcsError::not_found("team repository", repo_id))?;
        let removed = team.repositories.remove(idx);
        team.updated_at = Utc::now();
        info!(team_id = %team.id, repo_id, "snapshot removed from team");
        Ok(removed)
    }

    /// Make `selected` exactly the set of teams holding a snapshot of `repo`.
    ///
    /// Every existing snapshot of the repository is dropped first, so the
    /// selected teams receive fresh copies. Unknown team ids are skipped.
    /// Returns the ids of the teams that now hold the repository.
    pub fn sync_assignments(&mut self, repo: &Repository, selected: &[String]) -> Vec<String> {
        for team in &mut self.teams {
            team.repositories.retain(|s| s.id != repo.id);
        }

        let mut assigned = Vec::new();
        for team_id in selected {
            let Some(team) = self.teams.iter_mut().find(|t| &t.id == team_id) else {
                debug!(team_id = %team_id, "skipping unknown team");
                continue;
            };
            if assigned.contains(&team.id) {
                continue;
            }
            team.repositories.push(RepositorySnapshot::capture(repo));
            team.updated_at = Utc::now();
            assigned.push(team.id.clone());
        }
        info!(repo_id = %repo.id, teams = assigned.len(), "synced team assignments");
        assigned
    }

    /// Ids of the teams holding a snapshot of `repo_id`.
    pub fn assigned_team_ids(&self, repo_id: &str) -> Vec<String> {
        self.teams
            .iter()
            .filter(|t| t.repositories.iter().any(|s| s.id == repo_id))
            .map(|t| t.id.clone())
            .collect()
    }
}
