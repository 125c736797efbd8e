//! The command dispatcher.
//!
//! A [`Session`] owns the loaded [`ApplicationState`], the persistence
//! gateway and the two oracles. Front ends build a [`Command`], hand it to
//! [`Session::execute`] and render the returned [`Event`]s. Every successful
//! mutation appends an activity entry and flushes the whole state.

use std::path::Path;

use tracing::{debug, info};

use crate::branch::BranchRegistry;
use crate::config::AppConfig;
use crate::conflict::{build_oracle, ConflictOracle, ConflictResolver, ConflictSimulator, MergeOutcome};
use crate::db::{open_store, KeyValueStore, MemoryStore};
use crate::errors::{CoreError, TransferError, VcsError};
use crate::ledger::{VersionAmendment, VersionLedger};
use crate::models::{
    Activity, Collaborator, Conflict, ConflictResolution, Member, MemberRole, Repository, Team,
    UserProfile, UserSettings, Version,
};
use crate::oracle::{random_source, RandomSource};
use crate::persistence::{ApplicationState, PersistenceGateway};
use crate::repository::{NewRepository, RepositoryUpdate};
use crate::stats::{chart_series, ChartSeries, DashboardStats};
use crate::team::{NewTeam, TeamUpdate};
use crate::transfer::{apply_import, export_json, ImportDocument};

/// Partial update of the user profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub timezone: Option<String>,
}

/// Partial update of the user settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub dark_mode: Option<bool>,
    pub language: Option<String>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub public_profile: Option<bool>,
    pub analytics: Option<bool>,
}

/// A state transition. Entity references are exact ids.
#[derive(Debug, Clone)]
pub enum Command {
    /// Create a repository, then assign it to `team_ids` when non-empty.
    CreateRepository {
        new: NewRepository,
        team_ids: Vec<String>,
    },
    UpdateRepository {
        id: String,
        update: RepositoryUpdate,
    },
    DeleteRepository {
        id: String,
    },
    AddCollaborator {
        repo_id: String,
        email: String,
    },
    RemoveCollaborator {
        repo_id: String,
        email: String,
    },
    CreateVersion {
        repo_id: String,
        message: String,
        content: String,
        tags: Vec<String>,
    },
    AmendVersion {
        repo_id: String,
        version_id: String,
        amendment: VersionAmendment,
    },
    Rollback {
        repo_id: String,
        version_id: String,
    },
    CreateBranch {
        repo_id: String,
        name: String,
    },
    SwitchBranch {
        repo_id: String,
        name: String,
    },
    AttemptMerge {
        repo_id: String,
    },
    ResolveConflict {
        repo_id: String,
        conflict_id: String,
        resolution: ConflictResolution,
    },
    FinalizeMerge {
        repo_id: String,
    },
    CreateTeam(NewTeam),
    UpdateTeam {
        id: String,
        update: TeamUpdate,
    },
    DeleteTeam {
        id: String,
    },
    AddMember {
        team_id: String,
        email: String,
        role: MemberRole,
    },
    RemoveMember {
        team_id: String,
        email: String,
    },
    AddTeamRepository {
        team_id: String,
        repo_id: String,
    },
    RemoveTeamRepository {
        team_id: String,
        repo_id: String,
    },
    /// Make `team_ids` exactly the teams holding a snapshot of the repository.
    SyncTeamAssignments {
        repo_id: String,
        team_ids: Vec<String>,
    },
    UpdateProfile(ProfileUpdate),
    UpdateSettings(SettingsUpdate),
    Import(ImportDocument),
    /// Note in the activity log that an export was written.
    RecordExport,
    /// Remove everything from the store and reset to defaults.
    ClearAll,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RepositoryCreated(Repository),
    RepositoryUpdated(Repository),
    RepositoryDeleted { id: String, name: String },
    CollaboratorAdded { repo_id: String, collaborator: Collaborator },
    CollaboratorRemoved { repo_id: String, collaborator: Collaborator },
    VersionCreated { repo_id: String, version: Version },
    VersionAmended { repo_id: String, version: Version },
    RolledBack { repo_id: String, source_id: String, version: Version },
    BranchCreated { repo_id: String, name: String },
    BranchSwitched { repo_id: String, name: String },
    MergeCompleted { repo_id: String },
    ConflictDetected { repo_id: String, conflict: Conflict },
    ConflictResolved { repo_id: String, conflict: Conflict },
    TeamCreated(Team),
    TeamUpdated(Team),
    TeamDeleted { id: String, name: String },
    MemberAdded { team_id: String, member: Member },
    MemberRemoved { team_id: String, member: Member },
    TeamRepositoryAdded { team_id: String, repo_id: String },
    TeamRepositoryRemoved { team_id: String, repo_id: String },
    AssignmentsSynced { repo_id: String, team_ids: Vec<String> },
    ProfileUpdated(UserProfile),
    SettingsUpdated(UserSettings),
    DataImported { repositories: usize, teams: usize },
    DataCleared,
    ActivityRecorded(Activity),
}

/// Loaded state plus the collaborators needed to change it.
pub struct Session {
    state: ApplicationState,
    gateway: PersistenceGateway,
    random: Box<dyn RandomSource>,
    oracle: Box<dyn ConflictOracle>,
}

impl Session {
    /// Load state from `store`.
    pub fn new(
        store: Box<dyn KeyValueStore>,
        random: Box<dyn RandomSource>,
        oracle: Box<dyn ConflictOracle>,
    ) -> Result<Self, CoreError> {
        let gateway = PersistenceGateway::new(store);
        let state = gateway.load()?;
        Ok(Self {
            state,
            gateway,
            random,
            oracle,
        })
    }

    /// Open the configured backend and build the configured oracles.
    pub fn open(config: &AppConfig) -> Result<Self, CoreError> {
        info!(
            backend = %config.storage.backend,
            oracle = %config.simulation.conflict_oracle,
            "opening session"
        );
        let store = open_store(&config.storage)?;
        Self::new(
            store,
            random_source(config.simulation.seed),
            build_oracle(&config.simulation),
        )
    }

    /// A session over an empty in-memory store.
    pub fn in_memory(
        random: Box<dyn RandomSource>,
        oracle: Box<dyn ConflictOracle>,
    ) -> Result<Self, CoreError> {
        Self::new(Box::new(MemoryStore::new()), random, oracle)
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    /// Look up a repository by id, id prefix or name.
    pub fn repository(&self, key: &str) -> Result<&Repository, CoreError> {
        Ok(self.state.repositories.resolve(key)?)
    }

    /// Look up a team by id, id prefix or name.
    pub fn team(&self, key: &str) -> Result<&Team, CoreError> {
        Ok(self.state.teams.resolve(key)?)
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(self.state.repositories.list(), self.state.teams.len())
    }

    pub fn chart(&self, repo_key: &str) -> Result<ChartSeries, CoreError> {
        Ok(chart_series(self.repository(repo_key)?))
    }

    /// Write an export document to `path`. The export is recorded only once
    /// the file is written.
    pub fn export_to(&mut self, path: &Path) -> Result<Vec<Event>, CoreError> {
        let json = export_json(&self.state)?;
        std::fs::write(path, json).map_err(TransferError::from)?;
        info!(path = %path.display(), "exported data");
        self.execute(Command::RecordExport)
    }

    /// Apply `command`, then record activity and flush.
    pub fn execute(&mut self, command: Command) -> Result<Vec<Event>, CoreError> {
        debug!(?command, "executing command");
        let (mut events, activity) = self.apply(command)?;
        if let Some(activity) = activity {
            self.state.activities.push(activity.clone());
            self.gateway.flush(&self.state)?;
            events.push(Event::ActivityRecorded(activity));
        }
        Ok(events)
    }

    /// Mutate the state. Returns no activity when nothing is left to flush.
    fn apply(&mut self, command: Command) -> Result<(Vec<Event>, Option<Activity>), CoreError> {
        let user = self.state.user_profile.email.clone();

        let result = match command {
            Command::CreateRepository { new, team_ids } => {
                let repo = self
                    .state
                    .repositories
                    .create(new, &user, self.random.as_mut())?
                    .clone();
                let activity = Activity::new(format!("Created repository \"{}\"", repo.name));
                let mut events = vec![Event::RepositoryCreated(repo.clone())];
                if !team_ids.is_empty() {
                    let team_ids = self.state.teams.sync_assignments(&repo, &team_ids);
                    events.push(Event::AssignmentsSynced {
                        repo_id: repo.id.clone(),
                        team_ids,
                    });
                }
                (events, activity)
            }
            Command::UpdateRepository { id, update } => {
                let repo = self.state.repositories.update(&id, update)?.clone();
                let activity = Activity::new(format!("Updated repository \"{}\"", repo.name));
                (vec![Event::RepositoryUpdated(repo)], activity)
            }
            Command::DeleteRepository { id } => {
                let repo = self.state.repositories.delete(&id)?;
                let activity = Activity::new(format!("Deleted repository \"{}\"", repo.name));
                (
                    vec![Event::RepositoryDeleted {
                        id: repo.id,
                        name: repo.name,
                    }],
                    activity,
                )
            }
            Command::AddCollaborator { repo_id, email } => {
                let collaborator = self.state.repositories.add_collaborator(&repo_id, &email)?;
                let name = self.repo_name(&repo_id);
                (
                    vec![Event::CollaboratorAdded { repo_id, collaborator }],
                    Activity::new(format!("Added collaborator to \"{name}\"")),
                )
            }
            Command::RemoveCollaborator { repo_id, email } => {
                let collaborator = self.state.repositories.remove_collaborator(&repo_id, &email)?;
                let name = self.repo_name(&repo_id);
                (
                    vec![Event::CollaboratorRemoved { repo_id, collaborator }],
                    Activity::new(format!("Removed collaborator from \"{name}\"")),
                )
            }
            Command::CreateVersion {
                repo_id,
                message,
                content,
                tags,
            } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                let version = VersionLedger::create_version(
                    repo,
                    &message,
                    &content,
                    &tags,
                    &user,
                    self.random.as_mut(),
                )?;
                let activity = Activity::new(format!("Created version in \"{}\"", repo.name));
                (vec![Event::VersionCreated { repo_id, version }], activity)
            }
            Command::AmendVersion {
                repo_id,
                version_id,
                amendment,
            } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                let version =
                    VersionLedger::amend_version(repo, &version_id, amendment, self.random.as_mut())?;
                let activity = Activity::new(format!("Updated version in \"{}\"", repo.name));
                (vec![Event::VersionAmended { repo_id, version }], activity)
            }
            Command::Rollback {
                repo_id,
                version_id,
            } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                let version = VersionLedger::rollback(repo, &version_id)?;
                let activity = Activity::new(format!("Rolled back to version in \"{}\"", repo.name));
                (
                    vec![Event::RolledBack {
                        repo_id,
                        source_id: version_id,
                        version,
                    }],
                    activity,
                )
            }
            Command::CreateBranch { repo_id, name } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(VcsError::invalid("name", "branch name must not be empty").into());
                }
                if !BranchRegistry::create_branch(repo, &name) {
                    return Err(VcsError::exists("branch", &name).into());
                }
                let activity =
                    Activity::new(format!("Created branch \"{name}\" in \"{}\"", repo.name));
                (vec![Event::BranchCreated { repo_id, name }], activity)
            }
            Command::SwitchBranch { repo_id, name } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                BranchRegistry::switch_branch(repo, &name)?;
                let activity = Activity::with_icon(
                    format!("Switched to branch \"{name}\" in \"{}\"", repo.name),
                    "code-branch",
                );
                (vec![Event::BranchSwitched { repo_id, name }], activity)
            }
            Command::AttemptMerge { repo_id } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                match ConflictSimulator::attempt_merge(repo, self.oracle.as_mut()) {
                    MergeOutcome::Clean => {
                        let activity = Activity::new(format!("Merged branches in \"{}\"", repo.name));
                        (vec![Event::MergeCompleted { repo_id }], activity)
                    }
                    MergeOutcome::Conflicted(conflict) => {
                        let activity = Activity::with_icon(
                            format!("Merge conflict in \"{}\"", repo.name),
                            "exclamation-triangle",
                        );
                        (vec![Event::ConflictDetected { repo_id, conflict }], activity)
                    }
                }
            }
            Command::ResolveConflict {
                repo_id,
                conflict_id,
                resolution,
            } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                let conflict = ConflictResolver::resolve(repo, &conflict_id, resolution)?;
                let activity = Activity::new(format!("Resolved conflict in \"{}\"", repo.name));
                (vec![Event::ConflictResolved { repo_id, conflict }], activity)
            }
            Command::FinalizeMerge { repo_id } => {
                let repo = self.state.repositories.get_mut(&repo_id)?;
                ConflictSimulator::finalize_merge(repo)?;
                let activity = Activity::new(format!("Merged branches in \"{}\"", repo.name));
                (vec![Event::MergeCompleted { repo_id }], activity)
            }
            Command::CreateTeam(new) => {
                let team = self.state.teams.create(new, &user)?.clone();
                let activity = Activity::new(format!("Created team \"{}\"", team.name));
                (vec![Event::TeamCreated(team)], activity)
            }
            Command::UpdateTeam { id, update } => {
                let team = self.state.teams.update(&id, update)?.clone();
                let activity =
                    Activity::new(format!("Updated team settings for \"{}\"", team.name));
                (vec![Event::TeamUpdated(team)], activity)
            }
            Command::DeleteTeam { id } => {
                let team = self.state.teams.delete(&id)?;
                let activity = Activity::new(format!("Deleted team \"{}\"", team.name));
                (
                    vec![Event::TeamDeleted {
                        id: team.id,
                        name: team.name,
                    }],
                    activity,
                )
            }
            Command::AddMember {
                team_id,
                email,
                role,
            } => {
                let member = self.state.teams.add_member(&team_id, &email, role)?;
                let name = self.team_name(&team_id);
                let activity = Activity::new(format!("Added {} to team \"{name}\"", member.email));
                (vec![Event::MemberAdded { team_id, member }], activity)
            }
            Command::RemoveMember { team_id, email } => {
                let member = self.state.teams.remove_member(&team_id, &email)?;
                let name = self.team_name(&team_id);
                let activity =
                    Activity::new(format!("Removed {} from team \"{name}\"", member.email));
                (vec![Event::MemberRemoved { team_id, member }], activity)
            }
            Command::AddTeamRepository { team_id, repo_id } => {
                let repo = self.state.repositories.get(&repo_id)?;
                self.state.teams.add_repository(&team_id, repo)?;
                let activity = Activity::new(format!(
                    "Added repository \"{}\" to team \"{}\"",
                    repo.name,
                    self.team_name(&team_id)
                ));
                (vec![Event::TeamRepositoryAdded { team_id, repo_id }], activity)
            }
            Command::RemoveTeamRepository { team_id, repo_id } => {
                self.state.teams.remove_repository(&team_id, &repo_id)?;
                let activity = Activity::new(format!(
                    "Removed repository from team \"{}\"",
                    self.team_name(&team_id)
                ));
                (vec![Event::TeamRepositoryRemoved { team_id, repo_id }], activity)
            }
            Command::SyncTeamAssignments { repo_id, team_ids } => {
                let repo = self.state.repositories.get(&repo_id)?;
                let team_ids = self.state.teams.sync_assignments(repo, &team_ids);
                let activity = Activity::with_icon(
                    format!("Updated team access for \"{}\"", repo.name),
                    "users",
                );
                (vec![Event::AssignmentsSynced { repo_id, team_ids }], activity)
            }
            Command::UpdateProfile(update) => {
                let profile = self.update_profile(update)?;
                (
                    vec![Event::ProfileUpdated(profile)],
                    Activity::with_icon("Updated user profile", "user"),
                )
            }
            Command::UpdateSettings(update) => {
                let settings = self.update_settings(update);
                (
                    vec![Event::SettingsUpdated(settings)],
                    Activity::with_icon("Updated settings", "cog"),
                )
            }
            Command::Import(doc) => {
                apply_import(&mut self.state, doc);
                (
                    vec![Event::DataImported {
                        repositories: self.state.repositories.len(),
                        teams: self.state.teams.len(),
                    }],
                    Activity::with_icon("Imported data", "upload"),
                )
            }
            Command::RecordExport => (Vec::new(), Activity::with_icon("Exported data", "download")),
            Command::ClearAll => {
                self.gateway.clear()?;
                self.state = ApplicationState::default();
                return Ok((vec![Event::DataCleared], None));
            }
        };
        Ok((result.0, Some(result.1)))
    }

    fn repo_name(&self, id: &str) -> String {
        self.state
            .repositories
            .get(id)
            .map(|r| r.name.clone())
            .unwrap_or_default()
    }

    fn team_name(&self, id: &str) -> String {
        self.state
            .teams
            .get(id)
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }

    fn update_profile(&mut self, update: ProfileUpdate) -> Result<UserProfile, VcsError> {
        for (field, value) in [("name", &update.name), ("email", &update.email)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(VcsError::invalid(field, "must not be empty"));
            }
        }
        let profile = &mut self.state.user_profile;
        if let Some(name) = update.name {
            profile.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            profile.email = email.trim().to_string();
        }
        if let Some(bio) = update.bio {
            profile.bio = bio;
        }
        if let Some(timezone) = update.timezone {
            profile.timezone = timezone;
        }
        Ok(profile.clone())
    }

    fn update_settings(&mut self, update: SettingsUpdate) -> UserSettings {
        let settings = &mut self.state.user_settings;
        if let Some(v) = update.dark_mode {
            settings.dark_mode = v;
        }
        if let Some(v) = update.language {
            settings.language = v;
        }
        if let Some(v) = update.email_notifications {
            settings.email_notifications = v;
        }
        if let Some(v) = update.push_notifications {
            settings.push_notifications = v;
        }
        if let Some(v) = update.public_profile {
            settings.public_profile = v;
        }
        if let Some(v) = update.analytics {
            settings.analytics = v;
        }
        settings.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::RandomConflictOracle;
    use crate::errors::ConflictError;
    use crate::oracle::SequenceRandom;
    use crate::transfer::parse_import;

    fn session(conflict_roll: f64) -> Session {
        Session::in_memory(
            Box::new(SequenceRandom::new(vec![0.5])),
            Box::new(RandomConflictOracle::new(SequenceRandom::new(vec![conflict_roll]))),
        )
        .unwrap()
    }

    fn create_repo(s: &mut Session, name: &str) -> String {
        let events = s
            .execute(Command::CreateRepository {
                new: NewRepository::named(name),
                team_ids: Vec::new(),
            })
            .unwrap();
        match &events[0] {
            Event::RepositoryCreated(repo) => repo.id.clone(),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_create_repository_records_activity_and_flushes() {
        let mut s = session(0.0);
        let id = create_repo(&mut s, "R1");

        let repo = s.repository("R1").unwrap();
        assert_eq!(repo.id, id);
        assert_eq!(repo.collaborators[0].email, "user@example.com");
        assert_eq!(s.state().activities.len(), 1);
        assert_eq!(s.state().activities[0].message, "Created repository \"R1\"");

        let reloaded = s.gateway.load().unwrap();
        assert_eq!(&reloaded, s.state());
    }

    #[test]
    fn test_failed_command_changes_nothing() {
        let mut s = session(0.0);
        let id = create_repo(&mut s, "R1");
        let before = s.state().clone();

        let err = s
            .execute(Command::CreateVersion {
                repo_id: id.clone(),
                message: " ".into(),
                content: "c".into(),
                tags: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Vcs(VcsError::InvalidInput { .. })));

        let err = s
            .execute(Command::CreateBranch {
                repo_id: id.clone(),
                name: "main".into(),
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Vcs(VcsError::AlreadyExists { .. })));

        let err = s
            .execute(Command::SwitchBranch {
                repo_id: id,
                name: "nope".into(),
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Vcs(VcsError::InvalidBranch(_))));

        assert_eq!(s.state(), &before);
    }

    #[test]
    fn test_versions_use_profile_email_as_author() {
        let mut s = session(0.0);
        let id = create_repo(&mut s, "R1");
        s.execute(Command::UpdateProfile(ProfileUpdate {
            email: Some("ada@example.com".into()),
            ..Default::default()
        }))
        .unwrap();
        let events = s
            .execute(Command::CreateVersion {
                repo_id: id,
                message: "m1".into(),
                content: "c1".into(),
                tags: vec!["beta".into()],
            })
            .unwrap();
        let Event::VersionCreated { version, .. } = &events[0] else {
            panic!("expected VersionCreated");
        };
        assert_eq!(version.author, "ada@example.com");
        assert!(matches!(events[1], Event::ActivityRecorded(_)));
    }

    #[test]
    fn test_merge_conflict_resolve_finalize() {
        let mut s = session(0.99);
        let id = create_repo(&mut s, "R1");
        s.execute(Command::CreateBranch {
            repo_id: id.clone(),
            name: "dev".into(),
        })
        .unwrap();

        let events = s.execute(Command::AttemptMerge { repo_id: id.clone() }).unwrap();
        let Event::ConflictDetected { conflict, .. } = &events[0] else {
            panic!("expected a conflict");
        };
        let conflict_id = conflict.id.clone();

        let err = s.execute(Command::FinalizeMerge { repo_id: id.clone() }).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(ConflictError::Unresolved(1))));

        s.execute(Command::ResolveConflict {
            repo_id: id.clone(),
            conflict_id,
            resolution: ConflictResolution::Manual,
        })
        .unwrap();
        let events = s.execute(Command::FinalizeMerge { repo_id: id.clone() }).unwrap();
        assert!(matches!(events[0], Event::MergeCompleted { .. }));
        assert!(s.repository(&id).unwrap().conflicts.is_empty());
    }

    #[test]
    fn test_create_repository_with_teams() {
        let mut s = session(0.0);
        let events = s.execute(Command::CreateTeam(NewTeam::named("Core"))).unwrap();
        let Event::TeamCreated(team) = &events[0] else {
            panic!("expected TeamCreated");
        };
        let team_id = team.id.clone();

        let events = s
            .execute(Command::CreateRepository {
                new: NewRepository::named("R1"),
                team_ids: vec![team_id.clone(), "ghost".into()],
            })
            .unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            Event::AssignmentsSynced { team_ids, .. } if team_ids == &vec![team_id.clone()]
        ));
        assert_eq!(s.team("Core").unwrap().repositories.len(), 1);
    }

    #[test]
    fn test_export_import_and_clear() {
        let mut s = session(0.0);
        create_repo(&mut s, "R1");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        s.export_to(&path).unwrap();
        assert_eq!(s.state().activities.last().unwrap().message, "Exported data");
        let json = std::fs::read_to_string(&path).unwrap();

        s.execute(Command::ClearAll).unwrap();
        assert!(s.state().repositories.is_empty());
        assert!(s.state().activities.is_empty());

        s.execute(Command::Import(parse_import(&json).unwrap())).unwrap();
        assert_eq!(s.state().repositories.len(), 1);
        assert_eq!(s.state().activities.len(), 1);
        assert_eq!(s.state().activities[0].message, "Imported data");
    }

    #[test]
    fn test_failed_export_write_records_nothing() {
        let mut s = session(0.0);
        create_repo(&mut s, "R1");
        let before = s.state().clone();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("export.json");
        let err = s.export_to(&path).unwrap_err();
        assert!(matches!(err, CoreError::Transfer(TransferError::Io(_))));
        assert!(!path.exists());
        assert_eq!(s.state(), &before);
        assert_ne!(s.state().activities.last().unwrap().message, "Exported data");
    }

    #[test]
    fn test_settings_update() {
        let mut s = session(0.0);
        s.execute(Command::UpdateSettings(SettingsUpdate {
            dark_mode: Some(true),
            language: Some("fr".into()),
            ..Default::default()
        }))
        .unwrap();
        let settings = &s.state().user_settings;
        assert!(settings.dark_mode);
        assert_eq!(settings.language, "fr");
        assert!(settings.analytics);
    }
}
