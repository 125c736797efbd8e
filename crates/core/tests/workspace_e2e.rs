//! End-to-end tests for a PromptVCS workspace.
//!
//! These tests drive a real `Session` with:
//! - Real SQLite databases in temporary directories
//! - Configuration loaded from TOML files
//! - Seeded or scripted randomness so outcomes are reproducible

use std::path::Path;

use tempfile::TempDir;

use promptvcs_core::config::{AppConfig, OracleKind, StorageBackend};
use promptvcs_core::conflict::{ConflictOracle, ContentConflictOracle, RandomConflictOracle};
use promptvcs_core::db::SqliteStore;
use promptvcs_core::errors::{CoreError, TransferError};
use promptvcs_core::models::{ConflictResolution, MemberRole};
use promptvcs_core::oracle::{SeededRandom, SequenceRandom};
use promptvcs_core::repository::NewRepository;
use promptvcs_core::session::ProfileUpdate;
use promptvcs_core::team::NewTeam;
use promptvcs_core::transfer::parse_import;
use promptvcs_core::{Command, Event, Session};

// ===========================================================================
// Helpers
// ===========================================================================

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let toml = format!(
        "[storage]\nbackend = \"sqlite\"\ndata_dir = \"{}\"\ndatabase_file = \"state.db\"\n\n{extra}",
        dir.join("data").display()
    );
    std::fs::write(&path, toml).unwrap();
    path
}

fn open(dir: &Path, extra: &str) -> Session {
    let config = AppConfig::load_from_file(write_config(dir, extra)).unwrap();
    config.validate().unwrap();
    Session::open(&config).unwrap()
}

fn sqlite_session(dir: &Path, conflict_roll: f64) -> Session {
    let store = SqliteStore::new(dir.join("state.db")).unwrap();
    store.initialize().unwrap();
    Session::new(
        Box::new(store),
        Box::new(SeededRandom::new(11)),
        Box::new(RandomConflictOracle::new(SequenceRandom::new(vec![conflict_roll]))),
    )
    .unwrap()
}

fn created_repo_id(events: &[Event]) -> String {
    events
        .iter()
        .find_map(|e| match e {
            Event::RepositoryCreated(r) => Some(r.id.clone()),
            _ => None,
        })
        .expect("no RepositoryCreated event")
}

fn created_team_id(events: &[Event]) -> String {
    events
        .iter()
        .find_map(|e| match e {
            Event::TeamCreated(t) => Some(t.id.clone()),
            _ => None,
        })
        .expect("no TeamCreated event")
}

/// Parse then apply, the way the CLI imports a file.
fn import(session: &mut Session, json: &str) -> Result<Vec<Event>, CoreError> {
    let doc = parse_import(json)?;
    session.execute(Command::Import(doc))
}

fn commit(session: &mut Session, repo_id: &str, message: &str, content: &str) -> String {
    let events = session
        .execute(Command::CreateVersion {
            repo_id: repo_id.to_string(),
            message: message.to_string(),
            content: content.to_string(),
            tags: Vec::new(),
        })
        .unwrap();
    match &events[0] {
        Event::VersionCreated { version, .. } => version.id.clone(),
        other => panic!("unexpected event {other:?}"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_state_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let repo_id;
    {
        let mut session = open(tmp.path(), "");
        repo_id = created_repo_id(
            &session
                .execute(Command::CreateRepository {
                    new: NewRepository {
                        name: "Support bot".into(),
                        initial_prompt: Some("You are a helpful assistant.".into()),
                        ..Default::default()
                    },
                    team_ids: Vec::new(),
                })
                .unwrap(),
        );
        commit(&mut session, &repo_id, "Tighten tone", "You are a concise assistant.");
    }

    assert!(tmp.path().join("data").join("state.db").exists());
    let session = open(tmp.path(), "");
    let repo = session.repository("Support bot").unwrap();
    assert_eq!(repo.id, repo_id);
    assert_eq!(repo.versions.len(), 2);
    assert_eq!(repo.versions[0].message, "Initial commit");
    assert_eq!(session.state().activities.len(), 2);
}

#[test]
fn test_memory_backend_forgets() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[storage]\nbackend = \"memory\"\n").unwrap();
    let config = AppConfig::load_from_file(&path).unwrap();
    assert_eq!(config.storage.backend, StorageBackend::Memory);

    {
        let mut session = Session::open(&config).unwrap();
        session
            .execute(Command::CreateRepository {
                new: NewRepository::named("R1"),
                team_ids: Vec::new(),
            })
            .unwrap();
    }
    let session = Session::open(&config).unwrap();
    assert!(session.state().repositories.is_empty());
}

#[test]
fn test_scenario_branch_and_merge() {
    let tmp = TempDir::new().unwrap();
    let mut session = open(tmp.path(), "[simulation]\nseed = 5\n");
    let repo_id = created_repo_id(
        &session
            .execute(Command::CreateRepository {
                new: NewRepository::named("R1"),
                team_ids: Vec::new(),
            })
            .unwrap(),
    );
    {
        let repo = session.repository(&repo_id).unwrap();
        assert_eq!(repo.branches, vec!["main"]);
        assert!(repo.versions.is_empty());
    }

    commit(&mut session, &repo_id, "m1", "c1");
    let v = &session.repository(&repo_id).unwrap().versions[0];
    assert_eq!(v.branch, "main");
    assert!((75..=100).contains(&v.performance.accuracy));

    for command in [
        Command::CreateBranch {
            repo_id: repo_id.clone(),
            name: "dev".into(),
        },
        Command::SwitchBranch {
            repo_id: repo_id.clone(),
            name: "dev".into(),
        },
    ] {
        session.execute(command).unwrap();
    }

    let events = session
        .execute(Command::AttemptMerge {
            repo_id: repo_id.clone(),
        })
        .unwrap();
    let repo = session.repository(&repo_id).unwrap();
    match &events[0] {
        Event::MergeCompleted { .. } => assert!(repo.conflicts.is_empty()),
        Event::ConflictDetected { conflict, .. } => {
            assert_eq!(repo.conflicts.len(), 1);
            assert_eq!(conflict.branches, vec!["dev", "main"]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_conflict_lifecycle_persists() {
    let tmp = TempDir::new().unwrap();
    let repo_id;
    let conflict_id;
    {
        let mut session = sqlite_session(tmp.path(), 0.95);
        repo_id = created_repo_id(
            &session
                .execute(Command::CreateRepository {
                    new: NewRepository::named("R1"),
                    team_ids: Vec::new(),
                })
                .unwrap(),
        );
        session
            .execute(Command::CreateBranch {
                repo_id: repo_id.clone(),
                name: "feature".into(),
            })
            .unwrap();
        let events = session
            .execute(Command::AttemptMerge {
                repo_id: repo_id.clone(),
            })
            .unwrap();
        conflict_id = match &events[0] {
            Event::ConflictDetected { conflict, .. } => conflict.id.clone(),
            other => panic!("expected a conflict, got {other:?}"),
        };
    }

    let mut session = sqlite_session(tmp.path(), 0.0);
    assert_eq!(session.repository(&repo_id).unwrap().unresolved_conflicts(), 1);
    session
        .execute(Command::ResolveConflict {
            repo_id: repo_id.clone(),
            conflict_id,
            resolution: ConflictResolution::Incoming,
        })
        .unwrap();
    session
        .execute(Command::FinalizeMerge {
            repo_id: repo_id.clone(),
        })
        .unwrap();
    assert!(session.repository(&repo_id).unwrap().conflicts.is_empty());
}

#[test]
fn test_rollback_twice_yields_distinct_copies() {
    let tmp = TempDir::new().unwrap();
    let mut session = sqlite_session(tmp.path(), 0.0);
    let repo_id = created_repo_id(
        &session
            .execute(Command::CreateRepository {
                new: NewRepository::named("R1"),
                team_ids: Vec::new(),
            })
            .unwrap(),
    );
    let v1 = commit(&mut session, &repo_id, "first", "alpha");
    commit(&mut session, &repo_id, "second", "beta");

    let mut copies = Vec::new();
    for _ in 0..2 {
        let events = session
            .execute(Command::Rollback {
                repo_id: repo_id.clone(),
                version_id: v1.clone(),
            })
            .unwrap();
        match &events[0] {
            Event::RolledBack { version, .. } => copies.push(version.clone()),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_ne!(copies[0].id, copies[1].id);
    assert_eq!(copies[0].content, "alpha");
    assert_eq!(copies[0].content, copies[1].content);
    assert_eq!(copies[0].message, "Rollback to: first");
    assert_eq!(copies[0].message, copies[1].message);
    assert_eq!(session.repository(&repo_id).unwrap().versions.len(), 4);
}

#[test]
fn test_deleted_repository_snapshot_stays_in_team() {
    let tmp = TempDir::new().unwrap();
    let mut session = sqlite_session(tmp.path(), 0.0);
    let team_id = created_team_id(
        &session
            .execute(Command::CreateTeam(NewTeam {
                name: "A-Team".into(),
                member_emails: vec!["alice@example.com".into()],
                ..Default::default()
            }))
            .unwrap(),
    );
    let repo_id = created_repo_id(
        &session
            .execute(Command::CreateRepository {
                new: NewRepository {
                    name: "Support bot".into(),
                    initial_prompt: Some("Be kind.".into()),
                    ..Default::default()
                },
                team_ids: vec![team_id.clone()],
            })
            .unwrap(),
    );
    let before = session.team(&team_id).unwrap().repositories[0].clone();

    session
        .execute(Command::DeleteRepository {
            id: repo_id.clone(),
        })
        .unwrap();
    assert!(session.repository(&repo_id).is_err());
    let team = session.team("A-Team").unwrap();
    assert_eq!(team.repositories, vec![before]);
    assert_eq!(team.members.len(), 2);
    assert_eq!(team.members[0].role, MemberRole::Admin);
}

#[test]
fn test_export_import_roundtrip_across_databases() {
    let src_dir = TempDir::new().unwrap();
    let dst_dir = TempDir::new().unwrap();

    let mut src = sqlite_session(src_dir.path(), 0.0);
    let team_id = created_team_id(&src.execute(Command::CreateTeam(NewTeam::named("Core"))).unwrap());
    let repo_id = created_repo_id(
        &src.execute(Command::CreateRepository {
            new: NewRepository::named("R1"),
            team_ids: vec![team_id],
        })
        .unwrap(),
    );
    commit(&mut src, &repo_id, "m1", "c1");
    let export_path = src_dir.path().join("export.json");
    src.export_to(&export_path).unwrap();
    assert_eq!(src.state().activities.last().unwrap().message, "Exported data");
    let json = std::fs::read_to_string(&export_path).unwrap();

    let mut dst = sqlite_session(dst_dir.path(), 0.0);
    import(&mut dst, &json).unwrap();
    assert_eq!(dst.state().repositories, src.state().repositories);
    assert_eq!(dst.state().teams, src.state().teams);
    assert_eq!(dst.state().user_profile, src.state().user_profile);
    assert_eq!(dst.state().user_settings, src.state().user_settings);

    drop(dst);
    let reopened = sqlite_session(dst_dir.path(), 0.0);
    assert_eq!(reopened.state().repositories, src.state().repositories);
}

#[test]
fn test_content_oracle_from_config() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "[simulation]\nconflict_oracle = \"content\"\n");
    let config = AppConfig::load_from_file(&config_path).unwrap();
    assert_eq!(config.simulation.conflict_oracle, OracleKind::Content);

    let mut session = Session::open(&config).unwrap();
    let repo_id = created_repo_id(
        &session
            .execute(Command::CreateRepository {
                new: NewRepository::named("R1"),
                team_ids: Vec::new(),
            })
            .unwrap(),
    );
    commit(&mut session, &repo_id, "base", "Answer briefly.\n");
    for command in [
        Command::CreateBranch {
            repo_id: repo_id.clone(),
            name: "dev".into(),
        },
        Command::SwitchBranch {
            repo_id: repo_id.clone(),
            name: "dev".into(),
        },
    ] {
        session.execute(command).unwrap();
    }
    commit(&mut session, &repo_id, "detail", "Answer in detail.\n");
    session
        .execute(Command::SwitchBranch {
            repo_id: repo_id.clone(),
            name: "main".into(),
        })
        .unwrap();
    commit(&mut session, &repo_id, "short", "Answer in one sentence.\n");

    let events = session
        .execute(Command::AttemptMerge {
            repo_id: repo_id.clone(),
        })
        .unwrap();
    assert!(matches!(events[0], Event::ConflictDetected { .. }));

    let repo = session.repository(&repo_id).unwrap();
    assert!(ContentConflictOracle.detect(repo, "main", "dev").is_some());
}

#[test]
fn test_malformed_import_leaves_populated_state_untouched() {
    let tmp = TempDir::new().unwrap();
    let mut session = sqlite_session(tmp.path(), 0.0);

    let team_id = created_team_id(&session.execute(Command::CreateTeam(NewTeam::named("Core"))).unwrap());
    let repo_id = created_repo_id(
        &session
            .execute(Command::CreateRepository {
                new: NewRepository::named("R1"),
                team_ids: vec![team_id],
            })
            .unwrap(),
    );
    commit(&mut session, &repo_id, "m1", "c1");
    session
        .execute(Command::UpdateProfile(ProfileUpdate {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            ..Default::default()
        }))
        .unwrap();
    let before = session.state().clone();

    for bad in ["{ nope", "[1, 2", r#"{"repositories": 5}"#, r#"{"teams": [{"name": 1}]}"#] {
        let err = import(&mut session, bad).unwrap_err();
        assert!(
            matches!(err, CoreError::Transfer(TransferError::InvalidFormat(_))),
            "{bad}: {err}"
        );
        assert_eq!(session.state(), &before, "{bad}");
    }

    drop(session);
    let reopened = sqlite_session(tmp.path(), 0.0);
    assert_eq!(reopened.state(), &before);
}

#[test]
fn test_failed_export_write_is_not_recorded() {
    let tmp = TempDir::new().unwrap();
    let mut session = sqlite_session(tmp.path(), 0.0);
    created_repo_id(
        &session
            .execute(Command::CreateRepository {
                new: NewRepository::named("R1"),
                team_ids: Vec::new(),
            })
            .unwrap(),
    );
    let before = session.state().clone();

    let path = tmp.path().join("no-such-dir").join("out.json");
    let err = session.export_to(&path).unwrap_err();
    assert!(matches!(err, CoreError::Transfer(TransferError::Io(_))));

    drop(session);
    let reopened = sqlite_session(tmp.path(), 0.0);
    assert_eq!(reopened.state(), &before);
    assert!(reopened
        .state()
        .activities
        .iter()
        .all(|a| a.message != "Exported data"));
}
