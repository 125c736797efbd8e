//! Whole-state export and import documents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::TransferError;
use crate::models::{Activity, Repository, Team, UserProfile, UserSettings};
use crate::persistence::ApplicationState;
use crate::repository::RepositoryStore;
use crate::team::TeamStore;

/// The exported JSON document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub repositories: &'a [Repository],
    pub teams: &'a [Team],
    pub user_profile: &'a UserProfile,
    pub user_settings: &'a UserSettings,
    pub activities: &'a [Activity],
    pub export_date: DateTime<Utc>,
}

/// An import document. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDocument {
    #[serde(default)]
    pub repositories: Option<Vec<Repository>>,
    #[serde(default)]
    pub teams: Option<Vec<Team>>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub user_settings: Option<UserSettings>,
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
}

/// Serialize `state` as a pretty-printed export document.
pub fn export_json(state: &ApplicationState) -> Result<String, TransferError> {
    let doc = ExportDocument {
        repositories: state.repositories.list(),
        teams: state.teams.list(),
        user_profile: &state.user_profile,
        user_settings: &state.user_settings,
        activities: &state.activities,
        export_date: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&doc)
        .map_err(|e| TransferError::InvalidFormat(e.to_string()))?;
    info!(
        repositories = doc.repositories.len(),
        teams = doc.teams.len(),
        bytes = json.len(),
        "exported state"
    );
    Ok(json)
}

/// Parse an export document without touching any state.
pub fn parse_import(json: &str) -> Result<ImportDocument, TransferError> {
    serde_json::from_str(json).map_err(|e| TransferError::InvalidFormat(e.to_string()))
}

/// Replace repositories and teams with the document's (empty when missing).
/// Profile and settings are replaced only when present. The activity log is
/// kept.
pub fn apply_import(state: &mut ApplicationState, doc: ImportDocument) {
    state.repositories = RepositoryStore::from_vec(doc.repositories.unwrap_or_default());
    state.teams = TeamStore::from_vec(doc.teams.unwrap_or_default());
    if let Some(profile) = doc.user_profile {
        state.user_profile = profile;
    }
    if let Some(settings) = doc.user_settings {
        state.user_settings = settings;
    }
    info!(
        repositories = state.repositories.len(),
        teams = state.teams.len(),
        "imported state"
    );
}

/// `promptvcs-export-YYYY-MM-DD.json`
pub fn default_export_file_name(date: NaiveDate) -> String {
    format!("promptvcs-export-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SequenceRandom;
    use crate::repository::NewRepository;
    use crate::team::NewTeam;

    fn state() -> ApplicationState {
        let mut state = ApplicationState::default();
        state
            .repositories
            .create(NewRepository::named("R1"), "you@example.com", &mut SequenceRandom::default())
            .unwrap();
        state.teams.create(NewTeam::named("Core"), "you@example.com").unwrap();
        state.user_profile.bio = "hi".into();
        state.activities.push(Activity::new("Created repository"));
        state
    }

    #[test]
    fn test_export_shape() {
        let json = export_json(&state()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["repositories", "teams", "userProfile", "userSettings", "activities", "exportDate"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["repositories"][0]["currentBranch"], "main");
    }

    #[test]
    fn test_export_then_import_restores_state() {
        let original = state();
        let json = export_json(&original).unwrap();

        let mut target = ApplicationState::default();
        target.activities.push(Activity::new("kept"));
        apply_import(&mut target, parse_import(&json).unwrap());

        assert_eq!(target.repositories, original.repositories);
        assert_eq!(target.teams, original.teams);
        assert_eq!(target.user_profile, original.user_profile);
        assert_eq!(target.user_settings, original.user_settings);
        assert_eq!(target.activities.len(), 1);
        assert_eq!(target.activities[0].message, "kept");
    }

    #[test]
    fn test_import_missing_fields() {
        let mut target = state();
        target.user_profile.name = "Ada".into();
        apply_import(&mut target, parse_import("{}").unwrap());
        assert!(target.repositories.is_empty());
        assert!(target.teams.is_empty());
        assert_eq!(target.user_profile.name, "Ada");
    }

    #[test]
    fn test_import_invalid_format() {
        assert!(matches!(parse_import("not json"), Err(TransferError::InvalidFormat(_))));
        assert!(matches!(
            parse_import(r#"{"repositories": 5}"#),
            Err(TransferError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_default_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(default_export_file_name(date), "promptvcs-export-2024-03-07.json");
    }
}
