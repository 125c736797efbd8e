//! Persistence gateway: moves [`ApplicationState`] in and out of a
//! [`KeyValueStore`] as one JSON blob per key.
//!
//! Loading never fails on bad data. An absent key or a blob that does not
//! parse falls back to the default for that key and logs a warning. Backend
//! errors do propagate.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::KeyValueStore;
use crate::errors::StorageError;
use crate::models::{Activity, Repository, Team, UserProfile, UserSettings};
use crate::repository::RepositoryStore;
use crate::team::TeamStore;

pub const KEY_REPOSITORIES: &str = "repositories";
pub const KEY_TEAMS: &str = "teams";
pub const KEY_USER_PROFILE: &str = "userProfile";
pub const KEY_USER_SETTINGS: &str = "userSettings";
pub const KEY_ACTIVITY_LOG: &str = "activityLog";

/// Every key the gateway owns.
pub const ALL_KEYS: &[&str] = &[
    KEY_REPOSITORIES,
    KEY_TEAMS,
    KEY_USER_PROFILE,
    KEY_USER_SETTINGS,
    KEY_ACTIVITY_LOG,
];

/// Everything the application keeps: the two root collections plus the user
/// record and the activity log (oldest first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationState {
    pub repositories: RepositoryStore,
    pub teams: TeamStore,
    pub user_profile: UserProfile,
    pub user_settings: UserSettings,
    pub activities: Vec<Activity>,
}

impl ApplicationState {
    /// The newest `n` activities, newest first.
    pub fn recent_activities(&self, n: usize) -> impl Iterator<Item = &Activity> {
        self.activities.iter().rev().take(n)
    }
}

/// Reads and writes [`ApplicationState`] through a key-value backend.
pub struct PersistenceGateway {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceGateway {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Load the full state, substituting defaults for missing or bad blobs.
    pub fn load(&self) -> Result<ApplicationState, StorageError> {
        let repositories: Vec<Repository> = self.read_or_default(KEY_REPOSITORIES)?;
        let teams: Vec<Team> = self.read_or_default(KEY_TEAMS)?;
        let state = ApplicationState {
            repositories: RepositoryStore::from_vec(repositories),
            teams: TeamStore::from_vec(teams),
            user_profile: self.read_or_default(KEY_USER_PROFILE)?,
            user_settings: self.read_or_default(KEY_USER_SETTINGS)?,
            activities: self.read_or_default(KEY_ACTIVITY_LOG)?,
        };
        info!(
            repositories = state.repositories.len(),
            teams = state.teams.len(),
            activities = state.activities.len(),
            "loaded application state"
        );
        Ok(state)
    }

    /// Write every key. Each `set` is atomic on its own.
    pub fn flush(&self, state: &ApplicationState) -> Result<(), StorageError> {
        self.write(KEY_REPOSITORIES, state.repositories.list())?;
        self.write(KEY_TEAMS, state.teams.list())?;
        self.write(KEY_USER_PROFILE, &state.user_profile)?;
        self.write(KEY_USER_SETTINGS, &state.user_settings)?;
        self.write(KEY_ACTIVITY_LOG, &state.activities)?;
        debug!("flushed application state");
        Ok(())
    }

    /// Remove every key the gateway owns.
    pub fn clear(&self) -> Result<(), StorageError> {
        for key in ALL_KEYS {
            self.store.remove(key)?;
        }
        info!("cleared all stored data");
        Ok(())
    }

    fn read_or_default<T>(&self, key: &str) -> Result<T, StorageError>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.store.get(key)? else {
            debug!(key, "key absent, using default");
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key, error = %e, "stored value is invalid, using default");
                Ok(T::default())
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }
}
