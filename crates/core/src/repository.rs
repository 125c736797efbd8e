//! Repository store: the root collection of prompt repositories.
//!
//! The store owns every [`Repository`] together with its versions, branches,
//! collaborators and conflicts. Deleting a repository cascades nothing; team
//! snapshots of it are left as they are.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::VcsError;
use crate::models::{
    Collaborator, CollaboratorRole, Repository, Version, DEFAULT_BRANCH,
};
use crate::oracle::{sample_repository_performance, RandomSource, INITIAL_COMMIT_PERFORMANCE};

/// Message of the version created from an initial prompt.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Input for [`RepositoryStore::create`].
#[derive(Debug, Clone, Default)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    /// When non-empty, becomes the content of an "Initial commit" on `main`.
    pub initial_prompt: Option<String>,
}

impl NewRepository {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update for [`RepositoryStore::update`]. `None` keeps a field.
#[derive(Debug, Clone, Default)]
pub struct RepositoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub private: Option<bool>,
}

/// Owner of all repositories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryStore {
    repos: Vec<Repository>,
}

impl RepositoryStore {
    pub fn from_vec(repos: Vec<Repository>) -> Self {
        Self { repos }
    }

    pub fn list(&self) -> &[Repository] {
        &self.repos
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Create a repository with a `main` branch and `owner` as its owner.
    pub fn create(
        &mut self,
        new: NewRepository,
        owner: &str,
        random: &mut dyn RandomSource,
    ) -> Result<&Repository, VcsError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(VcsError::invalid("name", "repository name must not be empty"));
        }

        let now = Utc::now();
        let mut repo = Repository {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: new.description.trim().to_string(),
            private: new.private,
            created_at: now,
            updated_at: now,
            versions: Vec::new(),
            branches: vec![DEFAULT_BRANCH.to_string()],
            current_branch: DEFAULT_BRANCH.to_string(),
            collaborators: vec![Collaborator {
                email: owner.to_string(),
                role: CollaboratorRole::Owner,
                added_at: now,
            }],
            conflicts: Vec::new(),
            performance: sample_repository_performance(random),
        };

        if let Some(prompt) = new.initial_prompt.filter(|p| !p.trim().is_empty()) {
            repo.versions.push(Version {
                id: Uuid::new_v4().to_string(),
                message: INITIAL_COMMIT_MESSAGE.to_string(),
                content: prompt,
                author: owner.to_string(),
                timestamp: now,
                branch: DEFAULT_BRANCH.to_string(),
                tags: vec!["initial".to_string()],
                performance: INITIAL_COMMIT_PERFORMANCE,
            });
        }

        info!(repo_id = %repo.id, name = %repo.name, "created repository");
        let idx = self.repos.len();
        self.repos.push(repo);
        Ok(&self.repos[idx])
    }

    pub fn get(&self, id: &str) -> Result<&Repository, VcsError> {
        self.repos
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| VcsError::not_found("repository", id))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Repository, VcsError> {
        self.repos
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| VcsError::not_found("repository", id))
    }

    /// Find a repository by exact id, unambiguous id prefix, or exact name.
    pub fn resolve(&self, key: &str) -> Result<&Repository, VcsError> {
        if let Ok(repo) = self.get(key) {
            return Ok(repo);
        }
        if !key.is_empty() {
            if let Some(r) = single(self.repos.iter().filter(|r| r.id.starts_with(key))) {
                return Ok(r);
            }
        }
        single(self.repos.iter().filter(|r| r.name == key))
            .ok_or_else(|| VcsError::not_found("repository", key))
    }

    /// Apply a partial update.
    pub fn update(&mut self, id: &str, update: RepositoryUpdate) -> Result<&Repository, VcsError> {
        if let Some(ref name) = update.name {
            if name.trim().is_empty() {
                return Err(VcsError::invalid("name", "repository name must not be empty"));
            }
        }

        let repo = self.get_mut(id)?;
        if let Some(name) = update.name {
            repo.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            repo.description = description.trim().to_string();
        }
        if let Some(private) = update.private {
            repo.private = private;
        }
        repo.updated_at = Utc::now();
        info!(repo_id = %repo.id, "updated repository");
        Ok(repo)
    }

    /// Remove a repository and return it.
    pub fn delete(&mut self, id: &str) -> Result<Repository, VcsError> {
        let idx = self
            .repos
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| VcsError::not_found("repository", id))?;
        let repo = self.repos.remove(idx);
        info!(repo_id = %repo.id, name = %repo.name, "deleted repository");
        Ok(repo)
    }

    /// Add a contributor.
    pub fn add_collaborator(&mut self, id: &str, email: &str) -> Result<Collaborator, VcsError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(VcsError::invalid("email", "collaborator email must not be empty"));
        }
        let repo = self.get_mut(id)?;
        if repo.collaborators.iter().any(|c| c.email == email) {
            return Err(VcsError::exists("collaborator", email));
        }

        let collaborator = Collaborator {
            email: email.to_string(),
            role: CollaboratorRole::Contributor,
            added_at: Utc::now(),
        };
        repo.collaborators.push(collaborator.clone());
        debug!(repo_id = %repo.id, email, "added collaborator");
        Ok(collaborator)
    }

    /// Remove a contributor. The owner cannot be removed.
    pub fn remove_collaborator(&mut self, id: &str, email: &str) -> Result<Collaborator, VcsError> {
        let repo = self.get_mut(id)?;
        let idx = repo
            .collaborators
            .iter()
            .position(|c| c.email == email)
            .ok_or_else(|| VcsError::not_found("collaborator", email))?;
        if repo.collaborators[idx].role == CollaboratorRole::Owner {
            return Err(VcsError::invalid("email", "the repository owner cannot be removed"));
        }
        let removed = repo.collaborators.remove(idx);
        debug!(repo_id = %repo.id, email, "removed collaborator");
        Ok(removed)
    }
}

/// The only item of `iter`, or `None` when it yields zero or several.
pub(crate) fn single<T>(mut iter: impl Iterator<Item = T>) -> Option<T> {
    match (iter.next(), iter.next()) {
        (Some(item), None) => Some(item),
        _ => None,
    }
}
