//! The per-repository version ledger.
//!
//! Versions are appended on create and rollback and amended in place by id;
//! they are never removed.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::VcsError;
use crate::models::{Repository, Version};
use crate::oracle::{sample_version_performance, RandomSource};

/// Tag placed on versions created by [`VersionLedger::rollback`].
pub const ROLLBACK_TAG: &str = "rollback";

/// Fields of a version that can be amended. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct VersionAmendment {
    pub message: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Stateless operations over `Repository::versions`.
pub struct VersionLedger;

impl VersionLedger {
    /// Append a new version on the repository's current branch.
    pub fn create_version(
        repo: &mut Repository,
        message: &str,
        content: &str,
        tags: &[String],
        author: &str,
        random: &mut dyn RandomSource,
    ) -> Result<Version, VcsError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(VcsError::invalid("message", "version message must not be empty"));
        }

        let now = Utc::now();
        let version = Version {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            content: content.to_string(),
            author: author.to_string(),
            timestamp: now,
            branch: repo.current_branch.clone(),
            tags: normalize_tags(tags),
            performance: sample_version_performance(random),
        };

        repo.versions.push(version.clone());
        repo.updated_at = now;
        info!(
            repo_id = %repo.id,
            version_id = %version.id,
            branch = %version.branch,
            "created version"
        );
        Ok(version)
    }

    /// Replace the editable fields of a version.
    ///
    /// The id is kept. The version moves to the current branch, the timestamp
    /// is refreshed and the metrics are re-sampled.
    pub fn amend_version(
        repo: &mut Repository,
        version_id: &str,
        amendment: VersionAmendment,
        random: &mut dyn RandomSource,
    ) -> Result<Version, VcsError> {
        if let Some(ref message) = amendment.message {
            if message.trim().is_empty() {
                return Err(VcsError::invalid("message", "version message must not be empty"));
            }
        }

        let now = Utc::now();
        let branch = repo.current_branch.clone();
        let version = repo
            .versions
            .iter_mut()
            .find(|v| v.id == version_id)
            .ok_or_else(|| VcsError::not_found("version", version_id))?;

        if let Some(message) = amendment.message {
            version.message = message.trim().to_string();
        }
        if let Some(content) = amendment.content {
            version.content = content;
        }
        if let Some(tags) = amendment.tags {
            version.tags = normalize_tags(&tags);
        }
        version.branch = branch;
        version.timestamp = now;
        version.performance = sample_version_performance(random);

        let amended = version.clone();
        repo.updated_at = now;
        info!(repo_id = %repo.id, version_id, "amended version");
        Ok(amended)
    }

    /// Append a copy of an earlier version on the current branch.
    pub fn rollback(repo: &mut Repository, version_id: &str) -> Result<Version, VcsError> {
        let source = Self::get(repo, version_id)?;

        let now = Utc::now();
        let version = Version {
            id: Uuid::new_v4().to_string(),
            message: format!("Rollback to: {}", source.message),
            content: source.content.clone(),
            author: source.author.clone(),
            timestamp: now,
            branch: repo.current_branch.clone(),
            tags: vec![ROLLBACK_TAG.to_string()],
            performance: source.performance,
        };

        debug!(
            from_branch = %source.branch,
            to_branch = %version.branch,
            "rollback copies onto the current branch"
        );
        repo.versions.push(version.clone());
        repo.updated_at = now;
        info!(repo_id = %repo.id, source_id = version_id, version_id = %version.id, "rolled back");
        Ok(version)
    }

    /// Versions on `branch`, oldest first.
    pub fn list_by_branch<'a>(repo: &'a Repository, branch: &str) -> Vec<&'a Version> {
        repo.versions.iter().filter(|v| v.branch == branch).collect()
    }

    /// The most recently appended version, on any branch.
    pub fn latest(repo: &Repository) -> Option<&Version> {
        repo.versions.last()
    }

    /// The newest version on `branch`.
    pub fn tip<'a>(repo: &'a Repository, branch: &str) -> Option<&'a Version> {
        repo.versions.iter().rev().find(|v| v.branch == branch)
    }

    /// Look up a version by exact id.
    pub fn get<'a>(repo: &'a Repository, version_id: &str) -> Result<&'a Version, VcsError> {
        repo.versions
            .iter()
            .find(|v| v.id == version_id)
            .ok_or_else(|| VcsError::not_found("version", version_id))
    }

    /// Look up a version by exact id or unambiguous id prefix.
    pub fn find<'a>(repo: &'a Repository, key: &str) -> Result<&'a Version, VcsError> {
        if let Ok(v) = Self::get(repo, key) {
            return Ok(v);
        }
        let mut matches = repo.versions.iter().filter(|v| v.id.starts_with(key));
        match (matches.next(), matches.next()) {
            (Some(v), None) if !key.is_empty() => Ok(v),
            _ => Err(VcsError::not_found("version", key)),
        }
    }
}

/// Trim tags, drop empties and keep the first of any duplicates.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
