//! Conflict resolution actions.
//!
//! Resolution is bookkeeping only: the conflict is marked resolved with the
//! chosen side, and no version content is touched.

use chrono::Utc;
use tracing::{debug, info};

use crate::errors::ConflictError;
use crate::models::{Conflict, ConflictResolution, ConflictStatus, Repository};

/// Stateless conflict resolution operations.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Mark a conflict resolved. Resolving twice overwrites the resolution.
    pub fn resolve(
        repo: &mut Repository,
        conflict_id: &str,
        resolution: ConflictResolution,
    ) -> Result<Conflict, ConflictError> {
        let conflict = repo
            .conflicts
            .iter_mut()
            .find(|c| c.id == conflict_id)
            .ok_or_else(|| ConflictError::NotFound(conflict_id.to_string()))?;

        if let Some(previous) = conflict.resolution {
            debug!(conflict_id, %previous, "overwriting earlier resolution");
        }
        conflict.status = ConflictStatus::Resolved;
        conflict.resolution = Some(resolution);
        conflict.resolved_at = Some(Utc::now());

        info!(repo_id = %repo.id, conflict_id, %resolution, "conflict resolved");
        Ok(conflict.clone())
    }

    /// Look up a conflict by exact id or unambiguous id prefix.
    pub fn find<'a>(repo: &'a Repository, key: &str) -> Result<&'a Conflict, ConflictError> {
        if let Some(c) = repo.conflicts.iter().find(|c| c.id == key) {
            return Ok(c);
        }
        let mut matches = repo.conflicts.iter().filter(|c| c.id.starts_with(key));
        match (matches.next(), matches.next()) {
            (Some(c), None) if !key.is_empty() => Ok(c),
            _ => Err(ConflictError::NotFound(key.to_string())),
        }
    }
}
