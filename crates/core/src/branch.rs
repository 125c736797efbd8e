//! Branch registry: the named lines of history in a repository.

use tracing::{debug, info};

use crate::errors::VcsError;
use crate::models::Repository;

/// Stateless operations over `Repository::branches` and
/// `Repository::current_branch`.
pub struct BranchRegistry;

impl BranchRegistry {
    /// Add a branch. Returns `false` without changing anything when the name
    /// is empty or already taken.
    ///
    /// No version is created; the branch is empty until something is
    /// committed while it is current.
    pub fn create_branch(repo: &mut Repository, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || repo.has_branch(name) {
            debug!(repo_id = %repo.id, name, "branch not created");
            return false;
        }
        repo.branches.push(name.to_string());
        info!(repo_id = %repo.id, name, "created branch");
        true
    }

    /// Make `name` the current branch.
    pub fn switch_branch(repo: &mut Repository, name: &str) -> Result<(), VcsError> {
        if !repo.has_branch(name) {
            return Err(VcsError::InvalidBranch(name.to_string()));
        }
        repo.current_branch = name.to_string();
        info!(repo_id = %repo.id, name, "switched branch");
        Ok(())
    }

    pub fn list_branches(repo: &Repository) -> &[String] {
        &repo.branches
    }

    /// Branches other than the current one, in creation order.
    pub fn other_branches(repo: &Repository) -> Vec<&str> {
        repo.branches
            .iter()
            .filter(|b| **b != repo.current_branch)
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SequenceRandom;
    use crate::repository::{NewRepository, RepositoryStore};

    fn repo() -> Repository {
        let mut store = RepositoryStore::default();
        store
            .create(NewRepository::named("R1"), "you@example.com", &mut SequenceRandom::default())
            .unwrap()
            .clone()
    }

    #[test]
    fn test_create_branch() {
        let mut repo = repo();
        assert!(BranchRegistry::create_branch(&mut repo, "dev"));
        assert_eq!(BranchRegistry::list_branches(&repo), ["main", "dev"]);
        assert!(repo.versions.is_empty());
    }

    #[test]
    fn test_create_branch_noop_on_duplicate_or_empty() {
        let mut repo = repo();
        assert!(!BranchRegistry::create_branch(&mut repo, "main"));
        assert!(!BranchRegistry::create_branch(&mut repo, "   "));
        assert_eq!(repo.branches.len(), 1);
    }

    #[test]
    fn test_switch_branch_validates() {
        let mut repo = repo();
        let err = BranchRegistry::switch_branch(&mut repo, "dev").unwrap_err();
        assert!(matches!(err, VcsError::InvalidBranch(ref b) if b == "dev"));
        assert_eq!(repo.current_branch, "main");

        BranchRegistry::create_branch(&mut repo, "dev");
        BranchRegistry::switch_branch(&mut repo, "dev").unwrap();
        assert_eq!(repo.current_branch, "dev");
        assert_eq!(BranchRegistry::other_branches(&repo), vec!["main"]);
    }

    #[test]
    fn test_current_branch_always_member() {
        let mut repo = repo();
        let ops = ["dev", "feature", "dev", "", "missing", "main", "feature"];
        for (i, name) in ops.iter().enumerate() {
            if i % 2 == 0 {
                BranchRegistry::create_branch(&mut repo, name);
            } else {
                let _ = BranchRegistry::switch_branch(&mut repo, name);
            }
            assert!(repo.has_branch(&repo.current_branch));
        }
    }
}
