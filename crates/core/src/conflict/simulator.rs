//! The merge state machine.
//!
//! A merge attempt either finishes immediately (`Clean`) or leaves exactly one
//! unresolved [`Conflict`] on the repository (`Conflicted`). Conflicts are
//! cleared only by a successful merge.

use tracing::{debug, info};

use crate::branch::BranchRegistry;
use crate::errors::ConflictError;
use crate::models::{Conflict, Repository};

use super::detector::ConflictOracle;

/// Outcome of [`ConflictSimulator::attempt_merge`].
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Merged; the repository holds no conflicts.
    Clean,
    /// The merge stopped on this conflict, now stored on the repository.
    Conflicted(Conflict),
}

/// Stateless merge operations over `Repository::conflicts`.
pub struct ConflictSimulator;

impl ConflictSimulator {
    /// Try to merge the first other branch into the current branch.
    ///
    /// With no other branch this is a no-op success. A detected conflict
    /// replaces whatever conflicts the repository held before.
    pub fn attempt_merge(repo: &mut Repository, oracle: &mut dyn ConflictOracle) -> MergeOutcome {
        let current = repo.current_branch.clone();
        let incoming = BranchRegistry::other_branches(repo)
            .first()
            .map(|b| b.to_string());
        let Some(incoming) = incoming else {
            debug!(repo_id = %repo.id, "no other branches, nothing to merge");
            Self::clear(repo);
            return MergeOutcome::Clean;
        };

        match oracle.detect(repo, &current, &incoming) {
            Some(diff) => {
                let conflict = Conflict::new(&current, &incoming, diff);
                info!(
                    repo_id = %repo.id,
                    conflict_id = %conflict.id,
                    current = %current,
                    incoming = %incoming,
                    "merge conflict detected"
                );
                repo.conflicts = vec![conflict.clone()];
                MergeOutcome::Conflicted(conflict)
            }
            None => {
                Self::clear(repo);
                info!(repo_id = %repo.id, current = %current, incoming = %incoming, "merged cleanly");
                MergeOutcome::Clean
            }
        }
    }

    /// Complete a merge whose conflicts have all been resolved.
    ///
    /// Clears the conflict list. No merge version is created.
    pub fn finalize_merge(repo: &mut Repository) -> Result<(), ConflictError> {
        let open = repo.unresolved_conflicts();
        if open > 0 {
            return Err(ConflictError::Unresolved(open));
        }
        Self::clear(repo);
        info!(repo_id = %repo.id, "merge finalized");
        Ok(())
    }

    fn clear(repo: &mut Repository) {
        if !repo.conflicts.is_empty() {
            debug!(repo_id = %repo.id, count = repo.conflicts.len(), "clearing conflicts");
        }
        repo.conflicts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::detector::{simulated_diff, RandomConflictOracle};
    use crate::conflict::resolver::ConflictResolver;
    use crate::ledger::VersionLedger;
    use crate::models::{ConflictResolution, ConflictStatus};
    use crate::oracle::{SeededRandom, SequenceRandom};
    use crate::repository::{NewRepository, RepositoryStore};

    fn repo() -> Repository {
        let mut store = RepositoryStore::default();
        store
            .create(NewRepository::named("R1"), "you@example.com", &mut SequenceRandom::default())
            .unwrap()
            .clone()
    }

    fn always() -> RandomConflictOracle<SequenceRandom> {
        RandomConflictOracle::new(SequenceRandom::new(vec![0.99]))
    }

    fn never() -> RandomConflictOracle<SequenceRandom> {
        RandomConflictOracle::new(SequenceRandom::new(vec![0.1]))
    }

    #[test]
    fn test_single_branch_is_always_clean() {
        for seed in 0..50 {
            let mut repo = repo();
            let mut oracle = RandomConflictOracle::with_probability(SeededRandom::new(seed), 1.0);
            assert_eq!(ConflictSimulator::attempt_merge(&mut repo, &mut oracle), MergeOutcome::Clean);
            assert!(repo.conflicts.is_empty());
        }
    }

    #[test]
    fn test_conflict_shape() {
        let mut repo = repo();
        BranchRegistry::create_branch(&mut repo, "dev");
        BranchRegistry::switch_branch(&mut repo, "dev").unwrap();

        let outcome = ConflictSimulator::attempt_merge(&mut repo, &mut always());
        let MergeOutcome::Conflicted(conflict) = outcome else {
            panic!("expected a conflict");
        };
        assert_eq!(conflict.branches, vec!["dev", "main"]);
        assert_eq!(conflict.files, vec!["prompt.txt"]);
        assert_eq!(conflict.status, ConflictStatus::Unresolved);
        assert_eq!(conflict.diff, simulated_diff());
        assert_eq!(repo.conflicts, vec![conflict]);
    }

    #[test]
    fn test_repeated_conflicts_replace_not_accumulate() {
        let mut repo = repo();
        BranchRegistry::create_branch(&mut repo, "dev");
        let mut oracle = always();
        ConflictSimulator::attempt_merge(&mut repo, &mut oracle);
        ConflictSimulator::attempt_merge(&mut repo, &mut oracle);
        assert_eq!(repo.conflicts.len(), 1);
    }

    #[test]
    fn test_clean_merge_clears_conflicts() {
        let mut repo = repo();
        BranchRegistry::create_branch(&mut repo, "dev");
        ConflictSimulator::attempt_merge(&mut repo, &mut always());
        assert_eq!(repo.conflicts.len(), 1);

        let outcome = ConflictSimulator::attempt_merge(&mut repo, &mut never());
        assert_eq!(outcome, MergeOutcome::Clean);
        assert!(repo.conflicts.is_empty());
    }

    #[test]
    fn test_finalize_requires_resolution() {
        let mut repo = repo();
        BranchRegistry::create_branch(&mut repo, "dev");
        let MergeOutcome::Conflicted(conflict) =
            ConflictSimulator::attempt_merge(&mut repo, &mut always())
        else {
            panic!("expected a conflict");
        };

        assert!(matches!(
            ConflictSimulator::finalize_merge(&mut repo),
            Err(ConflictError::Unresolved(1))
        ));
        assert_eq!(repo.conflicts.len(), 1);

        ConflictResolver::resolve(&mut repo, &conflict.id, ConflictResolution::Incoming).unwrap();
        ConflictSimulator::finalize_merge(&mut repo).unwrap();
        assert!(repo.conflicts.is_empty());
    }

    #[test]
    fn test_scenario_r1() {
        let mut repo = repo();
        assert_eq!(repo.branches, vec!["main"]);
        assert!(repo.versions.is_empty());

        let v = VersionLedger::create_version(
            &mut repo,
            "m1",
            "c1",
            &[],
            "you@example.com",
            &mut SeededRandom::new(3),
        )
        .unwrap();
        assert_eq!(VersionLedger::list_by_branch(&repo, "main").len(), 1);
        assert!((75..=100).contains(&v.performance.accuracy));

        BranchRegistry::create_branch(&mut repo, "dev");
        BranchRegistry::switch_branch(&mut repo, "dev").unwrap();

        for seed in 0..20 {
            let mut oracle = RandomConflictOracle::new(SeededRandom::new(seed));
            match ConflictSimulator::attempt_merge(&mut repo, &mut oracle) {
                MergeOutcome::Clean => assert!(repo.conflicts.is_empty()),
                MergeOutcome::Conflicted(c) => {
                    assert_eq!(repo.conflicts.len(), 1);
                    assert_eq!(c.branches, vec!["dev", "main"]);
                }
            }
        }
    }
}
