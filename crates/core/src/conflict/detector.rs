//! Conflict detection oracles.
//!
//! A [`ConflictOracle`] decides whether merging an incoming branch into the
//! current branch disagrees, and if so what the conflict diff looks like.
//! The default oracle is a weighted coin flip; [`ContentConflictOracle`]
//! compares the two branch tips with a real three-way merge.

use tracing::{debug, info};

use crate::config::{OracleKind, SimulationConfig};
use crate::ledger::VersionLedger;
use crate::models::{DiffLine, Repository};
use crate::oracle::{random_source, RandomSource};

use super::merger::Merger;

/// Default chance that a simulated merge conflicts.
pub const DEFAULT_CONFLICT_PROBABILITY: f64 = 0.3;

/// Decides whether two branches conflict.
pub trait ConflictOracle {
    /// Return the conflict diff when merging `incoming` into `current`
    /// disagrees, or `None` when the merge is clean.
    fn detect(&mut self, repo: &Repository, current: &str, incoming: &str) -> Option<Vec<DiffLine>>;
}

impl<O: ConflictOracle + ?Sized> ConflictOracle for Box<O> {
    fn detect(&mut self, repo: &Repository, current: &str, incoming: &str) -> Option<Vec<DiffLine>> {
        (**self).detect(repo, current, incoming)
    }
}

/// The fixed three-line diff attached to simulated conflicts.
pub fn simulated_diff() -> Vec<DiffLine> {
    vec![
        DiffLine::remove("- Old prompt content"),
        DiffLine::add("+ New prompt content from main"),
        DiffLine::add("+ New prompt content from feature"),
    ]
}

// ---------------------------------------------------------------------------
// Random oracle
// ---------------------------------------------------------------------------

/// Conflicts with a fixed probability, regardless of content.
pub struct RandomConflictOracle<R> {
    random: R,
    probability: f64,
}

impl<R: RandomSource> RandomConflictOracle<R> {
    /// Oracle with the default 30% conflict chance.
    pub fn new(random: R) -> Self {
        Self::with_probability(random, DEFAULT_CONFLICT_PROBABILITY)
    }

    pub fn with_probability(random: R, probability: f64) -> Self {
        Self {
            random,
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

impl<R: RandomSource> ConflictOracle for RandomConflictOracle<R> {
    fn detect(&mut self, repo: &Repository, current: &str, incoming: &str) -> Option<Vec<DiffLine>> {
        let roll = self.random.next_f64();
        let conflicted = self.probability >= 1.0 || roll > 1.0 - self.probability;
        debug!(repo_id = %repo.id, current, incoming, roll, conflicted, "rolled for conflict");
        conflicted.then(simulated_diff)
    }
}

// ---------------------------------------------------------------------------
// Content oracle
// ---------------------------------------------------------------------------

/// Conflicts when the branch tips cannot be merged cleanly.
///
/// The merge base is the newest version of the older branch that precedes the
/// first version of the younger one. Branches without versions never
/// conflict.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentConflictOracle;

impl ContentConflictOracle {
    fn merge_base<'a>(repo: &'a Repository, current: &str, incoming: &str) -> &'a str {
        let first = |branch: &str| repo.versions.iter().position(|v| v.branch == branch);
        let (Some(fc), Some(fi)) = (first(current), first(incoming)) else {
            return "";
        };
        let (older, fork) = if fc <= fi { (current, fi) } else { (incoming, fc) };
        repo.versions[..fork]
            .iter()
            .rev()
            .find(|v| v.branch == older)
            .map(|v| v.content.as_str())
            .unwrap_or("")
    }
}

impl ConflictOracle for ContentConflictOracle {
    fn detect(&mut self, repo: &Repository, current: &str, incoming: &str) -> Option<Vec<DiffLine>> {
        let ours = VersionLedger::tip(repo, current)?;
        let theirs = VersionLedger::tip(repo, incoming)?;
        let base = Self::merge_base(repo, current, incoming);

        let result = Merger::three_way_merge(base, &ours.content, &theirs.content);
        debug!(
            repo_id = %repo.id,
            current,
            incoming,
            regions = result.conflict_regions,
            "compared branch tips"
        );
        result
            .has_conflicts
            .then(|| Merger::diff_lines(&ours.content, &theirs.content))
    }
}

/// Seed of the conflict stream, offset from the metrics seed so the two
/// streams differ.
pub fn oracle_seed(seed: Option<u64>) -> Option<u64> {
    seed.map(|s| s.wrapping_add(1))
}

/// Build the oracle selected by the simulation settings.
pub fn build_oracle(config: &SimulationConfig) -> Box<dyn ConflictOracle> {
    info!(oracle = %config.conflict_oracle, "using conflict oracle");
    match config.conflict_oracle {
        OracleKind::Random => Box::new(RandomConflictOracle::with_probability(
            random_source(oracle_seed(config.seed)),
            config.conflict_probability,
        )),
        OracleKind::Content => Box::new(ContentConflictOracle),
    }
}
