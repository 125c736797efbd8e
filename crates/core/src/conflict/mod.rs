//! Merge attempts, conflict synthesis and resolution bookkeeping.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- asking a [`ConflictOracle`] whether two branches disagree.
//! 2. **Merging** -- the [`ConflictSimulator`] state machine (`Clean` / `Conflicted`).
//! 3. **Resolution** -- marking conflicts resolved so the merge can be finalized.

pub mod detector;
pub mod merger;
pub mod resolver;
pub mod simulator;

pub use detector::{
    build_oracle, simulated_diff, ConflictOracle, ContentConflictOracle, RandomConflictOracle,
};
pub use merger::{MergeResult, Merger};
pub use resolver::ConflictResolver;
pub use simulator::{ConflictSimulator, MergeOutcome};
