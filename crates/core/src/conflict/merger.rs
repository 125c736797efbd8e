//! Three-way merge of prompt contents.
//!
//! Uses the `diffy` crate for line-based merging between a base, the current
//! branch's tip ("ours") and the incoming branch's tip ("theirs").

use diffy::Line;
use tracing::{debug, info};

use crate::models::DiffLine;

/// The result of a three-way merge attempt.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The merged content (contains conflict markers if `has_conflicts`).
    pub merged_content: String,
    /// Whether the merge completed without conflicts.
    pub has_conflicts: bool,
    /// Number of conflicting regions in `merged_content`.
    pub conflict_regions: usize,
}

impl MergeResult {
    fn clean(content: &str) -> Self {
        Self {
            merged_content: content.to_string(),
            has_conflicts: false,
            conflict_regions: 0,
        }
    }
}

/// Stateless three-way merge engine.
pub struct Merger;

impl Merger {
    /// Merge `ours` and `theirs`, both derived from `base`.
    ///
    /// Always returns merged content. On conflict, standard `<<<<<<<` /
    /// `=======` / `>>>>>>>` markers are embedded and `has_conflicts` is set.
    pub fn three_way_merge(base: &str, ours: &str, theirs: &str) -> MergeResult {
        info!("performing three-way merge");

        if ours == base || ours == theirs {
            debug!("ours unchanged or identical to theirs, theirs wins cleanly");
            return MergeResult::clean(theirs);
        }
        if theirs == base {
            debug!("theirs == base, ours wins cleanly");
            return MergeResult::clean(ours);
        }

        match diffy::merge(base, ours, theirs) {
            Ok(merged) => {
                debug!("clean three-way merge");
                MergeResult::clean(&merged)
            }
            Err(conflicted) => {
                let regions = conflicted
                    .lines()
                    .filter(|l| l.starts_with("<<<<<<<"))
                    .count();
                debug!(regions, "three-way merge produced conflicts");
                MergeResult {
                    merged_content: conflicted,
                    has_conflicts: true,
                    conflict_regions: regions,
                }
            }
        }
    }

    /// Line diff from `ours` to `theirs` in conflict-record form.
    ///
    /// Removed lines are prefixed `- `, added lines `+ ` and context lines
    /// two spaces.
    pub fn diff_lines(ours: &str, theirs: &str) -> Vec<DiffLine> {
        let patch = diffy::create_patch(ours, theirs);
        let mut out = Vec::new();
        for hunk in patch.hunks() {
            for line in hunk.lines() {
                let entry = match line {
                    Line::Context(s) => DiffLine::context(format!("  {}", s.trim_end_matches('\n'))),
                    Line::Delete(s) => DiffLine::remove(format!("- {}", s.trim_end_matches('\n'))),
                    Line::Insert(s) => DiffLine::add(format!("+ {}", s.trim_end_matches('\n'))),
                };
                out.push(entry);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiffLineKind;

    #[test]
    fn test_identical_contents() {
        let base = "line1\nline2\nline3\n";
        let result = Merger::three_way_merge(base, base, base);
        assert!(!result.has_conflicts);
        assert_eq!(result.conflict_regions, 0);
    }

    #[test]
    fn test_only_one_side_changed() {
        let base = "line1\nline2\nline3\n";
        let changed = "line1\nmodified\nline3\n";

        let result = Merger::three_way_merge(base, changed, base);
        assert!(!result.has_conflicts);
        assert_eq!(result.merged_content, changed);

        let result = Merger::three_way_merge(base, base, changed);
        assert!(!result.has_conflicts);
        assert_eq!(result.merged_content, changed);
    }

    #[test]
    fn test_non_overlapping_changes() {
        let base = "line1\nline2\nline3\nline4\nline5\nline6\nline7\nline8\n";
        let ours = "LINE1\nline2\nline3\nline4\nline5\nline6\nline7\nline8\n";
        let theirs = "line1\nline2\nline3\nline4\nline5\nline6\nline7\nLINE8\n";
        let result = Merger::three_way_merge(base, ours, theirs);
        assert!(!result.has_conflicts);
        assert!(result.merged_content.contains("LINE1"));
        assert!(result.merged_content.contains("LINE8"));
    }

    #[test]
    fn test_conflicting_changes() {
        let base = "You are a helpful assistant.\nAnswer briefly.\n";
        let ours = "You are a helpful assistant.\nAnswer in one sentence.\n";
        let theirs = "You are a helpful assistant.\nAnswer in detail.\n";
        let result = Merger::three_way_merge(base, ours, theirs);
        assert!(result.has_conflicts);
        assert!(result.merged_content.contains("<<<<<<<"));
        assert!(result.merged_content.contains(">>>>>>>"));
        assert_eq!(result.conflict_regions, 1);
    }

    #[test]
    fn test_same_change_both_sides() {
        let result = Merger::three_way_merge("old\n", "new\n", "new\n");
        assert!(!result.has_conflicts);
        assert_eq!(result.merged_content, "new\n");
    }

    #[test]
    fn test_diff_lines() {
        let diff = Merger::diff_lines("keep\nold\n", "keep\nnew\n");
        assert_eq!(
            diff,
            vec![
                DiffLine::context("  keep"),
                DiffLine::remove("- old"),
                DiffLine::add("+ new"),
            ]
        );
        assert!(Merger::diff_lines("same\n", "same\n").is_empty());
        assert_eq!(diff[1].kind, DiffLineKind::Remove);
    }
}
