//! Dashboard aggregates and chart data.

use serde::Serialize;

use crate::models::{Repository, Version};

/// Number of trailing versions plotted by [`chart_series`].
pub const CHART_WINDOW: usize = 10;

/// Counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub repositories: usize,
    pub branches: usize,
    pub collaborators: usize,
    pub teams: usize,
    /// Rounded mean accuracy over every version of every repository.
    pub performance_score: u32,
}

impl DashboardStats {
    pub fn compute(repos: &[Repository], teams: usize) -> Self {
        Self {
            repositories: repos.len(),
            branches: repos.iter().map(|r| r.branches.len()).sum(),
            collaborators: repos.iter().map(|r| r.collaborators.len()).sum(),
            teams,
            performance_score: mean_accuracy(repos.iter().flat_map(|r| r.versions.iter())),
        }
    }
}

/// Rounded mean accuracy of one repository's versions, 0 when it has none.
pub fn average_accuracy(repo: &Repository) -> u32 {
    mean_accuracy(repo.versions.iter())
}

fn mean_accuracy<'a>(versions: impl Iterator<Item = &'a Version>) -> u32 {
    let (total, count) = versions.fold((0u64, 0u64), |(t, c), v| {
        (t + u64::from(v.performance.accuracy), c + 1)
    });
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u32
}

/// Accuracy and speed over the last versions of a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    /// `v1..vN`, numbered within the window.
    pub labels: Vec<String>,
    pub accuracy: Vec<u32>,
    pub speed: Vec<u32>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Chart data for the last [`CHART_WINDOW`] versions in ledger order.
pub fn chart_series(repo: &Repository) -> ChartSeries {
    let start = repo.versions.len().saturating_sub(CHART_WINDOW);
    let window = &repo.versions[start..];
    ChartSeries {
        labels: (1..=window.len()).map(|i| format!("v{i}")).collect(),
        accuracy: window.iter().map(|v| v.performance.accuracy).collect(),
        speed: window.iter().map(|v| v.performance.speed).collect(),
    }
}
