//! Domain model types used throughout PromptVCS.
//!
//! Field names serialize in camelCase so persisted blobs and export documents
//! keep the shape `{"currentBranch": ..., "createdAt": ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the branch every repository starts with.
pub const DEFAULT_BRANCH: &str = "main";

/// File name reported by simulated conflicts.
pub const PROMPT_FILE: &str = "prompt.txt";

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

/// Simulated evaluation metrics of a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    /// Accuracy percentage, 0..=100.
    pub accuracy: u32,
    /// Latency in milliseconds.
    pub speed: u32,
    /// Cost per call, rounded to cents.
    pub cost: f64,
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// One snapshot of prompt text plus metadata (a "commit").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub message: String,
    pub content: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub branch: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub performance: PerformanceMetrics,
}

impl Version {
    /// First eight characters of the id, for display.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// Truncate an id to eight characters for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Role of a repository collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    Owner,
    Contributor,
}

impl std::fmt::Display for CollaboratorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Contributor => write!(f, "contributor"),
        }
    }
}

/// A user with access to a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub email: String,
    pub role: CollaboratorRole,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

/// Lifecycle status of a conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Unresolved,
    Resolved,
}

impl std::fmt::Display for ConflictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// How a conflict was resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Keep the current branch's side.
    Main,
    /// Take the incoming branch's side.
    Incoming,
    /// Resolved by hand.
    Manual,
}

impl ConflictResolution {
    /// Parse a resolution string.
    pub fn from_str_val(s: &str) -> Option<Self> {
        match s {
            "main" => Some(Self::Main),
            "incoming" => Some(Self::Incoming),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Incoming => write!(f, "incoming"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Kind of a line in a conflict diff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    Add,
    Remove,
    Context,
}

/// One line of a conflict diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: DiffLineKind,
    pub content: String,
}

impl DiffLine {
    pub fn add(content: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Add,
            content: content.into(),
        }
    }

    pub fn remove(content: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Remove,
            content: content.into(),
        }
    }

    pub fn context(content: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Context,
            content: content.into(),
        }
    }
}

/// A merge disagreement between two branches, held on the repository until
/// the next successful merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub id: String,
    /// `[current, incoming]`.
    pub branches: Vec<String>,
    pub files: Vec<String>,
    pub status: ConflictStatus,
    pub diff: Vec<DiffLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ConflictResolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Conflict {
    /// Create an unresolved conflict between `current` and `incoming`.
    pub fn new(current: &str, incoming: &str, diff: Vec<DiffLine>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            branches: vec![current.to_string(), incoming.to_string()],
            files: vec![PROMPT_FILE.to_string()],
            status: ConflictStatus::Unresolved,
            diff,
            resolution: None,
            resolved_at: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ConflictStatus::Resolved
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// A named container of prompt versions, branches and collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub versions: Vec<Version>,
    pub branches: Vec<String>,
    pub current_branch: String,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub performance: PerformanceMetrics,
}

impl Repository {
    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.iter().any(|b| b == name)
    }

    /// Number of conflicts still awaiting resolution.
    pub fn unresolved_conflicts(&self) -> usize {
        self.conflicts.iter().filter(|c| !c.is_resolved()).count()
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// Role of a team member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    /// Parse a role string.
    pub fn from_str_val(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// A member of a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub email: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Point-in-time copy of a repository held by a team.
///
/// Taken when the repository is assigned and never refreshed afterwards; it
/// outlives the repository it was copied from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub versions: Vec<Version>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
}

impl RepositorySnapshot {
    /// Copy the parts of `repo` a team keeps.
    pub fn capture(repo: &Repository) -> Self {
        Self {
            id: repo.id.clone(),
            name: repo.name.clone(),
            description: repo.description.clone(),
            added_at: Utc::now(),
            versions: repo.versions.clone(),
            collaborators: repo.collaborators.clone(),
        }
    }
}

/// A group of users sharing repository snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub repositories: Vec<RepositorySnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn admin_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.role == MemberRole::Admin)
            .count()
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The local user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub timezone: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "User".into(),
            email: "user@example.com".into(),
            bio: String::new(),
            timezone: "UTC".into(),
        }
    }
}

/// The local user's preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub dark_mode: bool,
    pub language: String,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub public_profile: bool,
    pub analytics: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            language: "en".into(),
            email_notifications: true,
            push_notifications: true,
            public_profile: false,
            analytics: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

fn default_icon() -> String {
    "info-circle".into()
}

/// An entry of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub message: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_icon(message, &default_icon())
    }

    pub fn with_icon(message: impl Into<String>, icon: &str) -> Self {
        Self {
            message: message.into(),
            icon: icon.to_string(),
            timestamp: Utc::now(),
        }
    }
}
