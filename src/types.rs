//! Core data types for the Mentorbridge engine
//!
//! This module defines the domain model shared across the engine: mentoring
//! relationships and their lifecycle, per-relationship share permissions,
//! the client-owned record kinds (goals, tasks, logs, reflections, action
//! plans, AI reports), mentor notes, and the audit trail written by the
//! access gate.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Defines a UUID-backed identifier newtype.
///
/// Wrapping prevents mixing identifiers of different record kinds, which is
/// easy to do in an engine that joins six tables into one response.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from a string
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a platform user (mentor or client)
    UserId
);
id_type!(
    /// Identifier of a mentor-client relationship
    RelationshipId
);
id_type!(
    /// Identifier of a goal
    GoalId
);
id_type!(
    /// Identifier of a task
    TaskId
);
id_type!(
    /// Identifier of a log entry
    LogId
);
id_type!(
    /// Identifier of a reflection
    ReflectionId
);
id_type!(
    /// Identifier of an action plan
    ActionPlanId
);
id_type!(
    /// Identifier of an AI analysis report
    ReportId
);
id_type!(
    /// Identifier of a mentor note
    NoteId
);

// === Relationships ===

/// Lifecycle state of a mentoring relationship
///
/// Transitions: Pending -> Active (client approval), Pending|Active ->
/// Terminated (either party). Terminated is final; no permission
/// evaluation succeeds for a terminated relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Pending,
    Active,
    Terminated,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Pending => "pending",
            RelationshipStatus::Active => "active",
            RelationshipStatus::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mentor-client relationship record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub mentor_id: UserId,
    pub client_id: UserId,
    pub status: RelationshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// Create a new pending relationship
    pub fn new(mentor_id: UserId, client_id: UserId) -> Self {
        Self {
            id: RelationshipId::new(),
            mentor_id,
            client_id,
            status: RelationshipStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Whether the given user is the mentor or the client of this relationship
    pub fn is_party(&self, user: UserId) -> bool {
        user == self.mentor_id || user == self.client_id
    }
}

// === Share permissions ===

/// The five client-data categories a relationship can expose to its mentor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareCategory {
    Goals,
    Tasks,
    Logs,
    Reflections,
    AiReports,
}

impl ShareCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareCategory::Goals => "goals",
            ShareCategory::Tasks => "tasks",
            ShareCategory::Logs => "logs",
            ShareCategory::Reflections => "reflections",
            ShareCategory::AiReports => "ai_reports",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "goals" => Some(ShareCategory::Goals),
            "tasks" => Some(ShareCategory::Tasks),
            "logs" => Some(ShareCategory::Logs),
            "reflections" => Some(ShareCategory::Reflections),
            "ai_reports" => Some(ShareCategory::AiReports),
            _ => None,
        }
    }

    /// All five gated categories
    pub fn all() -> [ShareCategory; 5] {
        [
            ShareCategory::Goals,
            ShareCategory::Tasks,
            ShareCategory::Logs,
            ShareCategory::Reflections,
            ShareCategory::AiReports,
        ]
    }
}

impl std::fmt::Display for ShareCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a category check was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Relationship is not in the Active state
    NoActiveRelationship,

    /// The relationship has no permission record
    NoPermissionRecord,

    /// The client paused all sharing (`is_active = false`)
    SharingPaused,

    /// The category's individual flag is off
    CategoryNotShared,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NoActiveRelationship => "no active relationship",
            DenyReason::NoPermissionRecord => "no permission record",
            DenyReason::SharingPaused => "sharing paused",
            DenyReason::CategoryNotShared => "category not shared",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default grants applied when a relationship is first activated
///
/// This is platform policy rather than a hardcoded literal at the creation
/// site: the full-disclosure default is the one place the business rule
/// could plausibly change, so it lives in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharePolicy {
    pub allow_goals: bool,
    pub allow_tasks: bool,
    pub allow_logs: bool,
    pub allow_reflections: bool,
    pub allow_ai_reports: bool,
}

impl Default for SharePolicy {
    fn default() -> Self {
        Self {
            allow_goals: true,
            allow_tasks: true,
            allow_logs: true,
            allow_reflections: true,
            allow_ai_reports: true,
        }
    }
}

/// Per-relationship data sharing permissions
///
/// One-to-one with a relationship; exists iff the relationship has ever
/// reached Active. Mutated only by the owning client, read by the
/// mentor-facing access gate on every check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePermissions {
    pub relationship_id: RelationshipId,
    pub allow_goals: bool,
    pub allow_tasks: bool,
    pub allow_logs: bool,
    pub allow_reflections: bool,
    pub allow_ai_reports: bool,

    /// Master switch: false short-circuits every category to deny without
    /// clearing the individual flags, so sharing can be paused and resumed.
    pub is_active: bool,

    pub updated_at: DateTime<Utc>,
}

impl SharePermissions {
    /// Build the initial permission record for a newly activated
    /// relationship from the configured default policy.
    pub fn from_policy(relationship_id: RelationshipId, policy: &SharePolicy) -> Self {
        Self {
            relationship_id,
            allow_goals: policy.allow_goals,
            allow_tasks: policy.allow_tasks,
            allow_logs: policy.allow_logs,
            allow_reflections: policy.allow_reflections,
            allow_ai_reports: policy.allow_ai_reports,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    /// The individual flag for a category, ignoring the master switch
    pub fn category_flag(&self, category: ShareCategory) -> bool {
        match category {
            ShareCategory::Goals => self.allow_goals,
            ShareCategory::Tasks => self.allow_tasks,
            ShareCategory::Logs => self.allow_logs,
            ShareCategory::Reflections => self.allow_reflections,
            ShareCategory::AiReports => self.allow_ai_reports,
        }
    }

    /// Evaluate a category against this record.
    ///
    /// The master switch wins over every individual flag.
    pub fn evaluate(&self, category: ShareCategory) -> Result<(), DenyReason> {
        if !self.is_active {
            return Err(DenyReason::SharingPaused);
        }
        if self.category_flag(category) {
            Ok(())
        } else {
            Err(DenyReason::CategoryNotShared)
        }
    }
}

// === Client records ===

/// Goal lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Archived,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        }
    }
}

/// A client goal
///
/// Tasks reference goals weakly via `goal_id`; deleting a goal leaves its
/// tasks in place with a dangling reference that must resolve to "no goal".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task priority, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    /// Sort rank: high < medium < low
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

/// Task completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

/// A client task, optionally attached to a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub goal_id: Option<GoalId>,
    pub title: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,

    /// Time of day the client planned the task for, minute precision
    #[serde(with = "hhmm", default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<NaiveTime>,

    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A dated activity log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A free-form written reflection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub id: ReflectionId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Action plan completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPlanStatus {
    Pending,
    Completed,
}

impl ActionPlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPlanStatus::Pending => "pending",
            ActionPlanStatus::Completed => "completed",
        }
    }
}

/// An improvement action plan the client committed to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: ActionPlanId,
    pub user_id: UserId,
    pub title: String,
    pub status: ActionPlanStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A prioritized recommendation inside an AI report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,

    /// Priority rank, lower is more important
    pub rank: u32,
}

/// A stored AI analysis report
///
/// The engine stores and serves reports; generation happens upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiReport {
    pub id: ReportId,
    pub user_id: UserId,
    pub summary: String,

    /// Model confidence in [0, 1]
    pub confidence: f64,

    pub insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub created_at: DateTime<Utc>,
}

// === Mentor notes ===

/// A note a mentor keeps about a client
///
/// Never routed through the access gate: the sharing direction is reversed
/// here, with `is_shared_with_client` controlling whether the client may
/// read the mentor's note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorNote {
    pub id: NoteId,
    pub mentor_id: UserId,
    pub client_id: UserId,
    pub content: String,
    pub is_shared_with_client: bool,
    pub created_at: DateTime<Utc>,
}

impl MentorNote {
    /// Whether the given viewer may read this note.
    ///
    /// Mentors always see their own notes; the client only sees notes
    /// explicitly shared with them.
    pub fn visible_to(&self, viewer: UserId) -> bool {
        viewer == self.mentor_id || (self.is_shared_with_client && viewer == self.client_id)
    }
}

// === Audit trail ===

/// Outcome of a gated access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Allowed,
    Denied,
}

impl AccessOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessOutcome::Allowed => "allowed",
            AccessOutcome::Denied => "denied",
        }
    }
}

/// Audit record written for every denied outcome and every successful
/// mentor category read. This is the client-facing trust guarantee that
/// mentor views are audited, not optional logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub relationship_id: RelationshipId,
    pub actor: UserId,
    pub category: ShareCategory,
    pub outcome: AccessOutcome,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Serde helper for `"HH:MM"` wall-clock times.
///
/// The wire format is zero-padded, so lexical order equals chronological
/// order.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value {
            Some(s) => NaiveTime::parse_from_str(&s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_permissions() -> SharePermissions {
        SharePermissions::from_policy(RelationshipId::new(), &SharePolicy::default())
    }

    #[test]
    fn test_default_policy_is_full_disclosure() {
        let perms = full_permissions();
        for category in ShareCategory::all() {
            assert!(perms.evaluate(category).is_ok());
        }
    }

    #[test]
    fn test_master_switch_short_circuits_all_flags() {
        let mut perms = full_permissions();
        perms.is_active = false;
        for category in ShareCategory::all() {
            assert_eq!(
                perms.evaluate(category),
                Err(DenyReason::SharingPaused),
                "{} should be denied while sharing is paused",
                category
            );
        }
    }

    #[test]
    fn test_individual_flag_denies_only_its_category() {
        let mut perms = full_permissions();
        perms.allow_tasks = false;

        assert_eq!(
            perms.evaluate(ShareCategory::Tasks),
            Err(DenyReason::CategoryNotShared)
        );
        assert!(perms.evaluate(ShareCategory::Goals).is_ok());
        assert!(perms.evaluate(ShareCategory::AiReports).is_ok());
    }

    #[test]
    fn test_category_round_trip() {
        for category in ShareCategory::all() {
            assert_eq!(ShareCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(ShareCategory::parse("notes"), None);
    }

    #[test]
    fn test_note_visibility() {
        let mentor = UserId::new();
        let client = UserId::new();
        let outsider = UserId::new();

        let mut note = MentorNote {
            id: NoteId::new(),
            mentor_id: mentor,
            client_id: client,
            content: "making steady progress".to_string(),
            is_shared_with_client: false,
            created_at: Utc::now(),
        };

        assert!(note.visible_to(mentor));
        assert!(!note.visible_to(client));
        assert!(!note.visible_to(outsider));

        note.is_shared_with_client = true;
        assert!(note.visible_to(client));
        assert!(!note.visible_to(outsider));
    }

    #[test]
    fn test_scheduled_time_wire_format() {
        let task = Task {
            id: TaskId::new(),
            user_id: UserId::new(),
            goal_id: None,
            title: "morning run".to_string(),
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            due_date: None,
            scheduled_time: Some(NaiveTime::from_hms_opt(8, 5, 0).unwrap()),
            completed_at: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["scheduled_time"], "08:05");

        let parsed: Task = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.scheduled_time, task.scheduled_time);
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(TaskPriority::High.rank() < TaskPriority::Medium.rank());
        assert!(TaskPriority::Medium.rank() < TaskPriority::Low.rank());
    }
}
