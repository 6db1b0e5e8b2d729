//! Storage layer for the Mentorbridge engine
//!
//! Provides the repository abstraction over relationships, share
//! permissions, client records, mentor notes, and the audit trail, plus the
//! SQLite implementation. The engine never prescribes the storage format;
//! everything above this trait works against `dyn StorageBackend`.
//!
//! Permission and relationship rows are re-read on every access check, so
//! implementations must not cache them with any read staleness window.

pub mod sqlite;

use crate::error::Result;
use crate::types::{
    ActionPlan, AiReport, AuditRecord, Goal, GoalId, LogEntry, MentorNote, Reflection,
    Relationship, RelationshipId, RelationshipStatus, SharePermissions, Task, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Raw counts feeding the compass summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounts {
    pub active_goals: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub logs: usize,
    pub total_action_plans: usize,
    pub completed_action_plans: usize,
}

/// Storage backend trait defining all required operations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    // === Relationships ===

    /// Store a new relationship
    async fn create_relationship(&self, relationship: &Relationship) -> Result<()>;

    /// Fetch a relationship by id
    async fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>>;

    /// Find the non-terminated relationship between a mentor and a client
    async fn relationship_between(
        &self,
        mentor: UserId,
        client: UserId,
    ) -> Result<Option<Relationship>>;

    /// Transition a relationship's lifecycle state
    async fn set_relationship_status(
        &self,
        id: RelationshipId,
        status: RelationshipStatus,
    ) -> Result<()>;

    // === Share permissions ===

    /// Fetch the permission record for a relationship, if one exists
    async fn get_permissions(
        &self,
        relationship: RelationshipId,
    ) -> Result<Option<SharePermissions>>;

    /// Insert or replace a permission record
    async fn upsert_permissions(&self, permissions: &SharePermissions) -> Result<()>;

    // === Client records ===

    async fn create_goal(&self, goal: &Goal) -> Result<()>;
    async fn delete_goal(&self, id: GoalId) -> Result<()>;
    async fn list_goals(&self, user: UserId) -> Result<Vec<Goal>>;

    async fn create_task(&self, task: &Task) -> Result<()>;
    async fn list_tasks(&self, user: UserId) -> Result<Vec<Task>>;

    /// Tasks with a due date inside [start, end)
    async fn tasks_due_between(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>>;

    async fn create_log(&self, entry: &LogEntry) -> Result<()>;
    async fn list_logs(&self, user: UserId) -> Result<Vec<LogEntry>>;

    async fn create_reflection(&self, reflection: &Reflection) -> Result<()>;
    async fn list_reflections(&self, user: UserId) -> Result<Vec<Reflection>>;

    async fn create_action_plan(&self, plan: &ActionPlan) -> Result<()>;
    async fn list_action_plans(&self, user: UserId) -> Result<Vec<ActionPlan>>;

    async fn create_report(&self, report: &AiReport) -> Result<()>;
    async fn list_reports(&self, user: UserId) -> Result<Vec<AiReport>>;

    // === Feed sources ===
    //
    // Each bounded by `limit` before the merge so feed work stays O(limit)
    // per source regardless of history size.

    /// Most recently completed tasks, by completion time descending
    async fn recent_completed_tasks(&self, user: UserId, limit: usize) -> Result<Vec<Task>>;

    /// Most recently created tasks, by creation time descending
    async fn recent_created_tasks(&self, user: UserId, limit: usize) -> Result<Vec<Task>>;

    /// Most recently created goals, by creation time descending
    async fn recent_goals(&self, user: UserId, limit: usize) -> Result<Vec<Goal>>;

    /// Most recently created reflections, by creation time descending
    async fn recent_reflections(&self, user: UserId, limit: usize) -> Result<Vec<Reflection>>;

    /// Most recently created action plans, by creation time descending
    async fn recent_action_plans(&self, user: UserId, limit: usize) -> Result<Vec<ActionPlan>>;

    // === Aggregates ===

    /// Raw counts for the compass summary
    async fn progress_counts(&self, user: UserId) -> Result<ProgressCounts>;

    // === Mentor notes ===

    async fn create_note(&self, note: &MentorNote) -> Result<()>;

    /// All notes a mentor keeps on a client, newest first (visibility
    /// filtering happens above the storage layer)
    async fn list_notes(&self, mentor: UserId, client: UserId) -> Result<Vec<MentorNote>>;

    // === Audit trail ===

    /// Append an audit record
    async fn record_audit(&self, record: &AuditRecord) -> Result<()>;

    /// Audit records for a relationship, newest first
    async fn list_audit(&self, relationship: RelationshipId) -> Result<Vec<AuditRecord>>;
}
