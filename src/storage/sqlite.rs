//! SQLite storage backend implementation
//!
//! Persistent storage via sqlx with runtime-checked queries. Identifiers
//! are stored as hyphenated UUID strings and enums as their snake_case
//! names, so the database stays inspectable with any SQLite tooling.

use crate::error::{EngineError, Result};
use crate::storage::{ProgressCounts, StorageBackend};
use crate::types::{
    AccessOutcome, ActionPlan, ActionPlanId, ActionPlanStatus, AiReport, AuditRecord, Goal,
    GoalId, LogEntry, LogId, MentorNote, NoteId, Reflection, ReflectionId, Relationship,
    RelationshipId, RelationshipStatus, ReportId, ShareCategory, SharePermissions, Task, TaskId,
    UserId, hhmm,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{ConnectOptions, Row};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite storage backend
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect to a SQLite database, creating the file if missing
    ///
    /// # Arguments
    /// * `database_url` - e.g. `sqlite:///var/lib/mentorbridge.db`
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to SQLite database: {}", database_url);

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30));

        // Query logging is too verbose at this layer
        options = options.disable_statement_logging();

        let pool = SqlitePool::connect_with(options).await?;

        info!("SQLite connection established");

        Ok(Self { pool })
    }

    /// Create the schema; every statement is idempotent
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&self.pool)
            .await?;
        info!("Database migrations completed");
        Ok(())
    }

    fn parse_enum<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
        serde_json::from_str(&format!("\"{}\"", value))
            .map_err(|_| EngineError::Other(format!("unknown enum value in database: {}", value)))
    }

    fn row_to_relationship(row: &SqliteRow) -> Result<Relationship> {
        let id: String = row.try_get("id")?;
        let mentor_id: String = row.try_get("mentor_id")?;
        let client_id: String = row.try_get("client_id")?;
        let status: String = row.try_get("status")?;

        Ok(Relationship {
            id: RelationshipId::from_string(&id)?,
            mentor_id: UserId::from_string(&mentor_id)?,
            client_id: UserId::from_string(&client_id)?,
            status: Self::parse_enum::<RelationshipStatus>(&status)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_permissions(row: &SqliteRow) -> Result<SharePermissions> {
        let relationship_id: String = row.try_get("relationship_id")?;

        Ok(SharePermissions {
            relationship_id: RelationshipId::from_string(&relationship_id)?,
            allow_goals: row.try_get::<i32, _>("allow_goals")? != 0,
            allow_tasks: row.try_get::<i32, _>("allow_tasks")? != 0,
            allow_logs: row.try_get::<i32, _>("allow_logs")? != 0,
            allow_reflections: row.try_get::<i32, _>("allow_reflections")? != 0,
            allow_ai_reports: row.try_get::<i32, _>("allow_ai_reports")? != 0,
            is_active: row.try_get::<i32, _>("is_active")? != 0,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_goal(row: &SqliteRow) -> Result<Goal> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let status: String = row.try_get("status")?;

        Ok(Goal {
            id: GoalId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            deadline: row.try_get("deadline")?,
            status: Self::parse_enum(&status)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_task(row: &SqliteRow) -> Result<Task> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let goal_id: Option<String> = row.try_get("goal_id")?;
        let priority: String = row.try_get("priority")?;
        let status: String = row.try_get("status")?;
        let scheduled: Option<String> = row.try_get("scheduled_time")?;

        let scheduled_time = match scheduled {
            Some(s) => Some(NaiveTime::parse_from_str(&s, hhmm::FORMAT).map_err(|_| {
                EngineError::Other(format!("malformed scheduled_time in database: {}", s))
            })?),
            None => None,
        };

        Ok(Task {
            id: TaskId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            goal_id: goal_id.as_deref().map(GoalId::from_string).transpose()?,
            title: row.try_get("title")?,
            priority: Self::parse_enum(&priority)?,
            status: Self::parse_enum(&status)?,
            due_date: row.try_get("due_date")?,
            scheduled_time,
            completed_at: row.try_get("completed_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_log(row: &SqliteRow) -> Result<LogEntry> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;

        Ok(LogEntry {
            id: LogId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_reflection(row: &SqliteRow) -> Result<Reflection> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;

        Ok(Reflection {
            id: ReflectionId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_action_plan(row: &SqliteRow) -> Result<ActionPlan> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let status: String = row.try_get("status")?;

        Ok(ActionPlan {
            id: ActionPlanId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            title: row.try_get("title")?,
            status: Self::parse_enum(&status)?,
            created_at: row.try_get("created_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }

    fn row_to_report(row: &SqliteRow) -> Result<AiReport> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let insights: String = row.try_get("insights")?;
        let recommendations: String = row.try_get("recommendations")?;

        Ok(AiReport {
            id: ReportId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            summary: row.try_get("summary")?,
            confidence: row.try_get("confidence")?,
            insights: serde_json::from_str(&insights)?,
            recommendations: serde_json::from_str(&recommendations)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_note(row: &SqliteRow) -> Result<MentorNote> {
        let id: String = row.try_get("id")?;
        let mentor_id: String = row.try_get("mentor_id")?;
        let client_id: String = row.try_get("client_id")?;

        Ok(MentorNote {
            id: NoteId::from_string(&id)?,
            mentor_id: UserId::from_string(&mentor_id)?,
            client_id: UserId::from_string(&client_id)?,
            content: row.try_get("content")?,
            is_shared_with_client: row.try_get::<i32, _>("is_shared_with_client")? != 0,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_audit(row: &SqliteRow) -> Result<AuditRecord> {
        let relationship_id: String = row.try_get("relationship_id")?;
        let actor_id: String = row.try_get("actor_id")?;
        let category: String = row.try_get("category")?;
        let outcome: String = row.try_get("outcome")?;

        Ok(AuditRecord {
            relationship_id: RelationshipId::from_string(&relationship_id)?,
            actor: UserId::from_string(&actor_id)?,
            category: Self::parse_enum::<ShareCategory>(&category)?,
            outcome: Self::parse_enum::<AccessOutcome>(&outcome)?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn count_where(&self, sql: &str, user: UserId) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(user.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn create_relationship(&self, relationship: &Relationship) -> Result<()> {
        debug!("Storing relationship: {}", relationship.id);

        sqlx::query(
            r#"
            INSERT INTO relationships (id, mentor_id, client_id, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(relationship.id.to_string())
        .bind(relationship.mentor_id.to_string())
        .bind(relationship.client_id.to_string())
        .bind(relationship.status.as_str())
        .bind(relationship.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>> {
        let row = sqlx::query("SELECT * FROM relationships WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_relationship).transpose()
    }

    async fn relationship_between(
        &self,
        mentor: UserId,
        client: UserId,
    ) -> Result<Option<Relationship>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM relationships
            WHERE mentor_id = ? AND client_id = ? AND status != 'terminated'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(mentor.to_string())
        .bind(client.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_relationship).transpose()
    }

    async fn set_relationship_status(
        &self,
        id: RelationshipId,
        status: RelationshipStatus,
    ) -> Result<()> {
        debug!("Relationship {} -> {}", id, status);

        sqlx::query("UPDATE relationships SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_permissions(
        &self,
        relationship: RelationshipId,
    ) -> Result<Option<SharePermissions>> {
        let row = sqlx::query("SELECT * FROM share_permissions WHERE relationship_id = ?")
            .bind(relationship.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_permissions).transpose()
    }

    async fn upsert_permissions(&self, permissions: &SharePermissions) -> Result<()> {
        debug!("Upserting permissions for {}", permissions.relationship_id);

        sqlx::query(
            r#"
            INSERT INTO share_permissions (
                relationship_id, allow_goals, allow_tasks, allow_logs,
                allow_reflections, allow_ai_reports, is_active, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(relationship_id) DO UPDATE SET
                allow_goals = excluded.allow_goals,
                allow_tasks = excluded.allow_tasks,
                allow_logs = excluded.allow_logs,
                allow_reflections = excluded.allow_reflections,
                allow_ai_reports = excluded.allow_ai_reports,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(permissions.relationship_id.to_string())
        .bind(permissions.allow_goals as i32)
        .bind(permissions.allow_tasks as i32)
        .bind(permissions.allow_logs as i32)
        .bind(permissions.allow_reflections as i32)
        .bind(permissions.allow_ai_reports as i32)
        .bind(permissions.is_active as i32)
        .bind(permissions.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_goal(&self, goal: &Goal) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO goals (id, user_id, title, description, deadline, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(goal.id.to_string())
        .bind(goal.user_id.to_string())
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.deadline)
        .bind(goal.status.as_str())
        .bind(goal.created_at)
        .bind(goal.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_goal(&self, id: GoalId) -> Result<()> {
        // Tasks keep their goal_id; the reference is weak and resolves to
        // "no goal" once the row is gone.
        sqlx::query("DELETE FROM goals WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_goals(&self, user: UserId) -> Result<Vec<Goal>> {
        let rows = sqlx::query(
            "SELECT * FROM goals WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_goal).collect()
    }

    async fn create_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, user_id, goal_id, title, priority, status,
                due_date, scheduled_time, completed_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(task.user_id.to_string())
        .bind(task.goal_id.map(|id| id.to_string()))
        .bind(&task.title)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(
            task.scheduled_time
                .map(|t| t.format(hhmm::FORMAT).to_string()),
        )
        .bind(task.completed_at)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_tasks(&self, user: UserId) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn tasks_due_between(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM tasks
            WHERE user_id = ? AND due_date IS NOT NULL AND due_date >= ? AND due_date < ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(user.to_string())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn create_log(&self, entry: &LogEntry) -> Result<()> {
        sqlx::query("INSERT INTO logs (id, user_id, content, created_at) VALUES (?, ?, ?, ?)")
            .bind(entry.id.to_string())
            .bind(entry.user_id.to_string())
            .bind(&entry.content)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_logs(&self, user: UserId) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM logs WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_log).collect()
    }

    async fn create_reflection(&self, reflection: &Reflection) -> Result<()> {
        sqlx::query(
            "INSERT INTO reflections (id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(reflection.id.to_string())
        .bind(reflection.user_id.to_string())
        .bind(&reflection.content)
        .bind(reflection.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_reflections(&self, user: UserId) -> Result<Vec<Reflection>> {
        let rows = sqlx::query(
            "SELECT * FROM reflections WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_reflection).collect()
    }

    async fn create_action_plan(&self, plan: &ActionPlan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO action_plans (id, user_id, title, status, created_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(plan.id.to_string())
        .bind(plan.user_id.to_string())
        .bind(&plan.title)
        .bind(plan.status.as_str())
        .bind(plan.created_at)
        .bind(plan.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_action_plans(&self, user: UserId) -> Result<Vec<ActionPlan>> {
        let rows = sqlx::query(
            "SELECT * FROM action_plans WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_action_plan).collect()
    }

    async fn create_report(&self, report: &AiReport) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ai_reports (
                id, user_id, summary, confidence, insights, recommendations, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.id.to_string())
        .bind(report.user_id.to_string())
        .bind(&report.summary)
        .bind(report.confidence)
        .bind(serde_json::to_string(&report.insights)?)
        .bind(serde_json::to_string(&report.recommendations)?)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_reports(&self, user: UserId) -> Result<Vec<AiReport>> {
        let rows = sqlx::query(
            "SELECT * FROM ai_reports WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_report).collect()
    }

    async fn recent_completed_tasks(&self, user: UserId, limit: usize) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM tasks
            WHERE user_id = ? AND status = 'completed' AND completed_at IS NOT NULL
            ORDER BY completed_at DESC
            LIMIT ?
            "#,
        )
        .bind(user.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn recent_created_tasks(&self, user: UserId, limit: usize) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn recent_goals(&self, user: UserId, limit: usize) -> Result<Vec<Goal>> {
        let rows = sqlx::query(
            "SELECT * FROM goals WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_goal).collect()
    }

    async fn recent_reflections(&self, user: UserId, limit: usize) -> Result<Vec<Reflection>> {
        let rows = sqlx::query(
            "SELECT * FROM reflections WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_reflection).collect()
    }

    async fn recent_action_plans(&self, user: UserId, limit: usize) -> Result<Vec<ActionPlan>> {
        let rows = sqlx::query(
            "SELECT * FROM action_plans WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_action_plan).collect()
    }

    async fn progress_counts(&self, user: UserId) -> Result<ProgressCounts> {
        Ok(ProgressCounts {
            active_goals: self
                .count_where(
                    "SELECT COUNT(*) FROM goals WHERE user_id = ? AND status = 'active'",
                    user,
                )
                .await?,
            total_tasks: self
                .count_where("SELECT COUNT(*) FROM tasks WHERE user_id = ?", user)
                .await?,
            completed_tasks: self
                .count_where(
                    "SELECT COUNT(*) FROM tasks WHERE user_id = ? AND status = 'completed'",
                    user,
                )
                .await?,
            logs: self
                .count_where("SELECT COUNT(*) FROM logs WHERE user_id = ?", user)
                .await?,
            total_action_plans: self
                .count_where("SELECT COUNT(*) FROM action_plans WHERE user_id = ?", user)
                .await?,
            completed_action_plans: self
                .count_where(
                    "SELECT COUNT(*) FROM action_plans WHERE user_id = ? AND status = 'completed'",
                    user,
                )
                .await?,
        })
    }

    async fn create_note(&self, note: &MentorNote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO mentor_notes (
                id, mentor_id, client_id, content, is_shared_with_client, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(note.id.to_string())
        .bind(note.mentor_id.to_string())
        .bind(note.client_id.to_string())
        .bind(&note.content)
        .bind(note.is_shared_with_client as i32)
        .bind(note.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_notes(&self, mentor: UserId, client: UserId) -> Result<Vec<MentorNote>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM mentor_notes
            WHERE mentor_id = ? AND client_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(mentor.to_string())
        .bind(client.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_note).collect()
    }

    async fn record_audit(&self, record: &AuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (relationship_id, actor_id, category, outcome, reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.relationship_id.to_string())
        .bind(record.actor.to_string())
        .bind(record.category.as_str())
        .bind(record.outcome.as_str())
        .bind(&record.reason)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_audit(&self, relationship: RelationshipId) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_log WHERE relationship_id = ? ORDER BY id DESC",
        )
        .bind(relationship.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_audit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GoalStatus, SharePolicy, TaskPriority, TaskStatus};
    use tempfile::TempDir;

    async fn storage() -> (SqliteStorage, TempDir) {
        // A file-backed database per test: pooled connections to
        // `sqlite::memory:` would each get their own empty database.
        let dir = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}/test.db", dir.path().display());
        let storage = SqliteStorage::new(&url).await.expect("storage");
        storage.run_migrations().await.expect("migrations");
        (storage, dir)
    }

    #[tokio::test]
    async fn test_relationship_lifecycle() {
        let (storage, _dir) = storage().await;

        let mentor = UserId::new();
        let client = UserId::new();
        let relationship = Relationship::new(mentor, client);

        storage.create_relationship(&relationship).await.unwrap();

        let loaded = storage
            .get_relationship(relationship.id)
            .await
            .unwrap()
            .expect("stored relationship");
        assert_eq!(loaded.status, RelationshipStatus::Pending);
        assert_eq!(loaded.mentor_id, mentor);

        storage
            .set_relationship_status(relationship.id, RelationshipStatus::Active)
            .await
            .unwrap();
        let loaded = storage
            .relationship_between(mentor, client)
            .await
            .unwrap()
            .expect("active relationship");
        assert_eq!(loaded.status, RelationshipStatus::Active);

        storage
            .set_relationship_status(relationship.id, RelationshipStatus::Terminated)
            .await
            .unwrap();
        assert!(storage
            .relationship_between(mentor, client)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_permissions_round_trip() {
        let (storage, _dir) = storage().await;

        let relationship = Relationship::new(UserId::new(), UserId::new());
        storage.create_relationship(&relationship).await.unwrap();

        assert!(storage
            .get_permissions(relationship.id)
            .await
            .unwrap()
            .is_none());

        let mut permissions =
            SharePermissions::from_policy(relationship.id, &SharePolicy::default());
        storage.upsert_permissions(&permissions).await.unwrap();

        let loaded = storage
            .get_permissions(relationship.id)
            .await
            .unwrap()
            .expect("permission record");
        assert!(loaded.allow_goals && loaded.is_active);

        permissions.allow_logs = false;
        permissions.is_active = false;
        storage.upsert_permissions(&permissions).await.unwrap();

        let loaded = storage
            .get_permissions(relationship.id)
            .await
            .unwrap()
            .expect("permission record");
        assert!(!loaded.allow_logs);
        assert!(!loaded.is_active);
        assert!(loaded.allow_goals);
    }

    #[tokio::test]
    async fn test_task_round_trip_preserves_schedule() {
        let (storage, _dir) = storage().await;
        let user = UserId::new();

        let task = Task {
            id: TaskId::new(),
            user_id: user,
            goal_id: Some(GoalId::new()),
            title: "review weekly plan".to_string(),
            priority: TaskPriority::High,
            status: TaskStatus::Pending,
            due_date: Some(Utc::now()),
            scheduled_time: NaiveTime::from_hms_opt(7, 30, 0),
            completed_at: None,
            created_at: Utc::now(),
        };
        storage.create_task(&task).await.unwrap();

        let tasks = storage.list_tasks(user).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].scheduled_time, task.scheduled_time);
        assert_eq!(tasks[0].priority, TaskPriority::High);
        assert_eq!(tasks[0].goal_id, task.goal_id);
    }

    #[tokio::test]
    async fn test_action_plan_round_trip() {
        let (storage, _dir) = storage().await;
        let user = UserId::new();
        let now = Utc::now();

        storage
            .create_action_plan(&ActionPlan {
                id: ActionPlanId::new(),
                user_id: user,
                title: "cut down evening screen time".to_string(),
                status: ActionPlanStatus::Completed,
                created_at: now,
                completed_at: Some(now),
            })
            .await
            .unwrap();
        storage
            .create_action_plan(&ActionPlan {
                id: ActionPlanId::new(),
                user_id: user,
                title: "plan meals on Sundays".to_string(),
                status: ActionPlanStatus::Pending,
                created_at: now + chrono::Duration::minutes(5),
                completed_at: None,
            })
            .await
            .unwrap();

        let plans = storage.list_action_plans(user).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].title, "plan meals on Sundays");
        assert_eq!(plans[1].status, ActionPlanStatus::Completed);
        assert!(plans[1].completed_at.is_some());

        assert!(storage
            .list_action_plans(UserId::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_progress_counts() {
        let (storage, _dir) = storage().await;
        let user = UserId::new();
        let now = Utc::now();

        for status in [GoalStatus::Active, GoalStatus::Active, GoalStatus::Completed] {
            storage
                .create_goal(&Goal {
                    id: GoalId::new(),
                    user_id: user,
                    title: "g".to_string(),
                    description: None,
                    deadline: None,
                    status,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        for status in [TaskStatus::Completed, TaskStatus::Pending] {
            storage
                .create_task(&Task {
                    id: TaskId::new(),
                    user_id: user,
                    goal_id: None,
                    title: "t".to_string(),
                    priority: TaskPriority::Medium,
                    status,
                    due_date: None,
                    scheduled_time: None,
                    completed_at: (status == TaskStatus::Completed).then_some(now),
                    created_at: now,
                })
                .await
                .unwrap();
        }

        storage
            .create_log(&LogEntry {
                id: LogId::new(),
                user_id: user,
                content: "walked 5km".to_string(),
                created_at: now,
            })
            .await
            .unwrap();

        let counts = storage.progress_counts(user).await.unwrap();
        assert_eq!(counts.active_goals, 2);
        assert_eq!(counts.total_tasks, 2);
        assert_eq!(counts.completed_tasks, 1);
        assert_eq!(counts.logs, 1);
        assert_eq!(counts.total_action_plans, 0);
    }

    #[tokio::test]
    async fn test_recent_queries_cap_and_order() {
        let (storage, _dir) = storage().await;
        let user = UserId::new();
        let base = Utc::now();

        for i in 0..12 {
            storage
                .create_goal(&Goal {
                    id: GoalId::new(),
                    user_id: user,
                    title: format!("goal {}", i),
                    description: None,
                    deadline: None,
                    status: GoalStatus::Active,
                    created_at: base + chrono::Duration::minutes(i),
                    updated_at: base + chrono::Duration::minutes(i),
                })
                .await
                .unwrap();
        }

        let recent = storage.recent_goals(user, 10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].title, "goal 11");
        assert!(recent[0].created_at > recent[9].created_at);
    }

    #[tokio::test]
    async fn test_audit_round_trip() {
        let (storage, _dir) = storage().await;
        let relationship = RelationshipId::new();

        storage
            .record_audit(&AuditRecord {
                relationship_id: relationship,
                actor: UserId::new(),
                category: ShareCategory::Goals,
                outcome: AccessOutcome::Denied,
                reason: Some("category not shared".to_string()),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let records = storage.list_audit(relationship).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, ShareCategory::Goals);
        assert_eq!(records[0].outcome, AccessOutcome::Denied);
        assert_eq!(records[0].reason.as_deref(), Some("category not shared"));
    }
}
