//! Common test utilities and helpers
#![allow(dead_code)]

use chrono::{DateTime, NaiveTime, Utc};
use mentorbridge_core::types::{
    ActionPlan, ActionPlanId, ActionPlanStatus, AiReport, Goal, GoalId, GoalStatus, LogEntry,
    LogId, Recommendation, Reflection, ReflectionId, ReportId, TaskId,
};
use mentorbridge_core::{
    AuditRecord, Engine, Relationship, RelationshipId, SharePolicy, SqliteStorage,
    StorageBackend, Task, TaskPriority, TaskStatus, UserId,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Engine plus direct storage access for seeding, backed by a throwaway
/// database file (pooled connections to `sqlite::memory:` would each see
/// their own empty database)
pub struct TestContext {
    pub engine: Engine,
    pub store: Arc<SqliteStorage>,
    _dir: TempDir,
}

pub async fn create_test_context() -> TestContext {
    let dir = TempDir::new().expect("failed to create temp dir");
    let url = format!("sqlite://{}/test.db", dir.path().display());

    let storage = SqliteStorage::new(&url)
        .await
        .expect("failed to create test storage");
    storage
        .run_migrations()
        .await
        .expect("failed to run migrations");

    let store = Arc::new(storage);
    let engine = Engine::new(store.clone(), SharePolicy::default());

    TestContext {
        engine,
        store,
        _dir: dir,
    }
}

/// Create and approve a relationship, returning it in the Active state
/// with the default full-disclosure permission record in place
pub async fn active_relationship(
    ctx: &TestContext,
    mentor: UserId,
    client: UserId,
) -> Relationship {
    let relationship = ctx
        .engine
        .create_relationship(mentor, mentor, client)
        .await
        .expect("failed to create relationship");
    ctx.engine
        .approve_relationship(relationship.id, client)
        .await
        .expect("failed to approve relationship")
}

pub fn goal(user: UserId, title: &str, status: GoalStatus, created_at: DateTime<Utc>) -> Goal {
    Goal {
        id: GoalId::new(),
        user_id: user,
        title: title.to_string(),
        description: None,
        deadline: None,
        status,
        created_at,
        updated_at: created_at,
    }
}

pub fn task(user: UserId, title: &str, status: TaskStatus, created_at: DateTime<Utc>) -> Task {
    Task {
        id: TaskId::new(),
        user_id: user,
        goal_id: None,
        title: title.to_string(),
        priority: TaskPriority::Medium,
        status,
        due_date: None,
        scheduled_time: None,
        completed_at: (status == TaskStatus::Completed).then_some(created_at),
        created_at,
    }
}

pub fn due_task(
    user: UserId,
    title: &str,
    priority: TaskPriority,
    due_date: DateTime<Utc>,
    scheduled: Option<&str>,
    created_at: DateTime<Utc>,
) -> Task {
    Task {
        id: TaskId::new(),
        user_id: user,
        goal_id: None,
        title: title.to_string(),
        priority,
        status: TaskStatus::Pending,
        due_date: Some(due_date),
        scheduled_time: scheduled.map(|s| {
            NaiveTime::parse_from_str(s, "%H:%M").expect("test scheduled time must be HH:MM")
        }),
        completed_at: None,
        created_at,
    }
}

pub fn log_entry(user: UserId, created_at: DateTime<Utc>) -> LogEntry {
    LogEntry {
        id: LogId::new(),
        user_id: user,
        content: "logged some progress".to_string(),
        created_at,
    }
}

pub fn reflection(user: UserId, created_at: DateTime<Utc>) -> Reflection {
    Reflection {
        id: ReflectionId::new(),
        user_id: user,
        content: "thinking it over".to_string(),
        created_at,
    }
}

pub fn action_plan(
    user: UserId,
    title: &str,
    status: ActionPlanStatus,
    created_at: DateTime<Utc>,
) -> ActionPlan {
    ActionPlan {
        id: ActionPlanId::new(),
        user_id: user,
        title: title.to_string(),
        status,
        created_at,
        completed_at: (status == ActionPlanStatus::Completed).then_some(created_at),
    }
}

pub fn report(user: UserId, created_at: DateTime<Utc>) -> AiReport {
    AiReport {
        id: ReportId::new(),
        user_id: user,
        summary: "steady improvement over the last month".to_string(),
        confidence: 0.82,
        insights: vec!["keeps a consistent morning routine".to_string()],
        recommendations: vec![Recommendation {
            text: "schedule weekly reviews".to_string(),
            rank: 1,
        }],
        created_at,
    }
}

/// Audit writes are detached from the request, so poll briefly instead of
/// asserting immediately after the gated call returns
pub async fn wait_for_audit(
    store: &SqliteStorage,
    relationship: RelationshipId,
    expected: usize,
) -> Vec<AuditRecord> {
    for _ in 0..100 {
        let records = store
            .list_audit(relationship)
            .await
            .expect("failed to list audit records");
        if records.len() >= expected {
            return records;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {} audit record(s)", expected);
}
