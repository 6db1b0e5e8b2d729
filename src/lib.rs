//! Mentorbridge - Permission-Gated Client Data Engine
//!
//! The engine that sits between a mentoring platform's stored client data
//! (goals, tasks, logs, reflections, AI reports) and any consumer. It
//! provides:
//! - Per-relationship sharing permissions, re-evaluated on every read
//! - A single access-gate choke point with an audited decision trail
//! - Progress aggregation (goal percentages, four-axis compass summary)
//! - A merged, timestamp-sorted activity feed
//! - Deterministic ordering for the daily task agenda
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Core data structures (Relationship, SharePermissions, ...)
//! - **Storage**: Repository trait plus the SQLite backend
//! - **Access/Progress/Feed/Agenda**: the gate and the aggregators
//! - **Engine**: the facade consumers call
//! - **Api**: HTTP surface over the engine
//!
//! # Example
//!
//! ```ignore
//! use mentorbridge_core::{Engine, SqliteStorage, SharePolicy, ShareCategory};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = SqliteStorage::new("sqlite://mentorbridge.db").await?;
//!     storage.run_migrations().await?;
//!     let engine = Engine::new(Arc::new(storage), SharePolicy::default());
//!
//!     // A mentor reading a shared category; denied unless the client
//!     // granted it and the relationship is active.
//!     let records = engine
//!         .category_data(relationship_id, mentor_id, ShareCategory::Goals)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod agenda;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod progress;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use access::{AccessGate, AccessGrant};
pub use config::Settings;
pub use engine::{CategoryRecords, Dashboard, Engine, PermissionUpdate};
pub use error::{EngineError, Result};
pub use feed::{ActivityEvent, ActivityKind};
pub use progress::{CompassSummary, GoalProgress};
pub use storage::{sqlite::SqliteStorage, ProgressCounts, StorageBackend};
pub use types::{
    AccessOutcome, ActionPlan, AiReport, AuditRecord, DenyReason, Goal, GoalStatus, LogEntry,
    MentorNote, Reflection, Relationship, RelationshipId, RelationshipStatus, ShareCategory,
    SharePermissions, SharePolicy, Task, TaskPriority, TaskStatus, UserId,
};
