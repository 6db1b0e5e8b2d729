//! Engine facade
//!
//! Composes the access gate, storage backend, and aggregators into the
//! operations consumers call: relationship lifecycle, permission
//! management, gated category reads, and the client's own dashboard,
//! feed, and agenda views.
//!
//! Requests are stateless; composite views fan their sub-fetches out
//! concurrently and nothing is cached between calls. Dropping the future
//! of a composite view cancels its in-flight sub-fetches, so partial
//! results are never surfaced.

use crate::access::{AccessGate, AccessGrant};
use crate::agenda::{self, AgendaEntry};
use crate::error::{EngineError, Result};
use crate::feed::{self, ActivityEvent, FeedSources};
use crate::progress::{goal_progress_list, CompassSummary, GoalProgress};
use crate::storage::StorageBackend;
use crate::types::{
    AiReport, AuditRecord, DenyReason, LogEntry, MentorNote, NoteId, Reflection, Relationship,
    RelationshipId, RelationshipStatus, ShareCategory, SharePermissions, SharePolicy, Task, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Largest activity feed a caller may request
pub const FEED_LIMIT_MAX: usize = 50;

/// Records served for one gated category
#[derive(Debug, Serialize)]
#[serde(tag = "category", content = "records", rename_all = "snake_case")]
pub enum CategoryRecords {
    Goals(Vec<GoalProgress>),
    Tasks(Vec<Task>),
    Logs(Vec<LogEntry>),
    Reflections(Vec<Reflection>),
    AiReports(Vec<AiReport>),
}

/// Permission flags submitted by the owning client
///
/// `is_active` is optional so a flag update does not silently resume
/// paused sharing.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionUpdate {
    pub allow_goals: bool,
    pub allow_tasks: bool,
    pub allow_logs: bool,
    pub allow_reflections: bool,
    pub allow_ai_reports: bool,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// The client's own dashboard view
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub compass: CompassSummary,
    pub goals: Vec<GoalProgress>,
    pub today: Vec<AgendaEntry>,
    pub recent_activity: Vec<ActivityEvent>,
}

/// The permission-gated data access and aggregation engine
pub struct Engine {
    store: Arc<dyn StorageBackend>,
    gate: AccessGate,
    policy: SharePolicy,
}

impl Engine {
    pub fn new(store: Arc<dyn StorageBackend>, policy: SharePolicy) -> Self {
        let gate = AccessGate::new(store.clone());
        Self {
            store,
            gate,
            policy,
        }
    }

    /// Direct access to the gate, for callers that need the check without
    /// the fetch
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    // === Relationship lifecycle ===

    /// Create a pending relationship between a mentor and a client.
    ///
    /// The caller must be one of the two parties.
    pub async fn create_relationship(
        &self,
        actor: UserId,
        mentor: UserId,
        client: UserId,
    ) -> Result<Relationship> {
        if mentor == client {
            return Err(EngineError::Validation(
                "mentor and client must be different users".to_string(),
            ));
        }
        if actor != mentor && actor != client {
            return Err(EngineError::NotAuthorized(
                "only a party to the relationship may create it".to_string(),
            ));
        }
        if let Some(existing) = self.store.relationship_between(mentor, client).await? {
            return Err(EngineError::Validation(format!(
                "a relationship between these users already exists ({})",
                existing.status
            )));
        }

        let relationship = Relationship::new(mentor, client);
        self.store.create_relationship(&relationship).await?;
        info!(
            "Relationship {} created: mentor={} client={}",
            relationship.id, mentor, client
        );
        Ok(relationship)
    }

    /// Client approval: Pending -> Active, creating the permission record
    /// from the configured default policy on first activation.
    pub async fn approve_relationship(
        &self,
        id: RelationshipId,
        actor: UserId,
    ) -> Result<Relationship> {
        let mut relationship = self.load_relationship(id).await?;

        if actor != relationship.client_id {
            return Err(EngineError::NotAuthorized(
                "only the client may approve a relationship".to_string(),
            ));
        }
        if relationship.status != RelationshipStatus::Pending {
            return Err(EngineError::Validation(format!(
                "relationship is {}, not pending",
                relationship.status
            )));
        }

        self.store
            .set_relationship_status(id, RelationshipStatus::Active)
            .await?;
        relationship.status = RelationshipStatus::Active;

        if self.store.get_permissions(id).await?.is_none() {
            let permissions = SharePermissions::from_policy(id, &self.policy);
            self.store.upsert_permissions(&permissions).await?;
        }

        info!("Relationship {} approved by client {}", id, actor);
        Ok(relationship)
    }

    /// Either party may terminate; terminated is final.
    pub async fn terminate_relationship(
        &self,
        id: RelationshipId,
        actor: UserId,
    ) -> Result<Relationship> {
        let mut relationship = self.load_relationship(id).await?;

        if !relationship.is_party(actor) {
            return Err(EngineError::NotAuthorized(
                "only a party to the relationship may terminate it".to_string(),
            ));
        }
        if relationship.status == RelationshipStatus::Terminated {
            return Err(EngineError::Validation(
                "relationship is already terminated".to_string(),
            ));
        }

        self.store
            .set_relationship_status(id, RelationshipStatus::Terminated)
            .await?;
        relationship.status = RelationshipStatus::Terminated;

        info!("Relationship {} terminated by {}", id, actor);
        Ok(relationship)
    }

    // === Permission management ===

    /// Current permission record, readable by either party
    pub async fn permissions(
        &self,
        id: RelationshipId,
        actor: UserId,
    ) -> Result<SharePermissions> {
        let relationship = self.load_relationship(id).await?;
        if !relationship.is_party(actor) {
            return Err(EngineError::NotAuthorized(
                "only a party to the relationship may read its permissions".to_string(),
            ));
        }

        self.store
            .get_permissions(id)
            .await?
            .ok_or(EngineError::PermissionDenied {
                reason: DenyReason::NoPermissionRecord,
            })
    }

    /// Replace the category grants; only the owning client, only while the
    /// relationship is active. The write goes straight through, so the
    /// next gate check observes it.
    pub async fn update_permissions(
        &self,
        id: RelationshipId,
        actor: UserId,
        update: PermissionUpdate,
    ) -> Result<SharePermissions> {
        let relationship = self.load_relationship(id).await?;

        if actor != relationship.client_id {
            return Err(EngineError::NotAuthorized(
                "only the owning client may change sharing permissions".to_string(),
            ));
        }
        if relationship.status != RelationshipStatus::Active {
            return Err(EngineError::RelationshipNotActive {
                id,
                status: relationship.status,
            });
        }

        let existing = self.store.get_permissions(id).await?;
        let permissions = SharePermissions {
            relationship_id: id,
            allow_goals: update.allow_goals,
            allow_tasks: update.allow_tasks,
            allow_logs: update.allow_logs,
            allow_reflections: update.allow_reflections,
            allow_ai_reports: update.allow_ai_reports,
            is_active: update
                .is_active
                .or(existing.map(|p| p.is_active))
                .unwrap_or(true),
            updated_at: Utc::now(),
        };
        self.store.upsert_permissions(&permissions).await?;

        info!("Permissions updated for relationship {}", id);
        Ok(permissions)
    }

    // === Gated category reads ===

    /// Mentor read of one shared category.
    ///
    /// The gate check completes before any record is fetched, so a denied
    /// category never touches the data.
    pub async fn category_data(
        &self,
        id: RelationshipId,
        actor: UserId,
        category: ShareCategory,
    ) -> Result<CategoryRecords> {
        let grant: AccessGrant = self.gate.check(id, category, actor).await?;
        let client = grant.relationship.client_id;

        match category {
            ShareCategory::Goals => {
                let (goals, tasks) =
                    tokio::try_join!(self.store.list_goals(client), self.store.list_tasks(client))?;
                Ok(CategoryRecords::Goals(goal_progress_list(goals, &tasks)))
            }
            ShareCategory::Tasks => Ok(CategoryRecords::Tasks(self.store.list_tasks(client).await?)),
            ShareCategory::Logs => Ok(CategoryRecords::Logs(self.store.list_logs(client).await?)),
            ShareCategory::Reflections => Ok(CategoryRecords::Reflections(
                self.store.list_reflections(client).await?,
            )),
            ShareCategory::AiReports => Ok(CategoryRecords::AiReports(
                self.store.list_reports(client).await?,
            )),
        }
    }

    /// Pair-addressed variant of [`Engine::category_data`]: resolves the
    /// caller's relationship with the client first.
    ///
    /// Without a live relationship there is no id to audit against, so the
    /// lookup failure surfaces as the same "no active relationship" denial
    /// the gate would produce.
    pub async fn category_data_for_client(
        &self,
        actor: UserId,
        client: UserId,
        category: ShareCategory,
    ) -> Result<CategoryRecords> {
        let relationship = self
            .store
            .relationship_between(actor, client)
            .await?
            .ok_or(EngineError::PermissionDenied {
                reason: DenyReason::NoActiveRelationship,
            })?;
        self.category_data(relationship.id, actor, category).await
    }

    // === Client self-views ===

    /// The client's own dashboard; no gating, sub-fetches run concurrently
    pub async fn dashboard(&self, user: UserId, now: DateTime<Utc>) -> Result<Dashboard> {
        let (counts, goals_with_progress, today, recent_activity) = tokio::try_join!(
            self.store.progress_counts(user),
            async {
                let (goals, tasks) =
                    tokio::try_join!(self.store.list_goals(user), self.store.list_tasks(user))?;
                Ok::<_, EngineError>(goal_progress_list(goals, &tasks))
            },
            self.today_agenda(user, now),
            self.activity_feed(user, Some(feed::DEFAULT_LIMIT)),
        )?;

        Ok(Dashboard {
            compass: CompassSummary::from_counts(&counts),
            goals: goals_with_progress,
            today,
            recent_activity,
        })
    }

    /// Point-in-time activity feed over the five source categories
    pub async fn activity_feed(
        &self,
        user: UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityEvent>> {
        let limit = limit.unwrap_or(feed::DEFAULT_LIMIT);
        if limit == 0 || limit > FEED_LIMIT_MAX {
            return Err(EngineError::Validation(format!(
                "feed limit must be between 1 and {}",
                FEED_LIMIT_MAX
            )));
        }

        let (completed_tasks, created_tasks, goals, reflections, action_plans) = tokio::try_join!(
            self.store.recent_completed_tasks(user, feed::SOURCE_CAP),
            self.store.recent_created_tasks(user, feed::SOURCE_CAP),
            self.store.recent_goals(user, feed::SOURCE_CAP),
            self.store.recent_reflections(user, feed::SOURCE_CAP),
            self.store.recent_action_plans(user, feed::SOURCE_CAP),
        )?;

        Ok(feed::build_feed(
            FeedSources {
                completed_tasks,
                created_tasks,
                goals,
                reflections,
                action_plans,
            },
            limit,
        ))
    }

    /// Tasks due on the day containing `now`, in agenda order
    pub async fn today_agenda(&self, user: UserId, now: DateTime<Utc>) -> Result<Vec<AgendaEntry>> {
        let (start, end) = agenda::day_window(now);
        let (tasks, goals) = tokio::try_join!(
            self.store.tasks_due_between(user, start, end),
            self.store.list_goals(user),
        )?;
        Ok(agenda::build_agenda(tasks, &goals))
    }

    // === Mentor notes ===

    /// Record a mentor note, optionally shared with the client
    pub async fn add_note(
        &self,
        id: RelationshipId,
        actor: UserId,
        content: String,
        is_shared_with_client: bool,
    ) -> Result<MentorNote> {
        let relationship = self.load_relationship(id).await?;
        if actor != relationship.mentor_id {
            return Err(EngineError::NotAuthorized(
                "only the mentor may add notes".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(EngineError::Validation("note content is empty".to_string()));
        }

        let note = MentorNote {
            id: NoteId::new(),
            mentor_id: relationship.mentor_id,
            client_id: relationship.client_id,
            content,
            is_shared_with_client,
            created_at: Utc::now(),
        };
        self.store.create_note(&note).await?;
        Ok(note)
    }

    /// Notes visible to the caller: mentors see all of their own, clients
    /// only what was shared with them
    pub async fn notes(&self, id: RelationshipId, actor: UserId) -> Result<Vec<MentorNote>> {
        let relationship = self.load_relationship(id).await?;
        if !relationship.is_party(actor) {
            return Err(EngineError::NotAuthorized(
                "only a party to the relationship may read its notes".to_string(),
            ));
        }

        let notes = self
            .store
            .list_notes(relationship.mentor_id, relationship.client_id)
            .await?;
        Ok(notes
            .into_iter()
            .filter(|note| note.visible_to(actor))
            .collect())
    }

    // === Audit trail ===

    /// Audit records for a relationship, readable by either party
    pub async fn audit_trail(
        &self,
        id: RelationshipId,
        actor: UserId,
    ) -> Result<Vec<AuditRecord>> {
        let relationship = self.load_relationship(id).await?;
        if !relationship.is_party(actor) {
            return Err(EngineError::NotAuthorized(
                "only a party to the relationship may read its audit trail".to_string(),
            ));
        }
        self.store.list_audit(id).await
    }

    async fn load_relationship(&self, id: RelationshipId) -> Result<Relationship> {
        self.store
            .get_relationship(id)
            .await?
            .ok_or(EngineError::RelationshipNotFound(id))
    }
}
