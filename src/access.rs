//! Access gate for mentor reads of client data
//!
//! The single choke point between a mentor-facing consumer and any gated
//! category of client records. Every check re-reads the relationship and
//! permission rows so a permission toggle is honored on the very next
//! read; nothing here is cached.
//!
//! Every denied outcome, and every allowed mentor read, produces an audit
//! record. Audit writes run on a spawned task so the access decision never
//! waits on, or fails because of, the audit store.

use crate::error::{EngineError, Result};
use crate::storage::StorageBackend;
use crate::types::{
    AccessOutcome, AuditRecord, DenyReason, Relationship, RelationshipId, RelationshipStatus,
    ShareCategory, UserId,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Proof that a category check passed, carrying the relationship so the
/// caller can fetch the client's records without a second lookup
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub relationship: Relationship,
    pub category: ShareCategory,
}

/// The mentor-facing access gate
#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn StorageBackend>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self { store }
    }

    /// Check whether `actor` may read `category` for the given relationship.
    ///
    /// Steps, in order: the relationship must exist and be active, the
    /// actor must be its mentor, a permission record must exist, and the
    /// record must allow the category. The first failing step decides the
    /// outcome; only storage faults surface as non-domain errors.
    pub async fn check(
        &self,
        relationship_id: RelationshipId,
        category: ShareCategory,
        actor: UserId,
    ) -> Result<AccessGrant> {
        let Some(relationship) = self.store.get_relationship(relationship_id).await? else {
            self.audit_denied(relationship_id, actor, category, "relationship not found");
            return Err(EngineError::RelationshipNotFound(relationship_id));
        };

        if relationship.status != RelationshipStatus::Active {
            return Err(self.deny(
                relationship_id,
                actor,
                category,
                DenyReason::NoActiveRelationship,
            ));
        }

        if actor != relationship.mentor_id {
            self.audit_denied(relationship_id, actor, category, "not the relationship mentor");
            return Err(EngineError::NotAuthorized(
                "only the relationship mentor may read shared data".to_string(),
            ));
        }

        let Some(permissions) = self.store.get_permissions(relationship_id).await? else {
            return Err(self.deny(
                relationship_id,
                actor,
                category,
                DenyReason::NoPermissionRecord,
            ));
        };

        if let Err(reason) = permissions.evaluate(category) {
            return Err(self.deny(relationship_id, actor, category, reason));
        }

        debug!(
            "Access allowed: relationship={} category={} mentor={}",
            relationship_id, category, actor
        );
        self.emit(AuditRecord {
            relationship_id,
            actor,
            category,
            outcome: AccessOutcome::Allowed,
            reason: None,
            created_at: Utc::now(),
        });

        Ok(AccessGrant {
            relationship,
            category,
        })
    }

    fn deny(
        &self,
        relationship_id: RelationshipId,
        actor: UserId,
        category: ShareCategory,
        reason: DenyReason,
    ) -> EngineError {
        debug!(
            "Access denied: relationship={} category={} mentor={} reason={}",
            relationship_id, category, actor, reason
        );
        self.audit_denied(relationship_id, actor, category, reason.as_str());
        EngineError::PermissionDenied { reason }
    }

    fn audit_denied(
        &self,
        relationship_id: RelationshipId,
        actor: UserId,
        category: ShareCategory,
        reason: &str,
    ) {
        self.emit(AuditRecord {
            relationship_id,
            actor,
            category,
            outcome: AccessOutcome::Denied,
            reason: Some(reason.to_string()),
            created_at: Utc::now(),
        });
    }

    /// Best-effort audit write, detached from the request
    fn emit(&self, record: AuditRecord) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.record_audit(&record).await {
                warn!(
                    "Audit write failed for relationship {}: {}",
                    record.relationship_id, e
                );
            }
        });
    }
}
