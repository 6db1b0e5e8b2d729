//! HTTP API server
//!
//! Routes map one-to-one onto engine operations: relationship lifecycle,
//! permission management, gated category reads for mentors, and the
//! client's own dashboard, feed, and agenda views.

use super::auth::Identity;
use super::{ApiError, ApiResult};
use crate::agenda::AgendaEntry;
use crate::engine::{CategoryRecords, Dashboard, Engine, PermissionUpdate};
use crate::error::{EngineError, Result};
use crate::feed::ActivityEvent;
use crate::types::{
    AuditRecord, MentorNote, Relationship, RelationshipId, ShareCategory, SharePermissions,
    UserId,
};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 8087).into(),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    engine: Arc<Engine>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }

    /// Build router
    fn build_router(state: AppState) -> Router {
        Router::new()
            // Relationship lifecycle
            .route("/relationships", post(create_relationship_handler))
            .route("/relationships/:id/approve", post(approve_handler))
            .route("/relationships/:id/terminate", post(terminate_handler))
            // Sharing permissions
            .route(
                "/relationships/:id/permissions",
                get(get_permissions_handler).put(put_permissions_handler),
            )
            // Gated mentor reads, addressed by relationship or by client
            .route("/relationships/:id/data/:category", get(category_data_handler))
            .route("/clients/:id/data/:category", get(client_data_handler))
            // Mentor notes
            .route(
                "/relationships/:id/notes",
                get(list_notes_handler).post(create_note_handler),
            )
            // Audit trail
            .route("/relationships/:id/audit", get(audit_handler))
            // Client self-views
            .route("/me/dashboard", get(dashboard_handler))
            .route("/me/feed", get(feed_handler))
            .route("/me/tasks/today", get(agenda_handler))
            // Health check
            .route("/health", get(health_handler))
            // State
            .with_state(state)
            // Middleware
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until the process is stopped
    pub async fn serve(self) -> Result<()> {
        let state = AppState {
            engine: self.engine,
        };
        let router = Self::build_router(state);

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("API server listening on http://{}", self.config.addr);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

fn relationship_id(raw: Uuid) -> RelationshipId {
    RelationshipId(raw)
}

// === Relationship lifecycle ===

#[derive(Debug, Deserialize)]
struct CreateRelationshipRequest {
    mentor_id: UserId,
    client_id: UserId,
}

async fn create_relationship_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Json(req): Json<CreateRelationshipRequest>,
) -> ApiResult<Relationship> {
    let relationship = state
        .engine
        .create_relationship(actor, req.mentor_id, req.client_id)
        .await?;
    Ok(Json(relationship))
}

async fn approve_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Relationship> {
    let relationship = state
        .engine
        .approve_relationship(relationship_id(id), actor)
        .await?;
    Ok(Json(relationship))
}

async fn terminate_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Relationship> {
    let relationship = state
        .engine
        .terminate_relationship(relationship_id(id), actor)
        .await?;
    Ok(Json(relationship))
}

// === Sharing permissions ===

async fn get_permissions_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<SharePermissions> {
    let permissions = state.engine.permissions(relationship_id(id), actor).await?;
    Ok(Json(permissions))
}

async fn put_permissions_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
    Json(update): Json<PermissionUpdate>,
) -> ApiResult<SharePermissions> {
    let permissions = state
        .engine
        .update_permissions(relationship_id(id), actor, update)
        .await?;
    Ok(Json(permissions))
}

// === Gated mentor reads ===

async fn category_data_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path((id, category)): Path<(Uuid, String)>,
) -> ApiResult<CategoryRecords> {
    let category = ShareCategory::parse(&category).ok_or_else(|| {
        ApiError(EngineError::Validation(format!(
            "unknown category: {}",
            category
        )))
    })?;

    let records = state
        .engine
        .category_data(relationship_id(id), actor, category)
        .await?;
    Ok(Json(records))
}

async fn client_data_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path((client, category)): Path<(Uuid, String)>,
) -> ApiResult<CategoryRecords> {
    let category = ShareCategory::parse(&category).ok_or_else(|| {
        ApiError(EngineError::Validation(format!(
            "unknown category: {}",
            category
        )))
    })?;

    let records = state
        .engine
        .category_data_for_client(actor, UserId(client), category)
        .await?;
    Ok(Json(records))
}

// === Mentor notes ===

#[derive(Debug, Deserialize)]
struct CreateNoteRequest {
    content: String,
    #[serde(default)]
    is_shared_with_client: bool,
}

async fn create_note_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<MentorNote> {
    let note = state
        .engine
        .add_note(
            relationship_id(id),
            actor,
            req.content,
            req.is_shared_with_client,
        )
        .await?;
    Ok(Json(note))
}

async fn list_notes_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<MentorNote>> {
    let notes = state.engine.notes(relationship_id(id), actor).await?;
    Ok(Json(notes))
}

// === Audit trail ===

async fn audit_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<AuditRecord>> {
    let records = state.engine.audit_trail(relationship_id(id), actor).await?;
    Ok(Json(records))
}

// === Client self-views ===

async fn dashboard_handler(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Dashboard> {
    let dashboard = state.engine.dashboard(user, Utc::now()).await?;
    Ok(Json(dashboard))
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    limit: Option<usize>,
}

async fn feed_handler(
    State(state): State<AppState>,
    Identity(user): Identity,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Vec<ActivityEvent>> {
    let feed = state.engine.activity_feed(user, query.limit).await?;
    Ok(Json(feed))
}

async fn agenda_handler(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Vec<AgendaEntry>> {
    let agenda = state.engine.today_agenda(user, Utc::now()).await?;
    Ok(Json(agenda))
}

// === Health ===

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
