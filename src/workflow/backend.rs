//! The external approval store, seen from the workflow.

use std::fmt;
use std::future::Future;

use actix_web::ResponseError;
use serde_json::json;
use sqlx::PgPool;

use crate::audit;
use crate::errors::AppError;
use crate::models::approval::{
    self, DecisionReceipt, EditorDecisionRequest, ExternalWorkflowItem, WorkflowItemPatch,
};
use crate::models::collaborator::{self, RoleInputs};

/// A failed call to the store: HTTP-style status plus whatever body came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: u16,
    pub body: String,
}

impl RemoteError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}: {}", self.status, self.body)
    }
}

impl From<AppError> for RemoteError {
    fn from(e: AppError) -> Self {
        let status = e.status_code().as_u16();
        if status >= 500 {
            log::error!("Approval store error: {e}");
        }
        RemoteError::new(status, e.to_string())
    }
}

/// Query and mutation surface of the approval store.
pub trait ApprovalBackend: Send + Sync {
    /// Every approval row of the project, in store order.
    fn fetch_project_items(
        &self,
        project_id: i64,
    ) -> impl Future<Output = Result<Vec<ExternalWorkflowItem>, RemoteError>> + Send;

    /// Owner id and collaborator role rows for the role resolver.
    fn load_role_inputs(
        &self,
        project_id: i64,
    ) -> impl Future<Output = Result<RoleInputs, RemoteError>> + Send;

    /// Decide a pending editor change.
    fn decide_editor_change(
        &self,
        project_id: i64,
        actor_id: i64,
        request: EditorDecisionRequest,
    ) -> impl Future<Output = Result<DecisionReceipt, RemoteError>> + Send;

    /// Status-update a generic workflow item; returns the updated row with its reviewer.
    fn update_workflow_item(
        &self,
        project_id: i64,
        actor_id: i64,
        item_id: i64,
        patch: WorkflowItemPatch,
    ) -> impl Future<Output = Result<ExternalWorkflowItem, RemoteError>> + Send;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ApprovalBackend for PgBackend {
    async fn fetch_project_items(&self, project_id: i64) -> Result<Vec<ExternalWorkflowItem>, RemoteError> {
        Ok(approval::find_all_for_project(&self.pool, project_id).await?)
    }

    async fn load_role_inputs(&self, project_id: i64) -> Result<RoleInputs, RemoteError> {
        Ok(collaborator::load_role_inputs(&self.pool, project_id).await?)
    }

    async fn decide_editor_change(
        &self,
        project_id: i64,
        actor_id: i64,
        request: EditorDecisionRequest,
    ) -> Result<DecisionReceipt, RemoteError> {
        collaborator::require_owner(&self.pool, project_id, actor_id).await?;
        let receipt = approval::decide_pending_change(&self.pool, project_id, actor_id, &request).await?;
        audit::record(
            &self.pool,
            actor_id,
            &format!("approval.{}", request.decision.stored_status()),
            "pending_change",
            request.pending_change_id,
            json!({ "project_id": project_id, "feedback_notes": request.feedback_notes }),
        )
        .await;
        Ok(receipt)
    }

    async fn update_workflow_item(
        &self,
        project_id: i64,
        actor_id: i64,
        item_id: i64,
        patch: WorkflowItemPatch,
    ) -> Result<ExternalWorkflowItem, RemoteError> {
        let updated = approval::update_workflow_item_status(&self.pool, project_id, item_id, actor_id, &patch)
            .await?
            .ok_or_else(|| RemoteError::new(404, format!("Workflow item {item_id} not found")))?;
        audit::record(
            &self.pool,
            actor_id,
            &format!("workflow_item.{}", patch.status),
            "workflow_item",
            item_id,
            json!({ "project_id": project_id, "review_notes": patch.review_notes }),
        )
        .await;
        Ok(updated)
    }
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        match e.status {
            400 => AppError::BadRequest(e.body),
            401 => AppError::Unauthenticated(e.body),
            403 => AppError::PermissionDenied(e.body),
            404 => AppError::NotFound,
            409 => AppError::Conflict(e.body),
            _ => AppError::Upstream(e.to_string()),
        }
    }
}
