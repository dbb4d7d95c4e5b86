use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::audit;
use crate::auth::Actor;
use crate::errors::AppError;
use crate::models::approval::{self, ApprovalListResponse, EditorDecisionRequest, WorkflowItemPatch};
use crate::models::collaborator;
use crate::workflow::normalize::normalize;
use crate::workflow::{can_approve, resolve_roles, ItemStatus, Priority};

/// GET /api/projects/{project_id}/approvals - Editor changes and workflow items, newest first.
pub async fn list(
    pool: web::Data<PgPool>,
    _actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    // 404 for unknown projects rather than an empty list.
    collaborator::load_role_inputs(&pool, project_id).await?;

    let items = approval::find_all_for_project(&pool, project_id).await?;
    Ok(HttpResponse::Ok().json(ApprovalListResponse { items }))
}

/// POST /api/projects/{project_id}/approvals - Owner decides a pending editor change.
pub async fn decide(
    pool: web::Data<PgPool>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Json<EditorDecisionRequest>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let request = body.into_inner();

    collaborator::require_owner(&pool, project_id, actor.id).await?;
    let receipt = approval::decide_pending_change(&pool, project_id, actor.id, &request).await?;

    audit::record(
        &pool,
        actor.id,
        &format!("approval.{}", request.decision.stored_status()),
        "pending_change",
        request.pending_change_id,
        json!({
            "project_id": project_id,
            "feedback_notes": request.feedback_notes,
        }),
    )
    .await;

    log::info!(
        "User {} decided change {} in project {project_id}: {}",
        actor.id,
        request.pending_change_id,
        request.decision.stored_status()
    );
    Ok(HttpResponse::Ok().json(receipt))
}

/// PATCH /api/projects/{project_id}/workflow-items/{item_id} - Status update by a permitted reviewer.
pub async fn update_item(
    pool: web::Data<PgPool>,
    actor: Actor,
    path: web::Path<(i64, i64)>,
    body: web::Json<WorkflowItemPatch>,
) -> Result<HttpResponse, AppError> {
    let (project_id, item_id) = path.into_inner();
    let patch = body.into_inner();

    if ItemStatus::parse(&patch.status).is_none() {
        return Err(AppError::BadRequest(format!("Unknown status '{}'", patch.status)));
    }
    if let Some(priority) = patch.priority.as_deref() {
        if Priority::parse(priority).is_none() {
            return Err(AppError::BadRequest(format!("Unknown priority '{priority}'")));
        }
    }

    let existing = approval::find_workflow_item(&pool, project_id, item_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let current = normalize(&existing);
    let inputs = collaborator::load_role_inputs(&pool, project_id).await?;
    let roles = resolve_roles(inputs.owner_id, actor.id, &inputs.records);
    if !can_approve(&current, &roles) {
        return Err(AppError::PermissionDenied(format!(
            "Your roles cannot decide on workflow item {item_id}"
        )));
    }
    if !current.status.is_pending() {
        return Err(AppError::Conflict(format!(
            "Workflow item {item_id} is {} and can no longer change",
            current.status.as_str()
        )));
    }

    let updated = approval::update_workflow_item_status(&pool, project_id, item_id, actor.id, &patch)
        .await?
        .ok_or(AppError::NotFound)?;

    audit::record(
        &pool,
        actor.id,
        &format!("workflow_item.{}", patch.status),
        "workflow_item",
        item_id,
        json!({
            "project_id": project_id,
            "previous_status": existing.status,
            "review_notes": patch.review_notes,
        }),
    )
    .await;

    Ok(HttpResponse::Ok().json(updated))
}
