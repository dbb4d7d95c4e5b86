use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::collaborator;
use super::types::*;

#[derive(sqlx::FromRow)]
struct PendingChangeRow {
    id: i64,
    content_type: String,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    original_content: Option<String>,
    status: String,
    editor_notes: Option<String>,
    feedback_notes: Option<String>,
    chapter_reference: Option<String>,
    word_count: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: i64,
    author_name: Option<String>,
    author_avatar: Option<String>,
    reviewer_id: Option<i64>,
    reviewer_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct WorkflowItemRow {
    id: i64,
    item_type: String,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    original_content: Option<String>,
    status: String,
    priority: String,
    category: String,
    review_notes: Option<String>,
    tags: Vec<String>,
    word_count: Option<i64>,
    chapter_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: i64,
    author_name: Option<String>,
    author_avatar: Option<String>,
    reviewer_id: Option<i64>,
    reviewer_name: Option<String>,
}

const PENDING_CHANGE_SELECT: &str = "SELECT pc.id, pc.content_type, pc.title, pc.description, pc.content, \
            pc.original_content, pc.status, pc.editor_notes, pc.feedback_notes, \
            pc.chapter_reference, pc.word_count, pc.created_at, pc.updated_at, \
            pc.editor_id AS author_id, a.full_name AS author_name, a.avatar_url AS author_avatar, \
            pc.reviewed_by AS reviewer_id, r.full_name AS reviewer_name \
     FROM pending_changes pc \
     LEFT JOIN profiles a ON a.id = pc.editor_id \
     LEFT JOIN profiles r ON r.id = pc.reviewed_by";

const WORKFLOW_ITEM_SELECT: &str = "SELECT wi.id, wi.item_type, wi.title, wi.description, wi.content, \
            wi.original_content, wi.status, wi.priority, wi.category, wi.review_notes, \
            wi.tags, wi.word_count, wi.chapter_reference, wi.created_at, wi.updated_at, \
            wi.author_id, a.full_name AS author_name, a.avatar_url AS author_avatar, \
            wi.reviewer_id, r.full_name AS reviewer_name \
     FROM workflow_items wi \
     LEFT JOIN profiles a ON a.id = wi.author_id \
     LEFT JOIN profiles r ON r.id = wi.reviewer_id";

/// Active collaboration roles per user, with the owner marked as `owner`.
async fn project_role_map(pool: &PgPool, project_id: i64) -> Result<HashMap<i64, Vec<String>>, AppError> {
    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    if let Some(owner_id) = collaborator::find_project_owner(pool, project_id).await? {
        map.entry(owner_id).or_default().push("owner".to_string());
    }
    for record in collaborator::find_role_records(pool, project_id).await? {
        if record.is_active() {
            map.entry(record.user_id).or_default().push(record.role);
        }
    }
    Ok(map)
}

fn profile(id: i64, name: Option<String>, avatar: Option<String>, role: Option<String>, roles: Vec<String>) -> ExternalProfile {
    ExternalProfile {
        id: Some(id),
        full_name: name,
        avatar_url: avatar,
        role,
        roles,
    }
}

fn reviewer_profile(id: Option<i64>, name: Option<String>) -> Option<ExternalProfile> {
    id.map(|id| profile(id, name, None, None, Vec::new()))
}

fn pending_change_to_external(row: PendingChangeRow, roles: &HashMap<i64, Vec<String>>) -> ExternalWorkflowItem {
    // The submitting role of an editor change is always "editor".
    let author_roles = roles.get(&row.author_id).cloned().unwrap_or_default();
    ExternalWorkflowItem {
        id: row.id,
        source: ExternalSource::PendingChange,
        item_type: Some("edit".to_string()),
        title: row.title,
        description: row.description,
        content: row.content,
        original_content: row.original_content,
        status: row.status,
        priority: None,
        category: None,
        author: Some(profile(
            row.author_id,
            row.author_name,
            row.author_avatar,
            Some("editor".to_string()),
            author_roles,
        )),
        reviewer: reviewer_profile(row.reviewer_id, row.reviewer_name),
        review_notes: row.feedback_notes,
        tags: None,
        word_count: row.word_count,
        chapter_reference: row.chapter_reference,
        content_type: Some(row.content_type),
        editor_notes: row.editor_notes,
        created_at: Some(row.created_at),
        updated_at: Some(row.updated_at),
    }
}

fn workflow_item_to_external(row: WorkflowItemRow, roles: &HashMap<i64, Vec<String>>) -> ExternalWorkflowItem {
    let author_roles = roles.get(&row.author_id).cloned().unwrap_or_default();
    let primary = author_roles.first().cloned();
    ExternalWorkflowItem {
        id: row.id,
        source: ExternalSource::WorkflowItem,
        item_type: Some(row.item_type),
        title: row.title,
        description: row.description,
        content: row.content,
        original_content: row.original_content,
        status: row.status,
        priority: Some(row.priority),
        category: Some(row.category),
        author: Some(profile(row.author_id, row.author_name, row.author_avatar, primary, author_roles)),
        reviewer: reviewer_profile(row.reviewer_id, row.reviewer_name),
        review_notes: row.review_notes,
        tags: Some(row.tags),
        word_count: row.word_count,
        chapter_reference: row.chapter_reference,
        content_type: None,
        editor_notes: None,
        created_at: Some(row.created_at),
        updated_at: Some(row.updated_at),
    }
}

/// All approval rows of a project (editor changes and workflow items), newest first.
pub async fn find_all_for_project(pool: &PgPool, project_id: i64) -> Result<Vec<ExternalWorkflowItem>, AppError> {
    let roles = project_role_map(pool, project_id).await?;

    let changes = sqlx::query_as::<_, PendingChangeRow>(&format!(
        "{PENDING_CHANGE_SELECT} WHERE pc.project_id = $1 ORDER BY pc.created_at DESC, pc.id DESC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let items = sqlx::query_as::<_, WorkflowItemRow>(&format!(
        "{WORKFLOW_ITEM_SELECT} WHERE wi.project_id = $1 ORDER BY wi.created_at DESC, wi.id DESC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let mut all: Vec<ExternalWorkflowItem> = changes
        .into_iter()
        .map(|row| pending_change_to_external(row, &roles))
        .chain(items.into_iter().map(|row| workflow_item_to_external(row, &roles)))
        .collect();
    // Stable sort keeps each table's id tiebreak for equal timestamps.
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(all)
}

/// A single generic workflow item, scoped to its project.
pub async fn find_workflow_item(
    pool: &PgPool,
    project_id: i64,
    item_id: i64,
) -> Result<Option<ExternalWorkflowItem>, AppError> {
    let row = sqlx::query_as::<_, WorkflowItemRow>(&format!(
        "{WORKFLOW_ITEM_SELECT} WHERE wi.project_id = $1 AND wi.id = $2"
    ))
    .bind(project_id)
    .bind(item_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let roles = project_role_map(pool, project_id).await?;
            Ok(Some(workflow_item_to_external(row, &roles)))
        }
        None => Ok(None),
    }
}

/// Record the owner's decision on a pending editor change.
///
/// Only `pending` changes can be decided; a second decision is a conflict.
pub async fn decide_pending_change(
    pool: &PgPool,
    project_id: i64,
    reviewer_id: i64,
    request: &EditorDecisionRequest,
) -> Result<DecisionReceipt, AppError> {
    let current: Option<String> = sqlx::query_scalar(
        "SELECT status FROM pending_changes WHERE id = $1 AND project_id = $2",
    )
    .bind(request.pending_change_id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    match current.as_deref() {
        None => return Err(AppError::NotFound),
        Some("pending") => {}
        Some(other) => {
            return Err(AppError::Conflict(format!(
                "Change {} was already decided ({other})",
                request.pending_change_id
            )))
        }
    }

    let result = sqlx::query(
        "UPDATE pending_changes \
         SET status = $3, feedback_notes = $4, suggested_changes = $5, \
             reviewed_by = $6, reviewed_at = now(), updated_at = now() \
         WHERE id = $1 AND project_id = $2 AND status = 'pending'",
    )
    .bind(request.pending_change_id)
    .bind(project_id)
    .bind(request.decision.stored_status())
    .bind(&request.feedback_notes)
    .bind(&request.suggested_changes)
    .bind(reviewer_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(format!(
            "Change {} was decided concurrently",
            request.pending_change_id
        )));
    }

    Ok(DecisionReceipt {
        message: request.decision.message().to_string(),
    })
}

/// Set status, review notes and (optionally) priority of a generic item,
/// stamping the reviewer. Returns the updated row, or `None` if it does not exist.
///
/// Only pending items can be decided; anything else is a conflict.
pub async fn update_workflow_item_status(
    pool: &PgPool,
    project_id: i64,
    item_id: i64,
    reviewer_id: i64,
    patch: &WorkflowItemPatch,
) -> Result<Option<ExternalWorkflowItem>, AppError> {
    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE workflow_items \
         SET status = $3, review_notes = $4, priority = COALESCE($5, priority), \
             reviewer_id = $6, updated_at = now() \
         WHERE id = $2 AND project_id = $1 \
           AND status IN ('pending_approval', 'pending_request') \
         RETURNING id",
    )
    .bind(project_id)
    .bind(item_id)
    .bind(&patch.status)
    .bind(&patch.review_notes)
    .bind(&patch.priority)
    .bind(reviewer_id)
    .fetch_optional(pool)
    .await?;

    if let Some(id) = updated {
        return find_workflow_item(pool, project_id, id).await;
    }

    let current: Option<String> = sqlx::query_scalar(
        "SELECT status FROM workflow_items WHERE id = $1 AND project_id = $2",
    )
    .bind(item_id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    match current {
        None => Ok(None),
        Some(status) => Err(AppError::Conflict(format!(
            "Workflow item {item_id} was already decided ({status})"
        ))),
    }
}

/// Insert a pending editor change, returning its id.
pub async fn create_pending_change(pool: &PgPool, change: &NewPendingChange) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO pending_changes \
             (project_id, editor_id, content_type, title, description, content, \
              original_content, editor_notes, chapter_reference, word_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id",
    )
    .bind(change.project_id)
    .bind(change.editor_id)
    .bind(&change.content_type)
    .bind(&change.title)
    .bind(&change.description)
    .bind(&change.content)
    .bind(&change.original_content)
    .bind(&change.editor_notes)
    .bind(&change.chapter_reference)
    .bind(change.word_count)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Insert a generic workflow item in `pending_approval`, returning its id.
pub async fn create_workflow_item(pool: &PgPool, item: &NewWorkflowItem) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO workflow_items \
             (project_id, author_id, item_type, title, description, content, priority, category, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(item.project_id)
    .bind(item.author_id)
    .bind(&item.item_type)
    .bind(&item.title)
    .bind(&item.description)
    .bind(&item.content)
    .bind(&item.priority)
    .bind(&item.category)
    .bind(&item.tags)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
