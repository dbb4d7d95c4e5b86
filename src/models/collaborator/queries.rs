use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;

/// Owner of a project, or `None` if the project does not exist.
pub async fn find_project_owner(pool: &PgPool, project_id: i64) -> Result<Option<i64>, AppError> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT owner_id FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

/// All collaborator role rows for a project, active or not.
/// Ordered so that structurally equal inputs compare equal between loads.
pub async fn find_role_records(pool: &PgPool, project_id: i64) -> Result<Vec<RoleRecord>, AppError> {
    let rows = sqlx::query_as::<_, RoleRecord>(
        "SELECT user_id, role, status \
         FROM project_collaborators \
         WHERE project_id = $1 \
         ORDER BY user_id, role",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Owner id plus role records, or `NotFound` for an unknown project.
pub async fn load_role_inputs(pool: &PgPool, project_id: i64) -> Result<RoleInputs, AppError> {
    let owner_id = find_project_owner(pool, project_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let records = find_role_records(pool, project_id).await?;
    Ok(RoleInputs { owner_id, records })
}

/// Editor changes may only be decided by the project owner.
pub async fn require_owner(pool: &PgPool, project_id: i64, user_id: i64) -> Result<(), AppError> {
    let owner_id = find_project_owner(pool, project_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if owner_id == user_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(
            "Only the project owner can decide editor changes".to_string(),
        ))
    }
}

/// Add or re-activate a collaborator role.
pub async fn upsert_role(
    pool: &PgPool,
    project_id: i64,
    user_id: i64,
    role: &str,
    status: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO project_collaborators (project_id, user_id, role, status) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (project_id, user_id, role) DO UPDATE SET status = EXCLUDED.status",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(role)
    .bind(status)
    .execute(pool)
    .await?;
    Ok(())
}
