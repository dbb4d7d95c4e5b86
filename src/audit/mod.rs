use serde_json::Value;
use sqlx::PgPool;

use crate::errors::AppError;

/// Append an audit entry for a decision or other state change.
pub async fn log(
    pool: &PgPool,
    user_id: i64,
    action: &str,
    target_type: &str,
    target_id: i64,
    details: Value,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO audit_entries (user_id, action, target_type, target_id, details) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(details)
    .execute(pool)
    .await?;
    Ok(())
}

/// Like [`log`], but failures are only logged; auditing never fails a request.
pub async fn record(pool: &PgPool, user_id: i64, action: &str, target_type: &str, target_id: i64, details: Value) {
    if let Err(e) = log(pool, user_id, action, target_type, target_id, details).await {
        ::log::warn!("Audit write failed for {action} on {target_type} {target_id}: {e}");
    }
}

/// Number of audit entries for a target.
pub async fn count_for_target(pool: &PgPool, target_type: &str, target_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_entries WHERE target_type = $1 AND target_id = $2",
    )
    .bind(target_type)
    .bind(target_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
