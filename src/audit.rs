use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;

/// Write an audit trail entry. Best effort: a failed insert is logged and
/// swallowed so it never fails the request that triggered it.
pub async fn record(
    pool: &DbPool,
    actor: Option<Uuid>,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(action)
    .bind(resource)
    .bind(&metadata)
    .execute(pool)
    .await;

    if let Err(err) = result {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
