use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::verify_email::VerifyEmail;

pub async fn create_verify_email<'e, E>(
    db: E,
    email: &str,
    secret_code: &str,
    expired_at: DateTime<Utc>,
) -> Result<VerifyEmail>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, VerifyEmail>(
        r#"
        INSERT INTO verify_emails (email, secret_code, expired_at)
        VALUES ($1, $2, $3)
        RETURNING id, email, secret_code, is_used, created_at, expired_at
        "#,
    )
    .bind(email)
    .bind(secret_code)
    .bind(expired_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Marks the row used if it is unused, unexpired and the code matches.
/// Returns `None` when any of those conditions fails.
pub async fn consume_verify_email<'e, E>(
    db: E,
    id: i64,
    secret_code: &str,
) -> Result<Option<VerifyEmail>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, VerifyEmail>(
        r#"
        UPDATE verify_emails
        SET is_used = TRUE
        WHERE id = $1
          AND secret_code = $2
          AND is_used = FALSE
          AND expired_at > NOW()
        RETURNING id, email, secret_code, is_used, created_at, expired_at
        "#,
    )
    .bind(id)
    .bind(secret_code)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete_expired_verify_emails<'e, E>(db: E, before: DateTime<Utc>) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM verify_emails WHERE expired_at < $1")
        .bind(before)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
