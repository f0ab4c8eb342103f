use sqlx::PgExecutor;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    User,
    Employer,
}

/// Serialises signups that target the same address until the surrounding
/// transaction ends. Must run inside a transaction.
pub async fn lock_email<'e, E>(db: E, email: &str) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(email)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn find_account_kind<'e, E>(db: E, email: &str) -> Result<Option<AccountKind>>
where
    E: PgExecutor<'e>,
{
    let kind: Option<String> = sqlx::query_scalar(
        r#"
        SELECT 'user'::text FROM users WHERE email = $1
        UNION ALL
        SELECT 'employer'::text FROM employers WHERE email = $1
        LIMIT 1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;

    Ok(kind.map(|k| {
        if k == "user" {
            AccountKind::User
        } else {
            AccountKind::Employer
        }
    }))
}
