use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::company::Company;

pub async fn create_company<'e, E>(
    db: E,
    name: &str,
    industry: &str,
    location: &str,
) -> Result<Company>
where
    E: PgExecutor<'e>,
{
    let company = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (name, industry, location)
        VALUES ($1, $2, $3)
        RETURNING id, name, industry, location
        "#,
    )
    .bind(name)
    .bind(industry)
    .bind(location)
    .fetch_one(db)
    .await?;
    Ok(company)
}

pub async fn update_company<'e, E>(
    db: E,
    id: i64,
    name: Option<&str>,
    industry: Option<&str>,
    location: Option<&str>,
) -> Result<Company>
where
    E: PgExecutor<'e>,
{
    let company = sqlx::query_as::<_, Company>(
        r#"
        UPDATE companies
        SET
            name = COALESCE($2, name),
            industry = COALESCE($3, industry),
            location = COALESCE($4, location)
        WHERE id = $1
        RETURNING id, name, industry, location
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(industry)
    .bind(location)
    .fetch_one(db)
    .await?;
    Ok(company)
}

pub async fn count_company_employers<'e, E>(db: E, company_id: i64) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employers WHERE company_id = $1")
        .bind(company_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Cascades to the company's jobs, their skills and applications.
pub async fn delete_company<'e, E>(db: E, id: i64) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
