use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::employer::{Employer, EmployerWithCompany};

#[derive(Debug, Clone)]
pub struct CreateEmployerParams {
    pub company_id: i64,
    pub full_name: String,
    pub email: String,
    pub hashed_password: String,
}

pub async fn create_employer<'e, E>(db: E, params: &CreateEmployerParams) -> Result<Employer>
where
    E: PgExecutor<'e>,
{
    let employer = sqlx::query_as::<_, Employer>(
        r#"
        INSERT INTO employers (company_id, full_name, email, hashed_password)
        VALUES ($1, $2, $3, $4)
        RETURNING id, company_id, full_name, email, hashed_password, is_email_verified, created_at
        "#,
    )
    .bind(params.company_id)
    .bind(&params.full_name)
    .bind(&params.email)
    .bind(&params.hashed_password)
    .fetch_one(db)
    .await?;
    Ok(employer)
}

pub async fn get_employer_by_email<'e, E>(db: E, email: &str) -> Result<Option<Employer>>
where
    E: PgExecutor<'e>,
{
    let employer = sqlx::query_as::<_, Employer>(
        r#"
        SELECT id, company_id, full_name, email, hashed_password, is_email_verified, created_at
        FROM employers
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(employer)
}

pub async fn get_employer_with_company_by_email<'e, E>(
    db: E,
    email: &str,
) -> Result<Option<EmployerWithCompany>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, EmployerWithCompany>(
        r#"
        SELECT
            e.id, e.company_id, e.full_name, e.email, e.hashed_password,
            e.is_email_verified, e.created_at,
            c.name AS company_name,
            c.industry AS company_industry,
            c.location AS company_location
        FROM employers e
        JOIN companies c ON c.id = e.company_id
        WHERE e.email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn get_employer_with_company_by_id<'e, E>(
    db: E,
    id: i64,
) -> Result<Option<EmployerWithCompany>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, EmployerWithCompany>(
        r#"
        SELECT
            e.id, e.company_id, e.full_name, e.email, e.hashed_password,
            e.is_email_verified, e.created_at,
            c.name AS company_name,
            c.industry AS company_industry,
            c.location AS company_location
        FROM employers e
        JOIN companies c ON c.id = e.company_id
        WHERE e.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn update_employer_full_name<'e, E>(db: E, id: i64, full_name: &str) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE employers SET full_name = $2 WHERE id = $1")
        .bind(id)
        .bind(full_name)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_employer_password<'e, E>(db: E, id: i64, hashed_password: &str) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE employers SET hashed_password = $2 WHERE id = $1")
        .bind(id)
        .bind(hashed_password)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn mark_employer_email_verified<'e, E>(db: E, email: &str) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("UPDATE employers SET is_email_verified = TRUE WHERE email = $1")
        .bind(email)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_employer<'e, E>(db: E, id: i64) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM employers WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
