use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::job_application::{
    ApplicationStatus, EmployerApplicationRow, JobApplication, UserApplicationRow,
};

pub async fn create_job_application<'e, E>(
    db: E,
    user_id: i64,
    job_id: i64,
    message: Option<&str>,
    cv: &[u8],
) -> Result<JobApplication>
where
    E: PgExecutor<'e>,
{
    let application = sqlx::query_as::<_, JobApplication>(
        r#"
        INSERT INTO job_applications (user_id, job_id, message, cv, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, job_id, message, cv, status, applied_at
        "#,
    )
    .bind(user_id)
    .bind(job_id)
    .bind(message)
    .bind(cv)
    .bind(ApplicationStatus::Applied)
    .fetch_one(db)
    .await?;
    Ok(application)
}

pub async fn get_job_application<'e, E>(db: E, id: i64) -> Result<Option<JobApplication>>
where
    E: PgExecutor<'e>,
{
    let application = sqlx::query_as::<_, JobApplication>(
        r#"
        SELECT id, user_id, job_id, message, cv, status, applied_at
        FROM job_applications
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(application)
}

pub async fn update_job_application_status<'e, E>(
    db: E,
    id: i64,
    status: ApplicationStatus,
) -> Result<JobApplication>
where
    E: PgExecutor<'e>,
{
    let application = sqlx::query_as::<_, JobApplication>(
        r#"
        UPDATE job_applications
        SET status = $2
        WHERE id = $1
        RETURNING id, user_id, job_id, message, cv, status, applied_at
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_one(db)
    .await?;
    Ok(application)
}

/// Moves `Applied` to `Seen`; leaves any other status untouched.
pub async fn mark_job_application_seen<'e, E>(db: E, id: i64) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query(
        "UPDATE job_applications SET status = $2 WHERE id = $1 AND status = $3",
    )
    .bind(id)
    .bind(ApplicationStatus::Seen)
    .bind(ApplicationStatus::Applied)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

/// Applies the patch only while the application is still `Applied`;
/// `None` is returned when the guard does not match.
pub async fn update_job_application_if_applied<'e, E>(
    db: E,
    id: i64,
    message: Option<&str>,
    cv: Option<&[u8]>,
) -> Result<Option<JobApplication>>
where
    E: PgExecutor<'e>,
{
    let application = sqlx::query_as::<_, JobApplication>(
        r#"
        UPDATE job_applications
        SET
            message = COALESCE($2, message),
            cv = COALESCE($3, cv)
        WHERE id = $1 AND status = $4
        RETURNING id, user_id, job_id, message, cv, status, applied_at
        "#,
    )
    .bind(id)
    .bind(message)
    .bind(cv)
    .bind(ApplicationStatus::Applied)
    .fetch_optional(db)
    .await?;
    Ok(application)
}

pub async fn delete_job_application<'e, E>(db: E, id: i64) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM job_applications WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_job_applications_for_user<'e, E>(
    db: E,
    user_id: i64,
    status: Option<ApplicationStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<UserApplicationRow>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, UserApplicationRow>(
        r#"
        SELECT ja.id, ja.job_id, j.title AS job_title, c.id AS company_id,
               c.name AS company_name, ja.message, ja.status, ja.applied_at
        FROM job_applications ja
        JOIN jobs j ON j.id = ja.job_id
        JOIN companies c ON c.id = j.company_id
        WHERE ja.user_id = $1
          AND ($2::application_status IS NULL OR ja.status = $2)
        ORDER BY ja.id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_job_applications_for_employer<'e, E>(
    db: E,
    company_id: i64,
    status: Option<ApplicationStatus>,
    job_id: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<EmployerApplicationRow>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, EmployerApplicationRow>(
        r#"
        SELECT ja.id, ja.job_id, j.title AS job_title, u.id AS user_id,
               u.full_name AS user_full_name, u.email AS user_email,
               ja.message, ja.status, ja.applied_at
        FROM job_applications ja
        JOIN jobs j ON j.id = ja.job_id
        JOIN users u ON u.id = ja.user_id
        WHERE j.company_id = $1
          AND ($2::application_status IS NULL OR ja.status = $2)
          AND ($3::bigint IS NULL OR ja.job_id = $3)
        ORDER BY ja.id
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(company_id)
    .bind(status)
    .bind(job_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
