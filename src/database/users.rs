use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub full_name: String,
    pub email: String,
    pub hashed_password: String,
    pub location: String,
    pub desired_job_title: String,
    pub desired_industry: String,
    pub desired_salary_min: i32,
    pub desired_salary_max: i32,
    pub skills_description: String,
    pub experience: String,
}

/// `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserParams {
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub desired_job_title: Option<String>,
    pub desired_industry: Option<String>,
    pub desired_salary_min: Option<i32>,
    pub desired_salary_max: Option<i32>,
    pub skills_description: Option<String>,
    pub experience: Option<String>,
}

pub async fn create_user<'e, E>(db: E, params: &CreateUserParams) -> Result<User>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (
            full_name, email, hashed_password, location, desired_job_title,
            desired_industry, desired_salary_min, desired_salary_max,
            skills_description, experience
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING
            id, full_name, email, hashed_password, location, desired_job_title,
            desired_industry, desired_salary_min, desired_salary_max,
            skills_description, experience, is_email_verified, created_at
        "#,
    )
    .bind(&params.full_name)
    .bind(&params.email)
    .bind(&params.hashed_password)
    .bind(&params.location)
    .bind(&params.desired_job_title)
    .bind(&params.desired_industry)
    .bind(params.desired_salary_min)
    .bind(params.desired_salary_max)
    .bind(&params.skills_description)
    .bind(&params.experience)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn get_user_by_email<'e, E>(db: E, email: &str) -> Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, hashed_password, location, desired_job_title,
               desired_industry, desired_salary_min, desired_salary_max,
               skills_description, experience, is_email_verified, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn update_user<'e, E>(db: E, id: i64, params: &UpdateUserParams) -> Result<User>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET
            full_name = COALESCE($2, full_name),
            location = COALESCE($3, location),
            desired_job_title = COALESCE($4, desired_job_title),
            desired_industry = COALESCE($5, desired_industry),
            desired_salary_min = COALESCE($6, desired_salary_min),
            desired_salary_max = COALESCE($7, desired_salary_max),
            skills_description = COALESCE($8, skills_description),
            experience = COALESCE($9, experience)
        WHERE id = $1
        RETURNING
            id, full_name, email, hashed_password, location, desired_job_title,
            desired_industry, desired_salary_min, desired_salary_max,
            skills_description, experience, is_email_verified, created_at
        "#,
    )
    .bind(id)
    .bind(&params.full_name)
    .bind(&params.location)
    .bind(&params.desired_job_title)
    .bind(&params.desired_industry)
    .bind(params.desired_salary_min)
    .bind(params.desired_salary_max)
    .bind(&params.skills_description)
    .bind(&params.experience)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn update_user_password<'e, E>(db: E, id: i64, hashed_password: &str) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
        .bind(id)
        .bind(hashed_password)
        .execute(db)
        .await?;
    Ok(())
}

/// Returns how many rows were flipped; zero means no user owns the address.
pub async fn mark_user_email_verified<'e, E>(db: E, email: &str) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("UPDATE users SET is_email_verified = TRUE WHERE email = $1")
        .bind(email)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_user<'e, E>(db: E, id: i64) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
