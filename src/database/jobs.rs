use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::job::{Job, JobDetail, JobWithCompany};

#[derive(Debug, Clone)]
pub struct CreateJobParams {
    pub company_id: i64,
    pub title: String,
    pub industry: String,
    pub description: String,
    pub location: String,
    pub salary_min: i32,
    pub salary_max: i32,
    pub requirements: String,
}

/// `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateJobParams {
    pub title: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub requirements: Option<String>,
}

/// Filters for the public job listing; absent fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub title: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

#[derive(Debug, Clone)]
pub enum CompanySelector {
    Id(i64),
    Name(String),
    NameContains(String),
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub async fn create_job<'e, E>(db: E, params: &CreateJobParams) -> Result<Job>
where
    E: PgExecutor<'e>,
{
    let job = sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs (
            company_id, title, industry, description, location,
            salary_min, salary_max, requirements
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, company_id, title, industry, description, location,
                  salary_min, salary_max, requirements, created_at
        "#,
    )
    .bind(params.company_id)
    .bind(&params.title)
    .bind(&params.industry)
    .bind(&params.description)
    .bind(&params.location)
    .bind(params.salary_min)
    .bind(params.salary_max)
    .bind(&params.requirements)
    .fetch_one(db)
    .await?;
    Ok(job)
}

/// Loads a job and holds a row lock on it until the transaction ends.
pub async fn get_job_for_update<'e, E>(db: E, id: i64) -> Result<Option<Job>>
where
    E: PgExecutor<'e>,
{
    let job = sqlx::query_as::<_, Job>(
        r#"
        SELECT id, company_id, title, industry, description, location,
               salary_min, salary_max, requirements, created_at
        FROM jobs
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(job)
}

pub async fn get_job_with_company<'e, E>(db: E, id: i64) -> Result<Option<JobWithCompany>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, JobWithCompany>(
        r#"
        SELECT j.id, j.company_id, j.title, j.industry, j.description, j.location,
               j.salary_min, j.salary_max, j.requirements, j.created_at,
               c.name AS company_name
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        WHERE j.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Like [`get_job_with_company`] but share-locks the job row until the
/// transaction ends. Updates and deletes of the job wait for it.
pub async fn get_job_with_company_for_share<'e, E>(
    db: E,
    id: i64,
) -> Result<Option<JobWithCompany>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, JobWithCompany>(
        r#"
        SELECT j.id, j.company_id, j.title, j.industry, j.description, j.location,
               j.salary_min, j.salary_max, j.requirements, j.created_at,
               c.name AS company_name
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        WHERE j.id = $1
        FOR SHARE OF j
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn get_job_detail<'e, E>(db: E, id: i64) -> Result<Option<JobDetail>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, JobDetail>(
        r#"
        SELECT j.id, j.company_id, j.title, j.industry, j.description, j.location,
               j.salary_min, j.salary_max, j.requirements, j.created_at,
               c.name AS company_name,
               c.industry AS company_industry,
               c.location AS company_location,
               e.id AS employer_id,
               e.full_name AS employer_full_name,
               e.email AS employer_email
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        JOIN LATERAL (
            SELECT id, full_name, email
            FROM employers
            WHERE company_id = c.id
            ORDER BY id
            LIMIT 1
        ) e ON TRUE
        WHERE j.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn get_company_id_of_job<'e, E>(db: E, job_id: i64) -> Result<Option<i64>>
where
    E: PgExecutor<'e>,
{
    let company_id: Option<i64> = sqlx::query_scalar("SELECT company_id FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(db)
        .await?;
    Ok(company_id)
}

pub async fn update_job<'e, E>(db: E, id: i64, params: &UpdateJobParams) -> Result<Job>
where
    E: PgExecutor<'e>,
{
    let job = sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs
        SET
            title = COALESCE($2, title),
            industry = COALESCE($3, industry),
            description = COALESCE($4, description),
            location = COALESCE($5, location),
            salary_min = COALESCE($6, salary_min),
            salary_max = COALESCE($7, salary_max),
            requirements = COALESCE($8, requirements)
        WHERE id = $1
        RETURNING id, company_id, title, industry, description, location,
                  salary_min, salary_max, requirements, created_at
        "#,
    )
    .bind(id)
    .bind(&params.title)
    .bind(&params.industry)
    .bind(&params.description)
    .bind(&params.location)
    .bind(params.salary_min)
    .bind(params.salary_max)
    .bind(&params.requirements)
    .fetch_one(db)
    .await?;
    Ok(job)
}

pub async fn delete_job<'e, E>(db: E, id: i64) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_jobs_by_filters<'e, E>(
    db: E,
    filter: &JobFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<JobWithCompany>>
where
    E: PgExecutor<'e>,
{
    let title_pattern = filter
        .title
        .as_deref()
        .map(|t| format!("%{}%", escape_like(t)));

    let rows = sqlx::query_as::<_, JobWithCompany>(
        r#"
        SELECT j.id, j.company_id, j.title, j.industry, j.description, j.location,
               j.salary_min, j.salary_max, j.requirements, j.created_at,
               c.name AS company_name
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        WHERE ($1::text IS NULL OR j.title ILIKE $1)
          AND ($2::text IS NULL OR j.location = $2)
          AND ($3::text IS NULL OR j.industry = $3)
          AND ($4::int IS NULL OR j.salary_min >= $4)
          AND ($5::int IS NULL OR j.salary_max <= $5)
        ORDER BY j.id
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(title_pattern)
    .bind(&filter.location)
    .bind(&filter.industry)
    .bind(filter.salary_min)
    .bind(filter.salary_max)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_jobs_by_filters<'e, E>(db: E, filter: &JobFilter) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    let title_pattern = filter
        .title
        .as_deref()
        .map(|t| format!("%{}%", escape_like(t)));

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM jobs j
        WHERE ($1::text IS NULL OR j.title ILIKE $1)
          AND ($2::text IS NULL OR j.location = $2)
          AND ($3::text IS NULL OR j.industry = $3)
          AND ($4::int IS NULL OR j.salary_min >= $4)
          AND ($5::int IS NULL OR j.salary_max <= $5)
        "#,
    )
    .bind(title_pattern)
    .bind(&filter.location)
    .bind(&filter.industry)
    .bind(filter.salary_min)
    .bind(filter.salary_max)
    .fetch_one(db)
    .await?;
    Ok(total)
}

pub async fn list_jobs_by_company<'e, E>(
    db: E,
    selector: &CompanySelector,
    limit: i64,
    offset: i64,
) -> Result<Vec<JobWithCompany>>
where
    E: PgExecutor<'e>,
{
    let (company_id, name, name_pattern) = match selector {
        CompanySelector::Id(id) => (Some(*id), None, None),
        CompanySelector::Name(name) => (None, Some(name.clone()), None),
        CompanySelector::NameContains(part) => {
            (None, None, Some(format!("%{}%", escape_like(part))))
        }
    };

    let rows = sqlx::query_as::<_, JobWithCompany>(
        r#"
        SELECT j.id, j.company_id, j.title, j.industry, j.description, j.location,
               j.salary_min, j.salary_max, j.requirements, j.created_at,
               c.name AS company_name
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        WHERE ($1::bigint IS NULL OR c.id = $1)
          AND ($2::text IS NULL OR c.name = $2)
          AND ($3::text IS NULL OR c.name ILIKE $3)
        ORDER BY j.id
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(company_id)
    .bind(name)
    .bind(name_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Jobs that require at least one skill the user declared, compared case-insensitively.
pub async fn list_jobs_matching_user_skills<'e, E>(
    db: E,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<JobWithCompany>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, JobWithCompany>(
        r#"
        SELECT j.id, j.company_id, j.title, j.industry, j.description, j.location,
               j.salary_min, j.salary_max, j.requirements, j.created_at,
               c.name AS company_name
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        WHERE EXISTS (
            SELECT 1
            FROM job_skills js
            JOIN user_skills us ON LOWER(us.skill) = LOWER(js.skill)
            WHERE js.job_id = j.id AND us.user_id = $1
        )
        ORDER BY j.id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_all_jobs_with_company<'e, E>(db: E) -> Result<Vec<JobWithCompany>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, JobWithCompany>(
        r#"
        SELECT j.id, j.company_id, j.title, j.industry, j.description, j.location,
               j.salary_min, j.salary_max, j.requirements, j.created_at,
               c.name AS company_name
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        ORDER BY j.id
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_job_ids_by_company<'e, E>(db: E, company_id: i64) -> Result<Vec<i64>>
where
    E: PgExecutor<'e>,
{
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE company_id = $1 ORDER BY id")
        .bind(company_id)
        .fetch_all(db)
        .await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("Go"), "Go");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("c_sharp"), "c\\_sharp");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
