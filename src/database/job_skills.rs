use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::job_skill::JobSkill;

pub async fn create_job_skills<'e, E>(db: E, job_id: i64, skills: &[String]) -> Result<Vec<JobSkill>>
where
    E: PgExecutor<'e>,
{
    if skills.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, JobSkill>(
        r#"
        INSERT INTO job_skills (job_id, skill)
        SELECT $1, skill FROM UNNEST($2::text[]) AS t (skill)
        RETURNING id, job_id, skill
        "#,
    )
    .bind(job_id)
    .bind(skills)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_job_skills<'e, E>(
    db: E,
    job_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<JobSkill>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, JobSkill>(
        r#"
        SELECT id, job_id, skill
        FROM job_skills
        WHERE job_id = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(job_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Skills of many jobs at once, ordered by skill id.
pub async fn list_job_skills_for_jobs<'e, E>(db: E, job_ids: &[i64]) -> Result<Vec<JobSkill>>
where
    E: PgExecutor<'e>,
{
    if job_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, JobSkill>(
        "SELECT id, job_id, skill FROM job_skills WHERE job_id = ANY($1) ORDER BY id",
    )
    .bind(job_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Only removes skills that belong to `job_id`.
pub async fn delete_job_skills_by_ids<'e, E>(db: E, job_id: i64, ids: &[i64]) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(0);
    }
    let res = sqlx::query("DELETE FROM job_skills WHERE job_id = $1 AND id = ANY($2)")
        .bind(job_id)
        .bind(ids)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_job_skills_by_job<'e, E>(db: E, job_id: i64) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM job_skills WHERE job_id = $1")
        .bind(job_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
