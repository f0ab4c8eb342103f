use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::user_skill::UserSkill;

#[derive(Debug, Clone)]
pub struct NewUserSkill {
    pub skill: String,
    pub experience_years: i32,
}

pub async fn create_user_skills<'e, E>(
    db: E,
    user_id: i64,
    skills: &[NewUserSkill],
) -> Result<Vec<UserSkill>>
where
    E: PgExecutor<'e>,
{
    if skills.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = skills.iter().map(|s| s.skill.clone()).collect();
    let years: Vec<i32> = skills.iter().map(|s| s.experience_years).collect();

    let rows = sqlx::query_as::<_, UserSkill>(
        r#"
        INSERT INTO user_skills (user_id, skill, experience_years)
        SELECT $1, skill, experience_years
        FROM UNNEST($2::text[], $3::int[]) AS t (skill, experience_years)
        RETURNING id, user_id, skill, experience_years
        "#,
    )
    .bind(user_id)
    .bind(&names)
    .bind(&years)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_user_skills<'e, E>(db: E, user_id: i64) -> Result<Vec<UserSkill>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, UserSkill>(
        r#"
        SELECT id, user_id, skill, experience_years
        FROM user_skills
        WHERE user_id = $1
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Only removes skills that belong to `user_id`.
pub async fn delete_user_skills<'e, E>(db: E, user_id: i64, ids: &[i64]) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(0);
    }
    let res = sqlx::query("DELETE FROM user_skills WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(ids)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
