use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkill {
    pub id: i64,
    pub user_id: i64,
    pub skill: String,
    pub experience_years: i32,
}
