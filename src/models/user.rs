use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub location: String,
    pub desired_job_title: String,
    pub desired_industry: String,
    pub desired_salary_min: i32,
    pub desired_salary_max: i32,
    pub skills_description: String,
    pub experience: String,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}
