use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employer {
    pub id: i64,
    pub company_id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Employer row joined with the company it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployerWithCompany {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employer: Employer,
    pub company_name: String,
    pub company_industry: String,
    pub company_location: String,
}
