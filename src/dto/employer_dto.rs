use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::employer::EmployerWithCompany;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmployerRequest {
    #[validate(length(min = 1, message = "full_name is required"))]
    pub full_name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "company_name is required"))]
    pub company_name: String,
    #[validate(length(min = 1, message = "industry is required"))]
    pub industry: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
}

/// Absent or blank fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEmployerRequest {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployerResponse {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub company_id: i64,
    pub company_name: String,
    pub industry: String,
    pub location: String,
}

impl From<EmployerWithCompany> for EmployerResponse {
    fn from(row: EmployerWithCompany) -> Self {
        Self {
            id: row.employer.id,
            full_name: row.employer.full_name,
            email: row.employer.email,
            is_email_verified: row.employer.is_email_verified,
            created_at: row.employer.created_at,
            company_id: row.employer.company_id,
            company_name: row.company_name,
            industry: row.company_industry,
            location: row.company_location,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEmployerResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub employer: EmployerResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employer::Employer;

    #[test]
    fn response_hides_password_and_flattens_company() {
        let row = EmployerWithCompany {
            employer: Employer {
                id: 4,
                company_id: 9,
                full_name: "Eve Boss".into(),
                email: "eve@acme.io".into(),
                hashed_password: "$argon2id$secret".into(),
                is_email_verified: true,
                created_at: Utc::now(),
            },
            company_name: "Acme".into(),
            company_industry: "Software".into(),
            company_location: "Remote".into(),
        };
        let json = serde_json::to_value(EmployerResponse::from(row)).unwrap();
        assert_eq!(json["company_id"], 9);
        assert_eq!(json["company_name"], "Acme");
        assert_eq!(json["industry"], "Software");
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn signup_requires_company_fields() {
        let req = CreateEmployerRequest {
            full_name: "Eve".into(),
            email: "eve@acme.io".into(),
            password: "secret1".into(),
            company_name: "".into(),
            industry: "Software".into(),
            location: "Remote".into(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("company_name"));
    }
}
