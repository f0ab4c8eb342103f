use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::user::User;
use crate::models::user_skill::UserSkill;
use crate::utils::validation::{check_optional_salary_range, check_salary_range};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserSkillPayload {
    #[validate(length(min = 1, max = 100, message = "skill name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 0, max = 80, message = "experience_years must be between 0 and 80"))]
    pub experience_years: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_user_salary"))]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "full_name is required"))]
    pub full_name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[validate(length(min = 1, message = "desired_job_title is required"))]
    pub desired_job_title: String,
    #[validate(length(min = 1, message = "desired_industry is required"))]
    pub desired_industry: String,
    #[validate(range(min = 0))]
    pub desired_salary_min: i32,
    #[validate(range(min = 0))]
    pub desired_salary_max: i32,
    #[serde(default)]
    pub skills_description: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    #[validate(nested)]
    pub skills: Vec<UserSkillPayload>,
}

fn validate_create_user_salary(req: &CreateUserRequest) -> Result<(), ValidationError> {
    check_salary_range(req.desired_salary_min, req.desired_salary_max)
}

/// Absent or blank fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_user_salary"))]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub desired_job_title: Option<String>,
    pub desired_industry: Option<String>,
    #[validate(range(min = 0))]
    pub desired_salary_min: Option<i32>,
    #[validate(range(min = 0))]
    pub desired_salary_max: Option<i32>,
    pub skills_description: Option<String>,
    pub experience: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub add_skills: Vec<UserSkillPayload>,
    #[serde(default)]
    pub remove_skill_ids: Vec<i64>,
}

fn validate_update_user_salary(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    check_optional_salary_range(req.desired_salary_min, req.desired_salary_max)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyEmailQuery {
    #[validate(range(min = 1, message = "id must be positive"))]
    pub id: i64,
    #[validate(length(min = 32, message = "code must be at least 32 characters"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailResponse {
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSkillResponse {
    pub id: i64,
    pub name: String,
    pub experience_years: i32,
}

impl From<UserSkill> for UserSkillResponse {
    fn from(skill: UserSkill) -> Self {
        Self {
            id: skill.id,
            name: skill.skill,
            experience_years: skill.experience_years,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub location: String,
    pub desired_job_title: String,
    pub desired_industry: String,
    pub desired_salary_min: i32,
    pub desired_salary_max: i32,
    pub skills_description: String,
    pub experience: String,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub skills: Vec<UserSkillResponse>,
}

impl UserResponse {
    pub fn new(user: User, skills: Vec<UserSkill>) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            location: user.location,
            desired_job_title: user.desired_job_title,
            desired_industry: user.desired_industry,
            desired_salary_min: user.desired_salary_min,
            desired_salary_max: user.desired_salary_max,
            skills_description: user.skills_description,
            experience: user.experience,
            is_email_verified: user.is_email_verified,
            created_at: user.created_at,
            skills: skills.into_iter().map(UserSkillResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUserResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signup_body() -> serde_json::Value {
        json!({
            "full_name": "Alice Doe",
            "email": "alice@example.com",
            "password": "hunter22",
            "location": "Berlin",
            "desired_job_title": "Backend Engineer",
            "desired_industry": "Software",
            "desired_salary_min": 100,
            "desired_salary_max": 200,
            "skills": [{ "name": "Go", "experience_years": 3 }]
        })
    }

    #[test]
    fn valid_signup_passes() {
        let req: CreateUserRequest = serde_json::from_value(signup_body()).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.skills.len(), 1);
        assert_eq!(req.skills_description, "");
    }

    #[test]
    fn signup_rejects_short_password_and_bad_email() {
        let mut body = signup_body();
        body["password"] = json!("12345");
        body["email"] = json!("not-an-email");
        let req: CreateUserRequest = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn signup_rejects_inverted_salary() {
        let mut body = signup_body();
        body["desired_salary_min"] = json!(500);
        body["desired_salary_max"] = json!(100);
        let req: CreateUserRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn signup_rejects_invalid_nested_skill() {
        let mut body = signup_body();
        body["skills"] = json!([{ "name": "", "experience_years": 1 }]);
        let req: CreateUserRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn partial_salary_patch_is_accepted_here() {
        let req = UpdateUserRequest {
            desired_salary_min: Some(10_000),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let req = UpdateUserRequest {
            desired_salary_min: Some(300),
            desired_salary_max: Some(200),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn verify_code_must_be_long_enough() {
        let short = VerifyEmailQuery {
            id: 1,
            code: "abc".into(),
        };
        assert!(short.validate().is_err());

        let ok = VerifyEmailQuery {
            id: 1,
            code: "a".repeat(32),
        };
        assert!(ok.validate().is_ok());
    }
}
