use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;

use crate::database::accounts::{self, AccountKind};
use crate::database::tx::exec_tx;
use crate::database::user_skills::{self, NewUserSkill};
use crate::database::users::{self, CreateUserParams, UpdateUserParams};
use crate::database::{employers, verify_emails};
use crate::dto::common_dto::{LoginRequest, UpdatePasswordRequest};
use crate::dto::user_dto::{
    CreateUserRequest, LoginUserResponse, UpdateUserRequest, UserResponse, UserSkillPayload,
};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::services::queue_service::TaskDistributor;
use crate::utils::crypto::{check_password, hash_password_blocking};
use crate::utils::token::TokenMaker;
use crate::utils::validation::{check_salary_range, non_blank, normalize_email};

pub(crate) fn duplicate_email_message(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::User => "user with this email already exists",
        AccountKind::Employer => "employer with this email already exists",
    }
}

pub(crate) fn to_new_skills(skills: &[UserSkillPayload]) -> Vec<NewUserSkill> {
    skills
        .iter()
        .map(|s| NewUserSkill {
            skill: s.name.trim().to_string(),
            experience_years: s.experience_years,
        })
        .collect()
}

pub(crate) fn token_expiry(expires_at: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(expires_at, 0)
        .ok_or_else(|| Error::Internal("token expiry out of range".to_string()))
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    token_maker: TokenMaker,
    access_token_duration: Duration,
    distributor: TaskDistributor,
}

impl UserService {
    pub fn new(
        pool: PgPool,
        token_maker: TokenMaker,
        access_token_duration: Duration,
        distributor: TaskDistributor,
    ) -> Self {
        Self {
            pool,
            token_maker,
            access_token_duration,
            distributor,
        }
    }

    /// Registers a user, their skills and the verification email task in
    /// one transaction.
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<UserResponse> {
        let email = normalize_email(&req.email);
        let hashed_password = hash_password_blocking(req.password.clone()).await?;
        let params = CreateUserParams {
            full_name: req.full_name.trim().to_string(),
            email: email.clone(),
            hashed_password,
            location: req.location.trim().to_string(),
            desired_job_title: req.desired_job_title.trim().to_string(),
            desired_industry: req.desired_industry.trim().to_string(),
            desired_salary_min: req.desired_salary_min,
            desired_salary_max: req.desired_salary_max,
            skills_description: req.skills_description,
            experience: req.experience,
        };
        let skills = to_new_skills(&req.skills);
        let distributor = self.distributor.clone();

        let (user, skills) = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                accounts::lock_email(&mut *conn, &params.email).await?;
                if let Some(kind) = accounts::find_account_kind(&mut *conn, &params.email).await? {
                    return Err(Error::Forbidden(duplicate_email_message(kind).to_string()));
                }
                let user = users::create_user(&mut *conn, &params)
                    .await
                    .map_err(|e| e.conflict_as_forbidden("user with this email already exists"))?;
                let skills = user_skills::create_user_skills(&mut *conn, user.id, &skills).await?;
                distributor
                    .distribute_task_send_verify_email(&mut *conn, &user.email)
                    .await?;
                Ok((user, skills))
            })
        })
        .await?;

        tracing::info!(user_id = user.id, email = %email, "user registered");
        Ok(UserResponse::new(user, skills))
    }

    pub async fn login_user(&self, req: LoginRequest) -> Result<LoginUserResponse> {
        let email = normalize_email(&req.email);
        let user = users::get_user_by_email(&self.pool, &email)
            .await?
            .ok_or_else(|| Error::NotFound("user not found".to_string()))?;
        if !user.is_email_verified {
            return Err(Error::Forbidden("email is not verified".to_string()));
        }
        check_password(req.password, user.hashed_password.clone()).await?;

        let (access_token, payload) = self
            .token_maker
            .create_token(&user.email, self.access_token_duration)?;
        let skills = user_skills::list_user_skills(&self.pool, user.id).await?;

        Ok(LoginUserResponse {
            access_token,
            access_token_expires_at: token_expiry(payload.expires_at)?,
            user: UserResponse::new(user, skills),
        })
    }

    /// Consumes a verification row and flips the owning account to verified.
    /// Works for users and employers alike.
    pub async fn verify_email(&self, id: i64, secret_code: String) -> Result<()> {
        let email = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let invalid = || Error::BadRequest("invalid or expired verification code".to_string());
                let verify = verify_emails::consume_verify_email(&mut *conn, id, &secret_code)
                    .await?
                    .ok_or_else(invalid)?;
                if users::mark_user_email_verified(&mut *conn, &verify.email).await? == 0
                    && employers::mark_employer_email_verified(&mut *conn, &verify.email).await? == 0
                {
                    return Err(invalid());
                }
                Ok(verify.email)
            })
        })
        .await?;

        tracing::info!(email = %email, "email verified");
        Ok(())
    }

    pub async fn get_user(&self, user: User) -> Result<UserResponse> {
        let skills = user_skills::list_user_skills(&self.pool, user.id).await?;
        Ok(UserResponse::new(user, skills))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserResponse> {
        let user = users::get_user_by_email(&self.pool, &normalize_email(email))
            .await?
            .ok_or_else(|| Error::NotFound("user not found".to_string()))?;
        self.get_user(user).await
    }

    pub async fn update_user(&self, user: User, req: UpdateUserRequest) -> Result<UserResponse> {
        let params = UpdateUserParams {
            full_name: non_blank(req.full_name),
            location: non_blank(req.location),
            desired_job_title: non_blank(req.desired_job_title),
            desired_industry: non_blank(req.desired_industry),
            desired_salary_min: req.desired_salary_min,
            desired_salary_max: req.desired_salary_max,
            skills_description: non_blank(req.skills_description),
            experience: non_blank(req.experience),
        };
        check_salary_range(
            params.desired_salary_min.unwrap_or(user.desired_salary_min),
            params.desired_salary_max.unwrap_or(user.desired_salary_max),
        )
        .map_err(|_| {
            Error::BadRequest("desired_salary_min must not be greater than desired_salary_max".to_string())
        })?;

        let add_skills = to_new_skills(&req.add_skills);
        let remove_ids = req.remove_skill_ids;
        let user_id = user.id;

        let (user, skills) = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let user = users::update_user(&mut *conn, user_id, &params).await?;
                user_skills::delete_user_skills(&mut *conn, user_id, &remove_ids).await?;
                user_skills::create_user_skills(&mut *conn, user_id, &add_skills).await?;
                let skills = user_skills::list_user_skills(&mut *conn, user_id).await?;
                Ok((user, skills))
            })
        })
        .await?;

        Ok(UserResponse::new(user, skills))
    }

    pub async fn update_password(&self, user: User, req: UpdatePasswordRequest) -> Result<()> {
        check_password(req.old_password, user.hashed_password.clone()).await?;
        let hashed = hash_password_blocking(req.new_password).await?;
        users::update_user_password(&self.pool, user.id, &hashed).await?;
        tracing::info!(user_id = user.id, "user password changed");
        Ok(())
    }

    pub async fn delete_user(&self, user: User) -> Result<()> {
        if users::delete_user(&self.pool, user.id).await? == 0 {
            return Err(Error::NotFound("user not found".to_string()));
        }
        tracing::info!(user_id = user.id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_messages_name_the_existing_account() {
        assert_eq!(
            duplicate_email_message(AccountKind::User),
            "user with this email already exists"
        );
        assert_eq!(
            duplicate_email_message(AccountKind::Employer),
            "employer with this email already exists"
        );
    }

    #[test]
    fn skill_names_are_trimmed() {
        let skills = to_new_skills(&[UserSkillPayload {
            name: "  Rust ".into(),
            experience_years: 2,
        }]);
        assert_eq!(skills[0].skill, "Rust");
        assert_eq!(skills[0].experience_years, 2);
    }

    #[test]
    fn token_expiry_converts_unix_seconds() {
        let at = token_expiry(1_700_000_000).unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
    }
}
