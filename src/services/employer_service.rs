use sqlx::PgPool;
use std::time::Duration;

use crate::database::accounts;
use crate::database::employers::{self, CreateEmployerParams};
use crate::database::tx::exec_tx;
use crate::database::{companies, jobs};
use crate::dto::common_dto::{LoginRequest, UpdatePasswordRequest};
use crate::dto::employer_dto::{
    CreateEmployerRequest, EmployerResponse, LoginEmployerResponse, UpdateEmployerRequest,
};
use crate::error::{Error, Result};
use crate::models::employer::Employer;
use crate::services::queue_service::TaskDistributor;
use crate::services::user_service::{duplicate_email_message, token_expiry};
use crate::utils::crypto::{check_password, hash_password_blocking};
use crate::utils::token::TokenMaker;
use crate::utils::validation::{non_blank, normalize_email};

const DUPLICATE_COMPANY: &str = "company with this name already exists";
const DUPLICATE_EMPLOYER: &str = "employer with this email already exists";

#[derive(Clone)]
pub struct EmployerService {
    pool: PgPool,
    token_maker: TokenMaker,
    access_token_duration: Duration,
    distributor: TaskDistributor,
}

impl EmployerService {
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

    /// Creates the company and its first employer together and queues the
    /// verification email.
    pub async fn create_employer(&self, req: CreateEmployerRequest) -> Result<EmployerResponse> {
        let email = normalize_email(&req.email);
        let hashed_password = hash_password_blocking(req.password.clone()).await?;
        let full_name = req.full_name.trim().to_string();
        let company_name = req.company_name.trim().to_string();
        let industry = req.industry.trim().to_string();
        let location = req.location.trim().to_string();
        let distributor = self.distributor.clone();
        let tx_email = email.clone();

        let employer_id = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                accounts::lock_email(&mut *conn, &tx_email).await?;
                if let Some(kind) = accounts::find_account_kind(&mut *conn, &tx_email).await? {
                    return Err(Error::Forbidden(duplicate_email_message(kind).to_string()));
                }
                let company =
                    companies::create_company(&mut *conn, &company_name, &industry, &location)
                        .await
                        .map_err(|e| e.conflict_as_forbidden(DUPLICATE_COMPANY))?;
                let params = CreateEmployerParams {
                    company_id: company.id,
                    full_name,
                    email: tx_email,
                    hashed_password,
                };
                let employer = employers::create_employer(&mut *conn, &params)
                    .await
                    .map_err(|e| e.conflict_as_forbidden(DUPLICATE_EMPLOYER))?;
                distributor
                    .distribute_task_send_verify_email(&mut *conn, &employer.email)
                    .await?;
                Ok(employer.id)
            })
        })
        .await?;

        tracing::info!(employer_id, email = %email, "employer registered");
        self.get_employer_by_id(employer_id).await
    }

    pub async fn login_employer(&self, req: LoginRequest) -> Result<LoginEmployerResponse> {
        let email = normalize_email(&req.email);
        let row = employers::get_employer_with_company_by_email(&self.pool, &email)
            .await?
            .ok_or_else(|| Error::NotFound("employer not found".to_string()))?;
        if !row.employer.is_email_verified {
            return Err(Error::Forbidden("email is not verified".to_string()));
        }
        check_password(req.password, row.employer.hashed_password.clone()).await?;

        let (access_token, payload) = self
            .token_maker
            .create_token(&row.employer.email, self.access_token_duration)?;

        Ok(LoginEmployerResponse {
            access_token,
            access_token_expires_at: token_expiry(payload.expires_at)?,
            employer: EmployerResponse::from(row),
        })
    }

    async fn get_employer_by_id(&self, id: i64) -> Result<EmployerResponse> {
        employers::get_employer_with_company_by_id(&self.pool, id)
            .await?
            .map(EmployerResponse::from)
            .ok_or_else(|| Error::NotFound("employer not found".to_string()))
    }

    pub async fn get_employer(&self, employer: &Employer) -> Result<EmployerResponse> {
        self.get_employer_by_id(employer.id).await
    }

    /// Public lookup used by applicants to see who is behind a job.
    pub async fn get_employer_by_email(&self, email: &str) -> Result<EmployerResponse> {
        employers::get_employer_with_company_by_email(&self.pool, &normalize_email(email))
            .await?
            .map(EmployerResponse::from)
            .ok_or_else(|| Error::NotFound("employer not found".to_string()))
    }

    /// Company fields are denormalised into search documents, so a rename
    /// queues a re-index of every job of the company.
    pub async fn update_employer(
        &self,
        employer: Employer,
        req: UpdateEmployerRequest,
    ) -> Result<EmployerResponse> {
        let full_name = non_blank(req.full_name);
        let company_name = non_blank(req.company_name);
        let industry = non_blank(req.industry);
        let location = non_blank(req.location);
        let distributor = self.distributor.clone();
        let (employer_id, company_id) = (employer.id, employer.company_id);

        exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                if let Some(full_name) = &full_name {
                    employers::update_employer_full_name(&mut *conn, employer_id, full_name).await?;
                }
                if company_name.is_some() || industry.is_some() || location.is_some() {
                    companies::update_company(
                        &mut *conn,
                        company_id,
                        company_name.as_deref(),
                        industry.as_deref(),
                        location.as_deref(),
                    )
                    .await
                    .map_err(|e| e.conflict_as_forbidden(DUPLICATE_COMPANY))?;
                }
                if company_name.is_some() {
                    for job_id in jobs::list_job_ids_by_company(&mut *conn, company_id).await? {
                        distributor
                            .distribute_task_index_job(&mut *conn, job_id)
                            .await?;
                    }
                }
                Ok(())
            })
        })
        .await?;

        self.get_employer_by_id(employer_id).await
    }

    pub async fn update_password(&self, employer: Employer, req: UpdatePasswordRequest) -> Result<()> {
        check_password(req.old_password, employer.hashed_password.clone()).await?;
        let hashed = hash_password_blocking(req.new_password).await?;
        employers::update_employer_password(&self.pool, employer.id, &hashed).await?;
        tracing::info!(employer_id = employer.id, "employer password changed");
        Ok(())
    }

    /// Deletes the employer. The last employer of a company takes the
    /// company, its jobs and their search documents with it.
    pub async fn delete_employer(&self, employer: Employer) -> Result<()> {
        let distributor = self.distributor.clone();
        let (employer_id, company_id) = (employer.id, employer.company_id);

        let removed_jobs = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                if employers::delete_employer(&mut *conn, employer_id).await? == 0 {
                    return Err(Error::NotFound("employer not found".to_string()));
                }
                if companies::count_company_employers(&mut *conn, company_id).await? > 0 {
                    return Ok(0);
                }
                let job_ids = jobs::list_job_ids_by_company(&mut *conn, company_id).await?;
                for job_id in &job_ids {
                    distributor
                        .distribute_task_delete_job_index(&mut *conn, *job_id)
                        .await?;
                }
                companies::delete_company(&mut *conn, company_id).await?;
                Ok(job_ids.len())
            })
        })
        .await?;

        tracing::info!(employer_id, company_id, removed_jobs, "employer deleted");
        Ok(())
    }
}
