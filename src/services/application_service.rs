use sqlx::PgPool;

use crate::database::job_applications;
use crate::database::jobs;
use crate::database::tx::exec_tx;
use crate::dto::application_dto::{ApplicationResponse, NewApplicationForm, UpdateApplicationForm};
use crate::dto::common_dto::{ListResponse, Pagination};
use crate::error::{Error, Result};
use crate::models::employer::Employer;
use crate::models::job_application::{
    ApplicationStatus, EmployerApplicationRow, JobApplication, UserApplicationRow,
};
use crate::models::principal::Principal;
use crate::models::user::User;
use crate::services::queue_service::{PayloadSendConfirmationEmail, TaskDistributor};

const ALREADY_APPLIED: &str = "you have already applied for this job";

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    distributor: TaskDistributor,
}

impl ApplicationService {
    pub fn new(pool: PgPool, distributor: TaskDistributor) -> Self {
        Self { pool, distributor }
    }

    async fn load(&self, id: i64) -> Result<JobApplication> {
        job_applications::get_job_application(&self.pool, id)
            .await?
            .ok_or_else(|| Error::NotFound("job application not found".to_string()))
    }

    async fn load_for_user(&self, user: &User, id: i64) -> Result<JobApplication> {
        let application = self.load(id).await?;
        if application.user_id != user.id {
            return Err(Error::Forbidden(
                "job application does not belong to the user".to_string(),
            ));
        }
        Ok(application)
    }

    async fn load_for_employer(&self, employer: &Employer, id: i64) -> Result<JobApplication> {
        let application = self.load(id).await?;
        let owner = jobs::get_company_id_of_job(&self.pool, application.job_id).await?;
        if owner != Some(employer.company_id) {
            return Err(Error::Forbidden(
                "job application does not belong to the employer's company".to_string(),
            ));
        }
        Ok(application)
    }

    /// Stores the application and queues the confirmation email in the same
    /// transaction.
    pub async fn create_application(
        &self,
        user: &User,
        form: NewApplicationForm,
    ) -> Result<ApplicationResponse> {
        let job = jobs::get_job_with_company(&self.pool, form.job_id)
            .await?
            .ok_or_else(|| Error::NotFound("job not found".to_string()))?;
        let user_id = user.id;
        let confirmation = PayloadSendConfirmationEmail {
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            position: job.job.title.clone(),
            company_name: job.company_name.clone(),
        };
        let distributor = self.distributor.clone();

        let application = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let application = job_applications::create_job_application(
                    &mut *conn,
                    user_id,
                    form.job_id,
                    form.message.as_deref(),
                    &form.cv,
                )
                .await
                .map_err(|e| e.conflict_as_forbidden(ALREADY_APPLIED))?;
                distributor
                    .distribute_task_send_confirmation_email(&mut *conn, &confirmation)
                    .await?;
                Ok(application)
            })
        })
        .await?;

        tracing::info!(
            application_id = application.id,
            user_id,
            job_id = application.job_id,
            cv_bytes = application.cv.len(),
            "job application created"
        );
        Ok(application.into())
    }

    pub async fn get_application_for_user(&self, user: &User, id: i64) -> Result<ApplicationResponse> {
        Ok(self.load_for_user(user, id).await?.into())
    }

    /// Only allowed until the employer has opened the application.
    pub async fn update_application_for_user(
        &self,
        user: &User,
        id: i64,
        form: UpdateApplicationForm,
    ) -> Result<ApplicationResponse> {
        let application = self.load_for_user(user, id).await?;
        let not_editable = || {
            Error::Forbidden("job application can no longer be updated".to_string())
        };
        if application.status != ApplicationStatus::Applied {
            return Err(not_editable());
        }

        let updated = job_applications::update_job_application_if_applied(
            &self.pool,
            id,
            form.message.as_deref(),
            form.cv.as_deref(),
        )
        .await?
        .ok_or_else(not_editable)?;
        Ok(updated.into())
    }

    pub async fn delete_application_for_user(&self, user: &User, id: i64) -> Result<()> {
        self.load_for_user(user, id).await?;
        job_applications::delete_job_application(&self.pool, id).await?;
        tracing::info!(application_id = id, user_id = user.id, "job application withdrawn");
        Ok(())
    }

    pub async fn list_applications_for_user(
        &self,
        user: &User,
        status: Option<ApplicationStatus>,
        page: Pagination,
    ) -> Result<ListResponse<UserApplicationRow>> {
        let rows = job_applications::list_job_applications_for_user(
            &self.pool,
            user.id,
            status,
            page.limit(),
            page.offset(),
        )
        .await?;
        Ok(ListResponse::new(rows, page))
    }

    /// Opening an `Applied` application marks it `Seen` before the response
    /// is built.
    pub async fn get_application_for_employer(
        &self,
        employer: &Employer,
        id: i64,
    ) -> Result<ApplicationResponse> {
        let mut application = self.load_for_employer(employer, id).await?;
        if application.status == ApplicationStatus::Applied
            && job_applications::mark_job_application_seen(&self.pool, id).await? > 0
        {
            application.status = ApplicationStatus::Seen;
            tracing::info!(application_id = id, "job application seen by employer");
        } else if application.status == ApplicationStatus::Applied {
            // a concurrent reader or status change won the race
            application = self.load(id).await?;
        }
        Ok(application.into())
    }

    pub async fn change_status(
        &self,
        employer: &Employer,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<ApplicationResponse> {
        if !status.is_employer_settable() {
            return Err(Error::BadRequest(format!("status {} cannot be set", status)));
        }
        self.load_for_employer(employer, id).await?;
        let updated = job_applications::update_job_application_status(&self.pool, id, status).await?;
        tracing::info!(application_id = id, status = %status, "job application status changed");
        Ok(updated.into())
    }

    pub async fn list_applications_for_employer(
        &self,
        employer: &Employer,
        status: Option<ApplicationStatus>,
        job_id: Option<i64>,
        page: Pagination,
    ) -> Result<ListResponse<EmployerApplicationRow>> {
        let rows = job_applications::list_job_applications_for_employer(
            &self.pool,
            employer.company_id,
            status,
            job_id,
            page.limit(),
            page.offset(),
        )
        .await?;
        Ok(ListResponse::new(rows, page))
    }

    /// CV bytes for the applicant or an employer of the company that owns the job.
    pub async fn get_cv(&self, principal: &Principal, id: i64) -> Result<Vec<u8>> {
        let application = match principal {
            Principal::User(user) => self.load_for_user(user, id).await?,
            Principal::Employer(employer) => self.load_for_employer(employer, id).await?,
        };
        Ok(application.cv)
    }
}
