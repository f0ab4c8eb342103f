use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common_dto::{default_page, default_page_size, Pagination};
use crate::error::{Error, Result};
use crate::models::job_application::{ApplicationStatus, JobApplication};
use crate::utils::validation::non_blank;

pub fn cv_url(application_id: i64) -> String {
    format!("/assets/cvs/{}.pdf", application_id)
}

fn parse_status(raw: Option<&str>) -> Result<Option<ApplicationStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map(Some).map_err(Error::BadRequest),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub message: Option<String>,
    pub application_status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub cv_url: String,
}

impl From<JobApplication> for ApplicationResponse {
    fn from(app: JobApplication) -> Self {
        Self {
            id: app.id,
            user_id: app.user_id,
            job_id: app.job_id,
            message: app.message,
            application_status: app.status,
            applied_at: app.applied_at,
            cv_url: cv_url(app.id),
        }
    }
}

/// Fields of the multipart form that creates an application.
#[derive(Debug, Clone)]
pub struct NewApplicationForm {
    pub job_id: i64,
    pub message: Option<String>,
    pub cv: Vec<u8>,
}

/// Fields of the multipart form that edits an application. `cv` is only
/// applied when the client set `cv_provided`.
#[derive(Debug, Clone, Default)]
pub struct UpdateApplicationForm {
    pub message: Option<String>,
    pub cv: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct ApplicationFormBuilder {
    pub job_id: Option<String>,
    pub message: Option<String>,
    pub cv: Option<Vec<u8>>,
    pub cv_provided: Option<String>,
}

impl ApplicationFormBuilder {
    pub fn into_new_application(self) -> Result<NewApplicationForm> {
        let job_id = self
            .job_id
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| Error::BadRequest("job_id is required".to_string()))?
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| Error::BadRequest("job_id must be a positive integer".to_string()))?;
        let cv = self
            .cv
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| Error::BadRequest("cv file is required".to_string()))?;
        Ok(NewApplicationForm {
            job_id,
            message: non_blank(self.message),
            cv,
        })
    }

    pub fn into_update(self) -> Result<UpdateApplicationForm> {
        let cv_provided = match self.cv_provided.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(raw) => raw.parse::<bool>().map_err(|_| {
                Error::BadRequest("cv_provided must be true or false".to_string())
            })?,
        };
        let cv = if cv_provided {
            Some(
                self.cv
                    .filter(|bytes| !bytes.is_empty())
                    .ok_or_else(|| Error::BadRequest("cv file is required".to_string()))?,
            )
        } else {
            None
        };
        Ok(UpdateApplicationForm {
            message: non_blank(self.message),
            cv,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

impl ChangeStatusRequest {
    /// Employers may only move an application to a review outcome.
    pub fn parse(&self) -> Result<ApplicationStatus> {
        let status = parse_status(Some(&self.status))?
            .ok_or_else(|| Error::BadRequest("status is required".to_string()))?;
        if !status.is_employer_settable() {
            return Err(Error::BadRequest(format!(
                "status must be one of Interviewing, Offered, Rejected, got {}",
                status
            )));
        }
        Ok(status)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserApplicationsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub status: Option<String>,
}

impl UserApplicationsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }

    pub fn status(&self) -> Result<Option<ApplicationStatus>> {
        parse_status(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployerApplicationsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub status: Option<String>,
    pub job_id: Option<i64>,
}

impl EmployerApplicationsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }

    pub fn status(&self) -> Result<Option<ApplicationStatus>> {
        parse_status(self.status.as_deref())
    }
}
