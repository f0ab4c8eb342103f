use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status")]
pub enum ApplicationStatus {
    Applied,
    Seen,
    Interviewing,
    Offered,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Seen,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offered,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Seen => "Seen",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Statuses an employer may set explicitly; `Seen` is only reached by reading.
    pub fn is_employer_settable(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Interviewing | ApplicationStatus::Offered | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown application status '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub message: Option<String>,
    #[serde(skip)]
    pub cv: Vec<u8>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Application row as listed for the applicant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserApplicationRow {
    pub id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub company_id: i64,
    pub company_name: String,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Application row as listed for the employer that owns the job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployerApplicationRow {
    pub id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub user_id: i64,
    pub user_full_name: String,
    pub user_email: String,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_names_case_insensitively() {
        assert_eq!("Seen".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Seen);
        assert_eq!(
            "interviewing".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Interviewing
        );
        assert!("Hired".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn only_terminal_review_states_are_employer_settable() {
        let settable: Vec<_> = ApplicationStatus::ALL
            .into_iter()
            .filter(ApplicationStatus::is_employer_settable)
            .collect();
        assert_eq!(
            settable,
            vec![
                ApplicationStatus::Interviewing,
                ApplicationStatus::Offered,
                ApplicationStatus::Rejected
            ]
        );
    }
}
