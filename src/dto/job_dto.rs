use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::common_dto::{default_page, default_page_size, Pagination};
use crate::database::jobs::{CompanySelector, JobFilter};
use crate::models::job::{Job, JobDetail};
use crate::models::job_skill::JobSkill;
use crate::utils::validation::{check_optional_salary_range, check_salary_range, non_blank};

fn check_skill_names(skills: &[String]) -> Result<(), ValidationError> {
    if skills.iter().any(|s| s.trim().is_empty() || s.len() > 100) {
        let mut err = ValidationError::new("skill_name");
        err.message = Some("skill names must be 1-100 characters".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_job"))]
pub struct CreateJobRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "industry is required"))]
    pub industry: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[validate(range(min = 0))]
    pub salary_min: i32,
    #[validate(range(min = 0))]
    pub salary_max: i32,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
}

fn validate_create_job(req: &CreateJobRequest) -> Result<(), ValidationError> {
    check_salary_range(req.salary_min, req.salary_max)?;
    check_skill_names(&req.required_skills)
}

/// Absent or blank fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_job"))]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub salary_min: Option<i32>,
    #[validate(range(min = 0))]
    pub salary_max: Option<i32>,
    pub requirements: Option<String>,
    #[serde(default)]
    pub skills_to_add: Vec<String>,
    #[serde(default)]
    pub skill_ids_to_remove: Vec<i64>,
}

fn validate_update_job(req: &UpdateJobRequest) -> Result<(), ValidationError> {
    check_optional_salary_range(req.salary_min, req.salary_max)?;
    check_skill_names(&req.skills_to_add)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub title: Option<String>,
    pub industry: Option<String>,
    pub job_location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

impl ListJobsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }

    pub fn filter(&self) -> JobFilter {
        JobFilter {
            title: non_blank(self.title.clone()),
            location: non_blank(self.job_location.clone()),
            industry: non_blank(self.industry.clone()),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyJobsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub id: Option<i64>,
    pub name: Option<String>,
    pub name_contains: Option<String>,
}

impl CompanyJobsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }

    /// Exactly one of `id`, `name` and `name_contains` must be given.
    pub fn selector(&self) -> Option<CompanySelector> {
        let name = non_blank(self.name.clone());
        let name_contains = non_blank(self.name_contains.clone());
        match (self.id, name, name_contains) {
            (Some(id), None, None) if id > 0 => Some(CompanySelector::Id(id)),
            (None, Some(name), None) => Some(CompanySelector::Name(name)),
            (None, None, Some(part)) => Some(CompanySelector::NameContains(part)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchJobsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[validate(length(min = 1, max = 200, message = "search must be 1-200 characters"))]
    pub search: String,
}

impl SearchJobsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSkillResponse {
    pub id: i64,
    pub name: String,
}

impl From<JobSkill> for JobSkillResponse {
    fn from(skill: JobSkill) -> Self {
        Self {
            id: skill.id,
            name: skill.skill,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub required_skills: Vec<JobSkillResponse>,
}

impl JobResponse {
    pub fn new(job: Job, company_name: String, skills: Vec<JobSkill>) -> Self {
        Self {
            job,
            company_name,
            required_skills: skills.into_iter().map(JobSkillResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub detail: JobDetail,
    pub required_skills: Vec<JobSkillResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company_query(id: Option<i64>, name: Option<&str>, part: Option<&str>) -> CompanyJobsQuery {
        CompanyJobsQuery {
            page: 1,
            page_size: 5,
            id,
            name: name.map(String::from),
            name_contains: part.map(String::from),
        }
    }

    #[test]
    fn exactly_one_company_selector() {
        assert!(matches!(
            company_query(Some(3), None, None).selector(),
            Some(CompanySelector::Id(3))
        ));
        assert!(matches!(
            company_query(None, Some("Acme"), None).selector(),
            Some(CompanySelector::Name(n)) if n == "Acme"
        ));
        assert!(matches!(
            company_query(None, None, Some("cm")).selector(),
            Some(CompanySelector::NameContains(p)) if p == "cm"
        ));
        assert!(company_query(None, None, None).selector().is_none());
        assert!(company_query(Some(3), Some("Acme"), None).selector().is_none());
        assert!(company_query(None, Some("  "), None).selector().is_none());
        assert!(company_query(Some(0), None, None).selector().is_none());
    }

    #[test]
    fn list_filter_drops_blank_values() {
        let q = ListJobsQuery {
            page: 1,
            page_size: 10,
            title: Some("engineer".into()),
            industry: Some("".into()),
            job_location: Some("Berlin".into()),
            salary_min: Some(0),
            salary_max: None,
        };
        let f = q.filter();
        assert_eq!(f.title.as_deref(), Some("engineer"));
        assert_eq!(f.industry, None);
        assert_eq!(f.location.as_deref(), Some("Berlin"));
        assert_eq!(f.salary_min, Some(0));
    }

    #[test]
    fn create_job_checks_salary_and_skills() {
        let mut req = CreateJobRequest {
            title: "Senior Go Engineer".into(),
            industry: "Software".into(),
            description: "Build things".into(),
            location: "Remote".into(),
            salary_min: 100,
            salary_max: 200,
            requirements: String::new(),
            required_skills: vec!["Go".into(), "Postgres".into()],
        };
        assert!(req.validate().is_ok());

        req.salary_min = 300;
        assert!(req.validate().is_err());

        req.salary_min = 100;
        req.required_skills.push(" ".into());
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_job_rejects_inverted_pair() {
        let req = UpdateJobRequest {
            salary_min: Some(1000),
            salary_max: Some(5),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
