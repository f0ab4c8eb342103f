use futures::{stream, StreamExt, TryStreamExt};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::database::jobs::{self, CompanySelector, CreateJobParams, JobFilter, UpdateJobParams};
use crate::database::job_skills;
use crate::database::tx::exec_tx;
use crate::dto::common_dto::{ListResponse, Pagination};
use crate::dto::job_dto::{CreateJobRequest, JobDetailResponse, JobResponse, UpdateJobRequest};
use crate::error::{Error, Result};
use crate::models::employer::Employer;
use crate::models::job::JobWithCompany;
use crate::models::job_skill::JobSkill;
use crate::models::user::User;
use crate::services::queue_service::TaskDistributor;
use crate::services::search_service::{JobDocument, SearchIndex};
use crate::utils::validation::{check_salary_range, non_blank};

/// Upper bound on skills returned with a single job.
const SKILLS_PAGE: i64 = 100;
const BULK_LOAD_WORKERS: usize = 5;

fn trimmed_skills(skills: &[String]) -> Vec<String> {
    skills.iter().map(|s| s.trim().to_string()).collect()
}

fn ensure_owner(job_company_id: i64, employer: &Employer) -> Result<()> {
    if job_company_id != employer.company_id {
        return Err(Error::Unauthorized(
            "job does not belong to the employer's company".to_string(),
        ));
    }
    Ok(())
}

/// Groups skill rows by job and zips them onto the listed jobs.
fn attach_skills(rows: Vec<JobWithCompany>, skills: Vec<JobSkill>) -> Vec<JobResponse> {
    let mut by_job: HashMap<i64, Vec<JobSkill>> = HashMap::new();
    for skill in skills {
        by_job.entry(skill.job_id).or_default().push(skill);
    }
    rows.into_iter()
        .map(|row| {
            let skills = by_job.remove(&row.job.id).unwrap_or_default();
            JobResponse::new(row.job, row.company_name, skills)
        })
        .collect()
}

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
    distributor: TaskDistributor,
    search_index: SearchIndex,
}

impl JobService {
    pub fn new(pool: PgPool, distributor: TaskDistributor, search_index: SearchIndex) -> Self {
        Self {
            pool,
            distributor,
            search_index,
        }
    }

    /// Writes the job, its skills and the index task atomically; the search
    /// document follows once the task is processed.
    pub async fn create_job(&self, employer: &Employer, req: CreateJobRequest) -> Result<JobResponse> {
        let params = CreateJobParams {
            company_id: employer.company_id,
            title: req.title.trim().to_string(),
            industry: req.industry.trim().to_string(),
            description: req.description,
            location: req.location.trim().to_string(),
            salary_min: req.salary_min,
            salary_max: req.salary_max,
            requirements: req.requirements,
        };
        let skills = trimmed_skills(&req.required_skills);
        let distributor = self.distributor.clone();

        let response = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let job = jobs::create_job(&mut *conn, &params).await?;
                job_skills::create_job_skills(&mut *conn, job.id, &skills).await?;
                distributor.distribute_task_index_job(&mut *conn, job.id).await?;

                let skills = job_skills::list_job_skills(&mut *conn, job.id, SKILLS_PAGE, 0).await?;
                let row = jobs::get_job_with_company(&mut *conn, job.id)
                    .await?
                    .ok_or_else(|| Error::Internal("job vanished after insert".to_string()))?;
                Ok(JobResponse::new(row.job, row.company_name, skills))
            })
        })
        .await?;

        tracing::info!(job_id = response.job.id, company_id = employer.company_id, "job created");
        Ok(response)
    }

    pub async fn get_job(&self, id: i64) -> Result<JobDetailResponse> {
        let detail = jobs::get_job_detail(&self.pool, id)
            .await?
            .ok_or_else(|| Error::NotFound("job not found".to_string()))?;
        let skills = job_skills::list_job_skills(&self.pool, id, SKILLS_PAGE, 0).await?;
        Ok(JobDetailResponse {
            detail,
            required_skills: skills.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn update_job(
        &self,
        employer: &Employer,
        id: i64,
        req: UpdateJobRequest,
    ) -> Result<JobResponse> {
        let params = UpdateJobParams {
            title: non_blank(req.title),
            industry: non_blank(req.industry),
            description: non_blank(req.description),
            location: non_blank(req.location),
            salary_min: req.salary_min,
            salary_max: req.salary_max,
            requirements: non_blank(req.requirements),
        };
        let add = trimmed_skills(&req.skills_to_add);
        let remove = req.skill_ids_to_remove;
        let employer = employer.clone();
        let distributor = self.distributor.clone();

        let response = exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let current = jobs::get_job_for_update(&mut *conn, id)
                    .await?
                    .ok_or_else(|| Error::NotFound("job not found".to_string()))?;
                ensure_owner(current.company_id, &employer)?;
                check_salary_range(
                    params.salary_min.unwrap_or(current.salary_min),
                    params.salary_max.unwrap_or(current.salary_max),
                )
                .map_err(|_| {
                    Error::BadRequest("salary_min must not be greater than salary_max".to_string())
                })?;

                jobs::update_job(&mut *conn, id, &params).await?;
                job_skills::delete_job_skills_by_ids(&mut *conn, id, &remove).await?;
                job_skills::create_job_skills(&mut *conn, id, &add).await?;
                distributor.distribute_task_index_job(&mut *conn, id).await?;

                let skills = job_skills::list_job_skills(&mut *conn, id, SKILLS_PAGE, 0).await?;
                let row = jobs::get_job_with_company(&mut *conn, id)
                    .await?
                    .ok_or_else(|| Error::NotFound("job not found".to_string()))?;
                Ok(JobResponse::new(row.job, row.company_name, skills))
            })
        })
        .await?;

        tracing::info!(job_id = id, "job updated");
        Ok(response)
    }

    pub async fn delete_job(&self, employer: &Employer, id: i64) -> Result<()> {
        let employer = employer.clone();
        let distributor = self.distributor.clone();

        exec_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let job = jobs::get_job_for_update(&mut *conn, id)
                    .await?
                    .ok_or_else(|| Error::NotFound("job not found".to_string()))?;
                ensure_owner(job.company_id, &employer)?;
                job_skills::delete_job_skills_by_job(&mut *conn, id).await?;
                jobs::delete_job(&mut *conn, id).await?;
                distributor
                    .distribute_task_delete_job_index(&mut *conn, id)
                    .await?;
                Ok(())
            })
        })
        .await?;

        tracing::info!(job_id = id, "job deleted");
        Ok(())
    }

    async fn with_skills(&self, rows: Vec<JobWithCompany>) -> Result<Vec<JobResponse>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.job.id).collect();
        let skills = job_skills::list_job_skills_for_jobs(&self.pool, &ids).await?;
        Ok(attach_skills(rows, skills))
    }

    pub async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: Pagination,
    ) -> Result<ListResponse<JobResponse>> {
        let rows = jobs::list_jobs_by_filters(&self.pool, filter, page.limit(), page.offset()).await?;
        let total = jobs::count_jobs_by_filters(&self.pool, filter).await?;
        let items = self.with_skills(rows).await?;
        Ok(ListResponse::new(items, page).with_total(total))
    }

    pub async fn list_jobs_by_company(
        &self,
        selector: &CompanySelector,
        page: Pagination,
    ) -> Result<ListResponse<JobResponse>> {
        let rows =
            jobs::list_jobs_by_company(&self.pool, selector, page.limit(), page.offset()).await?;
        let items = self.with_skills(rows).await?;
        Ok(ListResponse::new(items, page))
    }

    pub async fn list_jobs_matching_skills(
        &self,
        user: &User,
        page: Pagination,
    ) -> Result<ListResponse<JobResponse>> {
        let rows = jobs::list_jobs_matching_user_skills(
            &self.pool,
            user.id,
            page.limit(),
            page.offset(),
        )
        .await?;
        let items = self.with_skills(rows).await?;
        Ok(ListResponse::new(items, page))
    }

    pub async fn search_jobs(&self, query: &str, page: Pagination) -> Result<ListResponse<JobDocument>> {
        let hits = self
            .search_index
            .search(query.trim(), page.page, page.page_size)
            .await?;
        Ok(ListResponse::new(hits.jobs, page).with_total(hits.total))
    }

    /// Loads every job into the search index. Skills are fetched by a small
    /// pool of concurrent loaders.
    pub async fn rebuild_search_index(&self) -> Result<usize> {
        self.search_index.ensure_index().await?;
        let rows = jobs::list_all_jobs_with_company(&self.pool).await?;

        let docs: Vec<JobDocument> = stream::iter(rows)
            .map(|row| {
                let pool = self.pool.clone();
                async move {
                    let skills = job_skills::list_job_skills(&pool, row.job.id, SKILLS_PAGE, 0)
                        .await?
                        .into_iter()
                        .map(|s| s.skill)
                        .collect();
                    Ok::<_, Error>(JobDocument::new(row, skills))
                }
            })
            .buffer_unordered(BULK_LOAD_WORKERS)
            .try_collect()
            .await?;

        self.search_index.bulk_load(&docs).await?;
        Ok(docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::Job;
    use chrono::Utc;

    fn employer(company_id: i64) -> Employer {
        Employer {
            id: 1,
            company_id,
            full_name: "Eve".into(),
            email: "eve@acme.io".into(),
            hashed_password: String::new(),
            is_email_verified: true,
            created_at: Utc::now(),
        }
    }

    fn row(id: i64) -> JobWithCompany {
        JobWithCompany {
            job: Job {
                id,
                company_id: 1,
                title: format!("Job {}", id),
                industry: "Software".into(),
                description: "d".into(),
                location: "Remote".into(),
                salary_min: 1,
                salary_max: 2,
                requirements: String::new(),
                created_at: Utc::now(),
            },
            company_name: "Acme".into(),
        }
    }

    #[test]
    fn only_the_owning_company_passes() {
        assert!(ensure_owner(7, &employer(7)).is_ok());
        assert!(matches!(
            ensure_owner(7, &employer(8)),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn skills_are_attached_to_their_jobs() {
        let skills = vec![
            JobSkill { id: 1, job_id: 2, skill: "Go".into() },
            JobSkill { id: 2, job_id: 1, skill: "Rust".into() },
            JobSkill { id: 3, job_id: 2, skill: "SQL".into() },
        ];
        let out = attach_skills(vec![row(1), row(2), row(3)], skills);
        let names: Vec<Vec<String>> = out
            .iter()
            .map(|j| j.required_skills.iter().map(|s| s.name.clone()).collect())
            .collect();
        assert_eq!(
            names,
            vec![
                vec!["Rust".to_string()],
                vec!["Go".to_string(), "SQL".to_string()],
                Vec::<String>::new()
            ]
        );
        assert_eq!(out[0].company_name, "Acme");
    }

    #[test]
    fn skill_names_are_trimmed() {
        assert_eq!(trimmed_skills(&[" Go ".into()]), vec!["Go".to_string()]);
    }
}
