use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::{
        common_dto::PageQuery,
        job_dto::{CompanyJobsQuery, CreateJobRequest, ListJobsQuery, SearchJobsQuery, UpdateJobRequest},
    },
    error::{Error, Result},
    middleware::auth::{AuthEmployer, AuthUser},
    routes::extract::AppJson,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created and queued for indexing", body = JobResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Caller is not an employer")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    AppJson(payload): AppJson<CreateJobRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.create_job(&employer, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = i64, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job with company and posting employer", body = JobDetailResponse),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_job(id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    patch,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = i64, Path, description = "Job ID")
    ),
    request_body = UpdateJobRequest,
    responses(
        (status = 200, description = "Job updated", body = JobResponse),
        (status = 401, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateJobRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.update_job(&employer, id, payload).await?;
    Ok(Json(job))
}

#[utoipa::path(
    delete,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = i64, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 401, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.job_service.delete_job(&employer, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, 5 to 15"),
        ("title" = Option<String>, Query, description = "Title substring"),
        ("industry" = Option<String>, Query, description = "Industry substring"),
        ("job_location" = Option<String>, Query, description = "Location substring"),
        ("salary_min" = Option<i32>, Query, description = "Lowest acceptable salary_min"),
        ("salary_max" = Option<i32>, Query, description = "Highest acceptable salary_max")
    ),
    responses(
        (status = 200, description = "Filtered jobs with total count", body = ListResponse<JobResponse>),
        (status = 400, description = "Invalid paging")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse> {
    let page = query.pagination();
    page.validate()?;
    let jobs = state.job_service.list_jobs(&query.filter(), page).await?;
    Ok(Json(jobs))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/company",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, 5 to 15"),
        ("id" = Option<i64>, Query, description = "Company ID"),
        ("name" = Option<String>, Query, description = "Exact company name"),
        ("name_contains" = Option<String>, Query, description = "Company name substring")
    ),
    responses(
        (status = 200, description = "Jobs of the selected company", body = ListResponse<JobResponse>),
        (status = 400, description = "Not exactly one selector given")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs_by_company(
    State(state): State<AppState>,
    Query(query): Query<CompanyJobsQuery>,
) -> Result<impl IntoResponse> {
    let page = query.pagination();
    page.validate()?;
    let selector = query.selector().ok_or_else(|| {
        Error::BadRequest("exactly one of id, name, name_contains must be provided".to_string())
    })?;
    let jobs = state.job_service.list_jobs_by_company(&selector, page).await?;
    Ok(Json(jobs))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/search",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, 5 to 15"),
        ("search" = String, Query, description = "Free-text query")
    ),
    responses(
        (status = 200, description = "Ranked search hits", body = ListResponse<JobDocument>),
        (status = 400, description = "Invalid query")
    )
)]
#[axum::debug_handler]
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<SearchJobsQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    let page = query.pagination();
    page.validate()?;
    let hits = state.job_service.search_jobs(&query.search, page).await?;
    Ok(Json(hits))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/match-skills",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, 5 to 15")
    ),
    responses(
        (status = 200, description = "Jobs sharing a skill with the caller", body = ListResponse<JobResponse>),
        (status = 401, description = "Caller is not a user")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs_matching_skills(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.pagination();
    page.validate()?;
    let jobs = state.job_service.list_jobs_matching_skills(&user, page).await?;
    Ok(Json(jobs))
}
