use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationFormBuilder, ChangeStatusRequest, EmployerApplicationsQuery,
        UserApplicationsQuery,
    },
    error::{Error, Result},
    middleware::auth::{AuthEmployer, AuthUser},
    routes::extract::AppJson,
    AppState,
};

/// Collects the known text and file parts; unknown parts are skipped.
async fn read_application_form(mut multipart: Multipart) -> Result<ApplicationFormBuilder> {
    let mut form = ApplicationFormBuilder::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("job_id") => form.job_id = Some(field.text().await?),
            Some("message") => form.message = Some(field.text().await?),
            Some("cv_provided") => form.cv_provided = Some(field.text().await?),
            Some("cv") => form.cv = Some(field.bytes().await?.to_vec()),
            _ => {}
        }
    }
    Ok(form)
}

#[utoipa::path(
    post,
    path = "/api/v1/job-applications",
    request_body(content = String, description = "Multipart form: job_id, cv (file), optional message", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Application stored, confirmation email queued", body = ApplicationResponse),
        (status = 400, description = "Missing job_id or cv"),
        (status = 403, description = "Already applied for this job"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = read_application_form(multipart).await?.into_new_application()?;
    let application = state.application_service.create_application(&user, form).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/v1/job-applications/user/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application of the caller", body = ApplicationResponse),
        (status = 403, description = "Application belongs to another user"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application_for_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get_application_for_user(&user, id).await?;
    Ok(Json(application))
}

#[utoipa::path(
    patch,
    path = "/api/v1/job-applications/user/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body(content = String, description = "Multipart form: optional message, cv, cv_provided", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Application updated", body = ApplicationResponse),
        (status = 403, description = "Application was already seen by the employer")
    )
)]
#[axum::debug_handler]
pub async fn update_application_for_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = read_application_form(multipart).await?.into_update()?;
    let application = state
        .application_service
        .update_application_for_user(&user, id, form)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    delete,
    path = "/api/v1/job-applications/user/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 204, description = "Application withdrawn"),
        (status = 403, description = "Application belongs to another user")
    )
)]
#[axum::debug_handler]
pub async fn delete_application_for_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.application_service.delete_application_for_user(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/job-applications/user",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, 5 to 15"),
        ("status" = Option<String>, Query, description = "Filter by application status")
    ),
    responses(
        (status = 200, description = "Applications of the caller", body = ListResponse<UserApplicationRow>)
    )
)]
#[axum::debug_handler]
pub async fn list_applications_for_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<UserApplicationsQuery>,
) -> Result<impl IntoResponse> {
    let page = query.pagination();
    page.validate()?;
    let applications = state
        .application_service
        .list_applications_for_user(&user, query.status()?, page)
        .await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/v1/job-applications/employer/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application, marked Seen on first read", body = ApplicationResponse),
        (status = 403, description = "Job belongs to another company"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application_for_employer(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .get_application_for_employer(&employer, id)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    patch,
    path = "/api/v1/job-applications/employer/{id}/status",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApplicationResponse),
        (status = 400, description = "Status not settable by employers"),
        (status = 403, description = "Job belongs to another company")
    )
)]
#[axum::debug_handler]
pub async fn change_application_status(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ChangeStatusRequest>,
) -> Result<impl IntoResponse> {
    let status = payload.parse()?;
    let application = state
        .application_service
        .change_status(&employer, id, status)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    get,
    path = "/api/v1/job-applications/employer",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, 5 to 15"),
        ("status" = Option<String>, Query, description = "Filter by application status"),
        ("job_id" = Option<i64>, Query, description = "Filter by job")
    ),
    responses(
        (status = 200, description = "Applications to the company's jobs", body = ListResponse<EmployerApplicationRow>)
    )
)]
#[axum::debug_handler]
pub async fn list_applications_for_employer(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    Query(query): Query<EmployerApplicationsQuery>,
) -> Result<impl IntoResponse> {
    let page = query.pagination();
    page.validate()?;
    let applications = state
        .application_service
        .list_applications_for_employer(&employer, query.status()?, query.job_id, page)
        .await?;
    Ok(Json(applications))
}
