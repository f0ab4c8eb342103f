use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::{
        common_dto::{LoginRequest, UpdatePasswordRequest},
        employer_dto::{CreateEmployerRequest, UpdateEmployerRequest},
    },
    error::Result,
    middleware::auth::AuthEmployer,
    routes::extract::AppJson,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/employers",
    request_body = CreateEmployerRequest,
    responses(
        (status = 201, description = "Employer and company created", body = EmployerResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Email or company name already registered")
    )
)]
#[axum::debug_handler]
pub async fn create_employer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEmployerRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let employer = state.employer_service.create_employer(payload).await?;
    Ok((StatusCode::CREATED, Json(employer)))
}

#[utoipa::path(
    post,
    path = "/api/v1/employers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = LoginEmployerResponse),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Email not verified"),
        (status = 404, description = "Unknown employer")
    )
)]
#[axum::debug_handler]
pub async fn login_employer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.employer_service.login_employer(payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/employers",
    responses(
        (status = 200, description = "Current employer with company", body = EmployerResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn get_employer(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
) -> Result<impl IntoResponse> {
    let response = state.employer_service.get_employer(&employer).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/v1/employers",
    request_body = UpdateEmployerRequest,
    responses(
        (status = 200, description = "Employer and company updated", body = EmployerResponse),
        (status = 403, description = "Company name already taken")
    )
)]
#[axum::debug_handler]
pub async fn update_employer(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    AppJson(payload): AppJson<UpdateEmployerRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.employer_service.update_employer(employer, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/v1/employers/password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Old password does not match")
    )
)]
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.employer_service.update_password(employer, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/employers",
    responses(
        (status = 204, description = "Employer deleted, company removed with its last employer")
    )
)]
#[axum::debug_handler]
pub async fn delete_employer(
    State(state): State<AppState>,
    AuthEmployer(employer): AuthEmployer,
) -> Result<impl IntoResponse> {
    state.employer_service.delete_employer(employer).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/employers/user-details/{email}",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Caller is not an employer"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user_details(
    State(state): State<AppState>,
    AuthEmployer(_employer): AuthEmployer,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    let response = state.user_service.get_user_by_email(&email).await?;
    Ok(Json(response))
}
