use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::{
        common_dto::{LoginRequest, UpdatePasswordRequest},
        user_dto::{CreateUserRequest, UpdateUserRequest, VerifyEmailQuery, VerifyEmailResponse},
    },
    error::Result,
    middleware::auth::AuthUser,
    routes::extract::AppJson,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created, verification email queued", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = LoginUserResponse),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Email not verified"),
        (status = 404, description = "Unknown user")
    )
)]
#[axum::debug_handler]
pub async fn login_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.user_service.login_user(payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/verify-email",
    params(
        ("id" = i64, Query, description = "Verification record ID"),
        ("code" = String, Query, description = "Secret code from the email")
    ),
    responses(
        (status = 200, description = "Email verified", body = VerifyEmailResponse),
        (status = 400, description = "Invalid or expired code")
    )
)]
#[axum::debug_handler]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    state.user_service.verify_email(query.id, query.code).await?;
    Ok(Json(VerifyEmailResponse { is_verified: true }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse> {
    let response = state.user_service.get_user(user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.user_service.update_user(user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Old password does not match")
    )
)]
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.user_service.update_password(user, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/users",
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse> {
    state.user_service.delete_user(user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/users/employer-company-details/{email}",
    params(
        ("email" = String, Path, description = "Employer email")
    ),
    responses(
        (status = 200, description = "Employer with company", body = EmployerResponse),
        (status = 404, description = "Employer not found")
    )
)]
#[axum::debug_handler]
pub async fn get_employer_company_details(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    let response = state.employer_service.get_employer_by_email(&email).await?;
    Ok(Json(response))
}
