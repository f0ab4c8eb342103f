pub mod assets;
pub mod employers;
pub mod extract;
pub mod health;
pub mod job_applications;
pub mod jobs;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::middleware::{auth::require_bearer_auth, cors::api_cors};
use crate::AppState;

/// CVs arrive as multipart bodies; everything else is far smaller.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(title = "Job Marketplace API"),
    paths(
        health::health,
        users::create_user,
        users::login_user,
        users::verify_email,
        users::get_user,
        users::update_user,
        users::update_password,
        users::delete_user,
        users::get_employer_company_details,
        employers::create_employer,
        employers::login_employer,
        employers::get_employer,
        employers::update_employer,
        employers::update_password,
        employers::delete_employer,
        employers::get_user_details,
        jobs::create_job,
        jobs::get_job,
        jobs::update_job,
        jobs::delete_job,
        jobs::list_jobs,
        jobs::list_jobs_by_company,
        jobs::search_jobs,
        jobs::list_jobs_matching_skills,
        job_applications::create_application,
        job_applications::get_application_for_user,
        job_applications::update_application_for_user,
        job_applications::delete_application_for_user,
        job_applications::list_applications_for_user,
        job_applications::get_application_for_employer,
        job_applications::change_application_status,
        job_applications::list_applications_for_employer,
        assets::download_cv,
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::create_user))
        .route("/users/login", post(users::login_user))
        .route("/users/verify-email", get(users::verify_email))
        .route(
            "/users/employer-company-details/:email",
            get(users::get_employer_company_details),
        )
        .route("/employers", post(employers::create_employer))
        .route("/employers/login", post(employers::login_employer))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/company", get(jobs::list_jobs_by_company))
        .route("/jobs/search", get(jobs::search_jobs))
        .route("/jobs/:id", get(jobs::get_job))
        .route("/openapi.json", get(openapi_json))
}

fn authenticated_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/password", patch(users::update_password))
        .route(
            "/employers",
            get(employers::get_employer)
                .patch(employers::update_employer)
                .delete(employers::delete_employer),
        )
        .route("/employers/password", patch(employers::update_password))
        .route(
            "/employers/user-details/:email",
            get(employers::get_user_details),
        )
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/match-skills", get(jobs::list_jobs_matching_skills))
        .route("/jobs/:id", patch(jobs::update_job).delete(jobs::delete_job))
        .route(
            "/job-applications",
            post(job_applications::create_application),
        )
        .route(
            "/job-applications/user",
            get(job_applications::list_applications_for_user),
        )
        .route(
            "/job-applications/user/:id",
            get(job_applications::get_application_for_user)
                .patch(job_applications::update_application_for_user)
                .delete(job_applications::delete_application_for_user),
        )
        .route(
            "/job-applications/employer",
            get(job_applications::list_applications_for_employer),
        )
        .route(
            "/job-applications/employer/:id",
            get(job_applications::get_application_for_employer),
        )
        .route(
            "/job-applications/employer/:id/status",
            patch(job_applications::change_application_status),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth))
}

/// The whole HTTP surface: `/api/v1`, CV downloads and the health check.
pub fn api_router(state: AppState) -> Router {
    let api = public_routes().merge(authenticated_routes(&state));

    let assets = Router::new()
        .route("/assets/cvs/:file", get(assets::download_cv))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .merge(assets)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
