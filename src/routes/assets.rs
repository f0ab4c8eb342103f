use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};

use crate::{
    error::{Error, Result},
    models::principal::Principal,
    AppState,
};

/// `"<id>.pdf"` to the application id.
pub fn parse_cv_file_name(file: &str) -> Option<i64> {
    file.strip_suffix(".pdf")?
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
}

#[utoipa::path(
    get,
    path = "/assets/cvs/{file}",
    params(
        ("file" = String, Path, description = "<application_id>.pdf")
    ),
    responses(
        (status = 200, description = "CV bytes", body = String, content_type = "application/pdf"),
        (status = 403, description = "Neither the applicant nor the owning employer"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn download_cv(
    State(state): State<AppState>,
    principal: Principal,
    Path(file): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_cv_file_name(&file)
        .ok_or_else(|| Error::NotFound("cv not found".to_string()))?;
    let cv = state.application_service.get_cv(&principal, id).await?;
    let disposition = format!("inline; filename=\"cv_{}.pdf\"", id);
    Ok((
        [(CONTENT_TYPE, "application/pdf".to_string()), (CONTENT_DISPOSITION, disposition)],
        cv,
    ))
}
