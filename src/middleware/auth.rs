use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::database::{employers, users};
use crate::error::{Error, Result};
use crate::models::employer::Employer;
use crate::models::principal::Principal;
use crate::models::user::User;
use crate::utils::token::TokenPayload;
use crate::AppState;

const BEARER: &str = "bearer";

/// Extracts the token from `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(Error::Unauthorized(
            "authorization header is not provided".to_string(),
        ));
    };
    let invalid = || Error::Unauthorized("invalid authorization header format".to_string());
    let Ok(raw) = value.to_str() else {
        return Err(invalid());
    };
    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(BEARER) => Ok(token),
        (Some(scheme), Some(_), None) => Err(Error::Unauthorized(format!(
            "unsupported authorization type {}",
            scheme
        ))),
        _ => Err(invalid()),
    }
}

/// Verifies the bearer token and stores its payload in the request
/// extensions for the [`Principal`] extractor.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let payload = match bearer_token(req.headers()).and_then(|t| state.token_maker.verify_token(t)) {
        Ok(payload) => payload,
        Err(err) => return err.into_response(),
    };
    req.extensions_mut().insert(payload);
    next.run(req).await
}

/// Looks the token's email up among users first, then employers.
pub async fn resolve_principal(state: &AppState, payload: &TokenPayload) -> Result<Principal> {
    if let Some(user) = users::get_user_by_email(&state.pool, &payload.email).await? {
        return Ok(Principal::User(user));
    }
    if let Some(employer) = employers::get_employer_by_email(&state.pool, &payload.email).await? {
        return Ok(Principal::Employer(employer));
    }
    Err(Error::Unauthorized("account no longer exists".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let payload = parts
            .extensions
            .get::<TokenPayload>()
            .cloned()
            .ok_or_else(|| Error::Unauthorized("authorization header is not provided".to_string()))?;
        resolve_principal(state, &payload).await
    }
}

/// A principal that must be a job seeker.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        Principal::from_request_parts(parts, state)
            .await?
            .into_user()
            .map(AuthUser)
    }
}

/// A principal that must be an employer.
pub struct AuthEmployer(pub Employer);

#[async_trait]
impl FromRequestParts<AppState> for AuthEmployer {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        Principal::from_request_parts(parts, state)
            .await?
            .into_employer()
            .map(AuthEmployer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    fn message(err: Error) -> String {
        match err {
            Error::Unauthorized(msg) => msg,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn accepts_bearer_in_any_case() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert_eq!(
            message(bearer_token(&HeaderMap::new()).unwrap_err()),
            "authorization header is not provided"
        );
        assert_eq!(
            message(bearer_token(&headers("Bearer")).unwrap_err()),
            "invalid authorization header format"
        );
        assert_eq!(
            message(bearer_token(&headers("Bearer a b")).unwrap_err()),
            "invalid authorization header format"
        );
        assert_eq!(
            message(bearer_token(&headers("Basic dXNlcjpwYXNz")).unwrap_err()),
            "unsupported authorization type Basic"
        );
    }
}
