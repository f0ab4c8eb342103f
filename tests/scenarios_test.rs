//! End-to-end flows against a live Postgres (`DATABASE_URL`). The search
//! scenario also needs Elasticsearch at `ELASTICSEARCH_ADDRESS`.
//!
//! Run with `cargo test -- --ignored`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::Method, http::StatusCode, Router};
use job_marketplace_backend::{
    database::jobs,
    routes::api_router,
    services::queue_service::{TaskProcessor, TASK_DELETE_JOB_INDEX},
    AppState,
};
use serde_json::{json, Value as JsonValue};

use common::{
    json_request, live_state, multipart_request, processor, release_tasks, send, unique_email,
    RecordingMailer,
};

struct Harness {
    state: AppState,
    app: Router,
    mailer: Arc<RecordingMailer>,
    processor: TaskProcessor,
}

async fn harness() -> Harness {
    let state = live_state().await;
    let mailer = Arc::new(RecordingMailer::default());
    let processor = processor(&state.pool, mailer.clone(), state.search_index.clone());
    let app = api_router(state.clone());
    Harness {
        state,
        app,
        mailer,
        processor,
    }
}

impl Harness {
    /// Drains due tasks until `done` holds or the attempts run out.
    async fn drain_until(&self, mut done: impl FnMut() -> bool) {
        for _ in 0..50 {
            if done() {
                return;
            }
            match self.processor.run_once().await {
                Ok(true) => {}
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
        assert!(done(), "queued work did not complete");
    }

    async fn mark_verified(&self, table: &str, email: &str) {
        sqlx::query(&format!(
            "UPDATE {} SET is_email_verified = TRUE WHERE email = $1",
            table
        ))
        .bind(email)
        .execute(&self.state.pool)
        .await
        .expect("mark verified");
    }

    async fn signup_user(&self, email: &str) -> StatusCode {
        let (status, _) = send(
            &self.app,
            json_request(
                Method::POST,
                "/api/v1/users",
                None,
                Some(json!({
                    "full_name": "Alice Doe",
                    "email": email,
                    "password": "hunter22",
                    "location": "Berlin",
                    "desired_job_title": "Backend Engineer",
                    "desired_industry": "Software",
                    "desired_salary_min": 100,
                    "desired_salary_max": 200,
                    "skills": [{ "name": "Go", "experience_years": 3 }]
                })),
            ),
        )
        .await;
        status
    }

    async fn login(&self, kind: &str, email: &str) -> (StatusCode, JsonValue) {
        send(
            &self.app,
            json_request(
                Method::POST,
                &format!("/api/v1/{}/login", kind),
                None,
                Some(json!({ "email": email, "password": "hunter22" })),
            ),
        )
        .await
    }

    async fn verified_user_token(&self) -> String {
        let email = unique_email("user");
        assert_eq!(self.signup_user(&email).await, StatusCode::CREATED);
        self.mark_verified("users", &email).await;
        let (status, body) = self.login("users", &email).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().expect("token").to_string()
    }

    async fn verified_employer_token(&self) -> String {
        let email = unique_email("employer");
        let (status, _) = send(
            &self.app,
            json_request(
                Method::POST,
                "/api/v1/employers",
                None,
                Some(json!({
                    "full_name": "Eve Employer",
                    "email": email,
                    "password": "hunter22",
                    "company_name": format!("Acme {}", uuid::Uuid::new_v4().simple()),
                    "industry": "Software",
                    "location": "Remote"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        self.mark_verified("employers", &email).await;
        let (status, body) = self.login("employers", &email).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().expect("token").to_string()
    }

    async fn create_job(&self, token: &str, title: &str) -> i64 {
        let (status, body) = send(
            &self.app,
            json_request(
                Method::POST,
                "/api/v1/jobs",
                Some(token),
                Some(json!({
                    "title": title,
                    "industry": "Software",
                    "description": "Build and run backend services",
                    "location": "Remote",
                    "salary_min": 100,
                    "salary_max": 200,
                    "requirements": "5 years",
                    "required_skills": ["Go", "Postgres"]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().expect("job id")
    }

    async fn apply(&self, token: &str, job_id: i64) -> (StatusCode, JsonValue) {
        send(
            &self.app,
            multipart_request(
                Method::POST,
                "/api/v1/job-applications",
                token,
                &[("job_id", job_id.to_string().as_str()), ("message", "Hire me")],
                Some(&b"%PDF-1.4 test cv"[..]),
            ),
        )
        .await
    }
}

/// Pulls `id` and `code` out of the link in a verification email.
fn verification_params(html: &str) -> (i64, String) {
    let start = html.find("verify-email?id=").expect("verify link") + "verify-email?id=".len();
    let rest = &html[start..];
    let end = rest.find('"').expect("link end");
    let query = rest[..end].replace("&amp;", "&");
    let (id, code) = query.split_once("&code=").expect("code param");
    (id.parse().expect("numeric id"), code.to_string())
}

#[tokio::test]
#[ignore]
async fn signup_verify_then_login() {
    let h = harness().await;
    let email = unique_email("alice");
    assert_eq!(h.signup_user(&email).await, StatusCode::CREATED);

    let (status, body) = h.login("users", &email).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "email is not verified");

    release_tasks(&h.state.pool, "task:send_verify_email", "email", &email).await;
    h.drain_until(|| !h.mailer.sent_to(&email).is_empty()).await;
    let sent = h.mailer.sent_to(&email);
    assert_eq!(sent[0].subject, "Welcome to Job Marketplace");
    let (id, code) = verification_params(&sent[0].html);

    let (status, body) = send(
        &h.app,
        json_request(
            Method::GET,
            &format!("/api/v1/users/verify-email?id={}&code={}", id, code),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "is_verified": true }));

    // a consumed code cannot be replayed
    let (status, _) = send(
        &h.app,
        json_request(
            Method::GET,
            &format!("/api/v1/users/verify-email?id={}&code={}", id, code),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h.login("users", &email).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert_eq!(body["user"]["email"], email.as_str());
}

#[tokio::test]
#[ignore]
async fn duplicate_email_across_account_kinds_is_forbidden() {
    let h = harness().await;
    let email = unique_email("dup");
    assert_eq!(h.signup_user(&email).await, StatusCode::CREATED);
    assert_eq!(h.signup_user(&email).await, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/v1/employers",
            None,
            Some(json!({
                "full_name": "Eve",
                "email": email,
                "password": "hunter22",
                "company_name": format!("Dup {}", uuid::Uuid::new_v4().simple()),
                "industry": "Software",
                "location": "Remote"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "user with this email already exists");
}

#[tokio::test]
#[ignore]
async fn created_job_becomes_searchable() {
    let h = harness().await;
    let token = h.verified_employer_token().await;
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let title = format!("Senior Go Engineer {}", tag);
    let job_id = h.create_job(&token, &title).await;

    h.state.search_index.ensure_index().await.expect("index");
    release_tasks(&h.state.pool, "task:index_job", "job_id", &job_id.to_string()).await;

    let mut found = false;
    for _ in 0..20 {
        let _ = h.processor.run_once().await;
        let (status, body) = send(
            &h.app,
            json_request(
                Method::GET,
                &format!("/api/v1/jobs/search?search=senior%20engineer%20{}&page=1&page_size=5", tag),
                None,
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        if body["items"]
            .as_array()
            .map(|items| items.iter().any(|j| j["id"] == job_id))
            .unwrap_or(false)
        {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    assert!(found, "job {} never showed up in search", job_id);
}

#[tokio::test]
#[ignore]
async fn second_application_to_the_same_job_is_forbidden() {
    let h = harness().await;
    let employer = h.verified_employer_token().await;
    let job_id = h.create_job(&employer, "Backend Engineer").await;
    let user = h.verified_user_token().await;

    let (status, body) = h.apply(&user, job_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["application_status"], "Applied");
    let cv_url = body["cv_url"].as_str().expect("cv url").to_string();

    let (status, body) = h.apply(&user, job_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "you have already applied for this job");

    let response = tower::ServiceExt::oneshot(
        h.app.clone(),
        json_request(Method::GET, &cv_url, Some(&user), None),
    )
    .await
    .expect("cv response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
}

#[tokio::test]
#[ignore]
async fn employer_read_marks_application_seen() {
    let h = harness().await;
    let employer = h.verified_employer_token().await;
    let job_id = h.create_job(&employer, "Platform Engineer").await;
    let user = h.verified_user_token().await;
    let (status, body) = h.apply(&user, job_id).await;
    assert_eq!(status, StatusCode::CREATED);
    let application_id = body["id"].as_i64().expect("application id");
    let uri = format!("/api/v1/job-applications/employer/{}", application_id);

    for _ in 0..2 {
        let (status, body) = send(&h.app, json_request(Method::GET, &uri, Some(&employer), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["application_status"], "Seen");
    }

    // seen applications are frozen for the applicant
    let (status, body) = send(
        &h.app,
        multipart_request(
            Method::PATCH,
            &format!("/api/v1/job-applications/user/{}", application_id),
            &user,
            &[("message", "one more thing")],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "job application can no longer be updated");

    let (status, body) = send(
        &h.app,
        json_request(
            Method::PATCH,
            &format!("{}/status", uri),
            Some(&employer),
            Some(json!({ "status": "Interviewing" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application_status"], "Interviewing");
}

#[tokio::test]
#[ignore]
async fn inverted_salary_patch_is_rejected() {
    let h = harness().await;
    let employer = h.verified_employer_token().await;
    let job_id = h.create_job(&employer, "Data Engineer").await;

    let (status, _) = send(
        &h.app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/jobs/{}", job_id),
            Some(&employer),
            Some(json!({ "salary_min": 1000, "salary_max": 5 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // only one bound given, checked against the stored other bound
    let (status, _) = send(
        &h.app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/jobs/{}", job_id),
            Some(&employer),
            Some(json!({ "salary_min": 1000 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn employer_cannot_use_user_endpoints() {
    let h = harness().await;
    let employer = h.verified_employer_token().await;
    let (status, body) = send(
        &h.app,
        json_request(Method::GET, "/api/v1/jobs/match-skills", Some(&employer), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "only users can access this endpoint");
}

#[tokio::test]
#[ignore]
async fn other_companies_cannot_touch_a_job() {
    let h = harness().await;
    let owner = h.verified_employer_token().await;
    let stranger = h.verified_employer_token().await;
    let job_id = h.create_job(&owner, "SRE").await;

    let (status, body) = send(
        &h.app,
        json_request(Method::DELETE, &format!("/api/v1/jobs/{}", job_id), Some(&stranger), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "job does not belong to the employer's company");

    let (status, _) = send(
        &h.app,
        json_request(Method::DELETE, &format!("/api/v1/jobs/{}", job_id), Some(&owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

async fn pending_index_deletes(pool: &sqlx::PgPool, job_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE task_type = $1 AND payload->>'job_id' = $2",
    )
    .bind(TASK_DELETE_JOB_INDEX)
    .bind(job_id.to_string())
    .fetch_one(pool)
    .await
    .expect("count tasks")
}

#[tokio::test]
#[ignore]
async fn job_delete_waits_for_in_flight_indexing() {
    let h = harness().await;
    let employer = h.verified_employer_token().await;
    let job_id = h.create_job(&employer, "Indexing Order Engineer").await;

    // what the index handler holds while it talks to the search engine
    let mut indexing = h.state.pool.begin().await.expect("begin");
    let row = jobs::get_job_with_company_for_share(&mut *indexing, job_id)
        .await
        .expect("share lock");
    assert!(row.is_some());

    let app = h.app.clone();
    let token = employer.clone();
    let delete = tokio::spawn(async move {
        send(
            &app,
            json_request(
                Method::DELETE,
                &format!("/api/v1/jobs/{}", job_id),
                Some(&token),
                None,
            ),
        )
        .await
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!delete.is_finished());
    assert_eq!(pending_index_deletes(&h.state.pool, job_id).await, 0);

    indexing.commit().await.expect("commit");
    let (status, _) = delete.await.expect("delete request");
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(pending_index_deletes(&h.state.pool, job_id).await, 1);
}
