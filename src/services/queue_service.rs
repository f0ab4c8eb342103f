//! Durable at-least-once task queue stored in the `tasks` table.
//!
//! Producers insert through whatever executor they hold, so a task enqueued
//! inside a transaction only becomes visible once that transaction commits.
//! Consumers claim due tasks with `FOR UPDATE SKIP LOCKED` and hold a lease;
//! a task whose lease runs out (crashed worker) is delivered again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::models::task::Task;

pub const QUEUE_CRITICAL: &str = "critical";
pub const QUEUE_DEFAULT: &str = "default";

pub const TASK_SEND_VERIFY_EMAIL: &str = "task:send_verify_email";
pub const TASK_SEND_CONFIRMATION_EMAIL: &str = "task:send_confirmation_email";
pub const TASK_INDEX_JOB: &str = "task:index_job";
pub const TASK_DELETE_JOB_INDEX: &str = "task:delete_job_index";

const LEASE: Duration = Duration::from_secs(5 * 60);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct TaskOptions {
    pub queue: &'static str,
    pub max_retry: i32,
    pub process_in: Duration,
}

impl TaskOptions {
    pub fn email(process_in: Duration) -> Self {
        Self {
            queue: QUEUE_CRITICAL,
            max_retry: 10,
            process_in,
        }
    }

    pub fn search_sync() -> Self {
        Self {
            queue: QUEUE_DEFAULT,
            max_retry: 25,
            process_in: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadSendVerifyEmail {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadSendConfirmationEmail {
    pub email: String,
    pub full_name: String,
    pub position: String,
    pub company_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadJobIndex {
    pub job_id: i64,
}

/// Producer side of the queue.
#[derive(Debug, Clone)]
pub struct TaskDistributor {
    email_delay: Duration,
}

impl Default for TaskDistributor {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl TaskDistributor {
    pub fn new(email_delay: Duration) -> Self {
        Self { email_delay }
    }

    pub async fn enqueue<'e, E, P>(
        &self,
        db: E,
        task_type: &str,
        payload: &P,
        opts: &TaskOptions,
    ) -> Result<i64>
    where
        E: PgExecutor<'e>,
        P: Serialize + Sync,
    {
        let payload = serde_json::to_value(payload)?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (queue, task_type, payload, max_retry, process_at)
            VALUES ($1, $2, $3, $4, NOW() + make_interval(secs => $5))
            RETURNING id
            "#,
        )
        .bind(opts.queue)
        .bind(task_type)
        .bind(payload)
        .bind(opts.max_retry)
        .bind(opts.process_in.as_secs_f64())
        .fetch_one(db)
        .await?;

        tracing::info!(
            task_id = id,
            task_type,
            queue = opts.queue,
            max_retry = opts.max_retry,
            "enqueued task"
        );
        Ok(id)
    }

    pub async fn distribute_task_send_verify_email<'e, E>(&self, db: E, email: &str) -> Result<i64>
    where
        E: PgExecutor<'e>,
    {
        let payload = PayloadSendVerifyEmail {
            email: email.to_string(),
        };
        self.enqueue(
            db,
            TASK_SEND_VERIFY_EMAIL,
            &payload,
            &TaskOptions::email(self.email_delay),
        )
        .await
    }

    pub async fn distribute_task_send_confirmation_email<'e, E>(
        &self,
        db: E,
        payload: &PayloadSendConfirmationEmail,
    ) -> Result<i64>
    where
        E: PgExecutor<'e>,
    {
        self.enqueue(
            db,
            TASK_SEND_CONFIRMATION_EMAIL,
            payload,
            &TaskOptions::email(self.email_delay),
        )
        .await
    }

    pub async fn distribute_task_index_job<'e, E>(&self, db: E, job_id: i64) -> Result<i64>
    where
        E: PgExecutor<'e>,
    {
        self.enqueue(
            db,
            TASK_INDEX_JOB,
            &PayloadJobIndex { job_id },
            &TaskOptions::search_sync(),
        )
        .await
    }

    pub async fn distribute_task_delete_job_index<'e, E>(&self, db: E, job_id: i64) -> Result<i64>
    where
        E: PgExecutor<'e>,
    {
        self.enqueue(
            db,
            TASK_DELETE_JOB_INDEX,
            &PayloadJobIndex { job_id },
            &TaskOptions::search_sync(),
        )
        .await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Permanent failure; the task is archived without further attempts.
    #[error("skip retry: {0}")]
    SkipRetry(String),

    #[error(transparent)]
    Failed(#[from] Error),
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        TaskError::SkipRetry(format!("malformed payload: {}", err))
    }
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn process_task(&self, task: &Task) -> std::result::Result<(), TaskError>;
}

/// Routes a task to the handler registered for its type.
#[derive(Default, Clone)]
pub struct TaskMux {
    handlers: HashMap<&'static str, Arc<dyn TaskHandler>>,
}

impl TaskMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(mut self, task_type: &'static str, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(task_type, handler);
        self
    }

    pub fn task_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub async fn dispatch(&self, task: &Task) -> std::result::Result<(), TaskError> {
        match self.handlers.get(task.task_type.as_str()) {
            Some(handler) => handler.process_task(task).await,
            None => Err(TaskError::SkipRetry(format!(
                "no handler registered for task type {}",
                task.task_type
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Retry { retried: i32, delay: Duration },
    Archived,
}

/// Backoff before retry number `retried` (1-based): 30s doubling, capped at one hour.
pub fn retry_delay(retried: i32) -> Duration {
    let exponent = retried.saturating_sub(1).clamp(0, 16) as u32;
    let secs = 30u64.saturating_mul(1u64 << exponent);
    Duration::from_secs(secs).min(MAX_RETRY_DELAY)
}

pub fn decide_outcome(
    result: &std::result::Result<(), TaskError>,
    retried: i32,
    max_retry: i32,
) -> TaskOutcome {
    match result {
        Ok(()) => TaskOutcome::Completed,
        Err(TaskError::SkipRetry(_)) => TaskOutcome::Archived,
        Err(TaskError::Failed(_)) => {
            let next = retried + 1;
            if next > max_retry {
                TaskOutcome::Archived
            } else {
                TaskOutcome::Retry {
                    retried: next,
                    delay: retry_delay(next),
                }
            }
        }
    }
}

/// Consumer side of the queue.
#[derive(Clone)]
pub struct TaskProcessor {
    pool: PgPool,
    mux: Arc<TaskMux>,
}

impl TaskProcessor {
    pub fn new(pool: PgPool, mux: TaskMux) -> Self {
        Self {
            pool,
            mux: Arc::new(mux),
        }
    }

    async fn claim_next(&self) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET state = 'active',
                process_at = NOW() + make_interval(secs => $1),
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM tasks
                WHERE state IN ('pending', 'active') AND process_at <= NOW()
                ORDER BY CASE queue WHEN 'critical' THEN 0 ELSE 1 END, process_at, id
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, queue, task_type, payload, state, retried, max_retry,
                      last_error, process_at, created_at
            "#,
        )
        .bind(LEASE.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    /// Processes at most one due task. Returns `false` when nothing was due.
    pub async fn run_once(&self) -> Result<bool> {
        let Some(task) = self.claim_next().await? else {
            return Ok(false);
        };

        let result = self.mux.dispatch(&task).await;
        let outcome = decide_outcome(&result, task.retried, task.max_retry);
        let error_text = result.as_ref().err().map(|e| e.to_string());

        match &outcome {
            TaskOutcome::Completed => {
                sqlx::query(
                    r#"UPDATE tasks SET state = 'completed', completed_at = NOW(), updated_at = NOW() WHERE id = $1"#,
                )
                .bind(task.id)
                .execute(&self.pool)
                .await?;
                tracing::info!(task_id = task.id, task_type = %task.task_type, "processed task");
            }
            TaskOutcome::Retry { retried, delay } => {
                sqlx::query(
                    r#"
                    UPDATE tasks
                    SET state = 'pending',
                        retried = $2,
                        last_error = $3,
                        process_at = NOW() + make_interval(secs => $4),
                        updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(task.id)
                .bind(*retried)
                .bind(&error_text)
                .bind(delay.as_secs_f64())
                .execute(&self.pool)
                .await?;
                tracing::warn!(
                    task_id = task.id,
                    task_type = %task.task_type,
                    retried,
                    retry_in_secs = delay.as_secs(),
                    error = error_text.as_deref().unwrap_or_default(),
                    "task failed, scheduled retry"
                );
            }
            TaskOutcome::Archived => {
                sqlx::query(
                    r#"UPDATE tasks SET state = 'archived', last_error = $2, updated_at = NOW() WHERE id = $1"#,
                )
                .bind(task.id)
                .bind(&error_text)
                .execute(&self.pool)
                .await?;
                tracing::error!(
                    task_id = task.id,
                    task_type = %task.task_type,
                    error = error_text.as_deref().unwrap_or_default(),
                    "task archived"
                );
            }
        }

        Ok(true)
    }

    /// Spawns `concurrency` worker loops that stop when `shutdown` is cancelled.
    pub fn start(&self, concurrency: usize, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        tracing::info!(
            concurrency,
            task_types = ?self.mux.task_types(),
            "starting task processor"
        );
        (0..concurrency.max(1))
            .map(|worker| {
                let processor = self.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    loop {
                        let pause = match processor.run_once().await {
                            Ok(true) => None,
                            Ok(false) => Some(Duration::from_millis(500)),
                            Err(e) => {
                                tracing::error!(worker, error = ?e, "task worker error");
                                Some(Duration::from_secs(1))
                            }
                        };
                        if shutdown.is_cancelled() {
                            break;
                        }
                        if let Some(pause) = pause {
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(pause) => {}
                            }
                        }
                    }
                    tracing::info!(worker, "task worker stopped");
                })
            })
            .collect()
    }
}

/// Drops finished tasks that completed before `before`.
pub async fn purge_completed_tasks<'e, E>(db: E, before: DateTime<Utc>) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let res = sqlx::query("DELETE FROM tasks WHERE state = 'completed' AND completed_at < $1")
        .bind(before)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
