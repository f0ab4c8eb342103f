//! Relational store. Query functions take any `PgExecutor`, so the same call
//! runs against the pool or inside a transaction opened by [`tx::exec_tx`].

pub mod accounts;
pub mod companies;
pub mod employers;
pub mod job_applications;
pub mod job_skills;
pub mod jobs;
pub mod pool;
pub mod tx;
pub mod user_skills;
pub mod users;
pub mod verify_emails;
