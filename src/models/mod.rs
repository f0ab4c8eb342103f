pub mod company;
pub mod employer;
pub mod job;
pub mod job_application;
pub mod job_skill;
pub mod principal;
pub mod task;
pub mod user;
pub mod user_skill;
pub mod verify_email;
