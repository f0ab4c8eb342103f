pub mod application_service;
pub mod employer_service;
pub mod housekeeping_service;
pub mod job_service;
pub mod mail_service;
pub mod queue_service;
pub mod search_service;
pub mod task_handlers;
pub mod user_service;
