pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    application_service::ApplicationService, employer_service::EmployerService,
    job_service::JobService, queue_service::TaskDistributor, search_service::SearchIndex,
    user_service::UserService,
};
use crate::utils::token::TokenMaker;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub token_maker: TokenMaker,
    pub search_index: SearchIndex,
    pub user_service: UserService,
    pub employer_service: EmployerService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self> {
        let token_maker = TokenMaker::new(&config.token_symmetric_key)?;
        let search_index = SearchIndex::new(&config.elasticsearch_address)?;
        let distributor = TaskDistributor::default();

        let user_service = UserService::new(
            pool.clone(),
            token_maker.clone(),
            config.access_token_duration,
            distributor.clone(),
        );
        let employer_service = EmployerService::new(
            pool.clone(),
            token_maker.clone(),
            config.access_token_duration,
            distributor.clone(),
        );
        let job_service = JobService::new(pool.clone(), distributor.clone(), search_index.clone());
        let application_service = ApplicationService::new(pool.clone(), distributor);

        Ok(Self {
            pool,
            config: Arc::new(config),
            token_maker,
            search_index,
            user_service,
            employer_service,
            job_service,
            application_service,
        })
    }
}
