use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_driver: String,
    pub db_source: String,
    pub server_address: String,
    pub elasticsearch_address: String,
    pub token_symmetric_key: String,
    pub access_token_duration: Duration,
    pub email_sender_name: String,
    pub email_sender_address: String,
    pub email_sender_password: String,
    pub smtp_host: String,
    pub app_base_url: String,
    pub task_worker_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let db_driver = get_env("DB_DRIVER")?;
        if db_driver != "postgres" {
            return Err(Error::Config(format!(
                "Unsupported DB_DRIVER '{}', only 'postgres' is available",
                db_driver
            )));
        }

        let token_symmetric_key = get_env("TOKEN_SYMMETRIC_KEY")?;
        if token_symmetric_key.len() != 32 {
            return Err(Error::Config(
                "TOKEN_SYMMETRIC_KEY must be exactly 32 characters".to_string(),
            ));
        }

        let access_token_duration = parse_token_duration(&get_env("ACCESS_TOKEN_DURATION")?)?;

        let server_address = get_env("SERVER_ADDRESS")?;
        let app_base_url = env::var("APP_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}", server_address))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            db_driver,
            db_source: get_env("DB_SOURCE")?,
            server_address,
            elasticsearch_address: get_env("ELASTICSEARCH_ADDRESS")?,
            token_symmetric_key,
            access_token_duration,
            email_sender_name: env::var("EMAIL_SENDER_NAME")
                .unwrap_or_else(|_| "Job Marketplace".to_string()),
            email_sender_address: get_env("EMAIL_SENDER_ADDRESS")?,
            email_sender_password: get_env("EMAIL_SENDER_PASSWORD")?,
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            app_base_url,
            task_worker_concurrency: get_env_parse_or("TASK_WORKER_CONCURRENCY", 4)?,
        })
    }
}

/// Duration literals such as `15m`, `24h`, `1h30m` or `900s`.
fn parse_token_duration(raw: &str) -> Result<Duration> {
    let duration = humantime::parse_duration(raw.trim()).map_err(|e| {
        Error::Config(format!("Invalid value for ACCESS_TOKEN_DURATION: {}", e))
    })?;
    if duration.is_zero() {
        return Err(Error::Config(
            "ACCESS_TOKEN_DURATION must be positive".to_string(),
        ));
    }
    Ok(duration)
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_duration_accepts_compound_literals() {
        assert_eq!(parse_token_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_token_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_token_duration("1h30m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_token_duration(" 900s ").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_token_duration("500ms").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn token_duration_rejects_bad_literals() {
        for raw in ["", "15", "m15", "3x", "0s", "99999999999999999999h"] {
            assert!(
                matches!(parse_token_duration(raw), Err(Error::Config(_))),
                "{:?}",
                raw
            );
        }
    }
}
