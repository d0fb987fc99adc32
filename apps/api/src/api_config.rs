use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use meterline_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_non_empty_env("DATABASE_URL")?;
        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => parse_max_connections(value.as_str())?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_max_connections(value: &str) -> Result<u32, AppError> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err(AppError::Validation(
            "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
        )),
        Ok(connections) => Ok(connections),
        Err(error) => Err(AppError::Validation(format!(
            "invalid DATABASE_MAX_CONNECTIONS: {error}"
        ))),
    }
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
