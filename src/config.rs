use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub session_cookie_name: String,
    pub session_max_age_hours: i64,
    pub cookie_secure: bool,
    pub cors_allowed_origins: Vec<String>,
    pub seed_demo_data: bool,
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = parse_or(&lookup, "PORT", 8000u16)?;
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        if database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        let session_cookie_name =
            lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| "sewa_session".to_string());
        if session_cookie_name.is_empty()
            || !session_cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Invalid {
                key: "SESSION_COOKIE_NAME",
                value: session_cookie_name,
            });
        }

        let session_max_age_hours = parse_or(&lookup, "SESSION_MAX_AGE_HOURS", 24i64)?;
        if session_max_age_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_MAX_AGE_HOURS",
                value: session_max_age_hours.to_string(),
            });
        }

        let cookie_secure = parse_or(&lookup, "COOKIE_SECURE", false)?;
        let seed_demo_data = parse_or(&lookup, "SEED_DEMO_DATA", false)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            database_url,
            port,
            database_max_connections,
            session_cookie_name,
            session_max_age_hours,
            cookie_secure,
            cors_allowed_origins,
            seed_demo_data,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Config {
        Config {
            database_url: "postgres://localhost/sajilo_sewa_test".to_string(),
            port: 8000,
            database_max_connections: 1,
            session_cookie_name: "sewa_session".to_string(),
            session_max_age_hours: 24,
            cookie_secure: false,
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            seed_demo_data: false,
        }
    }
}
