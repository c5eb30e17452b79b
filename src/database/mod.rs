pub mod profiles;

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

pub use profiles::{MemoryProfileStore, PgProfileStore, ProfileStore, StaffProfile};

/// Errors from the staff directory
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Build the directory pool without connecting; the first query opens a connection
pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, ProfileError> {
    let url = config
        .url
        .as_deref()
        .ok_or(ProfileError::ConfigMissing("DATABASE_URL"))?;

    url::Url::parse(url).map_err(|_| ProfileError::InvalidDatabaseUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(url)?;

    info!("Configured staff directory pool (max {} connections)", config.max_connections);
    Ok(pool)
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), ProfileError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_reported() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
        };
        assert!(matches!(connect_lazy(&config), Err(ProfileError::ConfigMissing(_))));
    }

    #[test]
    fn malformed_url_is_reported() {
        let config = DatabaseConfig {
            url: Some("not a url".to_string()),
            max_connections: 1,
        };
        assert!(matches!(connect_lazy(&config), Err(ProfileError::InvalidDatabaseUrl)));
    }
}
