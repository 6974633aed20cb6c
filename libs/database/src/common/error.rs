/// Errors raised while connecting to, migrating or probing the store
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sea_orm::DbErr),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_failed_message() {
        let err = DatabaseError::HealthCheckFailed("timeout".to_string());
        assert_eq!(err.to_string(), "Health check failed: timeout");
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_from_db_err() {
        let err: DatabaseError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, DatabaseError::Postgres(_)));
        assert!(err.to_string().starts_with("PostgreSQL error"));
    }
}
