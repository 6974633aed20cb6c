use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    /// Carries the client-facing message, e.g. `Product with id shirt not found`
    #[error("{0}")]
    NotFound(String),

    /// Unique constraint violated; carries the store's detail text
    #[error("{0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Raw store failure. Never sent to clients as is.
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    pub fn not_found(term: impl std::fmt::Display) -> Self {
        ProductError::NotFound(format!("Product with id {} not found", term))
    }
}

impl From<DbErr> for ProductError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                ProductError::Conflict(postgres_detail(&err).unwrap_or(message))
            }
            _ => ProductError::Database(err.to_string()),
        }
    }
}

/// The `DETAIL` line of a Postgres error, e.g. `Key (slug)=(shirt) already exists.`
fn postgres_detail(err: &DbErr) -> Option<String> {
    let (DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e))) = err
    else {
        return None;
    };

    e.as_database_error()?
        .try_downcast_ref::<sea_orm::sqlx::postgres::PgDatabaseError>()?
        .detail()
        .map(str::to_string)
}

/// Conflicts surface as 400 with the store detail, matching the other client errors.
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(msg) => AppError::NotFound(msg),
            ProductError::Conflict(detail) => AppError::BadRequest(detail),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::Database(msg) => {
                tracing::error!(error = %msg, "Unhandled product store error");
                AppError::InternalServerError(
                    "Unexpected error, check the logs for more details".to_string(),
                )
            }
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
