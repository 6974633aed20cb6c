//! # Axum Helpers
//!
//! Shared HTTP plumbing for the products service.
//!
//! - **[`errors`]**: `AppError` and the `ErrorResponse` envelope with stable error codes
//! - **[`extractors`]**: `UuidPath` and `ValidatedJson`
//! - **[`http`]**: CORS and security header middleware
//! - **[`server`]**: router assembly with OpenAPI docs, health endpoints, graceful shutdown
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::app_info;
//!
//! let router = create_router::<ApiDoc>(api_routes)?.merge(health_router(app_info!()));
//! create_production_app(router, &server_config, timeout, cleanup).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{UuidPath, ValidatedJson};
pub use http::{cors_layer, security_headers};
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};
