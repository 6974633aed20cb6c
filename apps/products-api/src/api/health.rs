//! Readiness endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use axum_helpers::{run_health_checks, HealthCheckFuture};
use database::postgres::{check_health, DatabaseConnection};
use serde_json::Value;

type ReadyResponse = (StatusCode, Json<Value>);

async fn ready(State(db): State<DatabaseConnection>) -> Result<ReadyResponse, ReadyResponse> {
    let postgres: HealthCheckFuture<'_> =
        Box::pin(async { check_health(&db).await.map_err(|e| e.to_string()) });

    run_health_checks(vec![("postgres", postgres)]).await
}

/// `/ready`: 200 while Postgres answers, 503 otherwise
pub fn router(db: DatabaseConnection) -> Router {
    Router::new().route("/ready", get(ready)).with_state(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    async fn call_ready(db: DatabaseConnection) -> (StatusCode, Value) {
        let response = router(db)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ready_when_database_answers() {
        let row: BTreeMap<&str, sea_orm::Value> = BTreeMap::from([("?column?", 1i32.into())]);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let (status, body) = call_ready(db).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["postgres"], "connected");
    }

    #[tokio::test]
    async fn test_not_ready_when_database_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection refused".to_string())])
            .into_connection();

        let (status, body) = call_ready(db).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["postgres"], "disconnected");
    }
}
