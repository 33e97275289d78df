//! Web server module

mod middleware;
mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};
use tracing::info;

use crate::config::Config;
use crate::dashboard::SharedDashboard;
use middleware::RequestLoggingLayer;

pub struct AppState {
    pub dashboard: SharedDashboard,
}

/// Build the application router
pub fn router(dashboard: SharedDashboard, static_dir: &str) -> Router {
    let state = Arc::new(AppState { dashboard });

    // Panels are recomputed per request; never let a proxy serve a stale one
    let api = Router::new()
        .route("/sheets", get(routes::api_sheets))
        .route("/sheets/:sheet", get(routes::api_sheet))
        .route("/stores/:store_id", get(routes::api_store))
        .route("/states/:state", get(routes::api_state))
        .route("/families/:family", get(routes::api_family))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .nest("/api", api)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(RequestLoggingLayer::new())
        .with_state(state)
}

pub async fn start_server(config: &Config, dashboard: SharedDashboard) -> Result<()> {
    let app = router(dashboard, &config.server.static_dir);

    let addr = format!("{}:{}", config.server.host, config.server.http_port);
    info!("Web server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Dashboard;
    use crate::data::fixtures::tx;
    use crate::data::RawTable;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let raw = RawTable::from_records(vec![
            tx(1, "BREAD", 10.0),
            tx(3, "DAIRY", 4.0),
            tx(4, "BREAD", 6.0),
        ])
        .unwrap();
        router(Arc::new(Dashboard::new(raw)), "static")
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn overview_sheet() {
        let (status, body) = get_json("/api/sheets/sheet-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "overview");
        assert_eq!(body["cards"][0]["text"], "3 stores");
        assert_eq!(body["charts"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn selector_sheet_lists_options() {
        let (status, body) = get_json("/api/sheets/sheet-2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "store_selector");
        assert_eq!(body["selector"]["options"], serde_json::json!([1, 3, 4]));
        assert_eq!(body["selector"]["default"], 1);
    }

    #[tokio::test]
    async fn unknown_sheet_is_404() {
        let (status, body) = get_json("/api/sheets/sheet-9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("sheet-9"));
    }

    #[tokio::test]
    async fn store_panel() {
        let (status, body) = get_json("/api/stores/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aggregates"]["total_sales"], 10.0);
        assert_eq!(body["cards"][2]["text"], "D type");
    }

    #[tokio::test]
    async fn unknown_store_is_404() {
        let (status, body) = get_json("/api/stores/77").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no rows for store \"77\"");
    }

    #[tokio::test]
    async fn malformed_store_id_is_400() {
        let (status, _) = get_json("/api/stores/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn state_and_family_panels() {
        let (status, body) = get_json("/api/states/Pichincha").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aggregates"]["best_family"], "BREAD");

        let (status, body) = get_json("/api/families/DAIRY").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aggregates"]["rank_ordinal"], "2nd");
        assert_eq!(body["aggregates"]["best_state"], "Pichincha");
    }

    #[tokio::test]
    async fn health_reports_rows() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"], 3);
    }
}
