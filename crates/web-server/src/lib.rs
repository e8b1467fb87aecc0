use analyzer::AnalysisReport;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
///
/// A report is immutable once built, so handlers only ever read it.
#[derive(Clone)]
pub struct AppState {
    pub report: Arc<AnalysisReport>,
}

/// Builds the JSON API over `report`.
pub fn router(report: AnalysisReport) -> Router {
    let app_state = Arc::new(AppState {
        report: Arc::new(report),
    });
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/report", get(handlers::get_report))
        .route("/api/symbols", get(handlers::list_symbols))
        .route("/api/symbols/:symbol/returns", get(handlers::get_returns))
        .route("/api/symbols/:symbol/volatility", get(handlers::get_volatility))
        .route("/api/symbols/:symbol/risk", get(handlers::get_risk))
        .route("/api/correlations", get(handlers::get_correlations))
        .route("/api/ranking", get(handlers::get_ranking))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves `report` on `addr` until the process is stopped.
pub async fn run_server(addr: SocketAddr, report: AnalysisReport) -> anyhow::Result<()> {
    let run_id = report.run_id();
    let app = router(report);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%run_id, "Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
