use analyzer::AnalysisReport;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{Duration, NaiveDate};
use configuration::Config;
use core_types::RawObservation;
use serde_json::Value;
use std::collections::HashMap;
use tower::ServiceExt;

fn report() -> AnalysisReport {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let series = |base: f64, pattern: [f64; 4]| -> Vec<RawObservation> {
        let mut price = base;
        (0..40)
            .map(|i| {
                if i > 0 {
                    price *= 1.0 + pattern[i % 4];
                }
                RawObservation::new(start + Duration::days(i as i64), price)
            })
            .collect()
    };

    let mut raw = HashMap::new();
    raw.insert("AAPL".to_string(), series(150.0, [0.01, -0.004, 0.006, -0.008]));
    raw.insert("JPM".to_string(), series(140.0, [-0.003, 0.007, -0.009, 0.005]));

    let mut config = Config::default();
    config.analysis.volatility_window = 10;
    AnalysisReport::build_from_raw(&["AAPL", "JPM"], &raw, &config).unwrap()
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = web_server::router(report())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_ok() {
    let response = web_server::router(report())
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn symbols_are_listed_in_request_order() {
    let (status, json) = get("/api/symbols").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["symbol"], "AAPL");
    assert_eq!(json[0]["sector"], "technology");
    assert_eq!(json[1]["symbol"], "JPM");
    assert_eq!(json[1]["returns"], 39);
}

#[tokio::test]
async fn returns_can_be_narrowed_by_date() {
    let (status, json) = get("/api/symbols/AAPL/returns?start=2023-01-10&end=2023-01-14").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["observations"].as_array().unwrap().len(), 5);
    assert_eq!(json["observations"][0]["date"], "2023-01-10");
}

#[tokio::test]
async fn volatility_reports_its_window() {
    let (status, json) = get("/api/symbols/jpm/volatility").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["symbol"], "JPM");
    assert_eq!(json["window"], 10);
    assert_eq!(json["observations"].as_array().unwrap().len(), 39 - 10 + 1);
}

#[tokio::test]
async fn unknown_symbol_is_404_with_kind() {
    let (status, json) = get("/api/symbols/TSLA/risk").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
    assert!(json["error"].as_str().unwrap().contains("TSLA"));
}

#[tokio::test]
async fn inverted_range_is_400() {
    let (status, json) = get("/api/symbols/AAPL/returns?start=2023-02-01&end=2023-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_input");
}

#[tokio::test]
async fn correlations_are_symmetric() {
    let (status, json) = get("/api/correlations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["symbols"], serde_json::json!(["AAPL", "JPM"]));
    assert_eq!(json["coefficients"][0][1], json["coefficients"][1][0]);
    assert_eq!(json["coefficients"][0][0], 1.0);
}

#[tokio::test]
async fn risk_and_full_report_are_served() {
    let (status, risk) = get("/api/symbols/AAPL/risk").await;
    assert_eq!(status, StatusCode::OK);
    assert!(risk["max_drawdown"].as_f64().unwrap() >= 0.0);

    let (status, report) = get("/api/report").await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["run_id"].is_string());
    assert_eq!(report["ranking"].as_array().unwrap().len(), 2);
}
