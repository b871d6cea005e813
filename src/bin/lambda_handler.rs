//! AWS Lambda handler for settling a claim
//!
//! Accepts a scenario as JSON (capital tranches, events, optional config) and
//! returns the settlement result with its audit trail. The index snapshot is
//! loaded once at cold start from `INDICES_PATH` (default data/indices).
//!
//! Supports Lambda Function URLs for direct HTTP access.

use indexed_settlement::{
    IndexStore, Scenario, ScenarioError, ScenarioRunner, SettlementResult, DEFAULT_INDICES_PATH,
};
use indexed_settlement::settlement::SettlementSummary;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Output from a settlement
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub name: String,
    pub summary: SettlementSummary,
    pub result: SettlementResult,
    pub execution_time_ms: u64,
}

fn with_cors(status: u16) -> lambda_http::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message });
    Ok(with_cors(status).body(Body::Text(body.to_string()))?)
}

fn json_response(body: &SettlementResponse) -> Result<Response<Body>, Error> {
    Ok(with_cors(200).body(Body::Text(serde_json::to_string(body)?))?)
}

/// Lambda handler function
async fn handler(runner: &ScenarioRunner, event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(with_cors(200).body(Body::Empty)?);
    }

    let body_str = match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => return error_response(400, "Request body must be a scenario"),
    };

    let scenario: Scenario = match serde_json::from_str(&body_str) {
        Ok(s) => s,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };

    let result = match runner.run(&scenario) {
        Ok(result) => result,
        Err(e @ (ScenarioError::NoTranches(_) | ScenarioError::Settlement { .. })) => {
            log::warn!("Settlement failed: {}", e);
            return error_response(422, &e.to_string());
        }
        Err(e) => return error_response(500, &e.to_string()),
    };

    let response = SettlementResponse {
        name: scenario.name,
        summary: result.summary(),
        result,
        execution_time_ms: start.elapsed().as_millis() as u64,
    };

    json_response(&response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let dir = std::env::var("INDICES_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_INDICES_PATH));
    let runner = Arc::new(ScenarioRunner::with_store(IndexStore::load_from(&dir)?));

    run(service_fn(move |event: Request| {
        let runner = Arc::clone(&runner);
        async move { handler(&runner, event).await }
    }))
    .await
}
