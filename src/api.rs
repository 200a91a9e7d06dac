/// HTTP fallback API
/// Read-only endpoints over the bot's persisted flat files, for when the
/// dashboard's streaming connection is unavailable.
///
/// The bot writes its state in snake_case; these handlers reshape it into
/// the client schema (camelCase). A missing file is a normal condition
/// (bot not started yet) and yields an empty 200 response; a corrupt file
/// is a 500 with the parse failure echoed back.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::models::{Action, BotState};
use crate::settings::MAX_ACTIONS;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: crate::settings::DEFAULT_API_PORT,
        }
    }
}

/// Shared state for API handlers
#[derive(Clone)]
struct AppState {
    state_file: PathBuf,
    actions_file: PathBuf,
    start_time: Instant,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

/// Bot state response: `connected` reflects whether the bot has persisted
/// a snapshot at all
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BotStateResponse {
    pub connected: bool,
    pub state: Option<BotState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Actions log response, most-recent-first
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ActionsResponse {
    pub actions: Vec<Action>,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: uptime,
    })
}

/// Bot state endpoint
/// Loads the bot's persisted snapshot and reshapes it into the client schema
async fn bot_state_handler(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let raw = match tokio::fs::read_to_string(&state.state_file).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // Bot not started yet; a normal condition, not an error
            return Json(BotStateResponse {
                connected: false,
                state: None,
                message: Some("Bot state not available yet".to_string()),
            })
            .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to read state file: {}", e)})),
            )
                .into_response();
        }
    };

    match serde_json::from_str::<BotState>(&raw) {
        Ok(parsed) => Json(BotStateResponse {
            connected: true,
            state: Some(parsed),
            message: None,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to parse state file: {}", e)})),
        )
            .into_response(),
    }
}

/// Actions log endpoint
/// Returns the most recent entries from the bot's append-only log,
/// most-recent-first
async fn actions_handler(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let raw = match tokio::fs::read_to_string(&state.actions_file).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Json(ActionsResponse { actions: vec![] }).into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to read actions file: {}", e)})),
            )
                .into_response();
        }
    };

    match serde_json::from_str::<Vec<Action>>(&raw) {
        Ok(log) => {
            let actions: Vec<Action> = log.into_iter().rev().take(MAX_ACTIONS).collect();
            Json(ActionsResponse { actions }).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to parse actions file: {}", e)})),
        )
            .into_response(),
    }
}

/// Creates the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/bot-state", get(bot_state_handler))
        .route("/api/actions", get(actions_handler))
        .with_state(state)
}

/// Starts the HTTP API server
/// Returns a JoinHandle that can be awaited for graceful shutdown
pub async fn start_api_server(
    config: ApiConfig,
    state_file: PathBuf,
    actions_file: PathBuf,
) -> Result<tokio::task::JoinHandle<()>, Box<dyn std::error::Error + Send + Sync>> {
    if !config.enabled {
        return Err("API is disabled".into());
    }

    let state = Arc::new(AppState {
        state_file,
        actions_file,
        start_time: Instant::now(),
    });

    let app = create_router(state);
    let addr = format!("127.0.0.1:{}", config.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("API server error: {}", e);
        }
    });

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    async fn start_test_server(
        port: u16,
        state_file: PathBuf,
        actions_file: PathBuf,
    ) -> tokio::task::JoinHandle<()> {
        let config = ApiConfig {
            enabled: true,
            port,
        };
        let handle = start_api_server(config, state_file, actions_file)
            .await
            .unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        handle
    }

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert!(config.enabled);
        assert_eq!(config.port, 8080);
    }

    #[tokio::test]
    async fn test_api_disabled_fails_to_start() {
        let config = ApiConfig {
            enabled: false,
            port: 0,
        };
        let result =
            start_api_server(config, PathBuf::from("x.json"), PathBuf::from("y.json")).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "API is disabled");
    }

    #[tokio::test]
    async fn test_health_endpoint_returns_valid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let handle = start_test_server(
            18090,
            dir.path().join("missing_state.json"),
            dir.path().join("missing_actions.json"),
        )
        .await;

        let response = reqwest::get("http://127.0.0.1:18090/health").await.unwrap();
        assert_eq!(response.status(), 200);

        let health: HealthResponse = response.json().await.unwrap();
        assert_eq!(health.status, "ok");

        handle.abort();
    }

    #[tokio::test]
    async fn test_bot_state_missing_file_is_ok_and_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let handle = start_test_server(
            18091,
            dir.path().join("missing_state.json"),
            dir.path().join("missing_actions.json"),
        )
        .await;

        let response = reqwest::get("http://127.0.0.1:18091/api/bot-state")
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: BotStateResponse = response.json().await.unwrap();
        assert!(!body.connected);
        assert!(body.state.is_none());
        assert!(body.message.is_some());

        handle.abort();
    }

    #[tokio::test]
    async fn test_bot_state_maps_snake_case_file_to_camel_case() {
        let dir = tempfile::TempDir::new().unwrap();
        let state_file = write_file(
            &dir,
            "monitor_state.json",
            r#"{
                "token_address": "So11111111111111111111111111111111111111112",
                "total_buys": 12,
                "total_sells": 4,
                "total_buy_volume": 1034.5,
                "last_price": 0.00000321,
                "last_holder_count": 87,
                "trades": [],
                "analysis_mode": "brief"
            }"#,
        );
        let handle =
            start_test_server(18092, state_file, dir.path().join("actions.json")).await;

        let response = reqwest::get("http://127.0.0.1:18092/api/bot-state")
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let raw = response.text().await.unwrap();
        assert!(raw.contains("\"totalBuys\":12"));
        assert!(raw.contains("\"lastHolderCount\":87"));
        assert!(!raw.contains("total_buys"));

        let body: BotStateResponse = serde_json::from_str(&raw).unwrap();
        assert!(body.connected);
        let state = body.state.unwrap();
        assert_eq!(state.total_buys, 12);
        assert_eq!(state.analysis_mode.as_deref(), Some("brief"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_bot_state_corrupt_file_is_500_with_detail() {
        let dir = tempfile::TempDir::new().unwrap();
        let state_file = write_file(&dir, "monitor_state.json", "{not valid json");
        let handle =
            start_test_server(18093, state_file, dir.path().join("actions.json")).await;

        let response = reqwest::get("http://127.0.0.1:18093/api/bot-state")
            .await
            .unwrap();
        assert_eq!(response.status(), 500);

        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("parse"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_actions_missing_file_is_ok_and_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let handle = start_test_server(
            18094,
            dir.path().join("monitor_state.json"),
            dir.path().join("missing_actions.json"),
        )
        .await;

        let response = reqwest::get("http://127.0.0.1:18094/api/actions")
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: ActionsResponse = response.json().await.unwrap();
        assert!(body.actions.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_actions_returns_most_recent_first_capped_at_50() {
        let dir = tempfile::TempDir::new().unwrap();
        // Append-order log with 60 entries; endpoint must return the newest
        // 50, newest first
        let entries: Vec<String> = (0..60)
            .map(|n| {
                format!(
                    r#"{{"timestamp": "2025-06-01T12:00:{:02}", "type": "analysis", "description": "entry {}"}}"#,
                    n % 60,
                    n
                )
            })
            .collect();
        let actions_file = write_file(
            &dir,
            "actions.json",
            &format!("[{}]", entries.join(",")),
        );
        let handle =
            start_test_server(18095, dir.path().join("monitor_state.json"), actions_file)
                .await;

        let response = reqwest::get("http://127.0.0.1:18095/api/actions")
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: ActionsResponse = response.json().await.unwrap();
        assert_eq!(body.actions.len(), 50);
        assert_eq!(body.actions.first().unwrap().description, "entry 59");
        assert_eq!(body.actions.last().unwrap().description, "entry 10");

        handle.abort();
    }

    #[tokio::test]
    async fn test_actions_corrupt_file_is_500() {
        let dir = tempfile::TempDir::new().unwrap();
        let actions_file = write_file(&dir, "actions.json", r#"{"not": "an array"}"#);
        let handle =
            start_test_server(18096, dir.path().join("monitor_state.json"), actions_file)
                .await;

        let response = reqwest::get("http://127.0.0.1:18096/api/actions")
            .await
            .unwrap();
        assert_eq!(response.status(), 500);

        handle.abort();
    }
}
