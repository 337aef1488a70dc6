//! Axum router and HTTP handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use orbis_core::{AccountId, Participant};

use crate::commands::{self, Reply};
use crate::discord::{self, INTERACTION_COMMAND, INTERACTION_PING, RESPONSE_PONG};
use crate::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/events/message", post(message_event))
        .route("/discord/interactions", post(discord_interactions))
        .with_state(state)
        .layer(cors)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/status`: account count and the active economy settings.
async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.clone();
    let accounts = tokio::task::spawn_blocking(move || engine.store().list_all()).await;

    match accounts {
        Ok(Ok(accounts)) => {
            let total_balance: u128 = accounts.iter().map(|a| a.balance as u128).sum();
            let economy = state.engine.config();
            (
                StatusCode::OK,
                Json(json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "accounts": accounts.len(),
                    "total_balance": total_balance.to_string(),
                    "work_cooldown_secs": economy.cooldown.window_secs,
                    "rank_page_size": economy.ranking.page_size,
                })),
            )
        }
        Ok(Err(e)) => {
            warn!(error = %e, "status query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": e.to_string()})),
            )
        }
        Err(e) => {
            warn!(error = %e, "status task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
        }
    }
}

#[derive(Deserialize)]
struct MessageEvent {
    author_id: String,
    #[serde(default)]
    author_bot: bool,
    content: String,
}

/// `POST /api/events/message`: relay one chat message into the engine.
async fn message_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<MessageEvent>,
) -> impl IntoResponse {
    if let Some(expected) = &state.config.events_token {
        if bearer_token(&headers) != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid token"})));
        }
    }
    if event.author_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "author_id is required"})));
    }

    let author = Participant {
        id: AccountId::new(event.author_id),
        automated: event.author_bot,
    };
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        engine.record_message(&author, &event.content, Utc::now())
    })
    .await;

    match result {
        Ok(Ok(outcome)) => (
            StatusCode::OK,
            Json(json!({
                "qualified": outcome.is_some(),
                "outcome": outcome,
            })),
        ),
        Ok(Err(e)) => {
            warn!(error = %e, "message event failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": e.to_string()})),
            )
        }
        Err(e) => {
            warn!(error = %e, "message task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
        }
    }
}

/// `POST /discord/interactions`: handle Discord slash commands.
async fn discord_interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let public_key = match &state.config.discord.public_key {
        Some(k) => k.clone(),
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Discord integration not configured"})),
            );
        }
    };

    // Discord stops delivering to endpoints that accept bad signatures.
    let signature = headers
        .get("x-signature-ed25519")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let timestamp = headers
        .get("x-signature-timestamp")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !discord::verify_signature(&public_key, signature, timestamp, &body) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid signature"})));
    }

    let interaction: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid JSON"})));
        }
    };

    match interaction["type"].as_u64().unwrap_or(0) {
        INTERACTION_PING => (StatusCode::OK, Json(json!({"type": RESPONSE_PONG}))),
        INTERACTION_COMMAND => {
            let invocation = match commands::parse(&interaction) {
                Ok(inv) => inv,
                Err(msg) => {
                    debug!(%msg, "unparseable command");
                    return (StatusCode::OK, Json(Reply::private(msg).to_response()));
                }
            };
            debug!(user = %invocation.invoker.id, command = ?invocation.command, "slash command");

            let engine = state.engine.clone();
            let reply = tokio::task::spawn_blocking(move || {
                commands::execute(&engine, invocation, Utc::now())
            })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "command task failed");
                Reply::private("Something went wrong. Please try again.")
            });
            (StatusCode::OK, Json(reply.to_response()))
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Unsupported interaction type"})),
        ),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use ed25519_dalek::{Signer, SigningKey};
    use tower::ServiceExt;

    use orbis_core::MemoryAccountStore;
    use orbis_economy::{EconomyConfig, EconomyEngine};

    use crate::settings::{BotConfig, DiscordConfig};

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    fn state(events_token: Option<&str>) -> AppState {
        let config = BotConfig {
            events_token: events_token.map(str::to_string),
            discord: DiscordConfig {
                public_key: Some(hex::encode(signing_key().verifying_key().to_bytes())),
                ..DiscordConfig::default()
            },
            ..BotConfig::default()
        };
        AppState {
            engine: Arc::new(EconomyEngine::new(
                Arc::new(MemoryAccountStore::new()),
                EconomyConfig::default(),
            )),
            config: Arc::new(config),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn signed_interaction(body: &serde_json::Value) -> Request<Body> {
        let raw = serde_json::to_vec(body).unwrap();
        let timestamp = "1735700000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(&raw);
        let signature = hex::encode(signing_key().sign(&message).to_bytes());

        Request::post("/discord/interactions")
            .header("content-type", "application/json")
            .header("x-signature-ed25519", signature)
            .header("x-signature-timestamp", timestamp)
            .body(Body::from(raw))
            .unwrap()
    }

    fn message_request(body: serde_json::Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/events/message").header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn ping_answers_pong() {
        let app = router(state(None));
        let response = app
            .oneshot(signed_interaction(&json!({"type": 1})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["type"], 1);
    }

    #[tokio::test]
    async fn bad_signature_rejected() {
        let app = router(state(None));
        let mut request = signed_interaction(&json!({"type": 1}));
        request
            .headers_mut()
            .insert("x-signature-timestamp", "1".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn balance_command_replies() {
        let app = router(state(None));
        let interaction = json!({
            "type": 2,
            "member": { "user": { "id": "55" }, "permissions": "0" },
            "data": { "name": "balance" }
        });
        let response = app.oneshot(signed_interaction(&interaction)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["type"], 4);
        assert!(body["data"]["content"]
            .as_str()
            .unwrap()
            .starts_with("<@55> has **0** coins"));
    }

    #[tokio::test]
    async fn message_event_records_activity() {
        let state = state(None);
        let app = router(state.clone());
        let response = app
            .oneshot(message_request(
                json!({"author_id": "77", "content": "hello there"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["qualified"], true);
        assert!(body["outcome"]["activity_score"].as_f64().unwrap() >= 100.5);

        let account = state.engine.balance(&AccountId::from("77")).unwrap();
        assert!(account.last_active_date.is_some());
    }

    #[tokio::test]
    async fn short_message_not_qualified() {
        let app = router(state(None));
        let response = app
            .oneshot(message_request(json!({"author_id": "77", "content": "hi"}), None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["qualified"], false);
        assert!(body["outcome"].is_null());
    }

    #[tokio::test]
    async fn message_event_requires_token_when_configured() {
        let app = router(state(Some("s3cret")));
        let denied = app
            .clone()
            .oneshot(message_request(json!({"author_id": "1", "content": "hello"}), None))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = app
            .oneshot(message_request(
                json!({"author_id": "1", "content": "hello"}),
                Some("s3cret"),
            ))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_reports_accounts() {
        let state = state(None);
        state.engine.set_balance(&AccountId::from("a"), 10).unwrap();
        let app = router(state);
        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["accounts"], 1);
        assert_eq!(body["total_balance"], "10");
    }
}
