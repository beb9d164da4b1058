#![allow(dead_code)]

use axum::body::Body;
use http::{Method, Request};
use std::sync::Arc;
use std::time::Duration;

use relayserver::db;
use relayserver::registry::DEFAULT_CONNECTION_TTL;
use relayserver::routes;
use relayserver::state::AppState;
use relayserver::store::SqliteStore;
use relayserver::transport::{LocalTransport, SessionTable, TransportProvider};

/// Test server that owns an in-memory SQLite pool and full AppState.
/// Each instance is isolated, so tests may run in parallel.
pub struct TestServer {
    pub state: AppState,
    pub store: SqliteStore,
}

impl TestServer {
    /// Server delivering into its own sockets.
    pub async fn new() -> Self {
        let sessions = SessionTable::new();
        let transports = Arc::new(LocalTransport::new(
            sessions.clone(),
            Duration::from_millis(500),
        ));
        Self::with_transports(transports, sessions, None).await
    }

    pub async fn with_transports(
        transports: Arc<dyn TransportProvider>,
        sessions: SessionTable,
        endpoint_override: Option<String>,
    ) -> Self {
        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("failed to create test pool");
        let store = SqliteStore::new(pool);

        let state = AppState::new(
            Arc::new(store.clone()),
            DEFAULT_CONNECTION_TTL,
            transports,
            sessions,
            endpoint_override,
            "test",
        );

        Self { state, store }
    }

    /// Returns an Axum Router wired to this server's state for `oneshot()` calls.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    /// Binds a TCP listener on port 0, spawns the server, and returns the address.
    pub async fn spawn(&self) -> String {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("127.0.0.1:{}", addr.port())
    }

    pub async fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .state
            .registry
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids
    }
}

pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

pub async fn test_app() -> axum::Router {
    TestServer::new().await.router()
}
