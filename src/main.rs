use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use relayserver::config::{Config, StoreBackend, TransportBackend};
use relayserver::registry::ConnectionRegistry;
use relayserver::state::AppState;
use relayserver::store::{ConnectionStore, MemoryStore, SqliteStore};
use relayserver::transport::{CallbackProvider, LocalTransport, SessionTable, TransportProvider};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relayserver=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let store: Arc<dyn ConnectionStore> = match config.store {
        StoreBackend::Sqlite => {
            let pool = relayserver::db::create_pool(&config.database_url)
                .await
                .expect("failed to create database pool");
            Arc::new(SqliteStore::new(pool))
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };

    let send_timeout = Duration::from_millis(config.send_timeout_ms);
    let sessions = SessionTable::new();
    let transports: Arc<dyn TransportProvider> = match config.transport {
        TransportBackend::Local => Arc::new(LocalTransport::new(sessions.clone(), send_timeout)),
        TransportBackend::Callback => Arc::new(
            CallbackProvider::new(send_timeout).expect("failed to build callback http client"),
        ),
    };

    let ttl = chrono::Duration::seconds(config.connection_ttl_secs as i64);
    let state = AppState::new(
        store,
        ttl,
        transports,
        sessions,
        config.callback_endpoint.clone(),
        &config.stage,
    );

    spawn_reaper(
        state.registry.clone(),
        Duration::from_secs(config.reap_interval_secs.max(1)),
    );

    let app = relayserver::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let store = match config.store {
        StoreBackend::Sqlite => config.database_url.clone(),
        StoreBackend::Memory => "in-memory".to_string(),
    };
    let transport = match (&config.transport, &config.callback_endpoint) {
        (TransportBackend::Callback, Some(endpoint)) => format!("callback ({endpoint})"),
        (TransportBackend::Callback, None) => "callback (per-request endpoint)".to_string(),
        (TransportBackend::Local, _) => "local sockets".to_string(),
    };

    eprintln!();
    eprintln!("  \x1b[1;36mrelay\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mstore\x1b[0m        {store}");
    eprintln!("  \x1b[2mtransport\x1b[0m    {transport}");
    eprintln!("  \x1b[2mstage\x1b[0m        {}", config.stage);
    eprintln!("  \x1b[2mttl\x1b[0m          {}s", config.connection_ttl_secs);
    eprintln!();
}

/// Periodically drop connections whose TTL has passed.
fn spawn_reaper(registry: ConnectionRegistry, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match registry.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("reaped {n} expired connection(s)"),
                Err(e) => tracing::error!("connection reaper error: {:?}", e),
            }
        }
    });
}
