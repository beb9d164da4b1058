#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportBackend {
    /// Deliver into sockets held by this process.
    Local,
    /// Deliver through an external gateway's connection-management API.
    Callback,
}

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub store: StoreBackend,
    pub connection_ttl_secs: u64,
    pub reap_interval_secs: u64,
    pub transport: TransportBackend,
    pub callback_endpoint: Option<String>,
    pub stage: String,
    pub send_timeout_ms: u64,
}

pub const DEFAULT_CONNECTION_TTL_SECS: u64 = 24 * 60 * 60;
/// Five years. Larger values overflow timestamp arithmetic.
pub const MAX_CONNECTION_TTL_SECS: u64 = 5 * 365 * 24 * 60 * 60;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let store = match std::env::var("RELAY_STORE")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Sqlite,
        };

        let transport = match std::env::var("RELAY_TRANSPORT")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "callback" => TransportBackend::Callback,
            _ => TransportBackend::Local,
        };

        let callback_endpoint = std::env::var("RELAY_CALLBACK_ENDPOINT")
            .ok()
            .filter(|v| !v.is_empty());

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(39100),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:relay.db?mode=rwc".to_string()),
            store,
            connection_ttl_secs: Some(env_u64(
                "RELAY_CONNECTION_TTL_SECS",
                DEFAULT_CONNECTION_TTL_SECS,
            ))
            .filter(|secs| (1..=MAX_CONNECTION_TTL_SECS).contains(secs))
            .unwrap_or(DEFAULT_CONNECTION_TTL_SECS),
            reap_interval_secs: env_u64("RELAY_REAP_INTERVAL_SECS", 60),
            transport,
            callback_endpoint,
            stage: std::env::var("RELAY_STAGE").unwrap_or_else(|_| "dev".to_string()),
            send_timeout_ms: env_u64("RELAY_SEND_TIMEOUT_MS", 5000),
        }
    }
}
