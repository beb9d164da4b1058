use clap::{Parser, Subcommand};
use std::process::ExitCode;

use relayserver::db;
use relayserver::store::{ConnectionStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "relay-admin")]
#[command(about = "Inspect and maintain the relay connection store")]
#[command(version)]
struct Args {
    /// SQLite database holding the connections table
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:relay.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List unexpired connections
    List,
    /// Show a single connection, expired or not
    Show { id: String },
    /// Remove a connection
    Remove { id: String },
    /// Delete every expired connection
    Purge,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relayserver=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let pool = match db::create_pool(&args.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("failed to open {}: {e}", args.database_url);
            return ExitCode::FAILURE;
        }
    };
    let store = SqliteStore::new(pool);

    let result = match args.command {
        Command::List => store.scan().await.map(|conns| {
            for conn in &conns {
                println!(
                    "{}\t{}\t{}\t{}",
                    conn.id,
                    conn.user_id.as_deref().unwrap_or("-"),
                    conn.connected_at.to_rfc3339(),
                    conn.expires_at.to_rfc3339()
                );
            }
            eprintln!("{} connection(s)", conns.len());
        }),
        Command::Show { id } => db::connections::get_connection(store.pool(), &id)
            .await
            .map(|conn| match conn {
                Some(conn) => println!(
                    "{}",
                    serde_json::to_string_pretty(&conn).unwrap_or_default()
                ),
                None => eprintln!("no connection {id}"),
            }),
        Command::Remove { id } => store.delete(&id).await.map(|()| eprintln!("removed {id}")),
        Command::Purge => store
            .purge_expired(chrono::Utc::now())
            .await
            .map(|n| eprintln!("purged {n} expired connection(s)")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
