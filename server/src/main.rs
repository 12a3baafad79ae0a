use anyhow::Context;
use tokio::net::TcpListener;
use todo_server::{Config, TodoStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let store = TodoStore::connect_lazy(&config.database_url)
        .with_context(|| format!("invalid DATABASE_URL {:?}", config.database_url))?;

    // A datastore that is down at startup is logged, not fatal. Requests
    // report the failure until it comes back, and the first one to reach it
    // creates the table.
    match store.ping().await {
        Ok(()) => {
            tracing::info!(url = %config.database_url, "connected to database");
            if let Err(error) = store.ensure_schema().await {
                tracing::error!(%error, "failed to create todos table");
            }
        }
        Err(error) => {
            tracing::error!(url = %config.database_url, %error, "unable to connect to database");
        }
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {addr}");
    todo_server::run(listener, store).await?;
    Ok(())
}
