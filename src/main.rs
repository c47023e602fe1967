use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = std::env::var("DISCOGRAPH_HTTP_PORT").unwrap_or_else(|_| "7878".to_string());
    let admin_user = std::env::var("DISCOGRAPH_ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    info!(
        target: "discograph",
        "Discograph starting: RUST_LOG='{}', http_port={}, admin_user='{}'",
        rust_log, http_port, admin_user
    );

    discograph::server::run().await
}
