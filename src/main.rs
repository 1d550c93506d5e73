use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment and config.json still apply.
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    receipt_relay::cli::run().await
}
