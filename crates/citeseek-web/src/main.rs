//! citeseek web server.
//!
//! Run with: cargo run -p citeseek-web

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = citeseek_common::Config::load()?;
    let bind_addr = config.server.bind_addr.clone();

    let state = citeseek_web::state::AppState::new(config);
    let app = citeseek_web::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("citeseek listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
