use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use visitor_desk::config::Config;
use visitor_desk::router::{DeskState, desk_router};
use visitor_desk::service::{accounts, notifier::Notifier};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        uploads_dir = %cfg.basic.uploads_dir.display(),
        public_dir = %cfg.basic.public_dir.display(),
        loglevel = %cfg.basic.loglevel,
        sms = cfg.sms.api_key.is_some(),
        email = cfg.email.api_url.is_some(),
    );
    if cfg.basic.insecure_cookie {
        warn!("session cookie is sent without the Secure flag");
    }

    tokio::fs::create_dir_all(&cfg.basic.uploads_dir).await?;
    let storage = visitor_desk::db::connect(&cfg.basic.database_url).await?;
    accounts::seed_default_admin(&storage, &cfg.basic.admin_password).await?;

    let notifier = Notifier::new(&cfg)?;
    let addr = cfg.basic.listen_addr.clone();
    let state = DeskState::new(storage, notifier, Arc::new(cfg));
    let app = desk_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
