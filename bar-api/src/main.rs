use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bar_api::{app, AppState};
use bar_core::{pages, ChangeHub};
use bar_store::{app_config::Config, ChangeFeed, DbClient, StoreBookingRepository, StoreVisitorRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bar_api=debug,bar_store=debug,bar_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting bar admin on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    // Postgres NOTIFY -> per-view subscribers
    let feed = ChangeHub::new(config.feed.buffer);
    let change_feed = ChangeFeed::start(&db.pool, feed.clone())
        .await
        .context("Failed to start change feed")?;

    let settings = config.page_settings();
    let bookings = pages::bookings::page(
        Arc::new(StoreBookingRepository::new(db.pool.clone())),
        settings,
    );
    let visitor_repo = Arc::new(StoreVisitorRepository::new(db.pool.clone()));
    let visitors = pages::visitors::page(visitor_repo.clone(), visitor_repo, settings);

    bookings.refresh().await;
    visitors.page.refresh().await;

    let app_state = AppState {
        bookings: Arc::new(bookings),
        visitors: Arc::new(visitors),
        feed,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    change_feed.stop();
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
