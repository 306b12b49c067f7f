use std::{env, io, sync::Arc};

use practice_calendar::LayoutOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calendar_proxy::{cli, router, AppState, BookingClient, PeriodicTask};

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new(
        BookingClient::new(args.backend),
        LayoutOptions {
            row_height_pixels: args.row_height,
        },
        args.horizon_weeks,
        args.cache_capacity,
    ));

    let refresher = {
        let state = Arc::clone(&state);
        PeriodicTask::spawn(args.refresh, move || {
            let state = Arc::clone(&state);
            async move {
                if let Err(err) = state.refresh().await {
                    warn!("Booking refresh failed: {err}");
                }
            }
        })
    };

    let listener = TcpListener::bind(args.address).await?;
    info!("Listening at http://{}", args.address);

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    refresher.stop().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
