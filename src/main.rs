use std::{net::SocketAddr, process};

use foodgram_sdk::{config::Config, routes::app, state::AppState};
use sqlx::postgres::PgPoolOptions;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration, {e}");
            process::exit(1);
        }
    };

    log::info!("Connecting to database...");
    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        log::error!("Failed to run migrations: {e}");
        process::exit(1);
    }

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(pool.clone(), &config);

    let server = match warp::serve(app(state))
        .try_bind_with_graceful_shutdown(address, shutdown_signal())
    {
        Ok((address, server)) => {
            log::info!("Server running on {address}");
            server
        }
        Err(e) => {
            log::error!("Failed to bind {address}: {e}");
            process::exit(1);
        }
    };

    server.await;

    pool.close().await;
    log::info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl+C, shutting down");
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
