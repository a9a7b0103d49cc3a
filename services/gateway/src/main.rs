mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod request_context;
mod router;
mod state;
mod user_store;

use accrual_client::AccrualClient;
use balance_service::BalanceService;
use config::Config;
use ledger_store::PgBalanceStore;
use order_service::OrderService;
use order_store::PgOrderStore;
use router::create_router;
use sqlx::PgPool;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use user_store::PgUserStore;
use workers::{BalanceWorkerPool, OrderWorkerPool, DEFAULT_WORKER_COUNT};

const QUEUE_CAPACITY: usize = 256;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_args_and_env(&std::env::args().collect::<Vec<_>>());
    tracing::info!(address = %config.run_address, "starting gophermart gateway");

    let pool = PgPool::connect(&config.database_uri).await?;

    let balance_store = Arc::new(PgBalanceStore::new(pool.clone()));
    balance_store.migrate().await?;
    let order_store = Arc::new(PgOrderStore::new(pool.clone()));
    order_store.migrate().await?;
    let user_store = Arc::new(PgUserStore::new(pool));
    user_store.migrate().await?;

    let (order_tx, order_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (balance_tx, balance_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (error_tx, mut error_rx) = mpsc::channel(QUEUE_CAPACITY);

    let accrual_client = Arc::new(AccrualClient::new(config.accrual_system_address.as_str()));
    let order_service = Arc::new(OrderService::new(
        order_store.clone(),
        accrual_client,
        order_tx,
    ));
    let balance_service = Arc::new(BalanceService::new(balance_store.clone()));

    let cancel = CancellationToken::new();

    let order_pool = OrderWorkerPool::new(
        order_service.clone(),
        order_rx,
        balance_tx,
        error_tx.clone(),
        cancel.clone(),
    );
    let balance_pool =
        BalanceWorkerPool::new(balance_service.clone(), balance_rx, error_tx, cancel.clone());

    let mut worker_handles = order_pool.spawn(DEFAULT_WORKER_COUNT);
    worker_handles.extend(balance_pool.spawn(DEFAULT_WORKER_COUNT));

    // A send to the error sink is fatal: log and terminate the process.
    tokio::spawn(async move {
        if let Some(e) = error_rx.recv().await {
            tracing::error!(error = %e, "fatal worker error, terminating");
            std::process::exit(1);
        }
    });

    let state = AppState::new(order_service, balance_service, user_store, config.secret_key);
    let app = create_router(state);

    let listener = TcpListener::bind(config.run_address.as_str()).await?;
    tracing::info!(address = %config.run_address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP listener closed, draining workers");
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    cancel.cancel();
    for handle in worker_handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
