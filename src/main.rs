use std::error::Error;
use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use error::ServerError;

fn main() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg.logging).map_err(ServerError::Logger)?;

    // Worker count from config, otherwise one per CPU core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|w| *w > 0) {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(ServerError::Runtime)?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn Error>> {
    let addr = cfg.get_socket_addr()?;

    // The delegate is settled before anything is bound, so no request can
    // observe a half-initialized server
    let state = Arc::new(config::AppState::initialize(cfg).await);

    let listener =
        server::create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;

    logger::log_server_start(&addr, &state);
    logger::log_ready(addr.port());

    server::start_server_loop(listener, state).await;
    Ok(())
}
