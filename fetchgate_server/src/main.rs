use tokio_util::sync::CancellationToken;

use fetchgate_server::config::Config;
use fetchgate_server::server::AppState;
use fetchgate_server::{server, sweep};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.repo_dir).expect("failed to create repo directory");
    std::fs::create_dir_all(&config.archive_dir).expect("failed to create archive directory");
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::new(config);

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(sweep::run(
        state.config.archive_dir.clone(),
        cancel.clone(),
    ));

    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");

    log::info!(
        "fetchgated listening on http://{}  (set FETCHGATE_PORT to override)",
        addr
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutdown signal received");
        })
        .await
        .expect("server error");

    cancel.cancel();
    let _ = sweeper.await;
}
