use std::sync::Arc;

use chat_playground::config::load_config_with_env;
use chat_playground::observability::init_tracing;
use chat_playground::routing::dispatch::normalize_base_path;
use chat_playground::routing::serve;
use chat_playground::state::AppState;
use chat_playground::transport::HttpTransport;
use chat_playground::upstream::build_model_api;

fn main() {
    let config = load_config_with_env("config.yaml").unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        eprintln!("Copy 'config.example.yaml' to 'config.yaml' and adjust it, or remove the invalid file.");
        std::process::exit(1);
    });

    init_tracing(&config.features.log_level);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize Tokio runtime: {e}");
            std::process::exit(1);
        });

    runtime.block_on(async move {
        let host = config.server.host.clone();
        let port = config.server.port;
        let base_path = normalize_base_path(&config.server.base_path);

        let transport = HttpTransport::new(&config.server).unwrap_or_else(|e| {
            eprintln!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        });
        let upstream = build_model_api(&config.upstream, transport);
        let state = Arc::new(AppState::new(config, upstream));

        let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
            .await
            .unwrap_or_else(|err| {
                eprintln!("Failed to bind to {host}:{port}: {err}");
                std::process::exit(1);
            });

        tracing::info!(
            "chat-playground listening on {}:{} with base_path='{}' (mock_mode={})",
            host,
            port,
            base_path,
            state.upstream.is_mock()
        );
        serve(listener, state, Arc::from(base_path)).await;
    });
}
