//! Gateway binary: configuration from the environment, tracing to stderr.

use scholar_core::config::GatewayConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let config = GatewayConfig::from_env();
    if let Err(e) = scholar_gateway::server::serve(config).await {
        tracing::error!(error = %e, "gateway exited with error");
        std::process::exit(1);
    }
}
