//! `lambda-gateway` — entry point.
//!
//! Reads ambient configuration from the environment (`GATEWAY__*`, see
//! `gateway_kernel::config`) and an optional base file given by
//! `GATEWAY_CONFIG_FILE`, then starts the axum-based gateway service.
//!
//! The route table (`lambdas`) carries closures for dynamic cache/auth
//! fields and so cannot round-trip through flat config the way scalar
//! settings can; integrators embed this crate and build their own
//! `GatewayConfig` via `GatewayConfig::with_lambda`. This binary ships a
//! minimal single-route default so `cargo run` has something to serve.

use gateway::server::GatewayServer;
use gateway_kernel::lambda::LambdaDefaults;
use gateway_kernel::{CacheTuning, GatewayConfig, LambdaSpec};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lambda_gateway=info".parse().unwrap()))
        .init();

    let config_file = std::env::var("GATEWAY_CONFIG_FILE").ok();
    let settings = match gateway_kernel::config::load_env_settings(config_file.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let mut gateway_config = GatewayConfig::new(settings.log_group)
        .with_port(settings.port)
        .with_cache_prefix(settings.cache_prefix)
        .with_invoker_url(settings.invoker_url)
        .with_cache_tuning(CacheTuning {
            ttl_secs: settings.cache_ttl,
            ttr_secs: settings.cache_ttr,
            timeout_ms: settings.cache_timeout,
        })
        .with_lambda("/echo", LambdaSpec::new("echo").with_defaults(LambdaDefaults::default()));

    if let Some(url) = settings.redis_url {
        gateway_config = gateway_config.with_redis_url(url);
    }
    if let Some(url) = settings.log_sink_url {
        gateway_config = gateway_config.with_log_sink_url(url);
    }

    tracing::info!(port = gateway_config.port, "lambda gateway configuration loaded");

    if let Err(e) = GatewayServer::new(gateway_config).start().await {
        eprintln!("gateway error: {e}");
        std::process::exit(1);
    }
}
