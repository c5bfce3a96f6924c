use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vault_router::Config;
use vault_router::metrics::RouterMetrics;
use vault_router::router::Router;

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let metrics = if config.metrics.enabled {
        Some(RouterMetrics::new(Arc::new(prometheus::Registry::new()))?)
    } else {
        None
    };
    let router = Router::with_config(&config.router, metrics)?;

    tracing::info!(
        token_backend_prefix = %config.router.token_backend_prefix,
        mounts = router.mounts().len(),
        "Router ready; waiting for mounts"
    );

    Ok(())
}
