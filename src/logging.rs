use anyhow::Context as _;

/// Installs the stderr subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,tower_http=debug"))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "book2notion logging ready");
    Ok(())
}
