use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;

use book2notion::cli::ServerArgs;
use book2notion::notion::NotionClient;
use book2notion::server::{AppState, router};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    book2notion::logging::init()?;

    let args = ServerArgs::parse();
    tracing::info!(?args, "starting book2notion-server");

    let search_config = args.search.to_config().context("search configuration")?;
    let notion_config = args.notion.to_config().context("notion configuration")?;
    let client = args.http.build_client()?;

    let state = AppState {
        search: book2notion::search::from_config(&search_config, client.clone()),
        notion: Arc::new(NotionClient::new(client, &notion_config)),
    };
    let app = router(state, &args.public_dir);

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(%addr, backend = ?args.search.search_backend, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
