use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookscout::logging::init().context("init logging")?;

    let args = bookscout::cli::Args::parse();
    tracing::debug!(?args, "parsed cli");

    let catalog =
        bookscout::catalog::GoogleBooksClient::from_env().context("build catalog client")?;
    let state = bookscout::app::AppState {
        sessions: bookscout::session::SessionRegistry::new(),
        catalog: Arc::new(catalog),
        max_upload_bytes: args.max_upload_bytes,
    };

    let app = bookscout::app::router(state);
    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app).await.context("serve app")?;
    Ok(())
}
