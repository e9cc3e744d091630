use anyhow::Result;
use clap::Parser;
use md2pdf::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment (tool overrides may live in .env)
    dotenvy::dotenv().ok();

    // Logs go to stderr so `assemble` can stream Markdown on stdout.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
