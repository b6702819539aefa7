//! scan-workflow-lsp: LSP server and checker for Black Duck scan workflows

use std::process::ExitCode;

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use scan_workflow_lsp::cli::{run_check, Args, Commands};
use scan_workflow_lsp::Backend;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging; stdout is reserved for the LSP transport and reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Some(Commands::Check { files, json }) => run_check(&files, json),
        Some(Commands::Serve) | None => {
            serve().await;
            ExitCode::SUCCESS
        }
    }
}

async fn serve() {
    tracing::info!("Starting scan-workflow-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
