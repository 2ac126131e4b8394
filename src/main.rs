//! crossplane-gen CLI binary

use anyhow::Result;

use crossplane_gen::cli::CliApp;
use crossplane_gen::DEFAULT_LOG_FILTER;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr so `output:stdout` stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let matches = CliApp::app().get_matches();

    // Run the CLI application
    CliApp::run(&matches).await
}
