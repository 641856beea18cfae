use clap::Parser;
use poem_pipeline::{Cli, LogContext, Runner};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let logs = LogContext::init(&cli.log_dir())?;
    info!("Starting poem processor, logging to {}", logs.path().display());

    let credentials = cli.credentials();
    let runner = Runner::new(cli.into_config(credentials)).with_logging(logs);

    let summary = match runner.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run failed: {:#}", e);
            return Err(e);
        }
    };

    match &summary.written {
        Some(path) => info!(
            "Done: {} loaded, {} selected, {} processed, {} skipped. Output: {}",
            summary.loaded,
            summary.selected,
            summary.processed,
            summary.skipped,
            path.display()
        ),
        None => info!("Done: nothing written"),
    }
    if let Some(path) = runner.log_path() {
        info!("Log file: {}", path.display());
    }
    Ok(())
}
