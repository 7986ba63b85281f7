//! malshare-etl - fetch the MalShare sample list and store it, once.

use malshare_etl::{Config, Pipeline};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pipeline = match Config::from_env().and_then(Pipeline::new) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = pipeline.run().await;
    std::process::exit(outcome.exit_code());
}
