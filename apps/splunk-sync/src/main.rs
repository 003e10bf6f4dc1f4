use tessera_connector::prelude::*;
use tessera_connector_splunk::{SplunkConfig, SplunkConnector};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging on stderr; stdout carries the graph
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tessera_connector_splunk=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = SplunkConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tracing::info!(
        cloud = config.cloud,
        verbose = config.verbose,
        deployments = config.tenants().len(),
        "starting Splunk sync"
    );

    let connector = SplunkConnector::new(&config).unwrap_or_else(|e| {
        eprintln!("Connector error: {e}");
        std::process::exit(1);
    });

    if let Err(e) = connector.validate().await {
        eprintln!("Credential check failed: {e}");
        std::process::exit(1);
    }

    let graph = SyncDriver::new(connector.resource_syncers())
        .run()
        .await
        .unwrap_or_else(|e| {
            eprintln!("Sync failed [{}]: {e}", e.error_code());
            std::process::exit(1);
        });

    match serde_json::to_string_pretty(&graph) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize graph: {e}");
            std::process::exit(1);
        }
    }
}
