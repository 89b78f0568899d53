use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use kennel::{CliArgs, Config, DatabaseStorage, WebServer};
use log::{error, info};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default level
    // https://docs.rs/env_logger/latest/env_logger/
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let args = CliArgs::parse();

    info!("Loading configuration");
    let config = Config::load(&args).unwrap_or_else(|e| {
        error!("Unable to load configuration: {}", e);
        std::process::exit(1);
    });
    let addr = config.socket_addr().unwrap_or_else(|e| {
        error!("Invalid listen address: {}", e);
        std::process::exit(1);
    });

    let storage = DatabaseStorage::new_file(&config.database_path)
        .await
        .unwrap_or_else(|e| {
            error!(
                "Unable to open database {}: {}, exiting...",
                config.database_path.display(),
                e
            );
            std::process::exit(1);
        });

    let server = WebServer::new(Arc::new(storage), config.paging());
    server.start(addr).await;
}
