//! Servidor HTTP de metascope.
//!
//! ```bash
//! metascope-server --bind 0.0.0.0:5000 --upload-dir /var/tmp/metascope
//! METASCOPE_MAX_UPLOAD_BYTES=1048576 metascope-server
//! ```

use clap::Parser;
use metascope::server::{ServerConfig, run_server};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn setup_tracing_subscriber() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metascope=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_tracing_subscriber();

    let config = ServerConfig::parse();

    match run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Server error: {error}");
            ExitCode::FAILURE
        }
    }
}
