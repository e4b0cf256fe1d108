//! Witness server: audit record storage with an operator search console.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use witness_server::{parse_line, Args, ConsoleCommand, Witness};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "witness_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting witness");

    let config = Args::parse().into_config()?;
    tracing::info!(
        data_path = %config.storage.path.display(),
        collection = %config.storage.collection,
        record_expiry = %config.storage.record_expiry,
        defaults_enabled = config.query.defaults_enabled,
        "configuration loaded"
    );

    // Running without durable storage is not an option.
    let witness = match Witness::open(&config) {
        Ok(witness) => witness,
        Err(e) => {
            tracing::error!(error = %e, "failed to open storage, refusing to start");
            return Err(e.into());
        }
    };
    witness.purge_expired().await?;

    let flusher = witness.start_flusher(&config);
    tracing::info!("ready, type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "failed to listen for ctrl+c");
                }
                tracing::info!("received shutdown signal");
                None
            }
        };
        let Some(line) = line else { break };

        match parse_line(&line) {
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => println!("{}", witness.execute(command).await),
            Ok(None) => {}
            Err(message) => println!("{message}"),
        }
    }

    flusher.join().await;
    witness.flush().await?;
    tracing::info!("shutdown complete");
    Ok(())
}
