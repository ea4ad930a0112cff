use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use parts_order::catalog::MemorySink;
use parts_order::csv::{load_catalog, read_commands, write_orders};
use parts_order::{OrderSession, SessionConfig};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(catalog_dir), Some(script)) = (args.next(), args.next()) else {
        eprintln!("usage: parts-order <catalog-dir> <script.csv>");
        return ExitCode::FAILURE;
    };

    if !script.ends_with(".csv") {
        warn!(script, "script file seems to not be a csv file");
    }

    let catalog = match load_catalog(&catalog_dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let commands = match read_commands(script.clone()) {
        Ok(commands) => commands,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = SessionConfig::default();
    if let Some(ms) = env::var("PARTS_FETCH_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        config.fetch_timeout = Some(Duration::from_millis(ms));
    }

    let sink = Arc::new(MemorySink::new());
    let mut session = OrderSession::with_config(Arc::new(catalog), sink.clone(), config);
    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    session.run(ReceiverStream::new(command_receiver)).await;

    let orders = sink.orders().await;
    if let Err(e) = write_orders(std::io::stdout().lock(), &orders) {
        error!("failed to write orders: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
