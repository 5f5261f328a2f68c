//! Load generator binary: publishes reproducible traffic against the queue
//! the consumer is draining, so a controller can be evaluated under
//! deterministic load.
//!
//! Usage:
//!   loadgen --config consumer.toml

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use prefetch_ctl::broker::{Broker, LapinBroker};
use prefetch_ctl::errors::AppError;
use prefetch_ctl::loadgen::run_experiment;
use prefetch_ctl::parameters::AllParameters;

#[derive(Parser, Debug)]
#[command(name = "loadgen")]
#[command(about = "Publishes load against the adaptive consumer's queue")]
struct Args {
    /// Path to the TOML configuration file; shares the consumer's
    /// `NumberOfClients`/`NumberOfRequests`/`Mean`/`StdDev`/`MessageSize`
    /// keys.
    #[arg(long, env = "PREFETCH_CTL_CONFIG", default_value = "consumer.toml")]
    config: PathBuf,
}

// Genuinely concurrent clients, no shared controller state to protect.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let args = Args::parse();
    let params = AllParameters::load(&args.config)?;

    info!(
        clients = params.number_of_clients,
        requests = params.number_of_requests,
        "starting load generator"
    );

    let host = params.rabbitmq_host.clone();
    let port = params.rabbitmq_port;
    let queue_name = params.queue_name.clone();

    run_experiment(
        params.number_of_clients,
        params.number_of_requests,
        params.message_size,
        params.mean,
        params.std_dev,
        &queue_name,
        {
            let queue_name = queue_name.clone();
            move || {
                let host = host.clone();
                let queue_name = queue_name.clone();
                async move {
                    let mut broker = LapinBroker::connect(&host, port).await?;
                    broker.declare_queue(&queue_name).await?;
                    Ok(broker)
                }
            }
        },
    )
    .await?;

    Ok(())
}
