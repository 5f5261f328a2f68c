//! Adaptive consumer binary: loads the parameter bundle, builds the
//! configured controller, and drives one of the four execution modes
//! against a live AMQP-0-9-1 broker.
//!
//! Usage:
//!   consumer --config consumer.toml
//!
//! Environment:
//!   PREFETCH_CTL_* overrides anything set in the config file
//!   (`AllParameters::load`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use prefetch_ctl::broker::{Broker, LapinBroker};
use prefetch_ctl::controllers;
use prefetch_ctl::errors::AppError;
use prefetch_ctl::parameters::AllParameters;
use prefetch_ctl::sampler::{drive_closed_loop, drive_monitored_open_loop, drive_open_loop, warmup, Loop};
use prefetch_ctl::shared::ExecutionMode;
use prefetch_ctl::sink::SampleSink;

#[derive(Parser, Debug)]
#[command(name = "consumer")]
#[command(about = "Adaptive prefetch-window consumer for a message-broker queue")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "PREFETCH_CTL_CONFIG", default_value = "consumer.toml")]
    config: PathBuf,

    /// Drain a fixed backlog at prefetch 0 before the first sample.
    #[arg(long)]
    warmup: bool,
}

// Single-threaded cooperative runtime: the sampler's `Loop` and the
// `Broker` it drives are deliberately not `Send`-shared across OS threads.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // No retries, no backoff: every fatal error here terminates the
            // process after one diagnostic identifying the failing site.
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let args = Args::parse();

    let params = AllParameters::load(&args.config)?;
    info!(controller = %params.controller_type, execution = ?params.execution_type, "loaded parameters");

    let mut broker = LapinBroker::connect(&params.rabbitmq_host, params.rabbitmq_port).await?;
    broker.declare_queue(&params.queue_name).await?;
    broker.start_consuming(&params.queue_name).await?;
    broker.set_prefetch(params.pc.round() as u32).await?;

    if args.warmup {
        warmup(&mut broker, params.pc).await?;
    }

    match params.execution_type {
        ExecutionMode::OpenLoop => Ok(drive_open_loop(&mut broker).await?),
        ExecutionMode::MonitoredOpenLoop => {
            Ok(drive_monitored_open_loop(&mut broker, params.monitor_time).await?)
        }
        ExecutionMode::ClosedLoop | ExecutionMode::ExperimentClosedLoop => {
            let scheduled = params.execution_type == ExecutionMode::ExperimentClosedLoop;
            let controller = controllers::build(&params.controller_type, &params)?;
            let state = Loop::new(controller, &params, scheduled);

            let mut sink = SampleSink::create(std::path::Path::new(&params.output_file))?;

            drive_closed_loop(&mut broker, &params.queue_name, state, &mut sink).await?;
            Ok(())
        }
    }
}
