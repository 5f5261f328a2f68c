//! Load generator: `NumberOfClients` independent publishers, each sending
//! `NumberOfRequests` fixed-size messages with inter-arrival
//! `max(0, Mean + StdDev * Z)` ms, `Z ~ Normal(0,1)`, joined with a
//! barrier.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tokio::time::Duration;
use tracing::info;

use crate::broker::Broker;
use crate::errors::BrokerError;

/// Draws inter-arrival delays for one client: `max(0, Mean + StdDev * Z)`
/// milliseconds, clamped at zero so a large negative sample never produces
/// a negative sleep.
fn inter_arrival_ms(mean: f64, std_dev: f64, rng: &mut impl rand::Rng) -> f64 {
    let normal = Normal::new(0.0, 1.0).expect("unit normal is always valid");
    let z: f64 = normal.sample(rng);
    (mean + std_dev * z).max(0.0)
}

/// One publishing client: sends `count` fixed-size messages on `broker`,
/// sleeping `inter_arrival_ms(mean, std_dev)` between each.
pub async fn run_client<B: Broker>(
    broker: &mut B,
    queue_name: &str,
    count: usize,
    message_size: usize,
    mean: f64,
    std_dev: f64,
) -> Result<(), BrokerError> {
    let body = vec![0u8; message_size];
    let mut rng = rand::rngs::StdRng::from_entropy();

    for _ in 0..count {
        let delay = inter_arrival_ms(mean, std_dev, &mut rng);
        tokio::time::sleep(Duration::from_secs_f64(delay / 1000.0)).await;
        broker.publish(queue_name, &body).await?;
    }
    Ok(())
}

/// Run `number_of_clients` concurrent clients to completion, joining all
/// of them before returning.
///
/// `make_broker` is async (returns a future) rather than a plain
/// constructor, so each client can own a freshly-connected broker handle
/// (e.g. its own AMQP channel) instead of sharing one across tasks.
pub async fn run_experiment<F, Fut, B>(
    number_of_clients: usize,
    number_of_requests: usize,
    message_size: usize,
    mean: f64,
    std_dev: f64,
    queue_name: &str,
    mut make_broker: F,
) -> Result<(), BrokerError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<B, BrokerError>>,
    B: Broker + 'static,
{
    info!(number_of_clients, "all clients initialised");

    let mut handles = Vec::with_capacity(number_of_clients);
    for _ in 0..number_of_clients {
        let mut broker = make_broker().await?;
        let queue_name = queue_name.to_string();
        handles.push(tokio::spawn(async move {
            run_client(
                &mut broker,
                &queue_name,
                number_of_requests,
                message_size,
                mean,
                std_dev,
            )
            .await
        }));
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))??;
    }

    info!(number_of_clients, "all clients finished");
    Ok(())
}
