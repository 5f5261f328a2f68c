//! Broker adapter.
//!
//! `Broker` is the actuation/measurement boundary the control loop drives:
//! ack+count on delivery, push a new prefetch window, read back queue
//! depth. `LapinBroker` is the production AMQP-0-9-1 adapter; `InMemoryBroker`
//! is a deterministic fake used by the sampler's own tests and by
//! `loadgen`-less integration tests.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};

use crate::errors::BrokerError;

/// A single unacknowledged message handed to the consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub tag: u64,
    pub body: Vec<u8>,
}

/// The broker connection boundary: declare a non-durable/non-exclusive/
/// non-auto-delete queue, consume with manual ack, set channel-global QoS,
/// inspect queue depth.
#[async_trait]
pub trait Broker: Send {
    async fn declare_queue(&mut self, name: &str) -> Result<(), BrokerError>;

    /// Begin consuming; must be called once, after `declare_queue`.
    async fn start_consuming(&mut self, queue: &str) -> Result<(), BrokerError>;

    /// Await the next delivery. `None` only at a clean stream close.
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, BrokerError>;

    async fn ack(&mut self, tag: u64) -> Result<(), BrokerError>;

    /// Channel-global QoS; the broker's only actuation channel.
    async fn set_prefetch(&mut self, count: u32) -> Result<(), BrokerError>;

    /// Observational; a failed inspect is fatal.
    async fn queue_depth(&mut self, name: &str) -> Result<u32, BrokerError>;

    /// Publish a message to `name`. Used only by the load generator — the
    /// control loop itself never publishes.
    async fn publish(&mut self, name: &str, body: &[u8]) -> Result<(), BrokerError>;
}

/// `lapin`-backed AMQP-0-9-1 adapter.
pub struct LapinBroker {
    _connection: Connection,
    channel: Channel,
    consumer: Option<Consumer>,
}

impl LapinBroker {
    pub async fn connect(host: &str, port: u16) -> Result<Self, BrokerError> {
        let uri = format!("amqp://guest:guest@{host}:{port}/%2f");
        let connection = Connection::connect(&uri, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;
        Ok(LapinBroker {
            _connection: connection,
            channel,
            consumer: None,
        })
    }
}

#[async_trait]
impl Broker for LapinBroker {
    async fn declare_queue(&mut self, name: &str) -> Result<(), BrokerError> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: false,
                    exclusive: false,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::DeclareQueue {
                queue: name.to_string(),
                source: e.to_string(),
            })?;
        Ok(())
    }

    async fn start_consuming(&mut self, queue: &str) -> Result<(), BrokerError> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                "",
                BasicConsumeOptions {
                    no_ack: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Consume(e.to_string()))?;
        self.consumer = Some(consumer);
        Ok(())
    }

    async fn next_delivery(&mut self) -> Result<Option<Delivery>, BrokerError> {
        let consumer = self.consumer.as_mut().ok_or(BrokerError::StreamClosed)?;
        match consumer.next().await {
            Some(Ok(delivery)) => Ok(Some(Delivery {
                tag: delivery.delivery_tag,
                body: delivery.data.clone(),
            })),
            Some(Err(e)) => Err(BrokerError::Consume(e.to_string())),
            None => Ok(None),
        }
    }

    async fn ack(&mut self, tag: u64) -> Result<(), BrokerError> {
        self.channel
            .basic_ack(tag, BasicAckOptions::default())
            .await
            .map_err(|e| BrokerError::Ack {
                tag,
                source: e.to_string(),
            })
    }

    async fn set_prefetch(&mut self, count: u32) -> Result<(), BrokerError> {
        self.channel
            .basic_qos(count as u16, BasicQosOptions { global: true })
            .await
            .map_err(|e| BrokerError::SetPrefetch {
                prefetch: count,
                source: e.to_string(),
            })
    }

    async fn queue_depth(&mut self, name: &str) -> Result<u32, BrokerError> {
        let queue = self
            .channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: false,
                    exclusive: false,
                    auto_delete: false,
                    passive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Inspect {
                queue: name.to_string(),
                source: e.to_string(),
            })?;
        Ok(queue.message_count())
    }

    async fn publish(&mut self, name: &str, body: &[u8]) -> Result<(), BrokerError> {
        self.channel
            .basic_publish(
                "",
                name,
                lapin::options::BasicPublishOptions::default(),
                body,
                lapin::BasicProperties::default(),
            )
            .await
            .map_err(|e| BrokerError::Publish {
                queue: name.to_string(),
                source: e.to_string(),
            })?;
        Ok(())
    }
}

pub use test_support::InMemoryBroker;

/// Deterministic in-process fake broker. Not behind `#[cfg(test)]` so both
/// this crate's own unit tests and the `tests/` integration suite can drive
/// the sampler's async driver without a live AMQP server.
///
/// Backed by an mpsc channel rather than a plain queue: an empty backlog
/// must *pend* (like a real consumer stream with nothing to deliver yet),
/// not resolve to `None`, or `tokio::select!` would treat "no message right
/// now" as a closed stream and the driver would exit early. `None` is only
/// returned once the test explicitly calls [`InMemoryBroker::close`].
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    pub struct InMemoryBroker {
        sender: mpsc::UnboundedSender<Delivery>,
        receiver: mpsc::UnboundedReceiver<Delivery>,
        acked: Vec<u64>,
        pub prefetch_history: Vec<u32>,
        depth: Arc<AtomicU32>,
        next_tag: u64,
    }

    impl Default for InMemoryBroker {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InMemoryBroker {
        pub fn new() -> Self {
            let (sender, receiver) = mpsc::unbounded_channel();
            InMemoryBroker {
                sender,
                receiver,
                acked: Vec::new(),
                prefetch_history: Vec::new(),
                depth: Arc::new(AtomicU32::new(0)),
                next_tag: 0,
            }
        }

        pub fn push_message(&mut self, body: Vec<u8>) {
            self.next_tag += 1;
            self.depth.fetch_add(1, Ordering::SeqCst);
            let _ = self.sender.send(Delivery {
                tag: self.next_tag,
                body,
            });
        }

        /// Ends the delivery stream: the next `next_delivery()` call with an
        /// empty backlog resolves to `None` instead of pending forever.
        pub fn close(&mut self) {
            let (empty_sender, _) = mpsc::unbounded_channel();
            self.sender = empty_sender;
        }

        pub fn acked_tags(&self) -> &[u64] {
            &self.acked
        }
    }

    #[async_trait]
    impl Broker for InMemoryBroker {
        async fn declare_queue(&mut self, _name: &str) -> Result<(), BrokerError> {
            Ok(())
        }

        async fn start_consuming(&mut self, _queue: &str) -> Result<(), BrokerError> {
            Ok(())
        }

        async fn next_delivery(&mut self) -> Result<Option<Delivery>, BrokerError> {
            Ok(self.receiver.recv().await)
        }

        async fn ack(&mut self, tag: u64) -> Result<(), BrokerError> {
            self.acked.push(tag);
            self.depth.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        async fn set_prefetch(&mut self, count: u32) -> Result<(), BrokerError> {
            self.prefetch_history.push(count);
            Ok(())
        }

        async fn queue_depth(&mut self, _name: &str) -> Result<u32, BrokerError> {
            Ok(self.depth.load(Ordering::SeqCst))
        }

        async fn publish(&mut self, _name: &str, body: &[u8]) -> Result<(), BrokerError> {
            self.push_message(body.to_vec());
            Ok(())
        }
    }
}
