//! Fatal error taxonomy. Every variant here is the diagnostic identifying
//! the failing site that the loop prints before exiting — there are no
//! retries and no backoff, by design.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration key `{0}`")]
    MissingKey(&'static str),

    #[error("unknown controller type `{0}`")]
    UnknownController(String),

    #[error("controller `{0}` is recognised but not implemented: {1}")]
    Unsupported(String, &'static str),

    #[error("unknown membership function `{0}`")]
    UnknownMembershipFunction(String),

    #[error("unknown execution type `{0}`")]
    UnknownExecutionType(String),

    #[error("setpoint schedule must not be empty")]
    EmptySetpointSchedule,

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to connect to broker: {0}")]
    Connect(String),

    #[error("failed to open a channel: {0}")]
    Channel(String),

    #[error("failed to declare queue `{queue}`: {source}")]
    DeclareQueue { queue: String, source: String },

    #[error("failed to register a consumer: {0}")]
    Consume(String),

    #[error("failed to ack delivery (tag {tag}): {source}")]
    Ack { tag: u64, source: String },

    #[error("failed to set QoS (prefetch={prefetch}): {source}")]
    SetPrefetch { prefetch: u32, source: String },

    #[error("failed to publish to queue `{queue}`: {source}")]
    Publish { queue: String, source: String },

    #[error("failed to inspect queue `{queue}`: {source}")]
    Inspect { queue: String, source: String },

    #[error("delivery stream ended unexpectedly")]
    StreamClosed,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open sink file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write sample: {0}")]
    Write(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
