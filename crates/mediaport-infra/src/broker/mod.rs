//! Message broker plumbing.
//!
//! One [`BrokerClient`] is built at startup from validated configuration and
//! shared by everything that publishes.

mod client;
mod frame;

pub use client::BrokerClient;
pub use frame::Frame;

use mediaport_core::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Invalid broker configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not connect to broker at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Broker rejected the request: {0}")]
    Rejected(String),

    #[error("Broker protocol error: {0}")]
    Protocol(String),

    #[error("Broker did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Broker connection closed")]
    ConnectionClosed,

    #[error("Broker IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        AppError::Internal(err.to_string())
    }
}
