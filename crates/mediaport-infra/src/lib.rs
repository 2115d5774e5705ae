//! Mediaport Infrastructure Library
//!
//! Shared infrastructure used by the API binary:
//! - Telemetry initialization
//! - Message broker client (STOMP over TCP)
//! - ActivityStreams notifications for saved media

pub mod broker;
pub mod events;
pub mod telemetry;

pub use broker::{BrokerClient, BrokerError, Frame};
pub use events::{update_activity, Activity, BrokerEventListener};
pub use telemetry::{init_telemetry, shutdown_telemetry};
