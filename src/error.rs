//! Top-level error type for bridge startup.
//!
//! Per-message failures never reach this type; they are classified and
//! logged inside the message handler (see [`crate::bridge::Outcome`]).

use thiserror::Error;

use crate::bridge::ConnectionError;
use crate::config::ConfigError;
use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum BridgeError {
	/// Configuration could not be loaded from the environment.
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	/// The MQTT client rejected an operation (subscribe, disconnect).
	#[error("MQTT client operation failed: {0}")]
	Client(#[from] rumqttc::ClientError),

	/// The initial broker connection could not be established.
	#[error("failed to establish MQTT connection: {0}")]
	Connection(#[from] ConnectionError),

	/// The database was unreachable or rejected the startup handshake.
	#[error("storage sink error: {0}")]
	Sink(#[from] SinkError),
}
