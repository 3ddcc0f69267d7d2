//! # MQTT to InfluxDB Bridge
//!
//! A relay that subscribes to a home-automation MQTT topic hierarchy
//! carrying sensor telemetry and persists every valid reading as a
//! time-series point in InfluxDB.
//!
//! Telemetry topics follow a fixed five-segment grammar:
//!
//! ```text
//! <floor>/<room>/<sensor_kind>/<sensor_instance>/<measurement>
//! groundfloor/kitchen/sensor/room/temperature
//! ```
//!
//! Each inbound message flows through a straight pipeline:
//!
//! ```text
//! (topic, payload) -> SensorTopic::parse -> validate -> SensorReading -> ReadingSink
//! ```
//!
//! Messages whose topic does not use the grammar are not for us and are
//! skipped silently. Non-numeric payloads are dropped with a warning.
//! Messages on the `status` heartbeat channel are skipped by design. A
//! failed database write is logged and dropped; the bridge keeps
//! servicing the next message.

pub mod bridge;
pub mod config;
pub mod error;
pub mod reading;
pub mod sink;
pub mod topic;

pub use bridge::{Bridge, Outcome};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use reading::SensorReading;
pub use sink::{InfluxSink, ReadingSink};
pub use topic::SensorTopic;
