//! The bridge loop: owns the MQTT subscription and drives every inbound
//! message through parse -> validate -> translate -> write.
//!
//! Startup walks Disconnected -> Connected -> Subscribed -> Running;
//! after that the only transition is the per-message pipeline looping
//! inside Running. Transport reconnection lives in rumqttc's event
//! loop, the bridge only resubscribes when a reconnect arrives without
//! a preserved session.
//!
//! Per-message logging: successful writes and dropped/failed messages
//! are visible at the default `info` filter; skipped traffic (foreign
//! topics, status heartbeats) stays at debug to keep heartbeat noise
//! out of the logs.

use std::time::Duration;

use rumqttc::Packet::{self, Disconnect, Publish};
use rumqttc::{AsyncClient, ConnAck, ConnectReturnCode, EventLoop};
use rumqttc::{Event::Incoming, Event::Outgoing};
use rumqttc::{MqttOptions, QoS};
use thiserror::Error;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::MqttSettings;
use crate::error::BridgeError;
use crate::reading::{validate, SensorReading, ValidationError};
use crate::sink::ReadingSink;
use crate::topic::SensorTopic;

/// Wildcard filter covering every floor/room/sensor/instance/measurement.
pub const SENSOR_TOPIC_FILTER: &str = "+/+/+/+/+";

const EVENT_LOOP_CAPACITY: usize = 10;
const MAX_CONSECUTIVE_ERRORS: u32 = 10;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Classification of what happened to one inbound message.
///
/// Every message resolves to exactly one outcome; no failure category
/// escapes the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// Reading persisted to the database.
	Written,
	/// Topic does not use the sensor grammar; another hierarchy on the
	/// shared broker.
	NotForUs,
	/// Device status heartbeat, skipped by design.
	IgnoredStatus,
	/// Payload was not a finite number (or not UTF-8); dropped.
	DroppedInvalid,
	/// The database rejected the write; dropped, connection retained.
	WriteFailed,
}

/// Errors while establishing the initial broker connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
	#[error("network connection failed: {0}")]
	Network(#[from] rumqttc::ConnectionError),

	#[error("broker rejected connection: {code:?}")]
	BrokerRejected { code: ConnectReturnCode },
}

/// Single-consumer, single-writer relay between one MQTT subscription
/// and one storage sink.
///
/// Owns the sink exclusively for the process lifetime. Messages are
/// serviced sequentially; a blocking write stalls intake of further
/// messages, which is the accepted relay behavior.
pub struct Bridge<S> {
	sink: S,
}

impl<S: ReadingSink> Bridge<S> {
	pub fn new(sink: S) -> Self {
		Self { sink }
	}

	/// Connect to the broker, subscribe to the sensor hierarchy and
	/// service messages until the transport terminates.
	pub async fn run(
		&self,
		settings: &MqttSettings,
	) -> Result<(), BridgeError> {
		let mut options = MqttOptions::new(
			settings.client_id.as_str(),
			settings.host.as_str(),
			settings.port,
		);
		options.set_keep_alive(settings.keep_alive);
		if let (Some(username), Some(password)) =
			(&settings.username, &settings.password)
		{
			options.set_credentials(username.as_str(), password.as_str());
		}

		let (client, event_loop) =
			AsyncClient::new(options, EVENT_LOOP_CAPACITY);

		let event_loop = Self::establish_connection(event_loop).await?;
		info!(
			host = %settings.host,
			port = settings.port,
			client_id = %settings.client_id,
			"connected to MQTT broker"
		);

		client
			.subscribe(SENSOR_TOPIC_FILTER, QoS::AtLeastOnce)
			.await?;
		info!(filter = SENSOR_TOPIC_FILTER, "subscribed to sensor topics");

		self.service_messages(event_loop, &client).await;
		Ok(())
	}

	/// Poll the event loop until the broker acknowledges the connection.
	async fn establish_connection(
		mut event_loop: EventLoop,
	) -> Result<EventLoop, ConnectionError> {
		loop {
			match event_loop.poll().await {
				| Ok(Incoming(Packet::ConnAck(ConnAck { code, .. }))) => {
					if code == ConnectReturnCode::Success {
						debug!("MQTT connection established");
						return Ok(event_loop);
					}
					return Err(ConnectionError::BrokerRejected { code });
				}
				| Ok(notification) => {
					debug!(notification = ?notification, "bootstrap phase notification");
				}
				| Err(err) => {
					return Err(ConnectionError::Network(err));
				}
			}
		}
	}

	/// The Running state: one thread of control servicing inbound
	/// messages sequentially until the transport terminates.
	async fn service_messages(
		&self,
		mut event_loop: EventLoop,
		client: &AsyncClient,
	) {
		let mut error_count = 0;

		loop {
			match event_loop.poll().await {
				| Ok(Incoming(Packet::ConnAck(ConnAck {
					session_present: false,
					code: ConnectReturnCode::Success,
				}))) => {
					info!("reconnected without session, resubscribing");
					if let Err(err) = client
						.subscribe(SENSOR_TOPIC_FILTER, QoS::AtLeastOnce)
						.await
					{
						error!(error = %err, "failed to resubscribe after reconnect");
					}
				}
				| Ok(Incoming(Packet::ConnAck(ConnAck {
					session_present: true,
					code: ConnectReturnCode::Success,
				}))) => {
					info!(
						"reconnected with session preserved, subscription \
						 maintained by broker"
					);
				}
				| Ok(Incoming(Publish(publish))) => {
					error_count = 0;
					self.process_message(&publish.topic, &publish.payload)
						.await;
				}
				| Ok(Incoming(Disconnect)) => {
					info!("received Disconnect from broker");
					break;
				}
				| Ok(Outgoing(rumqttc::Outgoing::Disconnect)) => {
					info!("sent Disconnect to broker");
					break;
				}
				| Ok(notification) => {
					error_count = 0;
					debug!(notification = ?notification, "transport notification");
				}
				| Err(err) => {
					error_count += 1;
					error!(error_count, error = %err, "MQTT event loop error");

					if error_count >= MAX_CONSECUTIVE_ERRORS {
						error!(
							error_count,
							"too many consecutive transport errors, \
							 terminating"
						);
						break;
					}

					let delay = INITIAL_RETRY_DELAY
						* 2_u32.pow((error_count - 1).min(10));
					let delay = delay.min(MAX_RETRY_DELAY);
					warn!(delay = ?delay, "retrying MQTT connection");
					time::sleep(delay).await;
				}
			}
		}
		info!("MQTT event loop terminated");
	}

	/// Run one message through the pipeline and classify the result.
	///
	/// Logs the raw topic/payload pair together with the outcome; every
	/// failure category is converted into a log line plus a dropped
	/// message.
	pub async fn process_message(
		&self,
		topic: &str,
		payload: &[u8],
	) -> Outcome {
		let Some(parsed) = SensorTopic::parse(topic) else {
			debug!(topic = %topic, "topic outside the sensor grammar, skipping");
			return Outcome::NotForUs;
		};

		let text = match std::str::from_utf8(payload) {
			| Ok(text) => text,
			| Err(_) => {
				warn!(
					topic = %topic,
					payload_size = payload.len(),
					"payload is not valid UTF-8, dropping message"
				);
				return Outcome::DroppedInvalid;
			}
		};

		let value = match validate(text, &parsed.measurement) {
			| Ok(value) => value,
			| Err(ValidationError::IgnoredMeasurementKind) => {
				debug!(topic = %topic, payload = %text, "status heartbeat, skipping");
				return Outcome::IgnoredStatus;
			}
			| Err(err @ ValidationError::NonNumericPayload { .. }) => {
				warn!(topic = %topic, payload = %text, error = %err, "dropping message");
				return Outcome::DroppedInvalid;
			}
		};

		let reading = SensorReading::new(&parsed, value);
		match self.sink.write(&reading).await {
			| Ok(()) => {
				info!(
					topic = %topic,
					payload = %text,
					measurement = %reading.measurement,
					location = %reading.location,
					value = reading.value,
					"reading written"
				);
				Outcome::Written
			}
			| Err(err) => {
				error!(
					topic = %topic,
					payload = %text,
					error = %err,
					"failed to write reading, dropping message"
				);
				Outcome::WriteFailed
			}
		}
	}
}
