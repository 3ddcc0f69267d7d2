//! Storage sink: serializes readings into InfluxDB points.

use influxdb_rs::{Client, Point, Precision, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::InfluxSettings;
use crate::reading::SensorReading;

/// Errors from the storage side of the bridge.
///
/// The client library's error type is captured as text; nothing upstream
/// branches on the database failure kind, it is only logged.
#[derive(Debug, Error)]
pub enum SinkError {
	#[error("failed to connect to InfluxDB: {0}")]
	Connect(String),
	#[error("InfluxDB health check failed")]
	Unhealthy,
	#[error("failed to write point: {0}")]
	Write(String),
}

/// Destination for validated sensor readings.
///
/// The bridge loop is generic over this seam so tests can swap the
/// database for a recording sink.
#[allow(async_fn_in_trait)]
pub trait ReadingSink {
	/// Persist one reading. Each reading maps to exactly one point.
	async fn write(&self, reading: &SensorReading) -> Result<(), SinkError>;
}

impl<S: ReadingSink> ReadingSink for &S {
	async fn write(&self, reading: &SensorReading) -> Result<(), SinkError> {
		(**self).write(reading).await
	}
}

/// InfluxDB-backed sink, the single long-lived database handle of the
/// process.
pub struct InfluxSink {
	client: Client,
}

impl InfluxSink {
	/// Build the client, check the server is reachable and make sure the
	/// destination bucket exists.
	pub async fn connect(settings: &InfluxSettings) -> Result<Self, SinkError> {
		let client = Client::new(
			settings.url.clone(),
			settings.bucket.clone(),
			settings.org.clone(),
			settings.token.clone(),
		)
		.await
		.map_err(|err| SinkError::Connect(format!("{err:?}")))?;

		if !matches!(client.ping().await.await, Ok(true)) {
			return Err(SinkError::Unhealthy);
		}
		info!(url = %settings.url, bucket = %settings.bucket, "connected to InfluxDB");

		let sink = Self { client };
		sink.ensure_bucket(&settings.bucket).await;
		Ok(sink)
	}

	/// Create the destination bucket if it is absent.
	///
	/// Idempotent: a rejection for an already-existing bucket is logged
	/// at debug level and ignored. Any other rejection (bad token,
	/// missing permission) is surfaced as a warning so a misconfigured
	/// deployment is visible at startup, not only as per-write failures
	/// later.
	async fn ensure_bucket(&self, bucket: &str) {
		match self.client.create_database(bucket).await {
			| Ok(_) => {
				info!(bucket = %bucket, "created destination bucket");
			}
			| Err(err) => {
				let detail = format!("{err:?}");
				if is_already_exists(&detail) {
					debug!(
						bucket = %bucket,
						error = %detail,
						"destination bucket already exists"
					);
				} else {
					warn!(
						bucket = %bucket,
						error = %detail,
						"bucket creation failed, continuing; writes may \
						 fail until this is resolved"
					);
				}
			}
		}
	}
}

/// Classify a bucket-creation rejection as the benign already-exists
/// conflict.
///
/// The client library reports server rejections as text, so this checks
/// for the conflict markers InfluxDB uses (`409` status, "already
/// exists" message) rather than an error variant.
fn is_already_exists(detail: &str) -> bool {
	detail.contains("already exists") || detail.contains("409")
}

impl ReadingSink for InfluxSink {
	async fn write(&self, reading: &SensorReading) -> Result<(), SinkError> {
		// No timestamp on the point: the server assigns one at write
		// time.
		let point = Point::new(&reading.measurement)
			.add_tag("location", Value::String(reading.location.clone().into()))
			.add_tag("floor", Value::String(reading.floor.clone().into()))
			.add_tag("room", Value::String(reading.room.clone().into()))
			.add_field("value", Value::Float(reading.value));

		self.client
			.write_point(point, Some(Precision::Milliseconds), None)
			.await
			.map(|_| ())
			.map_err(|err| SinkError::Write(format!("{err:?}")))
	}
}
