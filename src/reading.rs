//! Payload validation and the sensor reading record.

use thiserror::Error;

use crate::topic::SensorTopic;

/// Measurement kind reserved for device liveness heartbeats.
///
/// Status messages are not sensor values and are never persisted.
pub const STATUS_MEASUREMENT: &str = "status";

/// Segment separator for the composite `location` key.
const LOCATION_SEPARATOR: char = '_';

/// Reasons a (payload, measurement) pair does not become a reading.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Payload text does not parse as a finite float.
	#[error("payload {payload:?} is not a finite number")]
	NonNumericPayload { payload: String },
	/// Device status heartbeat, skipped by design rather than an error.
	#[error("measurement kind is not persisted")]
	IgnoredMeasurementKind,
}

/// Check that a message payload is a persistable numeric reading.
///
/// Status heartbeats are skipped before the payload is inspected, so any
/// payload on a `status` topic is accepted and ignored regardless of
/// numeric validity. Leading and trailing whitespace around the number
/// is tolerated.
pub fn validate(
	payload: &str,
	measurement: &str,
) -> Result<f64, ValidationError> {
	if measurement == STATUS_MEASUREMENT {
		return Err(ValidationError::IgnoredMeasurementKind);
	}

	payload
		.trim()
		.parse::<f64>()
		.ok()
		.filter(|value| value.is_finite())
		.ok_or_else(|| ValidationError::NonNumericPayload {
			payload: payload.to_owned(),
		})
}

/// One validated sensor reading, constructed per inbound message and
/// consumed by a single database write.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
	pub floor: String,
	pub room: String,
	/// Composite key `floor_room_instance`, computed at construction.
	pub location: String,
	pub measurement: String,
	pub value: f64,
}

impl SensorReading {
	/// Combine parsed topic fields with a validated value.
	///
	/// Pure composition with no failure path; parsing and validation
	/// have already succeeded by the time this runs.
	pub fn new(topic: &SensorTopic, value: f64) -> Self {
		let location = format!(
			"{}{sep}{}{sep}{}",
			topic.floor,
			topic.room,
			topic.sensor_instance,
			sep = LOCATION_SEPARATOR,
		);

		Self {
			floor: topic.floor.clone(),
			room: topic.room.clone(),
			location,
			measurement: topic.measurement.clone(),
			value,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn topic(raw: &str) -> SensorTopic {
		SensorTopic::parse(raw).unwrap()
	}

	#[test]
	fn accepts_numeric_payloads() {
		assert_eq!(validate("21.5", "temperature").unwrap(), 21.5);
		assert_eq!(validate("-3", "temperature").unwrap(), -3.0);
		assert_eq!(validate(" 42.0 ", "humidity").unwrap(), 42.0);
		assert_eq!(validate("1e3", "pressure").unwrap(), 1000.0);
	}

	#[test]
	fn rejects_non_numeric_payloads() {
		for payload in ["abc", "", "12.3.4", "21,5"] {
			assert!(matches!(
				validate(payload, "temperature"),
				Err(ValidationError::NonNumericPayload { .. })
			));
		}
	}

	#[test]
	fn rejects_non_finite_payloads() {
		for payload in ["inf", "-inf", "NaN"] {
			assert!(matches!(
				validate(payload, "temperature"),
				Err(ValidationError::NonNumericPayload { .. })
			));
		}
	}

	#[test]
	fn skips_status_regardless_of_payload() {
		for payload in ["online", "21.5", ""] {
			assert!(matches!(
				validate(payload, "status"),
				Err(ValidationError::IgnoredMeasurementKind)
			));
		}
	}

	#[test]
	fn location_joins_floor_room_and_instance() {
		let reading = SensorReading::new(
			&topic("groundfloor/kitchen/sensor/room/temperature"),
			21.5,
		);

		assert_eq!(reading.location, "groundfloor_kitchen_room");
		assert_eq!(reading.floor, "groundfloor");
		assert_eq!(reading.room, "kitchen");
		assert_eq!(reading.measurement, "temperature");
		assert_eq!(reading.value, 21.5);
	}

	#[test]
	fn location_ignores_sensor_kind() {
		let reading =
			SensorReading::new(&topic("attic/office/dht22/desk/humidity"), 40.0);

		assert_eq!(reading.location, "attic_office_desk");
	}
}
