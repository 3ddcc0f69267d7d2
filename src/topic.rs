//! Sensor topic grammar.
//!
//! Telemetry topics carry exactly five `/`-separated segments:
//!
//! ```text
//! <floor>/<room>/<sensor_kind>/<sensor_instance>/<measurement>
//! ```
//!
//! Segments are intentionally unrestricted beyond "not the separator" so
//! arbitrary naming schemes work without a schema registry.

/// The five positional fields of a sensor telemetry topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTopic {
	pub floor: String,
	pub room: String,
	/// Extracted for grammar completeness, unused downstream.
	pub sensor_kind: String,
	pub sensor_instance: String,
	pub measurement: String,
}

impl SensorTopic {
	/// Parse a topic string against the five-segment grammar.
	///
	/// Returns `None` for anything else. The broker is shared with other
	/// topic hierarchies, so a non-matching topic is an expected case,
	/// not an error.
	pub fn parse(topic: &str) -> Option<Self> {
		let segments: Vec<&str> = topic.split('/').collect();

		match segments.as_slice() {
			| [floor, room, sensor_kind, sensor_instance, measurement] => {
				if segments.iter().any(|segment| segment.is_empty()) {
					return None;
				}
				Some(Self {
					floor: (*floor).to_owned(),
					room: (*room).to_owned(),
					sensor_kind: (*sensor_kind).to_owned(),
					sensor_instance: (*sensor_instance).to_owned(),
					measurement: (*measurement).to_owned(),
				})
			}
			| _ => None,
		}
	}
}
