//! End-to-end pipeline tests: raw (topic, payload) pairs fed through the
//! bridge against a recording sink instead of a live database.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use mqtt_influx_bridge::bridge::{Bridge, Outcome};
use mqtt_influx_bridge::reading::SensorReading;
use mqtt_influx_bridge::sink::{ReadingSink, SinkError};

/// Sink that records every written reading and can fail on demand.
#[derive(Default)]
struct RecordingSink {
	written: Mutex<Vec<SensorReading>>,
	fail_next: AtomicBool,
}

impl RecordingSink {
	fn written(&self) -> Vec<SensorReading> {
		self.written.lock().unwrap().clone()
	}

	fn fail_next_write(&self) {
		self.fail_next.store(true, Ordering::SeqCst);
	}
}

impl ReadingSink for RecordingSink {
	async fn write(&self, reading: &SensorReading) -> Result<(), SinkError> {
		if self.fail_next.swap(false, Ordering::SeqCst) {
			return Err(SinkError::Write("injected failure".to_owned()));
		}
		self.written.lock().unwrap().push(reading.clone());
		Ok(())
	}
}

#[tokio::test]
async fn accepted_reading_is_written_with_all_fields() {
	let sink = RecordingSink::default();
	let bridge = Bridge::new(&sink);

	let outcome = bridge
		.process_message("groundfloor/kitchen/sensor/room/temperature", b"21.5")
		.await;

	assert_eq!(outcome, Outcome::Written);
	let written = sink.written();
	assert_eq!(written.len(), 1);
	assert_eq!(written[0].measurement, "temperature");
	assert_eq!(written[0].location, "groundfloor_kitchen_room");
	assert_eq!(written[0].floor, "groundfloor");
	assert_eq!(written[0].room, "kitchen");
	assert_eq!(written[0].value, 21.5);
}

#[tokio::test]
async fn status_messages_never_produce_a_write() {
	let sink = RecordingSink::default();
	let bridge = Bridge::new(&sink);

	// Any payload on a status topic is ignored, numeric or not.
	for payload in [&b"online"[..], b"1.0", b""] {
		let outcome = bridge
			.process_message("groundfloor/kitchen/sensor/room/status", payload)
			.await;
		assert_eq!(outcome, Outcome::IgnoredStatus);
	}

	assert!(sink.written().is_empty());
}

#[tokio::test]
async fn non_numeric_payloads_are_dropped() {
	let sink = RecordingSink::default();
	let bridge = Bridge::new(&sink);

	for payload in [&b"abc"[..], b"", b"12.3.4"] {
		let outcome = bridge
			.process_message(
				"groundfloor/kitchen/sensor/room/temperature",
				payload,
			)
			.await;
		assert_eq!(outcome, Outcome::DroppedInvalid);
	}

	assert!(sink.written().is_empty());
}

#[tokio::test]
async fn non_utf8_payload_is_dropped() {
	let sink = RecordingSink::default();
	let bridge = Bridge::new(&sink);

	let outcome = bridge
		.process_message(
			"groundfloor/kitchen/sensor/room/temperature",
			&[0xff, 0xfe],
		)
		.await;

	assert_eq!(outcome, Outcome::DroppedInvalid);
	assert!(sink.written().is_empty());
}

#[tokio::test]
async fn foreign_topics_are_skipped_without_a_write() {
	let sink = RecordingSink::default();
	let bridge = Bridge::new(&sink);

	for topic in ["malformed", "a/b/c", "a/b/c/d/e/f", "zigbee2mqtt/state"] {
		let outcome = bridge.process_message(topic, b"21.5").await;
		assert_eq!(outcome, Outcome::NotForUs, "topic {topic:?}");
	}

	assert!(sink.written().is_empty());
}

#[tokio::test]
async fn failed_write_does_not_block_the_next_message() {
	let sink = RecordingSink::default();
	let bridge = Bridge::new(&sink);

	sink.fail_next_write();
	let first = bridge
		.process_message("groundfloor/kitchen/sensor/room/temperature", b"20.0")
		.await;
	assert_eq!(first, Outcome::WriteFailed);

	let second = bridge
		.process_message("groundfloor/kitchen/sensor/room/temperature", b"20.5")
		.await;
	assert_eq!(second, Outcome::Written);

	let written = sink.written();
	assert_eq!(written.len(), 1);
	assert_eq!(written[0].value, 20.5);
}

#[tokio::test]
async fn each_valid_message_produces_exactly_one_point() {
	let sink = RecordingSink::default();
	let bridge = Bridge::new(&sink);

	bridge
		.process_message("firstfloor/bedroom/sensor/window/humidity", b"40")
		.await;
	bridge
		.process_message("firstfloor/bedroom/sensor/window/status", b"online")
		.await;
	bridge
		.process_message("firstfloor/bedroom/sensor/window/humidity", b"41")
		.await;

	let written = sink.written();
	assert_eq!(written.len(), 2);
	assert_eq!(written[0].value, 40.0);
	assert_eq!(written[1].value, 41.0);
	assert_eq!(written[0].location, "firstfloor_bedroom_window");
}
