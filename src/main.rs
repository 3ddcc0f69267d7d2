//! MQTT to InfluxDB bridge entry point.

use mqtt_influx_bridge::bridge::Bridge;
use mqtt_influx_bridge::config::BridgeConfig;
use mqtt_influx_bridge::error::BridgeError;
use mqtt_influx_bridge::sink::InfluxSink;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
	init_tracing();
	info!("MQTT to InfluxDB bridge starting");

	let config = BridgeConfig::from_env()?;
	let sink = InfluxSink::connect(&config.influx).await?;

	Bridge::new(sink).run(&config.mqtt).await
}

/// `RUST_LOG`-driven tracing with an `info` default.
fn init_tracing() {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| "info".into());

	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_target(true)
				.compact(),
		)
		.init();
}
