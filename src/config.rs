//! Process configuration loaded once at startup from the environment.
//!
//! A `.env` file in the working directory is honored so local runs and
//! service-manager deployments configure the bridge the same way. All
//! values end up in an owned [`BridgeConfig`]; no process-wide mutable
//! globals. Parsing goes through an injected lookup function so tests
//! never mutate the process environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_CLIENT_ID: &str = "mqtt-influx-bridge";
const DEFAULT_INFLUXDB_URL: &str = "http://localhost:8086";
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("missing required environment variable {name}")]
	MissingVariable { name: &'static str },
	#[error("invalid value {value:?} for {name}")]
	InvalidValue { name: &'static str, value: String },
}

/// Broker endpoint and session identity.
#[derive(Debug, Clone)]
pub struct MqttSettings {
	pub host: String,
	pub port: u16,
	pub client_id: String,
	/// Credentials are optional; absent means anonymous access.
	pub username: Option<String>,
	pub password: Option<String>,
	pub keep_alive: Duration,
}

/// Destination database endpoint and credentials.
#[derive(Debug, Clone)]
pub struct InfluxSettings {
	pub url: Url,
	pub bucket: String,
	pub org: String,
	pub token: String,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
	pub mqtt: MqttSettings,
	pub influx: InfluxSettings,
}

impl BridgeConfig {
	/// Read the full configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		dotenv::dotenv().ok();
		Self::from_lookup(&|name| env::var(name).ok())
	}

	/// Build the configuration from an arbitrary variable lookup.
	fn from_lookup(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
		Ok(Self {
			mqtt: MqttSettings {
				host: required(lookup, "MQTT_HOST")?,
				port: parsed_or(lookup, "MQTT_PORT", DEFAULT_MQTT_PORT)?,
				client_id: optional(lookup, "MQTT_CLIENT_ID")
					.unwrap_or_else(|| DEFAULT_CLIENT_ID.to_owned()),
				username: optional(lookup, "MQTT_USERNAME"),
				password: optional(lookup, "MQTT_PASSWORD"),
				keep_alive: DEFAULT_KEEP_ALIVE,
			},
			influx: InfluxSettings {
				url: influx_url(lookup)?,
				bucket: required(lookup, "INFLUXDB_BUCKET")?,
				org: required(lookup, "INFLUXDB_ORG")?,
				token: required(lookup, "INFLUXDB_TOKEN")?,
			},
		})
	}
}

type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Empty-string variables count as unset, matching the original
/// deployment's empty-by-default configuration.
fn optional(lookup: &Lookup<'_>, name: &'static str) -> Option<String> {
	lookup(name).filter(|value| !value.is_empty())
}

fn required(
	lookup: &Lookup<'_>,
	name: &'static str,
) -> Result<String, ConfigError> {
	optional(lookup, name).ok_or(ConfigError::MissingVariable { name })
}

fn parsed_or<T: FromStr>(
	lookup: &Lookup<'_>,
	name: &'static str,
	default: T,
) -> Result<T, ConfigError> {
	match optional(lookup, name) {
		| Some(value) => value
			.parse()
			.map_err(|_| ConfigError::InvalidValue { name, value }),
		| None => Ok(default),
	}
}

fn influx_url(lookup: &Lookup<'_>) -> Result<Url, ConfigError> {
	let raw = optional(lookup, "INFLUXDB_URL")
		.unwrap_or_else(|| DEFAULT_INFLUXDB_URL.to_owned());
	Url::parse(&raw).map_err(|_| ConfigError::InvalidValue {
		name: "INFLUXDB_URL",
		value: raw,
	})
}
