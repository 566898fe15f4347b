//! Metrics module for the application.
//!
//! - This module contains the global Prometheus registry.
//! - Defines specific metrics for the application.

pub mod server;

use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
	/// Global Prometheus registry.
	///
	/// Holds every metric defined in this module and backs the `/metrics` endpoint.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Constant 1 while the process is up, labelled with instance id and version.
	pub static ref SERVICE_UP: GaugeVec = {
		let gauge = GaugeVec::new(
			Opts::new("service_up", "Whether the service is up"),
			&["instance_id", "version"]
		).unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Process start time as unix seconds.
	pub static ref START_TIME: GaugeVec = {
		let gauge = GaugeVec::new(
			Opts::new("start_time", "Start time of the service in unix seconds"),
			&["instance_id", "version"]
		).unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Number of safes with a running watcher.
	pub static ref WATCHED_SAFES: Gauge = {
		let gauge = Gauge::new("watched_safes", "Number of safes being watched").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Events handed to the notification sink, by event type.
	pub static ref EVENTS_EMITTED: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("events_emitted_total", "Number of transaction events emitted"),
			&["type"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Poll cycles aborted because the latest listing could not be fetched, by chain.
	pub static ref POLL_FAILURES: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("poll_failures_total", "Number of failed poll cycles"),
			&["chain"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};
}

/// Gather all metrics and encode into the Prometheus text format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Marks the service as up and records its start time.
pub fn record_service_start(instance_id: &str, start_time: chrono::DateTime<chrono::Utc>) {
	let version = env!("CARGO_PKG_VERSION");
	SERVICE_UP
		.with_label_values(&[instance_id, version])
		.set(1.0);
	START_TIME
		.with_label_values(&[instance_id, version])
		.set(start_time.timestamp() as f64);
}
