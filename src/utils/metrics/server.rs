//! Health and metrics server
//!
//! Serves a liveness document with the process uptime on `/` and the Prometheus
//! metrics on `/metrics`.

use actix_web::middleware::{Compress, DefaultHeaders, NormalizePath};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info};

use crate::utils::metrics::gather_metrics;

/// Process start time shared with the handlers
pub type StartTimeData = web::Data<DateTime<Utc>>;

/// Renders an elapsed duration as `1d 2h 3m 4s`, omitting leading zero units.
pub fn format_uptime(elapsed: chrono::Duration) -> String {
	let total = elapsed.num_seconds().max(0);
	let (days, hours, minutes, seconds) = (
		total / 86_400,
		(total % 86_400) / 3_600,
		(total % 3_600) / 60,
		total % 60,
	);

	let mut parts = Vec::new();
	if days > 0 {
		parts.push(format!("{}d", days));
	}
	if days > 0 || hours > 0 {
		parts.push(format!("{}h", hours));
	}
	if days > 0 || hours > 0 || minutes > 0 {
		parts.push(format!("{}m", minutes));
	}
	parts.push(format!("{}s", seconds));
	parts.join(" ")
}

async fn health_handler(started_at: StartTimeData) -> impl Responder {
	let uptime = format_uptime(Utc::now() - **started_at);
	HttpResponse::Ok().json(json!({ "uptime": uptime }))
}

async fn metrics_handler() -> impl Responder {
	match gather_metrics() {
		Ok(buffer) => HttpResponse::Ok()
			.content_type("text/plain; version=0.0.4; charset=utf-8")
			.body(buffer),
		Err(e) => {
			error!("Error gathering metrics: {}", e);
			HttpResponse::InternalServerError().finish()
		}
	}
}

async fn not_found_handler() -> impl Responder {
	HttpResponse::NotFound()
		.content_type("text/plain")
		.body("not found")
}

/// Binds address used inside a container: every interface, same port.
fn resolve_bind_address(bind_address: &str, in_docker: bool) -> String {
	if !in_docker {
		return bind_address.to_string();
	}
	match bind_address.rsplit_once(':') {
		Some((_, port)) => format!("0.0.0.0:{}", port),
		None => "0.0.0.0:4000".to_string(),
	}
}

/// Registers the health, metrics and fallback routes on `cfg`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("/", web::get().to(health_handler))
		.route("/metrics", web::get().to(metrics_handler))
		.default_service(web::to(not_found_handler));
}

/// Creates the health server; the returned future runs until stopped.
pub fn create_health_server(
	bind_address: String,
	started_at: DateTime<Utc>,
) -> std::io::Result<actix_web::dev::Server> {
	let in_docker = std::env::var("IN_DOCKER").unwrap_or_default() == "true";
	let actual_bind_address = resolve_bind_address(&bind_address, in_docker);

	info!(
		"Starting health server on {} (actual bind: {})",
		bind_address, actual_bind_address
	);

	Ok(HttpServer::new(move || {
		App::new()
			.wrap(Compress::default())
			.wrap(NormalizePath::trim())
			.wrap(DefaultHeaders::new())
			.app_data(web::Data::new(started_at))
			.configure(configure_routes)
	})
	.workers(2)
	.bind(actual_bind_address)?
	.shutdown_timeout(5)
	.run())
}
