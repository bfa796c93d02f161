// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fire-and-forget delivery of events and metrics.

use std::sync::Arc;
use std::time::Duration;

use bugcatch_core::EventId;
use parking_lot::{Condvar, Mutex};
use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Runtime;
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;
use crate::options::ClientOptions;

/// Timeout for metric requests.
pub const METRIC_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for establishing a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const TRANSPORT_WORKERS: usize = 2;

/// Delivers serialized payloads to the backend.
///
/// Sends must not block the caller and must never surface failures to it.
pub trait Transport: Send + Sync {
	/// Sends one serialized event.
	fn send_event(&self, event_id: EventId, body: String);

	/// Sends one serialized request metric.
	fn send_metric(&self, body: String);

	/// Waits up to `timeout` for in-flight sends. Returns true when none remain.
	fn flush(&self, timeout: Duration) -> bool {
		let _ = timeout;
		true
	}
}

/// Derives the metrics endpoint from the DSN by appending `/metrics` to its
/// path. The query string (and with it the SDK key) is kept.
pub fn metrics_url(dsn: &Url) -> Url {
	let mut url = dsn.clone();
	let path = format!("{}/metrics", dsn.path().trim_end_matches('/'));
	url.set_path(&path);
	url
}

#[derive(Default)]
struct InFlight {
	count: Mutex<usize>,
	idle: Condvar,
}

struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
	fn new(in_flight: &Arc<InFlight>) -> Self {
		*in_flight.count.lock() += 1;
		Self(Arc::clone(in_flight))
	}
}

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		let mut count = self.0.count.lock();
		*count = count.saturating_sub(1);
		if *count == 0 {
			self.0.idle.notify_all();
		}
	}
}

/// HTTP transport posting JSON on a small dedicated runtime, so capturing works
/// from synchronous code and from inside other runtimes alike.
pub struct HttpTransport {
	runtime: Option<Runtime>,
	http: reqwest::Client,
	ingest_url: Url,
	metrics_url: Url,
	event_timeout: Duration,
	debug: bool,
	in_flight: Arc<InFlight>,
}

impl HttpTransport {
	pub fn new(options: &ClientOptions) -> Result<Self> {
		let http = bugcatch_common_http::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.build()?;

		let runtime = tokio::runtime::Builder::new_multi_thread()
			.worker_threads(TRANSPORT_WORKERS)
			.thread_name("bugcatch-transport")
			.enable_all()
			.build()?;

		Ok(Self {
			runtime: Some(runtime),
			http,
			ingest_url: options.dsn().clone(),
			metrics_url: metrics_url(options.dsn()),
			event_timeout: options.request_timeout(),
			debug: options.debug(),
			in_flight: Arc::default(),
		})
	}

	pub fn ingest_url(&self) -> &Url {
		&self.ingest_url
	}

	pub fn metrics_url(&self) -> &Url {
		&self.metrics_url
	}

	fn post(&self, url: Url, body: String, timeout: Duration, what: &'static str) {
		let Some(runtime) = self.runtime.as_ref() else {
			return;
		};

		let guard = InFlightGuard::new(&self.in_flight);
		let request = self
			.http
			.post(url)
			.header(CONTENT_TYPE, "application/json")
			.timeout(timeout)
			.body(body);
		let debug = self.debug;

		runtime.spawn(async move {
			let _guard = guard;
			match request.send().await {
				Ok(response) if response.status().is_success() => {
					if debug {
						debug!(status = %response.status(), what, "Payload delivered");
					}
				}
				Ok(response) => {
					let status = response.status();
					let body = response.text().await.unwrap_or_default();
					warn!(%status, what, body = %body, "Payload rejected by server");
				}
				Err(e) => {
					warn!(error = %e, what, "Failed to deliver payload");
				}
			}
		});
	}
}

impl Transport for HttpTransport {
	fn send_event(&self, event_id: EventId, body: String) {
		if self.debug {
			debug!(%event_id, url = %self.ingest_url, "Sending event");
		}
		self.post(self.ingest_url.clone(), body, self.event_timeout, "event");
	}

	fn send_metric(&self, body: String) {
		self.post(self.metrics_url.clone(), body, METRIC_TIMEOUT, "metric");
	}

	/// Blocks the calling thread. Do not call from inside an async task.
	fn flush(&self, timeout: Duration) -> bool {
		let mut count = self.in_flight.count.lock();
		self
			.in_flight
			.idle
			.wait_while_for(&mut count, |pending| *pending > 0, timeout);
		*count == 0
	}
}

impl Drop for HttpTransport {
	fn drop(&mut self) {
		// Dropping a runtime from async context panics; this does not.
		if let Some(runtime) = self.runtime.take() {
			runtime.shutdown_background();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn url(s: &str) -> Url {
		Url::parse(s).unwrap()
	}

	#[test]
	fn test_metrics_url_keeps_query() {
		let dsn = url("https://ingest.example.com/ingest/proj_1?key=abc");
		assert_eq!(
			metrics_url(&dsn).as_str(),
			"https://ingest.example.com/ingest/proj_1/metrics?key=abc"
		);
	}

	#[test]
	fn test_metrics_url_without_query() {
		let dsn = url("http://localhost:8080/ingest/p");
		assert_eq!(metrics_url(&dsn).as_str(), "http://localhost:8080/ingest/p/metrics");
	}

	#[test]
	fn test_metrics_url_trailing_slash() {
		let dsn = url("http://localhost/ingest/p/?key=k");
		assert_eq!(metrics_url(&dsn).as_str(), "http://localhost/ingest/p/metrics?key=k");
	}

	#[test]
	fn test_flush_with_nothing_in_flight() {
		let options = ClientOptions::builder("http://127.0.0.1:9/ingest/p")
			.build()
			.unwrap();
		let transport = HttpTransport::new(&options).unwrap();
		assert!(transport.flush(Duration::from_millis(10)));
		assert_eq!(transport.ingest_url().as_str(), "http://127.0.0.1:9/ingest/p");
		assert_eq!(transport.metrics_url().as_str(), "http://127.0.0.1:9/ingest/p/metrics");
	}

	#[test]
	fn test_unreachable_backend_never_surfaces() {
		let options = ClientOptions::builder("http://127.0.0.1:9/ingest/p")
			.request_timeout(Duration::from_millis(200))
			.build()
			.unwrap();
		let transport = HttpTransport::new(&options).unwrap();
		transport.send_event(EventId::new(), "{}".to_string());
		transport.send_metric("{}".to_string());
		assert!(transport.flush(Duration::from_secs(5)));
	}

	#[test]
	fn test_default_flush_is_immediate() {
		struct Null;
		impl Transport for Null {
			fn send_event(&self, _: EventId, _: String) {}
			fn send_metric(&self, _: String) {}
		}
		assert!(Null.flush(Duration::ZERO));
	}
}
