// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error-telemetry client for capturing and reporting errors.

use std::error::Error;
use std::panic::{AssertUnwindSafe, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bugcatch_core::{
	error_message, error_type_name, BreadcrumbEntry, Event, EventId, ExceptionValue, Level, Map,
	RequestMetric, Serializable, UserContext, Value,
};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::backtrace::capture_frames;
use crate::error::Result;
use crate::options::ClientOptions;
use crate::panic_hook::{self, current_thread_name, panic_message, HookRegistration};
use crate::scope::Scope;
use crate::transport::{HttpTransport, Transport};

/// Exception type reported for panics.
pub const PANIC_TYPE: &str = "panic";

/// Upper bound on waiting for delivery of a panic report.
pub const PANIC_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Error-telemetry client.
///
/// Cheap to clone; clones share context and transport. Capture methods never
/// fail and never panic: they return the event id when an event was handed to
/// the transport, `None` when it was filtered, dropped by the pre-send hook or
/// the client has been destroyed.
#[derive(Clone)]
pub struct Client {
	inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
	options: ClientOptions,
	transport: Arc<dyn Transport>,
	scope: Scope,
	destroyed: AtomicBool,
	hook: Mutex<Option<HookRegistration>>,
}

impl Client {
	/// Creates a client. With `auto_capture_errors` on, a chaining panic hook is
	/// installed until [`destroy`](Self::destroy) or the last clone is dropped.
	pub fn new(options: ClientOptions) -> Result<Self> {
		let transport: Arc<dyn Transport> = match options.transport() {
			Some(transport) => Arc::clone(transport),
			None => Arc::new(HttpTransport::new(&options)?),
		};

		let inner = Arc::new(ClientInner {
			scope: Scope::new(options.max_breadcrumbs()),
			transport,
			destroyed: AtomicBool::new(false),
			hook: Mutex::new(None),
			options,
		});

		if inner.options.auto_capture_errors() {
			let weak = Arc::downgrade(&inner);
			let registration = panic_hook::register(move |info| {
				if let Some(inner) = weak.upgrade() {
					inner.capture_panic(info);
				}
			});
			*inner.hook.lock() = Some(registration);
			inner.log_debug("Installed panic hook");
		}

		if inner.options.debug() {
			debug!(dsn = %inner.options.dsn(), "bugcatch initialized");
		}

		Ok(Self { inner })
	}

	pub fn options(&self) -> &ClientOptions {
		&self.inner.options
	}

	/// Captures an error and its source chain at level `error`.
	pub fn capture_error<E: Error + ?Sized>(&self, error: &E) -> Option<EventId> {
		self.capture_error_with(error, Map::new())
	}

	/// Captures an error with additional context.
	pub fn capture_error_with<E: Error + ?Sized>(&self, error: &E, extra: Map) -> Option<EventId> {
		let inner = &self.inner;
		if inner.is_destroyed() {
			return None;
		}

		let kind = error_type_name(error);
		let message = error_message(error);
		if inner.is_ignored(message.as_deref(), &kind) {
			return None;
		}

		let frames = if inner.options.attach_stacktrace() {
			capture_frames()
		} else {
			Vec::new()
		};

		let mut event = inner.build_event(Level::Error, extra);
		event.exceptions = Some(ExceptionValue::chain(&kind, error, frames));
		inner.dispatch(event)
	}

	/// Captures a plain message at level `info`.
	pub fn capture_message(&self, message: impl Into<String>) -> Option<EventId> {
		self.capture_message_with(message, Level::Info, Map::new())
	}

	/// Captures a plain message at the given level with additional context.
	pub fn capture_message_with(
		&self,
		message: impl Into<String>,
		level: Level,
		extra: Map,
	) -> Option<EventId> {
		let inner = &self.inner;
		if inner.is_destroyed() {
			return None;
		}

		let mut event = inner.build_event(level, extra);
		event.message = Some(message.into());
		inner.dispatch(event)
	}

	/// Attaches a user to all subsequent events.
	pub fn set_user(&self, user: UserContext) {
		if !self.inner.is_destroyed() {
			self.inner.scope.set_user(Some(user));
		}
	}

	pub fn clear_user(&self) {
		self.inner.scope.set_user(None);
	}

	/// Attaches a tag to all subsequent events. An existing value is replaced.
	pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
		if !self.inner.is_destroyed() {
			self.inner.scope.set_tag(key.into(), value.into());
		}
	}

	pub fn remove_tag(&self, key: &str) {
		self.inner.scope.remove_tag(key);
	}

	/// Records a breadcrumb. The oldest entry is evicted once the buffer is full.
	pub fn add_breadcrumb(&self, breadcrumb: BreadcrumbEntry) {
		if !self.inner.is_destroyed() {
			self.inner.scope.add_breadcrumb(breadcrumb);
		}
	}

	/// Reports the timing of one HTTP request. The method is uppercased and the
	/// route normalized to a template. Empty method or route is ignored.
	pub fn track_request(&self, method: &str, route: &str, duration_ms: u64, status_code: u16) {
		let inner = &self.inner;
		if inner.is_destroyed() || method.is_empty() || route.is_empty() {
			return;
		}

		let metric = RequestMetric::new(method, route, duration_ms, status_code);
		inner.transport.send_metric(metric.to_json());
	}

	/// Waits up to `timeout` for in-flight sends. Returns true when all
	/// completed. Blocks the calling thread.
	pub fn flush(&self, timeout: Duration) -> bool {
		self.inner.transport.flush(timeout)
	}

	/// Uninstalls the panic hook, clears user, tags and breadcrumbs and turns
	/// every later operation into a no-op. Sends already in flight continue.
	/// Calling it again has no effect.
	pub fn destroy(&self) {
		let inner = &self.inner;
		if inner.destroyed.swap(true, Ordering::SeqCst) {
			return;
		}

		if let Some(registration) = inner.hook.lock().take() {
			registration.restore();
		}
		inner.scope.clear();
		inner.log_debug("bugcatch destroyed");
	}

	pub fn is_destroyed(&self) -> bool {
		self.inner.is_destroyed()
	}

	/// Breadcrumbs currently held, oldest first.
	pub fn breadcrumbs(&self) -> Vec<BreadcrumbEntry> {
		self.inner.scope.breadcrumbs().get_all()
	}

	/// Returns true if both handles refer to the same client.
	pub fn ptr_eq(&self, other: &Client) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("options", &self.inner.options)
			.field("destroyed", &self.inner.is_destroyed())
			.finish()
	}
}

impl ClientInner {
	fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::SeqCst)
	}

	fn log_debug(&self, message: &str) {
		if self.options.debug() {
			debug!("{message}");
		}
	}

	fn is_ignored(&self, message: Option<&str>, kind: &str) -> bool {
		let ignored = self.options.ignore_errors().should_ignore(message, kind);
		if ignored && self.options.debug() {
			debug!(error_type = %kind, message = ?message, "Ignoring error");
		}
		ignored
	}

	/// A new event carrying the configured release and environment and a
	/// snapshot of the current scope.
	fn build_event(&self, level: Level, extra: Map) -> Event {
		let mut event = Event::new(level);
		event.release = self.options.release().map(str::to_string);
		event.environment = self.options.environment().map(str::to_string);
		if !extra.is_empty() {
			event.extra = Some(extra);
		}
		self.scope.apply(&mut event);
		event
	}

	/// Runs the pre-send hook, serializes and hands the event to the transport.
	fn dispatch(&self, event: Event) -> Option<EventId> {
		let event = match self.options.before_send() {
			Some(hook) => {
				let hook = Arc::clone(hook);
				match std::panic::catch_unwind(AssertUnwindSafe(move || hook(event))) {
					Ok(Some(event)) => event,
					Ok(None) => {
						self.log_debug("Event dropped by before_send hook");
						return None;
					}
					Err(_) => {
						error!("before_send hook panicked; event dropped");
						return None;
					}
				}
			}
			None => event,
		};

		let event_id = event.id();
		self.transport.send_event(event_id, event.to_json());
		Some(event_id)
	}

	/// Reports a panic from inside the panic hook, then gives the transport a
	/// bounded chance to deliver it before the thread unwinds further.
	fn capture_panic(&self, info: &PanicHookInfo<'_>) {
		if self.is_destroyed() {
			return;
		}

		let message = panic_message(info);
		if self.is_ignored(Some(message.as_str()), PANIC_TYPE) {
			return;
		}

		let extra = Map::from([("thread".to_string(), Value::from(current_thread_name()))]);
		let mut event = self.build_event(Level::Error, extra);
		event.exceptions = Some(vec![ExceptionValue::new(
			PANIC_TYPE,
			Some(message),
			capture_frames(),
		)]);

		if self.dispatch(event).is_some() && !self.transport.flush(PANIC_FLUSH_TIMEOUT) {
			self.log_debug("Panic report still in flight after flush timeout");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fmt;

	#[derive(Default)]
	struct Recording {
		events: Mutex<Vec<String>>,
		metrics: Mutex<Vec<String>>,
	}

	impl Transport for Recording {
		fn send_event(&self, _event_id: EventId, body: String) {
			self.events.lock().push(body);
		}

		fn send_metric(&self, body: String) {
			self.metrics.lock().push(body);
		}
	}

	#[derive(Debug)]
	struct Refused;

	impl fmt::Display for Refused {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str("Connection refused")
		}
	}

	impl Error for Refused {}

	fn client_with(
		configure: impl FnOnce(crate::options::ClientOptionsBuilder) -> crate::options::ClientOptionsBuilder,
	) -> (Client, Arc<Recording>) {
		let recording = Arc::new(Recording::default());
		let builder = ClientOptions::builder("http://localhost/ingest/p?key=k")
			.auto_capture_errors(false)
			.transport(recording.clone());
		let client = Client::new(configure(builder).build().unwrap()).unwrap();
		(client, recording)
	}

	fn parse(body: &str) -> serde_json::Value {
		serde_json::from_str(body).unwrap()
	}

	#[test]
	fn test_capture_message_defaults_to_info() {
		let (client, recording) = client_with(|b| b.release("1.0.0").environment("test"));
		let id = client.capture_message("hello").unwrap();

		let events = recording.events.lock();
		let json = parse(&events[0]);
		assert_eq!(json["event_id"], id.to_string());
		assert_eq!(json["level"], "info");
		assert_eq!(json["message"], "hello");
		assert_eq!(json["release"], "1.0.0");
		assert_eq!(json["environment"], "test");
		assert!(json.get("exception").is_none());
	}

	#[test]
	fn test_capture_message_with_level_and_extra() {
		let (client, recording) = client_with(|b| b);
		let extra = Map::from([("attempt".to_string(), Value::from(2))]);
		client.capture_message_with("slow", Level::Warning, extra);

		let json = parse(&recording.events.lock()[0]);
		assert_eq!(json["level"], "warning");
		assert_eq!(json["extra"]["attempt"], 2);
	}

	#[test]
	fn test_capture_error_shape() {
		let (client, recording) = client_with(|b| b.attach_stacktrace(false));
		assert!(client.capture_error(&Refused).is_some());

		let json = parse(&recording.events.lock()[0]);
		assert_eq!(json["level"], "error");
		let values = json["exception"]["values"].as_array().unwrap();
		assert_eq!(values.len(), 1);
		assert!(values[0]["type"].as_str().unwrap().ends_with("Refused"));
		assert_eq!(values[0]["value"], "Connection refused");
		assert_eq!(values[0]["stacktrace"]["frames"], serde_json::json!([]));
	}

	#[test]
	fn test_ignored_error_not_sent() {
		let (client, recording) = client_with(|b| b.ignore_error("Connection refused"));
		assert!(client.capture_error(&Refused).is_none());
		assert!(recording.events.lock().is_empty());
	}

	#[test]
	fn test_scope_is_applied() {
		let (client, recording) = client_with(|b| b);
		client.set_user(UserContext::with_id("u1"));
		client.set_tag("region", "eu");
		client.add_breadcrumb(BreadcrumbEntry::new("nav", "opened cart"));
		client.capture_message("m");

		let json = parse(&recording.events.lock()[0]);
		assert_eq!(json["user"]["id"], "u1");
		assert_eq!(json["tags"]["region"], "eu");
		assert_eq!(json["breadcrumbs"][0]["message"], "opened cart");
	}

	#[test]
	fn test_before_send_can_rewrite() {
		let (client, recording) = client_with(|b| {
			b.before_send(|mut event| {
				event.message = Some("scrubbed".into());
				Some(event)
			})
		});
		client.capture_message("secret");
		assert_eq!(parse(&recording.events.lock()[0])["message"], "scrubbed");
	}

	#[test]
	fn test_before_send_panic_drops_event() {
		let (client, recording) = client_with(|b| b.before_send(|_| panic!("hook bug")));
		assert!(client.capture_message("m").is_none());
		assert!(recording.events.lock().is_empty());
	}

	#[test]
	fn test_track_request() {
		let (client, recording) = client_with(|b| b);
		client.track_request("post", "/api/orders/42", 17, 201);
		client.track_request("", "/api", 1, 200);
		client.track_request("GET", "", 1, 200);

		let metrics = recording.metrics.lock();
		assert_eq!(metrics.len(), 1);
		assert_eq!(
			metrics[0],
			r#"{"method":"POST","route":"/api/orders/:id","duration_ms":17,"status_code":201}"#
		);
	}

	#[test]
	fn test_destroy_is_idempotent_and_silences_client() {
		let (client, recording) = client_with(|b| b);
		client.set_tag("k", "v");
		client.add_breadcrumb(BreadcrumbEntry::new("c", "m"));

		client.destroy();
		client.destroy();

		assert!(client.is_destroyed());
		assert!(client.breadcrumbs().is_empty());
		assert!(client.capture_message("m").is_none());
		assert!(client.capture_error(&Refused).is_none());
		client.track_request("GET", "/", 1, 200);
		client.add_breadcrumb(BreadcrumbEntry::new("c", "m"));
		assert!(client.breadcrumbs().is_empty());
		assert!(recording.events.lock().is_empty());
		assert!(recording.metrics.lock().is_empty());
	}

	#[test]
	fn test_clones_share_state() {
		let (client, recording) = client_with(|b| b);
		let other = client.clone();
		assert!(client.ptr_eq(&other));
		other.set_tag("shared", "yes");
		client.capture_message("m");
		assert_eq!(parse(&recording.events.lock()[0])["tags"]["shared"], "yes");
	}
}
