// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bugcatch_core::{ErrorFilter, Event, IgnoreRule, DEFAULT_MAX_BREADCRUMBS};
use url::Url;

use crate::error::{BugcatchError, Result};
use crate::transport::Transport;

/// Timeout for event requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variables read by [`ClientOptionsBuilder::from_env`].
pub mod env {
	pub const DSN: &str = "BUGCATCH_DSN";
	pub const RELEASE: &str = "BUGCATCH_RELEASE";
	pub const ENVIRONMENT: &str = "BUGCATCH_ENVIRONMENT";
	pub const DEBUG: &str = "BUGCATCH_DEBUG";
	pub const MAX_BREADCRUMBS: &str = "BUGCATCH_MAX_BREADCRUMBS";
}

/// Hook run on every event before it is sent.
///
/// Return the event (modified or not) to send it, or `None` to drop it. The
/// hook runs synchronously on the capturing thread.
pub type BeforeSend = Arc<dyn Fn(Event) -> Option<Event> + Send + Sync>;

/// Immutable client configuration. Build via [`ClientOptions::builder`].
#[derive(Clone)]
pub struct ClientOptions {
	dsn: Url,
	release: Option<String>,
	environment: Option<String>,
	debug: bool,
	max_breadcrumbs: usize,
	auto_capture_errors: bool,
	attach_stacktrace: bool,
	request_timeout: Duration,
	ignore_errors: ErrorFilter,
	before_send: Option<BeforeSend>,
	transport: Option<Arc<dyn Transport>>,
}

impl ClientOptions {
	/// Starts a builder for the given DSN, e.g.
	/// `https://host/ingest/{project}?key={sdk_key}`. The DSN is also the
	/// ingest URL.
	pub fn builder(dsn: impl Into<String>) -> ClientOptionsBuilder {
		ClientOptionsBuilder::new(dsn)
	}

	pub fn dsn(&self) -> &Url {
		&self.dsn
	}

	pub fn release(&self) -> Option<&str> {
		self.release.as_deref()
	}

	pub fn environment(&self) -> Option<&str> {
		self.environment.as_deref()
	}

	pub fn debug(&self) -> bool {
		self.debug
	}

	pub fn max_breadcrumbs(&self) -> usize {
		self.max_breadcrumbs
	}

	pub fn auto_capture_errors(&self) -> bool {
		self.auto_capture_errors
	}

	pub fn attach_stacktrace(&self) -> bool {
		self.attach_stacktrace
	}

	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	pub fn ignore_errors(&self) -> &ErrorFilter {
		&self.ignore_errors
	}

	pub fn before_send(&self) -> Option<&BeforeSend> {
		self.before_send.as_ref()
	}

	pub(crate) fn transport(&self) -> Option<&Arc<dyn Transport>> {
		self.transport.as_ref()
	}
}

impl fmt::Debug for ClientOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientOptions")
			.field("dsn", &self.dsn.as_str())
			.field("release", &self.release)
			.field("environment", &self.environment)
			.field("debug", &self.debug)
			.field("max_breadcrumbs", &self.max_breadcrumbs)
			.field("auto_capture_errors", &self.auto_capture_errors)
			.field("attach_stacktrace", &self.attach_stacktrace)
			.field("request_timeout", &self.request_timeout)
			.field("ignore_errors", &self.ignore_errors.rules().len())
			.field("before_send", &self.before_send.is_some())
			.field("custom_transport", &self.transport.is_some())
			.finish()
	}
}

enum PendingRule {
	Literal(String),
	Pattern(String),
}

/// Builder for [`ClientOptions`].
pub struct ClientOptionsBuilder {
	dsn: String,
	release: Option<String>,
	environment: Option<String>,
	debug: bool,
	max_breadcrumbs: usize,
	auto_capture_errors: bool,
	attach_stacktrace: bool,
	request_timeout: Duration,
	ignore_errors: Vec<PendingRule>,
	before_send: Option<BeforeSend>,
	transport: Option<Arc<dyn Transport>>,
}

impl ClientOptionsBuilder {
	/// Creates a builder with default settings.
	pub fn new(dsn: impl Into<String>) -> Self {
		Self {
			dsn: dsn.into(),
			release: None,
			environment: None,
			debug: false,
			max_breadcrumbs: DEFAULT_MAX_BREADCRUMBS,
			auto_capture_errors: true,
			attach_stacktrace: true,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			ignore_errors: Vec::new(),
			before_send: None,
			transport: None,
		}
	}

	/// Creates a builder from `BUGCATCH_*` environment variables.
	///
	/// A missing `BUGCATCH_DSN` is reported by [`build`](Self::build).
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|var| std::env::var(var).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let mut builder = Self::new(lookup(env::DSN).unwrap_or_default());
		builder.release = lookup(env::RELEASE).filter(|v| !v.is_empty());
		builder.environment = lookup(env::ENVIRONMENT).filter(|v| !v.is_empty());

		if let Some(value) = lookup(env::DEBUG) {
			builder.debug = match value.trim().to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" | "on" => true,
				"" | "0" | "false" | "no" | "off" => false,
				_ => {
					return Err(BugcatchError::InvalidEnvValue {
						var: env::DEBUG,
						value,
					})
				}
			};
		}

		if let Some(value) = lookup(env::MAX_BREADCRUMBS) {
			builder.max_breadcrumbs =
				value
					.trim()
					.parse()
					.map_err(|_| BugcatchError::InvalidEnvValue {
						var: env::MAX_BREADCRUMBS,
						value,
					})?;
		}

		Ok(builder)
	}

	/// Application version, e.g. `1.2.3` or a git SHA.
	pub fn release(mut self, release: impl Into<String>) -> Self {
		self.release = Some(release.into());
		self
	}

	/// Deployment environment, e.g. `production`, `staging`.
	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}

	/// Emit routine diagnostics (dropped events, successful sends) at debug level.
	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	/// Maximum breadcrumbs kept in memory. Default: 100.
	pub fn max_breadcrumbs(mut self, max: usize) -> Self {
		self.max_breadcrumbs = max;
		self
	}

	/// Install a panic hook that reports panics. Default: `true`.
	pub fn auto_capture_errors(mut self, enabled: bool) -> Self {
		self.auto_capture_errors = enabled;
		self
	}

	/// Attach the capture-site backtrace to captured errors. Default: `true`.
	pub fn attach_stacktrace(mut self, enabled: bool) -> Self {
		self.attach_stacktrace = enabled;
		self
	}

	/// Timeout for event requests. Default: 10 seconds.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Drop errors whose message contains the given text.
	/// Call multiple times to add more rules.
	pub fn ignore_error(mut self, literal: impl Into<String>) -> Self {
		self.ignore_errors.push(PendingRule::Literal(literal.into()));
		self
	}

	/// Drop errors whose message matches the given regular expression.
	/// Call multiple times to add more rules.
	pub fn ignore_error_pattern(mut self, pattern: impl Into<String>) -> Self {
		self.ignore_errors.push(PendingRule::Pattern(pattern.into()));
		self
	}

	/// Hook called before each event is sent.
	pub fn before_send<F>(mut self, hook: F) -> Self
	where
		F: Fn(Event) -> Option<Event> + Send + Sync + 'static,
	{
		self.before_send = Some(Arc::new(hook));
		self
	}

	/// Replace the HTTP transport, e.g. to route events through the host's own
	/// delivery or to record them in tests.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Validates the settings and builds the options.
	pub fn build(self) -> Result<ClientOptions> {
		let dsn = self.dsn.trim();
		if dsn.is_empty() {
			return Err(BugcatchError::MissingDsn);
		}
		let dsn = Url::parse(dsn).map_err(|source| BugcatchError::InvalidDsn {
			dsn: dsn.to_string(),
			source,
		})?;
		if !matches!(dsn.scheme(), "http" | "https") {
			return Err(BugcatchError::UnsupportedScheme(dsn.scheme().to_string()));
		}

		if self.max_breadcrumbs == 0 {
			return Err(BugcatchError::InvalidMaxBreadcrumbs);
		}

		let mut ignore_errors = ErrorFilter::default();
		for rule in self.ignore_errors {
			ignore_errors.push(match rule {
				PendingRule::Literal(text) => IgnoreRule::literal(text),
				PendingRule::Pattern(pattern) => IgnoreRule::pattern(&pattern)?,
			});
		}

		Ok(ClientOptions {
			dsn,
			release: self.release,
			environment: self.environment,
			debug: self.debug,
			max_breadcrumbs: self.max_breadcrumbs,
			auto_capture_errors: self.auto_capture_errors,
			attach_stacktrace: self.attach_stacktrace,
			request_timeout: self.request_timeout,
			ignore_errors,
			before_send: self.before_send,
			transport: self.transport,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bugcatch_core::CoreError;
	use std::collections::HashMap;

	const DSN: &str = "https://ingest.example.com/ingest/proj_1?key=abc";

	#[test]
	fn test_defaults() {
		let options = ClientOptions::builder(DSN).build().unwrap();
		assert_eq!(options.dsn().as_str(), DSN);
		assert!(!options.debug());
		assert_eq!(options.max_breadcrumbs(), 100);
		assert!(options.auto_capture_errors());
		assert!(options.attach_stacktrace());
		assert_eq!(options.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
		assert!(options.ignore_errors().is_empty());
		assert!(options.before_send().is_none());
	}

	#[test]
	fn test_blank_dsn_fails_fast() {
		assert!(matches!(
			ClientOptions::builder("   ").build(),
			Err(BugcatchError::MissingDsn)
		));
		assert!(matches!(
			ClientOptions::builder("").build(),
			Err(BugcatchError::MissingDsn)
		));
	}

	#[test]
	fn test_unparseable_dsn() {
		assert!(matches!(
			ClientOptions::builder("not a url").build(),
			Err(BugcatchError::InvalidDsn { .. })
		));
	}

	#[test]
	fn test_non_http_dsn() {
		assert!(matches!(
			ClientOptions::builder("ftp://example.com/ingest").build(),
			Err(BugcatchError::UnsupportedScheme(s)) if s == "ftp"
		));
	}

	#[test]
	fn test_zero_breadcrumbs_rejected() {
		assert!(matches!(
			ClientOptions::builder(DSN).max_breadcrumbs(0).build(),
			Err(BugcatchError::InvalidMaxBreadcrumbs)
		));
	}

	#[test]
	fn test_bad_ignore_pattern_rejected() {
		let result = ClientOptions::builder(DSN)
			.ignore_error("fine")
			.ignore_error_pattern("[")
			.build();
		assert!(matches!(
			result,
			Err(BugcatchError::Core(CoreError::InvalidIgnorePattern { .. }))
		));
	}

	#[test]
	fn test_ignore_rules_compiled_in_order() {
		let options = ClientOptions::builder(DSN)
			.ignore_error("Connection refused")
			.ignore_error_pattern("^timeout")
			.build()
			.unwrap();
		let rules = options.ignore_errors().rules();
		assert_eq!(rules.len(), 2);
		assert!(matches!(rules[0], IgnoreRule::Literal(_)));
		assert!(matches!(rules[1], IgnoreRule::Pattern(_)));
	}

	#[test]
	fn test_from_lookup_reads_all_vars() {
		let vars: HashMap<&str, &str> = HashMap::from([
			(env::DSN, DSN),
			(env::RELEASE, "1.2.3"),
			(env::ENVIRONMENT, "staging"),
			(env::DEBUG, "true"),
			(env::MAX_BREADCRUMBS, "25"),
		]);
		let options = ClientOptionsBuilder::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
			.unwrap()
			.build()
			.unwrap();

		assert_eq!(options.release(), Some("1.2.3"));
		assert_eq!(options.environment(), Some("staging"));
		assert!(options.debug());
		assert_eq!(options.max_breadcrumbs(), 25);
	}

	#[test]
	fn test_from_lookup_missing_dsn() {
		let builder = ClientOptionsBuilder::from_lookup(|_| None).unwrap();
		assert!(matches!(builder.build(), Err(BugcatchError::MissingDsn)));
	}

	#[test]
	fn test_from_lookup_rejects_bad_values() {
		let result = ClientOptionsBuilder::from_lookup(|k| {
			(k == env::MAX_BREADCRUMBS).then(|| "lots".to_string())
		});
		assert!(matches!(
			result,
			Err(BugcatchError::InvalidEnvValue { var, .. }) if var == env::MAX_BREADCRUMBS
		));

		let result = ClientOptionsBuilder::from_lookup(|k| (k == env::DEBUG).then(|| "maybe".to_string()));
		assert!(matches!(result, Err(BugcatchError::InvalidEnvValue { .. })));
	}
}
