// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error-telemetry SDK for Rust applications.
//!
//! Captures errors, panics and messages, enriches them with user, tags and
//! breadcrumbs, and posts them to a bugcatch ingest endpoint without blocking
//! the caller.
//!
//! # Quick Start
//!
//! ```ignore
//! use bugcatch::{BreadcrumbEntry, ClientOptions, UserContext};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::builder("https://bugs.example.com/ingest/proj_1?key=sdk_key")
//!         .release(env!("CARGO_PKG_VERSION"))
//!         .environment("production")
//!         .ignore_error("Connection reset by peer")
//!         .build()?;
//!
//!     // Installs the panic hook as well.
//!     bugcatch::init(options)?;
//!
//!     bugcatch::set_user(UserContext::with_id("user_123"));
//!     bugcatch::set_tag("server", "web-01");
//!     bugcatch::add_breadcrumb(BreadcrumbEntry::new("startup", "Application started"));
//!
//!     if let Err(e) = risky_operation() {
//!         bugcatch::capture_error(&e);
//!     }
//!
//!     bugcatch::track_request("get", "/api/orders/42", 18, 200);
//!
//!     bugcatch::flush(std::time::Duration::from_secs(2));
//!     bugcatch::destroy();
//!     Ok(())
//! }
//!
//! fn risky_operation() -> Result<(), std::io::Error> {
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Panic Hook**: chains onto the existing hook and reports panics with the
//!   panicking thread's backtrace
//! - **Error Chains**: `source()` chains are reported root cause first
//! - **Ignore Rules**: literal or regex rules drop matching errors before any
//!   event is built
//! - **Pre-send Hook**: inspect, rewrite or drop every event
//! - **Request Metrics**: request timings grouped by route template
//!
//! Hosts that prefer an explicit handle can use [`Client`] directly instead of
//! the free functions.

mod backtrace;
pub mod client;
pub mod error;
mod global;
pub mod options;
pub mod panic_hook;
mod scope;
pub mod transport;

pub use client::{Client, PANIC_FLUSH_TIMEOUT, PANIC_TYPE};
pub use error::{BugcatchError, Result};
pub use global::{
	add_breadcrumb, capture_error, capture_error_with, capture_message, capture_message_with,
	clear_user, client, destroy, flush, init, is_initialized, remove_tag, set_tag, set_user,
	track_request,
};
pub use options::{BeforeSend, ClientOptions, ClientOptionsBuilder, DEFAULT_REQUEST_TIMEOUT};
pub use panic_hook::HookRegistration;
pub use transport::{metrics_url, HttpTransport, Transport};

pub use bugcatch_core::{
	normalize_route, BreadcrumbEntry, Event, EventId, ExceptionValue, Level, Map, StackFrame,
	UserContext, Value,
};
