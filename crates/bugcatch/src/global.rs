// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide convenience layer.
//!
//! Every function forwards to the client installed by [`init`] and is a no-op
//! (returning `None` where a value is expected) when there is none.

use std::error::Error;
use std::time::Duration;

use bugcatch_core::{BreadcrumbEntry, EventId, Level, Map, UserContext};
use parking_lot::RwLock;

use crate::client::Client;
use crate::error::Result;
use crate::options::ClientOptions;

static CURRENT: RwLock<Option<Client>> = parking_lot::const_rwlock(None);

/// Installs a new process-wide client, destroying the current one first so its
/// panic hook is gone before the new one chains onto the original.
///
/// The lock is not held while hooks are swapped: a panicking thread holds the
/// hook lock while its report may call back into this module.
pub fn init(options: ClientOptions) -> Result<Client> {
	let previous = CURRENT.write().take();
	if let Some(previous) = previous {
		previous.destroy();
	}

	let client = Client::new(options)?;
	let replaced = CURRENT.write().replace(client.clone());
	// A concurrent init raced us; keep the newest and retire the other.
	if let Some(replaced) = replaced {
		replaced.destroy();
	}
	Ok(client)
}

/// Destroys and removes the process-wide client. Safe to call repeatedly.
pub fn destroy() {
	let previous = CURRENT.write().take();
	if let Some(client) = previous {
		client.destroy();
	}
}

/// The current process-wide client, if any.
pub fn client() -> Option<Client> {
	CURRENT.read().clone()
}

pub fn is_initialized() -> bool {
	CURRENT.read().is_some()
}

fn with_client<R>(f: impl FnOnce(&Client) -> Option<R>) -> Option<R> {
	// Clone out so hooks calling back into this module never hold the lock.
	client().and_then(|client| f(&client))
}

pub fn capture_error<E: Error + ?Sized>(error: &E) -> Option<EventId> {
	with_client(|client| client.capture_error(error))
}

pub fn capture_error_with<E: Error + ?Sized>(error: &E, extra: Map) -> Option<EventId> {
	with_client(|client| client.capture_error_with(error, extra))
}

pub fn capture_message(message: impl Into<String>) -> Option<EventId> {
	with_client(|client| client.capture_message(message))
}

pub fn capture_message_with(message: impl Into<String>, level: Level, extra: Map) -> Option<EventId> {
	with_client(|client| client.capture_message_with(message, level, extra))
}

pub fn set_user(user: UserContext) {
	if let Some(client) = client() {
		client.set_user(user);
	}
}

pub fn clear_user() {
	if let Some(client) = client() {
		client.clear_user();
	}
}

pub fn set_tag(key: impl Into<String>, value: impl Into<String>) {
	if let Some(client) = client() {
		client.set_tag(key, value);
	}
}

pub fn remove_tag(key: &str) {
	if let Some(client) = client() {
		client.remove_tag(key);
	}
}

pub fn add_breadcrumb(breadcrumb: BreadcrumbEntry) {
	if let Some(client) = client() {
		client.add_breadcrumb(breadcrumb);
	}
}

pub fn track_request(method: &str, route: &str, duration_ms: u64, status_code: u16) {
	if let Some(client) = client() {
		client.track_request(method, route, duration_ms, status_code);
	}
}

/// Waits for in-flight sends of the current client. True when there is no
/// client or everything completed within `timeout`.
pub fn flush(timeout: Duration) -> bool {
	client().map(|client| client.flush(timeout)).unwrap_or(true)
}
