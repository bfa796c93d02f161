// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Breadcrumbs (events leading up to an error) and the bounded buffer that holds them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::event::format_timestamp;
use crate::json::{Entity, Map, Serializable};

/// Default breadcrumb capacity.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// A single breadcrumb recorded before an error.
#[derive(Debug, Clone, PartialEq)]
pub struct BreadcrumbEntry {
	pub timestamp: DateTime<Utc>,
	/// "default", "http", "navigation", "query"
	pub kind: Option<String>,
	/// "user.action", "db.query"
	pub category: Option<String>,
	pub message: Option<String>,
	pub data: Option<Map>,
}

impl Default for BreadcrumbEntry {
	fn default() -> Self {
		Self {
			timestamp: Utc::now(),
			kind: None,
			category: None,
			message: None,
			data: None,
		}
	}
}

impl BreadcrumbEntry {
	/// Creates a breadcrumb with a category and message, timestamped now.
	pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			category: Some(category.into()),
			message: Some(message.into()),
			..Default::default()
		}
	}
}

impl Serializable for BreadcrumbEntry {
	fn to_entity(&self) -> Entity {
		Entity::new()
			.field("timestamp", format_timestamp(&self.timestamp))
			.optional("type", self.kind.as_ref())
			.optional("category", self.category.as_ref())
			.optional("message", self.message.as_ref())
			.optional("data", self.data.as_ref().filter(|data| !data.is_empty()))
	}
}

/// Thread-safe ring buffer of breadcrumbs.
///
/// When the buffer is full the oldest entry is evicted before the new one is
/// inserted, so the capacity is never exceeded.
#[derive(Debug)]
pub struct BreadcrumbBuffer {
	entries: Mutex<VecDeque<BreadcrumbEntry>>,
	capacity: usize,
}

impl BreadcrumbBuffer {
	/// Creates a buffer holding at most `capacity` entries (minimum one).
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			entries: Mutex::new(VecDeque::with_capacity(capacity)),
			capacity,
		}
	}

	pub fn add(&self, entry: BreadcrumbEntry) {
		let mut entries = self.entries.lock();
		if entries.len() >= self.capacity {
			entries.pop_front();
		}
		entries.push_back(entry);
	}

	/// Returns a snapshot of all entries, oldest first.
	pub fn get_all(&self) -> Vec<BreadcrumbEntry> {
		self.entries.lock().iter().cloned().collect()
	}

	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

impl Default for BreadcrumbBuffer {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_BREADCRUMBS)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::sync::Arc;
	use std::thread;

	fn crumb(i: usize) -> BreadcrumbEntry {
		BreadcrumbEntry::new("test", format!("msg {i}"))
	}

	#[test]
	fn test_capacity_eviction() {
		let buffer = BreadcrumbBuffer::new(3);
		for i in 1..=4 {
			buffer.add(crumb(i));
		}

		let entries = buffer.get_all();
		assert_eq!(entries.len(), 3);
		assert_eq!(entries[0].message.as_deref(), Some("msg 2"));
		assert_eq!(entries[2].message.as_deref(), Some("msg 4"));
	}

	#[test]
	fn test_clear() {
		let buffer = BreadcrumbBuffer::new(5);
		buffer.add(crumb(1));
		buffer.add(crumb(2));
		buffer.clear();
		assert!(buffer.is_empty());
		assert!(buffer.get_all().is_empty());
	}

	#[test]
	fn test_zero_capacity_is_clamped() {
		let buffer = BreadcrumbBuffer::new(0);
		buffer.add(crumb(1));
		buffer.add(crumb(2));
		assert_eq!(buffer.capacity(), 1);
		assert_eq!(buffer.get_all()[0].message.as_deref(), Some("msg 2"));
	}

	#[test]
	fn test_snapshot_is_detached() {
		let buffer = BreadcrumbBuffer::new(5);
		buffer.add(crumb(1));
		let snapshot = buffer.get_all();
		buffer.add(crumb(2));
		assert_eq!(snapshot.len(), 1);
		assert_eq!(buffer.len(), 2);
	}

	#[test]
	fn test_concurrent_add_and_read_never_exceed_capacity() {
		let buffer = Arc::new(BreadcrumbBuffer::new(10));
		let mut handles = Vec::new();

		for t in 0..8 {
			let buffer = Arc::clone(&buffer);
			handles.push(thread::spawn(move || {
				for i in 0..200 {
					buffer.add(crumb(t * 1000 + i));
				}
			}));
		}
		for _ in 0..4 {
			let buffer = Arc::clone(&buffer);
			handles.push(thread::spawn(move || {
				for _ in 0..200 {
					assert!(buffer.get_all().len() <= 10);
				}
			}));
		}

		for handle in handles {
			handle.join().unwrap();
		}
		assert_eq!(buffer.len(), 10);
	}

	#[test]
	fn test_serializes_type_field() {
		let entry = BreadcrumbEntry {
			timestamp: DateTime::parse_from_rfc3339("2025-01-02T03:04:05.678Z")
				.unwrap()
				.with_timezone(&Utc),
			kind: Some("http".into()),
			message: Some("GET /".into()),
			..Default::default()
		};
		assert_eq!(
			entry.to_json(),
			r#"{"timestamp":"2025-01-02T03:04:05.678Z","type":"http","message":"GET /"}"#
		);
	}

	proptest! {
		#[test]
		fn retains_last_n_in_order(capacity in 1usize..20, inserts in 0usize..60) {
			let buffer = BreadcrumbBuffer::new(capacity);
			for i in 0..inserts {
				buffer.add(crumb(i));
			}

			let entries = buffer.get_all();
			let kept = inserts.min(capacity);
			prop_assert_eq!(entries.len(), kept);
			for (offset, entry) in entries.iter().enumerate() {
				let expected = format!("msg {}", inserts - kept + offset);
				prop_assert_eq!(entry.message.as_deref(), Some(expected.as_str()));
			}
		}
	}
}
