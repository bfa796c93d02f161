// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The event payload sent to the ingest endpoint.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::breadcrumb::BreadcrumbEntry;
use crate::context::UserContext;
use crate::exception::ExceptionValue;
use crate::json::{Entity, Map, Serializable, Value};
use crate::level::Level;

/// Platform tag carried by every event.
pub const PLATFORM: &str = "rust";

/// Unique identifier of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.hyphenated())
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// One captured error or message.
///
/// The id and timestamp are fixed at creation. Everything else is public so a
/// pre-send hook can inspect and rewrite the event before it is serialized.
#[derive(Debug, Clone)]
pub struct Event {
	id: EventId,
	timestamp: DateTime<Utc>,
	pub level: Level,
	pub message: Option<String>,
	pub release: Option<String>,
	pub environment: Option<String>,
	pub user: Option<Arc<UserContext>>,
	pub tags: Option<BTreeMap<String, String>>,
	pub extra: Option<Map>,
	/// Root cause first, originally raised error last.
	pub exceptions: Option<Vec<ExceptionValue>>,
	/// Oldest first.
	pub breadcrumbs: Option<Vec<BreadcrumbEntry>>,
}

impl Event {
	/// Creates an event with a fresh id and the current time.
	pub fn new(level: Level) -> Self {
		Self {
			id: EventId::new(),
			timestamp: Utc::now(),
			level,
			message: None,
			release: None,
			environment: None,
			user: None,
			tags: None,
			extra: None,
			exceptions: None,
			breadcrumbs: None,
		}
	}

	pub fn id(&self) -> EventId {
		self.id
	}

	pub fn timestamp(&self) -> DateTime<Utc> {
		self.timestamp
	}

	pub fn platform(&self) -> &'static str {
		PLATFORM
	}
}

impl Serializable for Event {
	fn to_entity(&self) -> Entity {
		let exception = self.exceptions.as_ref().filter(|e| !e.is_empty()).map(|values| {
			let values: Vec<Value> = values.iter().map(|v| Value::Entity(v.to_entity())).collect();
			Entity::new().field("values", values)
		});
		let breadcrumbs = self.breadcrumbs.as_ref().filter(|b| !b.is_empty()).map(|crumbs| {
			crumbs
				.iter()
				.map(|c| Value::Entity(c.to_entity()))
				.collect::<Vec<_>>()
		});

		Entity::new()
			.field("event_id", self.id.to_string())
			.field("timestamp", format_timestamp(&self.timestamp))
			.field("platform", PLATFORM)
			.field("level", self.level.as_str())
			.optional("message", self.message.as_ref())
			.optional("release", self.release.as_ref())
			.optional("environment", self.environment.as_ref())
			.optional("user", self.user.as_ref().map(|user| user.to_entity()))
			.optional("tags", self.tags.as_ref().filter(|t| !t.is_empty()))
			.optional("extra", self.extra.as_ref().filter(|e| !e.is_empty()))
			.optional("exception", exception)
			.optional("breadcrumbs", breadcrumbs)
	}
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-02T03:04:05.678Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
	timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_minimal_event_has_fixed_fields_only() {
		let event = Event::new(Level::Info);
		let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
		let object = json.as_object().unwrap();

		assert_eq!(object.len(), 4);
		assert_eq!(json["event_id"], event.id().to_string());
		assert_eq!(json["platform"], "rust");
		assert_eq!(json["level"], "info");
		assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
	}

	#[test]
	fn test_full_event_shape() {
		let mut event = Event::new(Level::Error);
		event.message = Some("boom".into());
		event.release = Some("1.2.3".into());
		event.environment = Some("production".into());
		event.user = Some(Arc::new(UserContext::with_id("u1")));
		event.tags = Some(BTreeMap::from([("region".to_string(), "eu".to_string())]));
		event.extra = Some(Map::from([("attempt".to_string(), Value::from(3))]));
		event.exceptions = Some(vec![ExceptionValue::new("Io", Some("disk".into()), vec![])]);
		event.breadcrumbs = Some(vec![BreadcrumbEntry::new("ui", "clicked")]);

		let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
		assert_eq!(json["message"], "boom");
		assert_eq!(json["release"], "1.2.3");
		assert_eq!(json["environment"], "production");
		assert_eq!(json["user"], serde_json::json!({"id": "u1"}));
		assert_eq!(json["tags"]["region"], "eu");
		assert_eq!(json["extra"]["attempt"], 3);
		assert_eq!(json["exception"]["values"][0]["type"], "Io");
		assert_eq!(json["exception"]["values"][0]["value"], "disk");
		assert_eq!(json["breadcrumbs"][0]["category"], "ui");
	}

	#[test]
	fn test_empty_collections_are_omitted() {
		let mut event = Event::new(Level::Warning);
		event.tags = Some(BTreeMap::new());
		event.extra = Some(Map::new());
		event.exceptions = Some(Vec::new());
		event.breadcrumbs = Some(Vec::new());

		let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
		for key in ["tags", "extra", "exception", "breadcrumbs"] {
			assert!(json.get(key).is_none(), "{key} should be omitted");
		}
	}

	#[test]
	fn test_ids_are_unique_and_hyphenated() {
		let a = Event::new(Level::Info).id();
		let b = Event::new(Level::Info).id();
		assert_ne!(a, b);
		assert_eq!(a.to_string().len(), 36);
	}

	proptest! {
		#[test]
		fn event_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let id = EventId(Uuid::from_bytes(uuid_bytes));
			let parsed: EventId = id.to_string().parse().unwrap();
			prop_assert_eq!(id, parsed);
		}

		#[test]
		fn messages_survive_serialization(message in any::<String>()) {
			let mut event = Event::new(Level::Info);
			event.message = Some(message.clone());
			let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
			prop_assert_eq!(json["message"].as_str(), Some(message.as_str()));
		}
	}
}
