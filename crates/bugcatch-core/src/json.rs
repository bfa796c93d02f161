// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Minimal JSON encoder for event payloads.
//!
//! Every payload is first lowered into a [`Value`] tree and then written by a
//! single recursive encoder. Domain types implement [`Serializable`] and
//! describe themselves as an [`Entity`], which is where the "omit absent
//! optional fields" rule lives. Plain maps and lists keep explicit nulls.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write};

/// Heterogeneous key/value mapping used for `extra` and breadcrumb `data`.
pub type Map = BTreeMap<String, Value>;

/// A JSON number in its native textual form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
	Int(i64),
	UInt(u64),
	Float(f64),
}

impl fmt::Display for Number {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(n) => write!(f, "{n}"),
			Self::UInt(n) => write!(f, "{n}"),
			Self::Float(n) if n.is_finite() => write!(f, "{n}"),
			// JSON has no NaN or infinity.
			Self::Float(_) => f.write_str("null"),
		}
	}
}

/// The closed set of values the encoder understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Number(Number),
	String(String),
	List(Vec<Value>),
	Map(Map),
	Entity(Entity),
}

/// A domain object lowered to its present fields, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
	fields: Vec<(&'static str, Value)>,
}

impl Entity {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a field that is always emitted.
	pub fn field(mut self, name: &'static str, value: impl Into<Value>) -> Self {
		self.fields.push((name, value.into()));
		self
	}

	/// Adds a field only when a value is present.
	pub fn optional<V: Into<Value>>(mut self, name: &'static str, value: Option<V>) -> Self {
		if let Some(value) = value {
			self.fields.push((name, value.into()));
		}
		self
	}

	pub fn fields(&self) -> &[(&'static str, Value)] {
		&self.fields
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self
			.fields
			.iter()
			.find(|(field, _)| *field == name)
			.map(|(_, value)| value)
	}
}

/// Implemented by every domain type that can render itself as JSON.
pub trait Serializable {
	fn to_entity(&self) -> Entity;

	fn to_json(&self) -> String {
		encode(&Value::Entity(self.to_entity()))
	}
}

/// Encodes a value tree into JSON text.
pub fn encode(value: &Value) -> String {
	let mut out = String::with_capacity(256);
	write_value(&mut out, value);
	out
}

/// Quotes and escapes a string, or returns the `null` literal for `None`.
pub fn escape(s: Option<&str>) -> String {
	match s {
		Some(s) => {
			let mut out = String::with_capacity(s.len() + 2);
			write_string(&mut out, s);
			out
		}
		None => "null".to_string(),
	}
}

fn write_value(out: &mut String, value: &Value) {
	match value {
		Value::Null => out.push_str("null"),
		Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
		Value::Number(n) => {
			let _ = write!(out, "{n}");
		}
		Value::String(s) => write_string(out, s),
		Value::List(items) => {
			out.push('[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_value(out, item);
			}
			out.push(']');
		}
		Value::Map(map) => write_object(out, map.iter().map(|(k, v)| (k.as_str(), v))),
		Value::Entity(entity) => write_object(out, entity.fields.iter().map(|(k, v)| (*k, v))),
	}
}

fn write_object<'a>(out: &mut String, entries: impl Iterator<Item = (&'a str, &'a Value)>) {
	out.push('{');
	for (i, (key, value)) in entries.enumerate() {
		if i > 0 {
			out.push(',');
		}
		write_string(out, key);
		out.push(':');
		write_value(out, value);
	}
	out.push('}');
}

fn write_string(out: &mut String, s: &str) {
	out.push('"');
	for c in s.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\u{08}' => out.push_str("\\b"),
			'\u{0C}' => out.push_str("\\f"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if (c as u32) < 0x20 => {
				let _ = write!(out, "\\u{:04x}", c as u32);
			}
			c => out.push(c),
		}
	}
	out.push('"');
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl From<&String> for Value {
	fn from(s: &String) -> Self {
		Value::String(s.clone())
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

macro_rules! impl_from_number {
	($variant:ident, $target:ty, $($t:ty),+) => {
		$(
			impl From<$t> for Value {
				fn from(n: $t) -> Self {
					Value::Number(Number::$variant(n as $target))
				}
			}
		)+
	};
}

impl_from_number!(Int, i64, i8, i16, i32, i64, isize);
impl_from_number!(UInt, u64, u8, u16, u32, u64, usize);
impl_from_number!(Float, f64, f32, f64);

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Value::Null)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Value::List(items.into_iter().map(Into::into).collect())
	}
}

impl From<Map> for Value {
	fn from(map: Map) -> Self {
		Value::Map(map)
	}
}

impl From<&Map> for Value {
	fn from(map: &Map) -> Self {
		Value::Map(map.clone())
	}
}

impl From<&BTreeMap<String, String>> for Value {
	fn from(map: &BTreeMap<String, String>) -> Self {
		Value::Map(
			map
				.iter()
				.map(|(k, v)| (k.clone(), Value::String(v.clone())))
				.collect(),
		)
	}
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
	fn from(map: HashMap<String, V>) -> Self {
		Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
	}
}

impl From<Entity> for Value {
	fn from(entity: Entity) -> Self {
		Value::Entity(entity)
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(b),
			serde_json::Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Value::Number(Number::Int(i))
				} else if let Some(u) = n.as_u64() {
					Value::Number(Number::UInt(u))
				} else {
					n.as_f64()
						.map(|f| Value::Number(Number::Float(f)))
						.unwrap_or(Value::Null)
				}
			}
			serde_json::Value::String(s) => Value::String(s),
			serde_json::Value::Array(items) => Value::List(items.into_iter().map(Into::into).collect()),
			serde_json::Value::Object(map) => {
				Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_escapes_quotes_backslashes_and_controls() {
		let raw = "say \"hi\"\\ then\nbreak\u{01}\tend";
		let encoded = escape(Some(raw));
		assert_eq!(encoded, r#""say \"hi\"\\ then\nbreak\u0001\tend""#);

		let decoded: String = serde_json::from_str(&encoded).unwrap();
		assert_eq!(decoded, raw);
	}

	#[test]
	fn test_non_ascii_passes_through() {
		assert_eq!(escape(Some("héllo ✓")), "\"héllo ✓\"");
	}

	#[test]
	fn test_escape_none_is_null_literal() {
		assert_eq!(escape(None), "null");
	}

	#[test]
	fn test_map_keeps_explicit_nulls() {
		let mut map = Map::new();
		map.insert("a".into(), Value::Null);
		map.insert("b".into(), 2.into());
		assert_eq!(encode(&Value::Map(map)), r#"{"a":null,"b":2}"#);
	}

	#[test]
	fn test_entity_omits_absent_fields() {
		let entity = Entity::new()
			.field("kept", "x")
			.optional::<String>("missing", None)
			.optional("present", Some(true));
		assert_eq!(entity.get("kept"), Some(&Value::String("x".into())));
		assert_eq!(entity.get("missing"), None);
		let names: Vec<&str> = entity.fields().iter().map(|(name, _)| *name).collect();
		assert_eq!(names, ["kept", "present"]);
		assert_eq!(encode(&entity.into()), r#"{"kept":"x","present":true}"#);
	}

	#[test]
	fn test_nested_lists_and_numbers() {
		let value = Value::List(vec![
			1i32.into(),
			Value::from(-7i64),
			Value::from(1.5f64),
			Value::from(f64::NAN),
			Value::List(vec![]),
		]);
		assert_eq!(encode(&value), "[1,-7,1.5,null,[]]");
	}

	#[test]
	fn test_converts_from_serde_json() {
		let value: Value = serde_json::json!({"n": 3, "s": "x", "l": [true, null]}).into();
		let encoded = encode(&value);
		let parsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
		assert_eq!(parsed, serde_json::json!({"n": 3, "s": "x", "l": [true, null]}));
	}

	proptest! {
		#[test]
		fn escaped_strings_parse_back(s in any::<String>()) {
			let encoded = escape(Some(&s));
			let decoded: String = serde_json::from_str(&encoded).unwrap();
			prop_assert_eq!(decoded, s);
		}
	}
}
