// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route templating and request timing metrics.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::json::{Entity, Serializable};

/// Replacement for identifier segments.
pub const ID_PLACEHOLDER: &str = ":id";

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"/[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
	)
	.unwrap()
});

/// Rewrites a raw path or URL into a route template so metrics group by route
/// rather than by resource id.
///
/// UUID segments are replaced first, then segments made only of 1 to 20
/// digits. Query strings and fragments are dropped and percent-escapes are
/// decoded.
pub fn normalize_route(route: &str) -> String {
	let path = extract_path(route);
	let path = UUID_SEGMENT.replace_all(&path, "/:id");

	path
		.split('/')
		.enumerate()
		.map(|(i, segment)| {
			// The first piece has no leading separator.
			if i > 0 && is_numeric_id(segment) {
				ID_PLACEHOLDER
			} else {
				segment
			}
		})
		.collect::<Vec<_>>()
		.join("/")
}

/// The decoded path, so `https://host/caf%C3%A9` and `/café` template alike.
fn extract_path(route: &str) -> String {
	let path = match Url::parse(route) {
		Ok(url) if url.has_host() => url.path().to_string(),
		_ => {
			let end = route.find(['?', '#']).unwrap_or(route.len());
			route[..end].to_string()
		}
	};
	match urlencoding::decode(&path) {
		Ok(decoded) => decoded.into_owned(),
		Err(_) => path,
	}
}

fn is_numeric_id(segment: &str) -> bool {
	(1..=20).contains(&segment.len()) && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Timing of one HTTP request, reported to the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetric {
	pub method: String,
	pub route: String,
	pub duration_ms: u64,
	pub status_code: u16,
}

impl RequestMetric {
	/// Uppercases the method and templates the route.
	pub fn new(method: &str, route: &str, duration_ms: u64, status_code: u16) -> Self {
		Self {
			method: method.to_uppercase(),
			route: normalize_route(route),
			duration_ms,
			status_code,
		}
	}
}

impl Serializable for RequestMetric {
	fn to_entity(&self) -> Entity {
		Entity::new()
			.field("method", self.method.as_str())
			.field("route", self.route.as_str())
			.field("duration_ms", self.duration_ms)
			.field("status_code", self.status_code)
	}
}
