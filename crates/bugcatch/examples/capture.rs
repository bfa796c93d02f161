// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Capture errors, messages and request timings with the bugcatch SDK.
//!
//! Run with:
//!   BUGCATCH_DSN=http://localhost:8080/ingest/proj_1?key=sdk_key \
//!   RUST_LOG=bugcatch=debug cargo run --example capture -p bugcatch

use std::time::Duration;

use bugcatch::{BreadcrumbEntry, ClientOptionsBuilder, Level, Map, UserContext, Value};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let options = ClientOptionsBuilder::from_env()?
		.release("0.1.0-example")
		.environment("development")
		.debug(true)
		.ignore_error("Connection reset by peer")
		.before_send(|mut event| {
			// Never ship email addresses.
			if let Some(user) = event.user.as_deref() {
				let mut user = user.clone();
				user.email = None;
				event.user = Some(user.into());
			}
			Some(event)
		})
		.build()?;

	println!("Initializing bugcatch...");
	println!("  Ingest URL: {}", options.dsn());
	bugcatch::init(options)?;

	bugcatch::set_user(UserContext {
		id: Some("user_example_123".to_string()),
		email: Some("example@example.com".to_string()),
		username: Some("example_user".to_string()),
	});
	bugcatch::set_tag("example", "true");

	bugcatch::add_breadcrumb(BreadcrumbEntry::new("startup", "Application started"));
	bugcatch::add_breadcrumb(BreadcrumbEntry {
		kind: Some("http".into()),
		category: Some("http".into()),
		message: Some("GET /api/data failed".into()),
		..Default::default()
	});

	println!("\nCapturing test error...");
	let error = std::fs::read_to_string("/definitely/not/here").unwrap_err();
	match bugcatch::capture_error(&error) {
		Some(id) => println!("  Event ID: {id}"),
		None => println!("  Event dropped"),
	}

	println!("\nCapturing test message...");
	let extra = Map::from([("attempt".to_string(), Value::from(3))]);
	if let Some(id) = bugcatch::capture_message_with("Example warning", Level::Warning, extra) {
		println!("  Event ID: {id}");
	}

	println!("\nTracking request timing...");
	bugcatch::track_request("get", "/api/orders/12345?expand=items", 87, 200);

	let delivered = bugcatch::flush(Duration::from_secs(5));
	println!("\nFlushed: {delivered}");

	bugcatch::destroy();
	println!("Done!");
	Ok(())
}
