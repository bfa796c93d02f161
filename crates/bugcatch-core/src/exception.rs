// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Exception values and stack frames.

use std::error::Error;

use crate::json::{Entity, Serializable, Value};

/// Function prefixes that never count as application code.
const SYSTEM_PREFIXES: &[&str] = &[
	"std::",
	"core::",
	"alloc::",
	"<std::",
	"<core::",
	"<alloc::",
	"tokio::",
	"<tokio::",
	"futures::",
	"<futures::",
	"backtrace::",
	"<backtrace::",
	"panic_unwind::",
	"rust_begin_unwind",
	"rust_panic",
	"__rust_",
	"_rust_",
	"bugcatch::",
	"<bugcatch::",
	"bugcatch_core::",
	"<bugcatch_core::",
];

/// Path fragments of runtime machinery.
const SYSTEM_CONTAINS: &[&str] = &["::panicking::", "::rt::", "::sys_common::"];

/// Determine if a function belongs to application code rather than the
/// runtime, standard library or this SDK.
pub fn is_in_app(function: &str) -> bool {
	!SYSTEM_PREFIXES
		.iter()
		.any(|prefix| function.starts_with(prefix))
		&& !SYSTEM_CONTAINS
			.iter()
			.any(|fragment| function.contains(fragment))
}

/// A single frame of a stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
	pub filename: Option<String>,
	/// 1-based line number.
	pub lineno: Option<u32>,
	pub function: Option<String>,
	pub in_app: bool,
}

impl StackFrame {
	/// Builds a frame, deriving `in_app` from the function path.
	pub fn new(filename: Option<String>, lineno: Option<u32>, function: Option<String>) -> Self {
		let in_app = function.as_deref().map(is_in_app).unwrap_or(false);
		Self {
			filename,
			lineno: lineno.filter(|line| *line > 0),
			function,
			in_app,
		}
	}
}

impl Serializable for StackFrame {
	fn to_entity(&self) -> Entity {
		Entity::new()
			.optional("filename", self.filename.as_ref())
			.optional("lineno", self.lineno)
			.optional("function", self.function.as_ref())
			.field("in_app", self.in_app)
	}
}

/// One error in a causal chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionValue {
	pub kind: String,
	pub value: Option<String>,
	/// Outermost call first.
	pub frames: Vec<StackFrame>,
}

impl ExceptionValue {
	pub fn new(kind: impl Into<String>, value: Option<String>, frames: Vec<StackFrame>) -> Self {
		Self {
			kind: kind.into(),
			value,
			frames,
		}
	}

	/// Builds a value from a single error, without walking its sources.
	pub fn from_error(kind: impl Into<String>, error: &(dyn Error + 'static)) -> Self {
		Self::new(kind, error_message(error), Vec::new())
	}

	/// Walks `error` and its sources and returns the chain with the root cause
	/// first and `error` itself last.
	///
	/// `kind` names the outermost error. Sources only expose `dyn Error`, so
	/// their names come from the leading identifier of their `Debug` output.
	/// For an enum source that is the variant rather than the type, e.g. `Io`
	/// for `MyError::Io(..)`.
	pub fn chain<E: Error + ?Sized>(kind: &str, error: &E, frames: Vec<StackFrame>) -> Vec<Self> {
		let mut chain = vec![Self::new(kind, error_message(error), frames)];
		let mut current = error.source();
		while let Some(cause) = current {
			chain.push(Self::from_error(type_from_debug(&cause), cause));
			current = cause.source();
		}
		chain.reverse();
		chain
	}
}

impl Serializable for ExceptionValue {
	fn to_entity(&self) -> Entity {
		let frames: Vec<Value> = self
			.frames
			.iter()
			.map(|frame| Value::Entity(frame.to_entity()))
			.collect();
		Entity::new()
			.field("type", self.kind.as_str())
			.optional("value", self.value.as_ref())
			.field("stacktrace", Entity::new().field("frames", frames))
	}
}

/// The error's `Display` text, or `None` when it is empty.
pub fn error_message<E: Error + ?Sized>(error: &E) -> Option<String> {
	let message = error.to_string();
	(!message.is_empty()).then_some(message)
}

/// Name for a concrete error type, falling back to its `Debug` output when the
/// static type is a trait object.
pub fn error_type_name<E: Error + ?Sized>(error: &E) -> String {
	let name = std::any::type_name::<E>();
	if name.starts_with("dyn ") || name.starts_with("&dyn ") || name.contains("<dyn ") {
		type_from_debug(&error)
	} else {
		name.to_string()
	}
}

/// Leading identifier of a `Debug` representation, e.g. `Custom` for
/// `Custom { kind: Other, .. }` or `ParseIntError` for `ParseIntError { .. }`.
pub fn type_from_debug(value: &dyn std::fmt::Debug) -> String {
	let debug = format!("{value:?}");
	let name: String = debug
		.chars()
		.take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
		.collect();
	if name.is_empty() {
		"Error".to_string()
	} else {
		name
	}
}
