// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack capture for captured errors and panics.

use backtrace::{Backtrace, BacktraceFrame};
use bugcatch_core::StackFrame;
use rustc_demangle::demangle;

/// Frames of the unwinder itself, dropped from captured traces.
const CAPTURE_PREFIXES: &[&str] = &["backtrace::", "<backtrace::", "bugcatch::backtrace::"];

/// Capture the current stack, outermost call first.
pub fn capture_frames() -> Vec<StackFrame> {
	let backtrace = Backtrace::new();
	let mut frames = frames_from(backtrace.frames());
	frames.reverse();
	frames
}

/// Convert resolved frames, innermost first, into stack frames. Inlined
/// functions produce one frame per symbol.
fn frames_from(raw: &[BacktraceFrame]) -> Vec<StackFrame> {
	let mut frames = Vec::new();
	for frame in raw {
		for symbol in frame.symbols() {
			let function = symbol
				.name()
				.and_then(|name| name.as_str().map(|raw| format!("{:#}", demangle(raw))));

			if function
				.as_deref()
				.is_some_and(|f| CAPTURE_PREFIXES.iter().any(|p| f.starts_with(p)))
			{
				continue;
			}

			frames.push(StackFrame::new(
				symbol.filename().map(|path| path.display().to_string()),
				symbol.lineno(),
				function,
			));
		}
	}
	frames
}
