// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the core event model.

use thiserror::Error;

/// Errors that can occur while building core telemetry types.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid level: {0}")]
	InvalidLevel(String),

	#[error("invalid ignore pattern {pattern:?}: {source}")]
	InvalidIgnorePattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
