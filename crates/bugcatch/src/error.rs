// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the bugcatch SDK.

use bugcatch_core::CoreError;
use thiserror::Error;

/// Result type alias for SDK construction.
pub type Result<T> = std::result::Result<T, BugcatchError>;

/// Errors that can occur while configuring or building a client.
///
/// Capturing never fails; these only surface from option and client
/// construction.
#[derive(Debug, Error)]
pub enum BugcatchError {
	/// The DSN was empty or whitespace.
	#[error("bugcatch DSN must not be blank")]
	MissingDsn,

	/// The DSN is not a valid URL.
	#[error("invalid DSN {dsn:?}: {source}")]
	InvalidDsn {
		dsn: String,
		#[source]
		source: url::ParseError,
	},

	/// The DSN uses a scheme other than http or https.
	#[error("unsupported DSN scheme: {0}")]
	UnsupportedScheme(String),

	/// Breadcrumb capacity must be at least one.
	#[error("max_breadcrumbs must be greater than zero")]
	InvalidMaxBreadcrumbs,

	/// An environment variable held an unparseable value.
	#[error("invalid value for {var}: {value:?}")]
	InvalidEnvValue { var: &'static str, value: String },

	/// Invalid core configuration, such as a bad ignore pattern.
	#[error(transparent)]
	Core(#[from] CoreError),

	/// The HTTP client could not be constructed.
	#[error("failed to build HTTP client: {0}")]
	HttpClient(#[from] reqwest::Error),

	/// The transport runtime could not be started.
	#[error("failed to start transport runtime: {0}")]
	Runtime(#[from] std::io::Error),
}
