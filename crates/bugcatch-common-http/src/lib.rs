// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for bugcatch.
//!
//! Every request leaves with the same User-Agent so the ingest side can tell
//! SDK versions and platforms apart.

mod client;

pub use client::{builder, user_agent, SDK_NAME, SDK_VERSION};
