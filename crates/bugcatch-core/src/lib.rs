// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the bugcatch error-telemetry client.
//!
//! This crate holds everything that does not touch the network or process-wide
//! state: the event model, the JSON encoder, the breadcrumb ring buffer, ignore
//! rules and route templating. The `bugcatch` crate builds the client on top.
//!
//! # Overview
//!
//! - [`Event`] and its parts ([`ExceptionValue`], [`StackFrame`],
//!   [`UserContext`], [`BreadcrumbEntry`]) render through [`Serializable`]
//! - [`BreadcrumbBuffer`] keeps a bounded, thread-safe breadcrumb trail
//! - [`ErrorFilter`] decides which errors are never reported
//! - [`normalize_route`] turns request paths into route templates

pub mod breadcrumb;
pub mod context;
pub mod error;
pub mod event;
pub mod exception;
pub mod filter;
pub mod json;
pub mod level;
pub mod route;

pub use breadcrumb::{BreadcrumbBuffer, BreadcrumbEntry, DEFAULT_MAX_BREADCRUMBS};
pub use context::UserContext;
pub use error::{CoreError, Result};
pub use event::{format_timestamp, Event, EventId, PLATFORM};
pub use exception::{error_message, error_type_name, is_in_app, ExceptionValue, StackFrame};
pub use filter::{ErrorFilter, IgnoreRule};
pub use json::{encode, escape, Entity, Map, Number, Serializable, Value};
pub use level::Level;
pub use route::{normalize_route, RequestMetric, ID_PLACEHOLDER};
