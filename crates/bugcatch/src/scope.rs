// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-client context merged into every event.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bugcatch_core::{BreadcrumbBuffer, BreadcrumbEntry, Event, UserContext};
use parking_lot::RwLock;

/// User, tags and breadcrumbs shared by all threads using a client.
pub(crate) struct Scope {
	user: RwLock<Option<Arc<UserContext>>>,
	tags: RwLock<HashMap<String, String>>,
	breadcrumbs: BreadcrumbBuffer,
}

impl Scope {
	pub(crate) fn new(max_breadcrumbs: usize) -> Self {
		Self {
			user: RwLock::new(None),
			tags: RwLock::new(HashMap::new()),
			breadcrumbs: BreadcrumbBuffer::new(max_breadcrumbs),
		}
	}

	pub(crate) fn set_user(&self, user: Option<UserContext>) {
		*self.user.write() = user.map(Arc::new);
	}

	pub(crate) fn user(&self) -> Option<Arc<UserContext>> {
		self.user.read().clone()
	}

	pub(crate) fn set_tag(&self, key: String, value: String) {
		self.tags.write().insert(key, value);
	}

	pub(crate) fn remove_tag(&self, key: &str) {
		self.tags.write().remove(key);
	}

	pub(crate) fn tags(&self) -> BTreeMap<String, String> {
		self
			.tags
			.read()
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	pub(crate) fn add_breadcrumb(&self, entry: BreadcrumbEntry) {
		self.breadcrumbs.add(entry);
	}

	pub(crate) fn breadcrumbs(&self) -> &BreadcrumbBuffer {
		&self.breadcrumbs
	}

	/// Copies the current user, tags and breadcrumbs into the event. The
	/// event keeps a snapshot; later changes do not reach it.
	pub(crate) fn apply(&self, event: &mut Event) {
		event.user = self.user();

		let tags = self.tags();
		event.tags = (!tags.is_empty()).then_some(tags);

		let breadcrumbs = self.breadcrumbs.get_all();
		event.breadcrumbs = (!breadcrumbs.is_empty()).then_some(breadcrumbs);
	}

	pub(crate) fn clear(&self) {
		*self.user.write() = None;
		self.tags.write().clear();
		self.breadcrumbs.clear();
	}
}
