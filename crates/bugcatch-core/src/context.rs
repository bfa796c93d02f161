// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User context attached to events.

use serde::{Deserialize, Serialize};

use crate::json::{Entity, Serializable};

/// Identity of the user affected by an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
	pub id: Option<String>,
	pub email: Option<String>,
	pub username: Option<String>,
}

impl UserContext {
	/// Shorthand for a user known only by id.
	pub fn with_id(id: impl Into<String>) -> Self {
		Self {
			id: Some(id.into()),
			..Default::default()
		}
	}
}

impl Serializable for UserContext {
	fn to_entity(&self) -> Entity {
		Entity::new()
			.optional("id", self.id.as_ref())
			.optional("email", self.email.as_ref())
			.optional("username", self.username.as_ref())
	}
}
