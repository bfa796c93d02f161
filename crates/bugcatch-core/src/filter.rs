// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ignore rules for captured errors.

use regex::Regex;

use crate::error::{CoreError, Result};

/// A single ignore rule.
///
/// Both kinds search the subject rather than matching it in full: a literal
/// rule drops any error whose message contains the literal.
#[derive(Debug, Clone)]
pub enum IgnoreRule {
	Literal(String),
	Pattern(Regex),
}

impl IgnoreRule {
	pub fn literal(text: impl Into<String>) -> Self {
		Self::Literal(text.into())
	}

	pub fn pattern(pattern: &str) -> Result<Self> {
		Regex::new(pattern)
			.map(Self::Pattern)
			.map_err(|source| CoreError::InvalidIgnorePattern {
				pattern: pattern.to_string(),
				source,
			})
	}

	pub fn matches(&self, subject: &str) -> bool {
		match self {
			Self::Literal(text) => subject.contains(text.as_str()),
			Self::Pattern(regex) => regex.is_match(subject),
		}
	}
}

/// The configured set of ignore rules.
#[derive(Debug, Clone, Default)]
pub struct ErrorFilter {
	rules: Vec<IgnoreRule>,
}

impl ErrorFilter {
	pub fn new(rules: Vec<IgnoreRule>) -> Self {
		Self { rules }
	}

	pub fn push(&mut self, rule: IgnoreRule) {
		self.rules.push(rule);
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	pub fn rules(&self) -> &[IgnoreRule] {
		&self.rules
	}

	/// Returns true when the error should be dropped. The message is the
	/// subject; the type name stands in when there is no message.
	pub fn should_ignore(&self, message: Option<&str>, type_name: &str) -> bool {
		if self.rules.is_empty() {
			return false;
		}
		let subject = message.unwrap_or(type_name);
		self.rules.iter().any(|rule| rule.matches(subject))
	}
}
