// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration for automatic error reporting.

use std::panic::PanicHookInfo;
use std::sync::Arc;

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

/// An installed chaining panic hook.
///
/// Restoring (explicitly or on drop) puts back the hook that was current at
/// registration, replacing whatever is installed at that time.
#[must_use = "dropping the registration uninstalls the hook"]
pub struct HookRegistration {
	previous: Option<Arc<PanicHook>>,
}

impl HookRegistration {
	/// Uninstalls the chaining hook.
	pub fn restore(mut self) {
		self.pop();
	}

	fn pop(&mut self) {
		let Some(previous) = self.previous.take() else {
			return;
		};
		// The hook cannot be swapped from a panicking thread. Leaving it in
		// place is harmless: the reporter only holds a weak client reference.
		if std::thread::panicking() {
			return;
		}
		drop(std::panic::take_hook());
		std::panic::set_hook(Box::new(move |info| previous(info)));
	}
}

impl Drop for HookRegistration {
	fn drop(&mut self) {
		self.pop();
	}
}

/// Installs a hook that runs `report` for each panic, then the previously
/// installed hook with the same info.
pub fn register<F>(report: F) -> HookRegistration
where
	F: Fn(&PanicHookInfo<'_>) + Send + Sync + 'static,
{
	let previous: Arc<PanicHook> = Arc::from(std::panic::take_hook());
	let chained = Arc::clone(&previous);

	std::panic::set_hook(Box::new(move |info| {
		report(info);
		chained(info);
	}));

	HookRegistration {
		previous: Some(previous),
	}
}

/// Extract the panic message from panic info.
pub fn panic_message(info: &PanicHookInfo<'_>) -> String {
	if let Some(s) = info.payload().downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = info.payload().downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}

/// Name of the current thread, or `unnamed`.
pub fn current_thread_name() -> String {
	std::thread::current()
		.name()
		.unwrap_or("unnamed")
		.to_string()
}
