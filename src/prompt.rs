// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Login prompt triggers
//!
//! The client never renders anything itself. It calls [`LoginPrompt::show`]
//! and leaves presentation to whoever owns the UI.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Something that can ask the user to log in
pub trait LoginPrompt: Send + Sync {
    fn show(&self);
}

/// Visibility state for a login modal.
///
/// UI code polls [`LoginModal::is_visible`] and calls [`LoginModal::hide`]
/// once the user has logged in or dismissed it.
#[derive(Debug, Default)]
pub struct LoginModal {
    visible: AtomicBool,
    shown: AtomicU64,
}

impl LoginModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub fn hide(&self) {
        self.visible.store(false, Ordering::Release);
    }

    /// Number of times the modal was requested
    pub fn times_shown(&self) -> u64 {
        self.shown.load(Ordering::Relaxed)
    }
}

impl LoginPrompt for LoginModal {
    fn show(&self) {
        self.shown.fetch_add(1, Ordering::Relaxed);
        if !self.visible.swap(true, Ordering::AcqRel) {
            tracing::debug!("Login modal opened");
        }
    }
}

/// Prints a login hint on stderr; used by the CLI
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl LoginPrompt for ConsolePrompt {
    fn show(&self) {
        eprintln!("Login required: run `portier login '<credentials json>'` first");
    }
}
