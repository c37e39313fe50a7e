//! Notices and navigation buffered for the browser.
//!
//! Over HTTP the checkout cannot pop a toast or change the page itself, so
//! the storefront hands each session a [`SessionFeed`]. Notices queue up
//! until the next checkout response drains them; the redirect sticks until
//! the session ends.

use std::sync::{Mutex, PoisonError};

use super::ports::{Navigator, Notice, Notifier};

#[derive(Debug, Default)]
pub struct SessionFeed {
    notices: Mutex<Vec<Notice>>,
    redirect: Mutex<Option<String>>,
}

impl SessionFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued notices.
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Where the customer should be sent, once an order is placed.
    pub fn redirect(&self) -> Option<String> {
        self.redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for SessionFeed {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

impl Navigator for SessionFeed {
    fn navigate(&self, path: String) {
        *self.redirect.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }
}
