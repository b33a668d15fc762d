//! Routing for messages and failures originating inside a page.
//!
//! Everything the page reports back goes through the `log` crate with a
//! `[page]` prefix so it can be told apart from host-side logging.

use log::{debug, error, warn};

/// Helpers for logging page-originated output.
pub struct PageConsole;

impl PageConsole {
    /// Log a diagnostic line from page `context`.
    #[inline]
    pub fn debug<M: AsRef<str>>(context: u64, message: M) {
        debug!("[page {context}]: {}", message.as_ref());
    }

    /// Log a warning from page `context`.
    #[inline]
    pub fn warn<M: AsRef<str>>(context: u64, message: M) {
        warn!("[page {context}]: {}", message.as_ref());
    }

    /// Log an error from page `context`.
    #[inline]
    pub fn error<M: AsRef<str>>(context: u64, message: M) {
        error!("[page {context}]: {}", message.as_ref());
    }
}
