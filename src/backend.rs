//! Backend seams between the query core and the platform.
//!
//! A [`Connection`] answers the synchronous foreground queries. A
//! [`NotificationSource`] is the listener's private channel to the display
//! server, used only under the resizable multi-head strategy.
//!
//! Optional extensions default to [`Error::NotSupported`], so a backend only
//! implements what it can actually answer.

use crate::error::{Error, Result};
use crate::settings::RepeatTiming;
use std::any::Any;

/// One screen record as reported by a multi-head backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRecord {
    /// Backend-native screen number or 1-based CRTC index.
    pub number: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Raw pointer control values, unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerControl {
    pub numerator: i32,
    pub denominator: i32,
    pub threshold: i32,
}

/// Synchronous queries against a live display server connection.
///
/// Implementations must be safe to call from any thread. Every method of a
/// closed connection returns [`Error::ConnectionUnavailable`].
pub trait Connection: Send + Sync {
    /// Whether the underlying handle is still open.
    fn is_open(&self) -> bool;

    /// Width and height of the default screen.
    fn default_screen_size(&self) -> Result<(i32, i32)>;

    /// Core pointer acceleration and threshold.
    fn pointer_control(&self) -> Result<PointerControl>;

    /// Flat list of screens from a multi-head extension.
    ///
    /// Returns the raw count reported by the backend alongside the records
    /// so overflow can be detected before allocation.
    fn multi_head_screens(&self) -> Result<(i64, Vec<ScreenRecord>)> {
        Err(Error::NotSupported("multi-head extension".into()))
    }

    /// Auto-repeat timing from the extended keyboard extension.
    fn extended_keyboard_repeat(&self) -> Result<RepeatTiming> {
        Err(Error::NotSupported("extended keyboard extension".into()))
    }

    /// Auto-repeat timing from the legacy keyboard settings extension.
    fn legacy_keyboard_repeat(&self) -> Result<RepeatTiming> {
        Err(Error::NotSupported("legacy keyboard extension".into()))
    }

    /// Multi-click interval from the toolkit, in milliseconds.
    fn toolkit_multi_click_time(&self) -> Result<i32> {
        Err(Error::NotSupported("toolkit multi-click query".into()))
    }

    /// A user default resource, `None` when unset.
    fn user_default(&self, _program: &str, _option: &str) -> Result<Option<String>> {
        Err(Error::NotSupported("user defaults".into()))
    }

    /// Open a private notification channel for the change listener.
    fn open_notification_source(&self) -> Result<Box<dyn NotificationSource>> {
        Err(Error::NotSupported("screen change notifications".into()))
    }
}

/// What the listener woke up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The screen configuration changed.
    ScreenChange,
    /// The host asked the listener to re-check its state.
    Wake,
    /// Anything else; ignored.
    Other,
}

/// A freshly fetched topology and the native resource backing it.
pub struct FetchedTopology {
    /// Raw count reported by the backend.
    pub raw_count: i64,
    pub records: Vec<ScreenRecord>,
    /// Released when the cache drops it.
    pub resource: Box<dyn Any + Send>,
}

/// Interrupts a blocked [`NotificationSource::next_notification`].
pub trait Waker: Send + Sync {
    fn wake(&self) -> Result<()>;
}

/// The listener's blocking view of the display server.
pub trait NotificationSource: Send {
    /// Register interest in screen change notifications.
    fn select_screen_changes(&mut self) -> Result<()>;

    /// Block until the next notification. An error means the source is gone.
    fn next_notification(&mut self) -> Result<Notification>;

    /// Re-resolve the resizable extension; it may disappear at runtime.
    fn extension_available(&mut self) -> bool;

    /// Fetch the current screen resources.
    fn fetch_topology(&mut self) -> Result<FetchedTopology>;

    /// A handle that can wake this source from another thread.
    fn waker(&self) -> Result<Box<dyn Waker>>;
}
