//! # deskprops
//!
//! Desktop system properties for X11: monitor topology and input settings.
//!
//! ## Features
//!
//! - Monitor enumeration via XRandR, Xinerama or the default screen
//! - A background listener that keeps the XRandR topology current
//! - Keyboard auto-repeat, pointer acceleration and multi-click time,
//!   each probed through a chain of backends with a "not determined" result
//! - Subscription to topology changes over std channels or `tokio::sync::watch`
//!
//! ## Quick Start
//!
//! ```no_run
//! use deskprops::SystemProperties;
//!
//! let properties = SystemProperties::open();
//! properties.start().expect("failed to start listener");
//!
//! for monitor in properties.screen_info().monitors() {
//!     println!(
//!         "#{} at ({}, {}) {}x{}",
//!         monitor.id, monitor.x, monitor.y, monitor.width, monitor.height
//!     );
//! }
//!
//! println!("repeat rate: {}", properties.auto_repeat_rate());
//! println!("double-click: {} ms", properties.multi_click_time());
//!
//! properties.shutdown();
//! ```
//!
//! ## Architecture
//!
//! [`SystemProperties`] owns a connection to the display server and, when the
//! resizable strategy is compiled in, a [`listener::ChangeListener`] thread
//! that refreshes a shared [`cache::TopologyCache`]. Foreground queries read
//! the cache without blocking on the listener. Integer getters return
//! [`NOT_DETERMINED`] when no backend could answer.

pub mod backend;
pub mod cache;
pub mod channel;
pub mod count;
pub mod display;
pub mod error;
pub mod listener;
pub mod probe;
pub mod properties;
pub mod settings;

#[cfg(test)]
mod fake;

mod platform;

// Re-exports
pub use backend::Connection;
pub use display::{MonitorDescriptor, Strategy, TopologySnapshot};
pub use error::{Error, Result};
pub use listener::ListenerState;
pub use properties::SystemProperties;
pub use settings::{
    ClickTimeSource, DEFAULT_MULTI_CLICK_TIME, MultiClickTime, NOT_DETERMINED,
    PointerAcceleration, RepeatTiming, SystemSettings,
};

#[cfg(all(target_os = "linux", feature = "x11"))]
pub use platform::XlibConnection;
pub use platform::open_connection;
