//! Ordered capability probing across backends.
//!
//! A probe is a fixed-priority list of backend queries for one setting. The
//! first query that returns `Ok` wins; later backends are never consulted.
//!
//! ```
//! use deskprops::probe::Probe;
//! use deskprops::Error;
//!
//! let rate = Probe::new("auto repeat rate")
//!     .backend("precise", || Err(Error::NotSupported("precise".into())))
//!     .backend("coarse", || Ok(25u32))
//!     .run();
//!
//! assert_eq!(rate, Some(25));
//! ```

use crate::error::{Error, Result};
use std::fmt::Debug;

type Query<'a, T> = Box<dyn FnOnce() -> Result<T> + 'a>;

/// An ordered chain of backend queries for a single setting.
pub struct Probe<'a, T> {
    setting: &'static str,
    backends: Vec<(&'static str, Query<'a, T>)>,
}

impl<'a, T: Debug> Probe<'a, T> {
    /// Start a probe for `setting`, used in log messages.
    pub fn new(setting: &'static str) -> Self {
        Self {
            setting,
            backends: Vec::new(),
        }
    }

    /// Append a backend. Backends run in the order they are added.
    pub fn backend<F>(mut self, label: &'static str, query: F) -> Self
    where
        F: FnOnce() -> Result<T> + 'a,
    {
        self.backends.push((label, Box::new(query)));
        self
    }

    /// Run the chain and return the first successful value.
    pub fn run(self) -> Option<T> {
        let setting = self.setting;
        for (label, query) in self.backends {
            match query() {
                Ok(value) => {
                    log::info!("{setting}: {label}: {value:?}");
                    return Some(value);
                }
                Err(e @ Error::ConnectionUnavailable) => log::error!("{setting}: {label}: {e}"),
                Err(e) => log::warn!("{setting}: {label}: {e}"),
            }
        }

        log::debug!("{setting}: not determined");
        None
    }
}

/// Accept a raw backend value only when it is non-negative.
pub fn non_negative(value: i32, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidValue(format!("{field} = {value}")))
}
