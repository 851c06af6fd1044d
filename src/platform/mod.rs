//! Platform-specific implementations.

#[cfg(all(target_os = "linux", feature = "x11"))]
mod linux;
#[cfg(all(target_os = "linux", feature = "x11"))]
pub use linux::*;

// Without an X11 backend every query degrades to "not determined".
#[cfg(not(all(target_os = "linux", feature = "x11")))]
mod stub {
    use crate::backend::{Connection, PointerControl};
    use crate::error::{Error, Result};
    use std::sync::Arc;

    /// A connection that was never opened.
    pub struct DisconnectedConnection;

    impl Connection for DisconnectedConnection {
        fn is_open(&self) -> bool {
            false
        }

        fn default_screen_size(&self) -> Result<(i32, i32)> {
            Err(Error::ConnectionUnavailable)
        }

        fn pointer_control(&self) -> Result<PointerControl> {
            Err(Error::ConnectionUnavailable)
        }
    }

    pub fn open_connection() -> Arc<dyn Connection> {
        log::error!("no display backend enabled; enable the 'x11' feature on Linux");
        Arc::new(DisconnectedConnection)
    }
}

#[cfg(not(all(target_os = "linux", feature = "x11")))]
pub use stub::*;
