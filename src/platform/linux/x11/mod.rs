//! X11 implementation using Xlib and its extensions.

mod connection;
mod ffi;
#[cfg(feature = "xrandr")]
mod listen;

pub use connection::{XlibConnection, open_connection};
