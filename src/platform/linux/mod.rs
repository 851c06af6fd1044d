//! Linux platform implementation.
//!
//! Display topology and input settings come from the X server. Which X
//! extensions are consulted is chosen by feature flags:
//!
//! - `xkb` (default): keyboard auto-repeat via XKB
//! - `xf86misc`: keyboard auto-repeat via XF86Misc (needs `libXxf86misc`)
//! - `xrandr` (default): resizable multi-head topology with a change listener
//! - `xinerama`: flat multi-head topology, used when `xrandr` is off
//! - `xt`: multi-click time from the X Toolkit

mod x11;

pub use x11::*;
