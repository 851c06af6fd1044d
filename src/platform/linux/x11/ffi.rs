//! Declarations for Xlib entry points the `x11` crate does not bind.

#![allow(non_snake_case, dead_code, unused_imports)]

use std::os::raw::{c_int, c_uint};
use x11::xlib::Display;

/// `XkbUseCoreKbd` device specifier.
#[cfg(feature = "xkb")]
pub const XKB_USE_CORE_KBD: c_uint = 0x0100;

// Part of libX11, which the `x11` crate already links.
#[cfg(feature = "xkb")]
unsafe extern "C" {
    pub fn XkbGetAutoRepeatRate(
        display: *mut Display,
        device_spec: c_uint,
        delay: *mut c_uint,
        interval: *mut c_uint,
    ) -> c_int;
}

/// `XF86MiscKbdSettings` from `xf86misc.h`.
#[cfg(feature = "xf86misc")]
#[repr(C)]
#[derive(Debug, Default)]
pub struct XF86MiscKbdSettings {
    pub type_: c_int,
    pub rate: c_int,
    pub delay: c_int,
    pub servnumlock: c_int,
}

#[cfg(feature = "xf86misc")]
#[link(name = "Xxf86misc")]
unsafe extern "C" {
    pub fn XF86MiscQueryExtension(
        display: *mut Display,
        event_base: *mut c_int,
        error_base: *mut c_int,
    ) -> c_int;

    pub fn XF86MiscGetKbdSettings(display: *mut Display, settings: *mut XF86MiscKbdSettings)
    -> c_int;
}
