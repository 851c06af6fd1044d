//! Xlib-backed [`Connection`].

use crate::backend::{Connection, PointerControl};
use crate::error::{Error, Result};
#[cfg(any(feature = "xkb", feature = "xf86misc"))]
use crate::settings::RepeatTiming;
use std::ffi::{CStr, CString};
use std::os::raw::c_int;
use std::ptr::{null, null_mut};
use std::sync::{Arc, Mutex, PoisonError};
use x11::xlib;

#[cfg(any(feature = "xkb", feature = "xf86misc"))]
use super::ffi;

#[cfg(feature = "xinerama")]
use crate::backend::ScreenRecord;
#[cfg(feature = "xrandr")]
use crate::backend::NotificationSource;

/// Raw display pointer; only dereferenced while the owning mutex is held.
struct DisplayPtr(*mut xlib::Display);

// Xlib connections may move between threads as long as calls on them are
// serialized, which the surrounding mutex guarantees.
unsafe impl Send for DisplayPtr {}

/// A connection to the X server opened with `XOpenDisplay`.
///
/// All queries on the main display are serialized. The change listener uses
/// a connection of its own, see [`Connection::open_notification_source`].
pub struct XlibConnection {
    display: Mutex<DisplayPtr>,
    #[cfg(feature = "xt")]
    toolkit: Mutex<Option<toolkit::Toolkit>>,
}

/// Open the default display named by `$DISPLAY`.
pub fn open_connection() -> Arc<dyn Connection> {
    Arc::new(XlibConnection::open())
}

impl XlibConnection {
    /// Open the default display.
    ///
    /// Failure is logged and yields a closed connection whose queries all
    /// degrade to "not determined".
    pub fn open() -> Self {
        let display = unsafe { xlib::XOpenDisplay(xlib::XDisplayName(null())) };
        if display.is_null() {
            log::error!("XOpenDisplay failure");
        } else {
            log::debug!("XOpenDisplay success");
        }

        Self {
            display: Mutex::new(DisplayPtr(display)),
            #[cfg(feature = "xt")]
            toolkit: Mutex::new(toolkit::Toolkit::open()),
        }
    }

    /// Close the display. Later queries degrade to "not determined".
    pub fn close(&self) {
        let mut display = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        if !display.0.is_null() {
            unsafe { xlib::XCloseDisplay(display.0) };
            display.0 = null_mut();
        }

        #[cfg(feature = "xt")]
        self.toolkit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn with_display<T>(&self, f: impl FnOnce(*mut xlib::Display) -> Result<T>) -> Result<T> {
        let display = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        if display.0.is_null() {
            return Err(Error::ConnectionUnavailable);
        }
        f(display.0)
    }
}

impl Drop for XlibConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl Connection for XlibConnection {
    fn is_open(&self) -> bool {
        !self
            .display
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .0
            .is_null()
    }

    fn default_screen_size(&self) -> Result<(i32, i32)> {
        self.with_display(|display| unsafe {
            let screen = xlib::XDefaultScreenOfDisplay(display);
            if screen.is_null() {
                return Err(Error::Platform("no default screen".into()));
            }
            Ok(((*screen).width, (*screen).height))
        })
    }

    fn pointer_control(&self) -> Result<PointerControl> {
        self.with_display(|display| unsafe {
            let mut numerator: c_int = -1;
            let mut denominator: c_int = -1;
            let mut threshold: c_int = -1;
            xlib::XGetPointerControl(display, &mut numerator, &mut denominator, &mut threshold);

            Ok(PointerControl {
                numerator,
                denominator,
                threshold,
            })
        })
    }

    #[cfg(feature = "xinerama")]
    fn multi_head_screens(&self) -> Result<(i64, Vec<ScreenRecord>)> {
        use crate::count::MAX_SCREEN_COUNT;
        use x11::xinerama;

        self.with_display(|display| unsafe {
            if xinerama::XineramaIsActive(display) == 0 {
                return Err(Error::NotSupported("Xinerama is not active".into()));
            }

            let mut count: c_int = 0;
            let info = xinerama::XineramaQueryScreens(display, &mut count);
            if info.is_null() {
                return Err(Error::Platform("XineramaQueryScreens failed".into()));
            }

            let screens = std::slice::from_raw_parts(info, count.max(0) as usize);
            let records = screens
                .iter()
                .take(usize::from(MAX_SCREEN_COUNT))
                .map(|screen| ScreenRecord {
                    number: screen.screen_number,
                    x: i32::from(screen.x_org),
                    y: i32::from(screen.y_org),
                    width: i32::from(screen.width),
                    height: i32::from(screen.height),
                })
                .collect();
            xlib::XFree(info.cast());

            Ok((i64::from(count), records))
        })
    }

    #[cfg(feature = "xkb")]
    fn extended_keyboard_repeat(&self) -> Result<RepeatTiming> {
        self.with_display(|display| unsafe {
            let mut delay = 0;
            let mut rate = 0;
            let ok = ffi::XkbGetAutoRepeatRate(
                display,
                ffi::XKB_USE_CORE_KBD,
                &mut delay,
                &mut rate,
            );
            if ok == 0 {
                return Err(Error::Platform("XkbGetAutoRepeatRate failed".into()));
            }
            Ok(RepeatTiming { delay, rate })
        })
    }

    #[cfg(feature = "xf86misc")]
    fn legacy_keyboard_repeat(&self) -> Result<RepeatTiming> {
        self.with_display(|display| unsafe {
            let (mut event_base, mut error_base) = (0, 0);
            if ffi::XF86MiscQueryExtension(display, &mut event_base, &mut error_base) == 0 {
                return Err(Error::NotSupported("XF86Misc extension not available".into()));
            }

            let mut settings = ffi::XF86MiscKbdSettings::default();
            if ffi::XF86MiscGetKbdSettings(display, &mut settings) == 0 {
                return Err(Error::Platform("XF86MiscGetKbdSettings failed".into()));
            }

            let delay = u32::try_from(settings.delay)
                .map_err(|_| Error::InvalidValue(format!("delay = {}", settings.delay)))?;
            let rate = u32::try_from(settings.rate)
                .map_err(|_| Error::InvalidValue(format!("rate = {}", settings.rate)))?;
            Ok(RepeatTiming { delay, rate })
        })
    }

    #[cfg(feature = "xt")]
    fn toolkit_multi_click_time(&self) -> Result<i32> {
        self.toolkit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(toolkit::Toolkit::multi_click_time)
            .ok_or(Error::ConnectionUnavailable)
    }

    fn user_default(&self, program: &str, option: &str) -> Result<Option<String>> {
        let program = CString::new(program)
            .map_err(|e| Error::InvalidValue(format!("program name: {e}")))?;
        let option =
            CString::new(option).map_err(|e| Error::InvalidValue(format!("option name: {e}")))?;

        self.with_display(|display| unsafe {
            // Owned by Xlib; must not be freed.
            let value = xlib::XGetDefault(display, program.as_ptr(), option.as_ptr());
            if value.is_null() {
                return Ok(None);
            }
            Ok(Some(CStr::from_ptr(value).to_string_lossy().into_owned()))
        })
    }

    #[cfg(feature = "xrandr")]
    fn open_notification_source(&self) -> Result<Box<dyn NotificationSource>> {
        // Fail early rather than leave a listener on a dead server.
        self.with_display(|_| Ok(()))?;
        Ok(Box::new(super::listen::RandrSource::open()?))
    }
}

#[cfg(feature = "xt")]
mod toolkit {
    use std::os::raw::{c_char, c_int};
    use std::ptr::null_mut;
    use x11::{xlib, xt};

    /// An X Toolkit application context and its display.
    pub struct Toolkit {
        context: xt::XtAppContext,
        display: *mut xlib::Display,
    }

    unsafe impl Send for Toolkit {}

    impl Toolkit {
        pub fn open() -> Option<Self> {
            unsafe {
                xt::XtToolkitInitialize();
                let context = xt::XtCreateApplicationContext();

                let mut argc: c_int = 0;
                let argv: *mut *mut c_char = null_mut();
                let display = xt::XtOpenDisplay(
                    context,
                    std::ptr::null(),
                    c"deskprops".as_ptr(),
                    c"Deskprops".as_ptr(),
                    null_mut(),
                    0,
                    &mut argc,
                    argv,
                );

                if display.is_null() {
                    log::error!("XtOpenDisplay failure");
                    xt::XtDestroyApplicationContext(context);
                    return None;
                }

                Some(Self { context, display })
            }
        }

        pub fn multi_click_time(&self) -> i32 {
            unsafe { xt::XtGetMultiClickTime(self.display) }
        }
    }

    impl Drop for Toolkit {
        fn drop(&mut self) {
            unsafe {
                xt::XtCloseDisplay(self.display);
                xt::XtDestroyApplicationContext(self.context);
            }
        }
    }
}
