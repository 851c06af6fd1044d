//! Screen change notifications using XRandR.

use crate::backend::{FetchedTopology, Notification, NotificationSource, ScreenRecord, Waker};
use crate::count::MAX_SCREEN_COUNT;
use crate::error::{Error, Result};
use std::os::raw::c_int;
use std::ptr::null;
use x11::xlib;
use x11::xrandr;

const FALSE: c_int = 0;

/// Screen resources returned by `XRRGetScreenResources`, freed on drop.
struct ScreenResources(*mut xrandr::XRRScreenResources);

// Freeing the resources does not touch the display connection.
unsafe impl Send for ScreenResources {}

impl Drop for ScreenResources {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { xrandr::XRRFreeScreenResources(self.0) };
            log::debug!("XRRFreeScreenResources");
        }
    }
}

/// The listener's own display connection.
///
/// Xlib connections are not shared across threads here, so the listener
/// opens a connection of its own and a hidden window to receive wake-ups on.
pub struct RandrSource {
    display: *mut xlib::Display,
    root: xlib::Window,
    wake_window: xlib::Window,
    event_base: c_int,
}

// Only ever used from the listener thread after construction.
unsafe impl Send for RandrSource {}

impl RandrSource {
    pub fn open() -> Result<Self> {
        unsafe {
            let display = xlib::XOpenDisplay(xlib::XDisplayName(null()));
            if display.is_null() {
                log::error!("XOpenDisplay failure for listener connection");
                return Err(Error::ConnectionUnavailable);
            }

            let (mut event_base, mut error_base) = (0, 0);
            if xrandr::XRRQueryExtension(display, &mut event_base, &mut error_base) == FALSE {
                xlib::XCloseDisplay(display);
                return Err(Error::NotSupported("XRandR extension not available".into()));
            }

            let root = xlib::XDefaultRootWindow(display);
            let wake_window = xlib::XCreateSimpleWindow(display, root, 0, 0, 1, 1, 0, 0, 0);
            xlib::XSync(display, FALSE);

            log::debug!("XRandR listener connection opened (event base {event_base})");

            Ok(Self {
                display,
                root,
                wake_window,
                event_base,
            })
        }
    }
}

impl NotificationSource for RandrSource {
    fn select_screen_changes(&mut self) -> Result<()> {
        unsafe {
            xrandr::XRRSelectInput(self.display, self.root, xrandr::RRScreenChangeNotifyMask);
            xlib::XSync(self.display, FALSE);
        }
        Ok(())
    }

    fn next_notification(&mut self) -> Result<Notification> {
        let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };
        unsafe { xlib::XNextEvent(self.display, &mut event) };

        let kind = event.get_type();
        if kind == self.event_base + xrandr::RRScreenChangeNotify {
            unsafe { xrandr::XRRUpdateConfiguration(&mut event) };
            return Ok(Notification::ScreenChange);
        }

        if kind == xlib::ClientMessage {
            let message: xlib::XClientMessageEvent = event.into();
            if message.window == self.wake_window {
                return Ok(Notification::Wake);
            }
        }

        Ok(Notification::Other)
    }

    fn extension_available(&mut self) -> bool {
        let (mut event_base, mut error_base) = (0, 0);
        let available =
            unsafe { xrandr::XRRQueryExtension(self.display, &mut event_base, &mut error_base) };
        if available == FALSE {
            return false;
        }
        self.event_base = event_base;
        true
    }

    fn fetch_topology(&mut self) -> Result<FetchedTopology> {
        unsafe {
            let resources = xrandr::XRRGetScreenResources(self.display, self.root);
            if resources.is_null() {
                return Err(Error::Platform("XRRGetScreenResources failed".into()));
            }
            let resources = ScreenResources(resources);

            let raw_count = i64::from((*resources.0).ncrtc);
            let crtcs = if (*resources.0).crtcs.is_null() {
                &[][..]
            } else {
                let len = (*resources.0).ncrtc.max(0) as usize;
                std::slice::from_raw_parts((*resources.0).crtcs, len)
            };

            let mut records = Vec::new();
            for (index, &crtc) in crtcs.iter().take(usize::from(MAX_SCREEN_COUNT)).enumerate() {
                let info = xrandr::XRRGetCrtcInfo(self.display, resources.0, crtc);
                if info.is_null() {
                    return Err(Error::Platform(format!(
                        "XRRGetCrtcInfo failed for crtc {}",
                        index + 1
                    )));
                }

                records.push(ScreenRecord {
                    number: index as i32 + 1,
                    x: (*info).x,
                    y: (*info).y,
                    width: i32::try_from((*info).width).unwrap_or(i32::MAX),
                    height: i32::try_from((*info).height).unwrap_or(i32::MAX),
                });
                xrandr::XRRFreeCrtcInfo(info);
            }

            Ok(FetchedTopology {
                raw_count,
                records,
                resource: Box::new(resources),
            })
        }
    }

    fn waker(&self) -> Result<Box<dyn Waker>> {
        Ok(Box::new(RandrWaker {
            window: self.wake_window,
        }))
    }
}

impl Drop for RandrSource {
    fn drop(&mut self) {
        unsafe {
            xlib::XDestroyWindow(self.display, self.wake_window);
            xlib::XCloseDisplay(self.display);
        }
        log::debug!("XRandR listener connection closed");
    }
}

/// Sends a client message to the listener's hidden window.
struct RandrWaker {
    window: xlib::Window,
}

impl Waker for RandrWaker {
    fn wake(&self) -> Result<()> {
        unsafe {
            // The listener connection is blocked in XNextEvent, so the
            // message goes out on a separate control connection.
            let control = xlib::XOpenDisplay(xlib::XDisplayName(null()));
            if control.is_null() {
                return Err(Error::ConnectionUnavailable);
            }

            let mut event: xlib::XEvent = std::mem::zeroed();
            event.client_message.type_ = xlib::ClientMessage;
            event.client_message.send_event = xlib::True;
            event.client_message.display = control;
            event.client_message.window = self.window;
            event.client_message.format = 32;

            let status = xlib::XSendEvent(control, self.window, FALSE, 0, &mut event);
            xlib::XFlush(control);
            xlib::XCloseDisplay(control);

            if status == 0 {
                return Err(Error::Platform("XSendEvent failed".into()));
            }
        }
        Ok(())
    }
}
