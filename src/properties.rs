//! The [`SystemProperties`] context object and its query surface.

use crate::backend::{Connection, PointerControl};
use crate::cache::TopologyCache;
use crate::channel::TopologySubscribers;
use crate::display::{self, Strategy, TopologySnapshot};
use crate::error::{Error, Result};
use crate::listener::{ChangeListener, ListenerState};
use crate::probe::{Probe, non_negative};
use crate::settings::{
    ClickTimeSource, MultiClickTime, NOT_DETERMINED, PointerAcceleration, RepeatTiming,
    SystemSettings, determined, parse_click_time,
};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, PoisonError};

/// Display topology and input settings for one display server connection.
///
/// Every query is safe to call from any thread and always returns a value:
/// failures degrade to [`NOT_DETERMINED`], an empty snapshot or the default
/// multi-click time, and are logged.
///
/// # Example
///
/// ```no_run
/// use deskprops::SystemProperties;
///
/// let properties = SystemProperties::open();
/// properties.start().expect("Failed to start listener");
///
/// let screens = properties.screen_info();
/// for monitor in screens.monitors() {
///     println!("{monitor:?}");
/// }
/// println!("repeat rate: {}", properties.auto_repeat_rate());
///
/// properties.shutdown();
/// ```
pub struct SystemProperties {
    connection: Arc<dyn Connection>,
    strategy: Strategy,
    cache: Arc<TopologyCache>,
    subscribers: Arc<TopologySubscribers>,
    listener: Mutex<ListenerSlot>,
}

/// The listener handle and whether the properties were shut down.
#[derive(Default)]
struct ListenerSlot {
    listener: Option<ChangeListener>,
    shut_down: bool,
}

impl SystemProperties {
    /// Open the platform's default display connection with the compiled
    /// strategy.
    pub fn open() -> Self {
        Self::new(crate::platform::open_connection())
    }

    /// Wrap an existing connection using the compiled strategy.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self::with_strategy(connection, Strategy::compiled())
    }

    /// Wrap an existing connection with an explicit strategy.
    pub fn with_strategy(connection: Arc<dyn Connection>, strategy: Strategy) -> Self {
        Self {
            connection,
            strategy,
            cache: Arc::new(TopologyCache::new()),
            subscribers: Arc::new(TopologySubscribers::new()),
            listener: Mutex::new(ListenerSlot::default()),
        }
    }

    /// The screen enumeration strategy in use.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Begin listening for screen changes.
    ///
    /// Spawns the change listener under [`Strategy::ResizableMultiHead`] and
    /// does nothing otherwise. Call once; a second call while the listener
    /// is alive fails with [`Error::AlreadyRunning`].
    pub fn start(&self) -> Result<()> {
        if !self.strategy.needs_listener() {
            return Ok(());
        }

        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.shut_down {
            return Err(Error::Platform("properties have been shut down".into()));
        }
        if slot.listener.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let source = self.connection.open_notification_source().inspect_err(|e| {
            log::error!("failed to open screen change notifications: {e}");
        })?;
        slot.listener = Some(ChangeListener::spawn(
            source,
            self.cache.clone(),
            self.subscribers.clone(),
        )?);
        Ok(())
    }

    /// Stop the listener and release every held resource.
    ///
    /// Safe to call any number of times; later calls are no-ops.
    pub fn shutdown(&self) {
        let listener = {
            let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
            slot.shut_down = true;
            slot.listener.take()
        };

        if let Some(mut listener) = listener
            && let Err(e) = listener.stop()
        {
            log::error!("failed to stop screen change listener: {e}");
        }

        if self.cache.teardown() {
            log::debug!("released cached screen resources");
        }
    }

    /// State of the change listener, if one was started.
    pub fn listener_state(&self) -> Option<ListenerState> {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listener
            .as_ref()
            .map(ChangeListener::state)
    }

    /// Receive every snapshot the listener installs from now on.
    pub fn subscribe(&self) -> Receiver<Arc<TopologySnapshot>> {
        self.subscribers.subscribe()
    }

    /// Watch the latest installed snapshot from async code.
    #[cfg(feature = "tokio")]
    pub fn watch(&self) -> tokio::sync::watch::Receiver<Option<Arc<TopologySnapshot>>> {
        self.subscribers.watch()
    }

    /// Current monitor layout.
    ///
    /// Reads the listener's cache under the resizable strategy and queries
    /// the platform otherwise. Empty when nothing could be determined.
    pub fn screen_info(&self) -> Arc<TopologySnapshot> {
        display::enumerate(self.strategy, self.connection.as_ref(), &self.cache)
    }

    /// Keyboard auto-repeat timing from the most precise available backend.
    pub fn repeat_timing(&self) -> Option<RepeatTiming> {
        let connection = self.connection.as_ref();
        Probe::new("auto repeat")
            .backend("XkbGetAutoRepeatRate", || connection.extended_keyboard_repeat())
            .backend("XF86MiscGetKbdSettings", || connection.legacy_keyboard_repeat())
            .run()
    }

    /// Keyboard auto-repeat rate, or [`NOT_DETERMINED`].
    pub fn auto_repeat_rate(&self) -> i64 {
        self.repeat_timing()
            .map_or(NOT_DETERMINED, |timing| i64::from(timing.rate))
    }

    /// Keyboard auto-repeat delay in milliseconds, or [`NOT_DETERMINED`].
    pub fn auto_repeat_delay(&self) -> i64 {
        self.repeat_timing()
            .map_or(NOT_DETERMINED, |timing| i64::from(timing.delay))
    }

    /// All pointer acceleration fields from one pointer control query.
    pub fn pointer_acceleration(&self) -> PointerAcceleration {
        let Some(raw) = Probe::new("pointer acceleration")
            .backend("XGetPointerControl", || self.connection.pointer_control())
            .run()
        else {
            return PointerAcceleration::default();
        };

        let field = |value: i32| if value < 0 { NOT_DETERMINED } else { i64::from(value) };
        PointerAcceleration {
            numerator: field(raw.numerator),
            denominator: field(raw.denominator),
            threshold: field(raw.threshold),
        }
    }

    /// Pointer acceleration multiplier (the acceleration denominator), or
    /// [`NOT_DETERMINED`].
    pub fn pointer_acceleration_multiplier(&self) -> i64 {
        self.pointer_field("pointer acceleration multiplier", "denominator", |raw| {
            raw.denominator
        })
    }

    /// Pointer acceleration threshold, or [`NOT_DETERMINED`].
    pub fn pointer_acceleration_threshold(&self) -> i64 {
        self.pointer_field("pointer acceleration threshold", "threshold", |raw| {
            raw.threshold
        })
    }

    /// Pointer sensitivity (the acceleration numerator), or
    /// [`NOT_DETERMINED`].
    pub fn pointer_sensitivity(&self) -> i64 {
        self.pointer_field("pointer sensitivity", "numerator", |raw| raw.numerator)
    }

    fn pointer_field(
        &self,
        setting: &'static str,
        field: &'static str,
        select: fn(&PointerControl) -> i32,
    ) -> i64 {
        Probe::new(setting)
            .backend("XGetPointerControl", || {
                let raw = self.connection.pointer_control()?;
                non_negative(select(&raw), field)
            })
            .run()
            .map_or(NOT_DETERMINED, i64::from)
    }

    /// Multi-click interval with its provenance.
    pub fn multi_click_time_detail(&self) -> MultiClickTime {
        let connection = self.connection.as_ref();
        let from_default = |program: &str,
                            option: &str,
                            source: ClickTimeSource|
         -> Result<MultiClickTime> {
            let raw = connection
                .user_default(program, option)?
                .ok_or_else(|| Error::NotSupported(format!("{program}.{option} is unset")))?;
            let millis = parse_click_time(&raw)
                .ok_or_else(|| Error::InvalidValue(format!("{program}.{option} = {raw:?}")))?;
            Ok(MultiClickTime { millis, source })
        };

        Probe::new("multi-click time")
            .backend("XtGetMultiClickTime", || {
                let millis = non_negative(connection.toolkit_multi_click_time()?, "click time")?;
                Ok(MultiClickTime {
                    millis,
                    source: ClickTimeSource::Toolkit,
                })
            })
            .backend("XGetDefault(*, multiClickTime)", || {
                from_default("*", "multiClickTime", ClickTimeSource::MultiClickTime)
            })
            .backend("XGetDefault(OpenWindows, MultiClickTimeout)", || {
                from_default(
                    "OpenWindows",
                    "MultiClickTimeout",
                    ClickTimeSource::MultiClickTimeout,
                )
            })
            .run()
            .unwrap_or_else(MultiClickTime::fallback)
    }

    /// Multi-click interval in milliseconds; 200 when no backend answers.
    pub fn multi_click_time(&self) -> i64 {
        i64::from(self.multi_click_time_detail().millis)
    }

    /// Every input setting at once.
    pub fn system_settings(&self) -> SystemSettings {
        let repeat = self.repeat_timing();
        let pointer = self.pointer_acceleration();
        SystemSettings {
            keyboard_repeat_rate: repeat.map(|timing| timing.rate),
            keyboard_repeat_delay: repeat.map(|timing| timing.delay),
            pointer_sensitivity: determined(pointer.numerator),
            pointer_acceleration_multiplier: determined(pointer.denominator),
            pointer_acceleration_threshold: determined(pointer.threshold),
            multi_click_time: self.multi_click_time_detail(),
        }
    }
}

impl Drop for SystemProperties {
    fn drop(&mut self) {
        self.shutdown();
    }
}
