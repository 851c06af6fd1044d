//! Scripted backends for unit tests.

use crate::backend::{
    Connection, FetchedTopology, Notification, NotificationSource, PointerControl, ScreenRecord,
    Waker,
};
use crate::error::{Error, Result};
use crate::settings::RepeatTiming;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

pub(crate) fn record(number: i32, x: i32, y: i32, width: i32, height: i32) -> ScreenRecord {
    ScreenRecord {
        number,
        x,
        y,
        width,
        height,
    }
}

/// Poll `condition` until it holds, panicking after five seconds.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Counts how many of its tokens have been dropped.
pub(crate) struct DropCounter(Arc<AtomicUsize>);

pub(crate) struct DropToken(Arc<AtomicUsize>);

impl DropCounter {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicUsize::new(0)))
    }

    pub(crate) fn token(&self) -> DropToken {
        DropToken(self.0.clone())
    }

    pub(crate) fn drops(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Drop for DropToken {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A [`Connection`] answering from canned values and logging every call.
#[derive(Default)]
pub(crate) struct FakeConnection {
    closed: AtomicBool,
    screen_size: Option<(i32, i32)>,
    multi_head: Option<Vec<ScreenRecord>>,
    extended_repeat: Option<RepeatTiming>,
    legacy_repeat: Option<RepeatTiming>,
    pointer: Option<PointerControl>,
    toolkit_click_time: Option<i32>,
    defaults: HashMap<(String, String), String>,
    source: Mutex<Option<FakeSource>>,
    calls: Mutex<Vec<String>>,
}

impl FakeConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn closed() -> Self {
        let connection = Self::default();
        connection.close();
        connection
    }

    pub(crate) fn with_screen_size(mut self, width: i32, height: i32) -> Self {
        self.screen_size = Some((width, height));
        self
    }

    pub(crate) fn with_multi_head(mut self, records: Vec<ScreenRecord>) -> Self {
        self.multi_head = Some(records);
        self
    }

    pub(crate) fn with_extended_repeat(mut self, delay: u32, rate: u32) -> Self {
        self.extended_repeat = Some(RepeatTiming { delay, rate });
        self
    }

    pub(crate) fn with_legacy_repeat(mut self, delay: u32, rate: u32) -> Self {
        self.legacy_repeat = Some(RepeatTiming { delay, rate });
        self
    }

    pub(crate) fn with_pointer(mut self, numerator: i32, denominator: i32, threshold: i32) -> Self {
        self.pointer = Some(PointerControl {
            numerator,
            denominator,
            threshold,
        });
        self
    }

    pub(crate) fn with_toolkit_click_time(mut self, millis: i32) -> Self {
        self.toolkit_click_time = Some(millis);
        self
    }

    pub(crate) fn with_default(mut self, program: &str, option: &str, value: &str) -> Self {
        self.defaults
            .insert((program.to_owned(), option.to_owned()), value.to_owned());
        self
    }

    pub(crate) fn with_notification_source(self, source: FakeSource) -> Self {
        *self.source.lock().unwrap() = Some(source);
        self
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(name.to_owned());
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::ConnectionUnavailable)
        }
    }
}

fn scripted<T: Clone>(value: &Option<T>, what: &str) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| Error::NotSupported(what.to_owned()))
}

impl Connection for FakeConnection {
    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn default_screen_size(&self) -> Result<(i32, i32)> {
        self.call("default_screen_size")?;
        scripted(&self.screen_size, "default screen")
    }

    fn pointer_control(&self) -> Result<PointerControl> {
        self.call("pointer_control")?;
        scripted(&self.pointer, "pointer control")
    }

    fn multi_head_screens(&self) -> Result<(i64, Vec<ScreenRecord>)> {
        self.call("multi_head_screens")?;
        let records = scripted(&self.multi_head, "multi-head")?;
        Ok((records.len() as i64, records))
    }

    fn extended_keyboard_repeat(&self) -> Result<RepeatTiming> {
        self.call("extended_keyboard_repeat")?;
        scripted(&self.extended_repeat, "extended keyboard")
    }

    fn legacy_keyboard_repeat(&self) -> Result<RepeatTiming> {
        self.call("legacy_keyboard_repeat")?;
        scripted(&self.legacy_repeat, "legacy keyboard")
    }

    fn toolkit_multi_click_time(&self) -> Result<i32> {
        self.call("toolkit_multi_click_time")?;
        scripted(&self.toolkit_click_time, "toolkit")
    }

    fn user_default(&self, program: &str, option: &str) -> Result<Option<String>> {
        self.call(&format!("user_default {program}.{option}"))?;
        Ok(self
            .defaults
            .get(&(program.to_owned(), option.to_owned()))
            .cloned())
    }

    fn open_notification_source(&self) -> Result<Box<dyn NotificationSource>> {
        self.call("open_notification_source")?;
        self.source
            .lock()
            .unwrap()
            .take()
            .map(|source| Box::new(source) as Box<dyn NotificationSource>)
            .ok_or_else(|| Error::NotSupported("notification source".into()))
    }
}

type ScriptedTopology = Option<(Vec<ScreenRecord>, Option<DropToken>)>;

#[derive(Default)]
struct SourceState {
    notifications: VecDeque<Notification>,
    topologies: VecDeque<ScriptedTopology>,
    disconnected: bool,
    extension_missing: bool,
    fail_selection: bool,
    fail_wakes: bool,
    fetches: usize,
    extension_checks: usize,
}

#[derive(Default)]
struct Shared {
    state: Mutex<SourceState>,
    ready: Condvar,
}

impl Shared {
    fn update<R>(&self, f: impl FnOnce(&mut SourceState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        let result = f(&mut state);
        self.ready.notify_all();
        result
    }
}

/// A [`NotificationSource`] fed by a [`SourceControl`].
pub(crate) struct FakeSource {
    shared: Arc<Shared>,
}

/// Test-side handle that scripts a [`FakeSource`].
pub(crate) struct SourceControl {
    shared: Arc<Shared>,
}

impl FakeSource {
    pub(crate) fn new() -> (Self, SourceControl) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: shared.clone(),
            },
            SourceControl { shared },
        )
    }
}

impl SourceControl {
    pub(crate) fn push_topology(&self, records: Vec<ScreenRecord>) {
        self.shared
            .update(|state| state.topologies.push_back(Some((records, None))));
    }

    pub(crate) fn push_topology_with(&self, records: Vec<ScreenRecord>, token: DropToken) {
        self.shared
            .update(|state| state.topologies.push_back(Some((records, Some(token)))));
    }

    pub(crate) fn push_failure(&self) {
        self.shared.update(|state| state.topologies.push_back(None));
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.shared
            .update(|state| state.notifications.push_back(notification));
    }

    pub(crate) fn set_extension_available(&self, available: bool) {
        self.shared
            .update(|state| state.extension_missing = !available);
    }

    pub(crate) fn fail_selection(&self) {
        self.shared.update(|state| state.fail_selection = true);
    }

    pub(crate) fn fail_wakes(&self) {
        self.shared.update(|state| state.fail_wakes = true);
    }

    pub(crate) fn disconnect(&self) {
        self.shared.update(|state| state.disconnected = true);
    }

    pub(crate) fn fetches(&self) -> usize {
        self.shared.update(|state| state.fetches)
    }

    pub(crate) fn extension_checks(&self) -> usize {
        self.shared.update(|state| state.extension_checks)
    }
}

impl NotificationSource for FakeSource {
    fn select_screen_changes(&mut self) -> Result<()> {
        if self.shared.update(|state| state.fail_selection) {
            Err(Error::NotSupported("screen change selection".into()))
        } else {
            Ok(())
        }
    }

    fn next_notification(&mut self) -> Result<Notification> {
        let mut state = self.shared.state.lock().unwrap();
        loop {
            if let Some(notification) = state.notifications.pop_front() {
                return Ok(notification);
            }
            if state.disconnected {
                return Err(Error::Platform("display connection closed".into()));
            }
            state = self.shared.ready.wait(state).unwrap();
        }
    }

    fn extension_available(&mut self) -> bool {
        self.shared.update(|state| {
            state.extension_checks += 1;
            !state.extension_missing
        })
    }

    fn fetch_topology(&mut self) -> Result<FetchedTopology> {
        let scripted = self.shared.update(|state| {
            state.fetches += 1;
            state.topologies.pop_front()
        });

        match scripted {
            Some(Some((records, token))) => Ok(FetchedTopology {
                raw_count: records.len() as i64,
                records,
                resource: Box::new(token),
            }),
            Some(None) => Err(Error::Platform("scripted fetch failure".into())),
            None => Err(Error::Platform("no topology scripted".into())),
        }
    }

    fn waker(&self) -> Result<Box<dyn Waker>> {
        Ok(Box::new(FakeWaker {
            shared: self.shared.clone(),
        }))
    }
}

struct FakeWaker {
    shared: Arc<Shared>,
}

impl Waker for FakeWaker {
    fn wake(&self) -> Result<()> {
        self.shared.update(|state| {
            if state.fail_wakes {
                return Err(Error::ConnectionUnavailable);
            }
            state.notifications.push_back(Notification::Wake);
            Ok(())
        })
    }
}
