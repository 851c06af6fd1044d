//! Background listener that keeps the topology cache fresh.
//!
//! The listener owns a private [`NotificationSource`] and blocks on it. On a
//! screen change it re-resolves the resizable extension, fetches the current
//! resources and swaps them into the [`TopologyCache`]. A drop guard tied to
//! the thread body tears the cache down however the loop exits, so the
//! cached resource is released even if the thread unwinds.

use crate::backend::{Notification, NotificationSource, Waker};
use crate::cache::TopologyCache;
use crate::channel::TopologySubscribers;
use crate::display::TopologySnapshot;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

/// Lifecycle of the change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ListenerState {
    Created = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl ListenerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ListenerState::Created,
            1 => ListenerState::Running,
            2 => ListenerState::Draining,
            _ => ListenerState::Stopped,
        }
    }
}

/// Atomic cell holding a [`ListenerState`].
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(ListenerState::Created as u8))
    }

    #[inline]
    fn get(&self) -> ListenerState {
        ListenerState::from_u8(self.0.load(Ordering::SeqCst))
    }

    #[inline]
    fn set(&self, state: ListenerState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Move from `from` to `to`; fails if another transition won.
    #[inline]
    fn transition(&self, from: ListenerState, to: ListenerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Runs cache teardown when the listener thread leaves its body.
struct CleanupGuard<'a> {
    cache: &'a TopologyCache,
    state: &'a StateCell,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        self.state.set(ListenerState::Draining);
        if self.cache.teardown() {
            log::debug!("listener released cached screen resources");
        }
        self.state.set(ListenerState::Stopped);
    }
}

/// Handle to the background change listener.
///
/// Dropping the handle stops the listener and waits for it.
pub struct ChangeListener {
    state: Arc<StateCell>,
    waker: Box<dyn Waker>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ChangeListener {
    /// Spawn the listener thread over `source`.
    pub fn spawn(
        source: Box<dyn NotificationSource>,
        cache: Arc<TopologyCache>,
        subscribers: Arc<TopologySubscribers>,
    ) -> Result<Self> {
        let waker = source.waker()?;
        let state = Arc::new(StateCell::new());

        let thread_state = state.clone();
        let thread_handle = thread::Builder::new()
            .name("deskprops-listener".into())
            .spawn(move || run(source, &cache, &subscribers, &thread_state))
            .map_err(|e| Error::ThreadError(format!("failed to spawn listener: {e}")))?;

        log::debug!("screen change listener started");
        Ok(Self {
            state,
            waker,
            thread_handle: Some(thread_handle),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        self.state.get()
    }

    /// Stop the listener and wait for the thread to finish.
    ///
    /// Calling this more than once is a no-op. If the listener cannot be
    /// woken, the thread is detached instead of joined and an error is
    /// returned; it exits at its next notification.
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.thread_handle.take() else {
            return Ok(());
        };

        if !self.state.transition(ListenerState::Running, ListenerState::Draining) {
            self.state.transition(ListenerState::Created, ListenerState::Draining);
        }

        // A listener that cannot be woken may block forever; leave it detached.
        if self.state.get() != ListenerState::Stopped
            && let Err(e) = self.waker.wake()
        {
            log::warn!("failed to wake screen change listener: {e}");
            return Err(Error::ThreadError(format!(
                "listener could not be woken and was detached: {e}"
            )));
        }

        handle
            .join()
            .map_err(|_| Error::ThreadError("failed to join listener thread".into()))?;

        log::debug!("screen change listener stopped");
        Ok(())
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run(
    mut source: Box<dyn NotificationSource>,
    cache: &TopologyCache,
    subscribers: &TopologySubscribers,
    state: &StateCell,
) {
    let _cleanup = CleanupGuard { cache, state };

    if !state.transition(ListenerState::Created, ListenerState::Running) {
        return;
    }

    if let Err(e) = source.select_screen_changes() {
        log::warn!("could not select screen change notifications: {e}");
        return;
    }

    refresh(source.as_mut(), cache, subscribers);

    while state.get() == ListenerState::Running {
        match source.next_notification() {
            Ok(Notification::ScreenChange) => {
                if state.get() != ListenerState::Running {
                    break;
                }
                log::debug!("received screen change notification");
                refresh(source.as_mut(), cache, subscribers);
            }
            Ok(Notification::Wake | Notification::Other) => {}
            Err(e) => {
                log::warn!("screen change notifications lost: {e}");
                break;
            }
        }
    }
}

/// Fetch the current topology and install it. Failures keep the stale cache.
fn refresh(
    source: &mut dyn NotificationSource,
    cache: &TopologyCache,
    subscribers: &TopologySubscribers,
) {
    if !source.extension_available() {
        log::warn!("resizable screen extension is not currently available");
        return;
    }

    let fetched = match source.fetch_topology() {
        Ok(fetched) => fetched,
        Err(e) => {
            log::warn!("could not get screen resources: {e}");
            return;
        }
    };

    let snapshot = match TopologySnapshot::from_records(fetched.raw_count, fetched.records) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!("could not build screen topology: {e}");
            return;
        }
    };

    if cache.replace(snapshot, fetched.resource)
        && let Some(installed) = cache.read()
    {
        subscribers.publish(&installed);
    }
}
