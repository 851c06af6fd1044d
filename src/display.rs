//! Monitor topology types and the one-shot screen enumerator.

use crate::backend::{Connection, ScreenRecord};
use crate::cache::TopologyCache;
use crate::count::{MAX_SCREEN_COUNT, clamp_count};
use crate::error::{Error, Result};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Placement and size of one display output on the virtual desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorDescriptor {
    /// Backend-dependent identifier, not stable across topology changes.
    pub id: u32,
    /// Left coordinate.
    pub x: i32,
    /// Top coordinate.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl MonitorDescriptor {
    /// Check whether a point is inside this monitor.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x, y) = (i64::from(x), i64::from(y));
        let (left, top) = (i64::from(self.x), i64::from(self.y));
        x >= left && y >= top && x < left + i64::from(self.width) && y < top + i64::from(self.height)
    }
}

impl From<ScreenRecord> for MonitorDescriptor {
    fn from(record: ScreenRecord) -> Self {
        Self {
            id: record.number.max(0) as u32,
            x: record.x,
            y: record.y,
            width: record.width.max(0) as u32,
            height: record.height.max(0) as u32,
        }
    }
}

/// A point-in-time description of monitor count and geometry.
///
/// The count is the length of the monitor list and never exceeds
/// [`MAX_SCREEN_COUNT`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSnapshot"))]
pub struct TopologySnapshot {
    monitors: Vec<MonitorDescriptor>,
}

/// Unchecked wire form of [`TopologySnapshot`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSnapshot {
    monitors: Vec<MonitorDescriptor>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSnapshot> for TopologySnapshot {
    type Error = Error;

    fn try_from(raw: RawSnapshot) -> Result<Self> {
        if raw.monitors.len() > usize::from(MAX_SCREEN_COUNT) {
            return Err(Error::InvalidValue(format!(
                "{} monitors exceeds the limit of {MAX_SCREEN_COUNT}",
                raw.monitors.len()
            )));
        }
        Ok(Self {
            monitors: raw.monitors,
        })
    }
}

impl TopologySnapshot {
    /// An empty snapshot, meaning "no data".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a backend's raw count and its records.
    ///
    /// The raw count is clamped first and exactly that many descriptors are
    /// reserved and filled. Fewer records than the clamped count is a backend
    /// failure.
    pub fn from_records<I>(raw_count: i64, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = ScreenRecord>,
    {
        let (count, overflowed) = clamp_count(raw_count, MAX_SCREEN_COUNT);
        if overflowed {
            log::warn!("screen count overflow detected: {raw_count} clamped to {count}");
        }

        let count = usize::from(count);
        let mut monitors = Vec::new();
        monitors
            .try_reserve_exact(count)
            .map_err(|e| Error::OutOfResources(format!("{count} monitor descriptors: {e}")))?;
        monitors.extend(records.into_iter().take(count).map(MonitorDescriptor::from));

        if monitors.len() != count {
            return Err(Error::Platform(format!(
                "backend reported {count} screens but returned {}",
                monitors.len()
            )));
        }

        Ok(Self { monitors })
    }

    /// Number of monitors.
    pub fn count(&self) -> u8 {
        self.monitors.len() as u8
    }

    /// Whether the snapshot holds no monitors.
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Monitors in enumeration order.
    pub fn monitors(&self) -> &[MonitorDescriptor] {
        &self.monitors
    }

    /// Find the monitor containing a point.
    pub fn monitor_at(&self, x: i32, y: i32) -> Option<&MonitorDescriptor> {
        self.monitors.iter().find(|monitor| monitor.contains(x, y))
    }
}

/// How the monitor layout is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// A multi-head extension returns a flat list of screens.
    MultiHead,
    /// A resize-aware extension; the layout is kept fresh by a listener.
    ResizableMultiHead,
    /// Only the default screen is reported.
    SingleScreen,
}

impl Strategy {
    /// The strategy selected by the enabled Cargo features.
    pub const fn compiled() -> Self {
        if cfg!(all(target_os = "linux", feature = "xrandr")) {
            Strategy::ResizableMultiHead
        } else if cfg!(all(target_os = "linux", feature = "xinerama")) {
            Strategy::MultiHead
        } else {
            Strategy::SingleScreen
        }
    }

    /// Whether this strategy needs the change listener.
    pub fn needs_listener(&self) -> bool {
        matches!(self, Strategy::ResizableMultiHead)
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::compiled()
    }
}

/// Enumerate monitors once using `strategy`.
///
/// Never fails: any error is logged and reported as an empty snapshot.
pub fn enumerate(
    strategy: Strategy,
    connection: &dyn Connection,
    cache: &TopologyCache,
) -> Arc<TopologySnapshot> {
    let result = match strategy {
        Strategy::MultiHead => multi_head(connection).map(Arc::new),
        Strategy::ResizableMultiHead => resizable(connection, cache),
        Strategy::SingleScreen => single_screen(connection).map(Arc::new),
    };

    result.unwrap_or_else(|e| {
        match e {
            Error::ConnectionUnavailable => log::error!("screen enumeration failed: {e}"),
            _ => log::warn!("screen enumeration failed: {e}"),
        }
        Arc::new(TopologySnapshot::empty())
    })
}

fn multi_head(connection: &dyn Connection) -> Result<TopologySnapshot> {
    let (raw_count, records) = connection.multi_head_screens()?;
    TopologySnapshot::from_records(raw_count, records)
}

fn resizable(
    connection: &dyn Connection,
    cache: &TopologyCache,
) -> Result<Arc<TopologySnapshot>> {
    if !connection.is_open() {
        return Err(Error::ConnectionUnavailable);
    }

    Ok(cache.read().unwrap_or_else(|| {
        log::warn!("screen topology has not been populated yet");
        Arc::new(TopologySnapshot::empty())
    }))
}

fn single_screen(connection: &dyn Connection) -> Result<TopologySnapshot> {
    let (width, height) = connection.default_screen_size()?;
    if width <= 0 || height <= 0 {
        log::warn!("default screen reported an unusable size {width}x{height}");
        return Ok(TopologySnapshot::empty());
    }

    TopologySnapshot::from_records(
        1,
        [ScreenRecord {
            number: 1,
            x: 0,
            y: 0,
            width,
            height,
        }],
    )
}
