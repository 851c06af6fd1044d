//! Channel-based notification of topology changes.
//!
//! Every time the change listener installs a fresh snapshot it is published
//! to all subscribers. Receivers only see completed refreshes, in order.
//!
//! # Example (Sync)
//!
//! ```no_run
//! use deskprops::SystemProperties;
//! use std::time::Duration;
//!
//! let properties = SystemProperties::open();
//! let rx = properties.subscribe();
//! properties.start().expect("Failed to start listener");
//!
//! loop {
//!     match rx.recv_timeout(Duration::from_millis(500)) {
//!         Ok(snapshot) => println!("{} monitors", snapshot.count()),
//!         Err(_) => {
//!             // Timeout - do other work or check exit condition
//!         }
//!     }
//! }
//! ```
//!
//! # Example (Async with Tokio)
//!
//! ```ignore
//! use deskprops::SystemProperties;
//!
//! #[tokio::main]
//! async fn main() {
//!     let properties = SystemProperties::open();
//!     let mut rx = properties.watch();
//!     properties.start().expect("Failed to start listener");
//!
//!     while rx.changed().await.is_ok() {
//!         println!("{:?}", *rx.borrow());
//!     }
//! }
//! ```

use crate::display::TopologySnapshot;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "tokio")]
use tokio::sync::watch;

/// Fan-out of topology snapshots to interested receivers.
pub struct TopologySubscribers {
    senders: Mutex<Vec<Sender<Arc<TopologySnapshot>>>>,
    #[cfg(feature = "tokio")]
    watch: watch::Sender<Option<Arc<TopologySnapshot>>>,
}

impl Default for TopologySubscribers {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologySubscribers {
    /// Create a publisher with no subscribers.
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
            #[cfg(feature = "tokio")]
            watch: watch::Sender::new(None),
        }
    }

    /// Register a new unbounded receiver.
    pub fn subscribe(&self) -> Receiver<Arc<TopologySnapshot>> {
        let (sender, receiver) = mpsc::channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// A tokio watch receiver that always holds the latest snapshot.
    #[cfg(feature = "tokio")]
    pub fn watch(&self) -> watch::Receiver<Option<Arc<TopologySnapshot>>> {
        self.watch.subscribe()
    }

    /// Send a snapshot to every live subscriber, pruning dropped receivers.
    pub fn publish(&self, snapshot: &Arc<TopologySnapshot>) {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|sender| sender.send(snapshot.clone()).is_ok());

        #[cfg(feature = "tokio")]
        self.watch.send_replace(Some(snapshot.clone()));
    }

    /// Number of live synchronous subscribers.
    pub fn len(&self) -> usize {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether there are no synchronous subscribers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
