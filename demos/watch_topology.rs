//! Print the monitor topology every time it changes.
//!
//! Run with: cargo run --example watch_topology
//!
//! Rearrange or hot-plug a monitor (for example with `xrandr`) to see updates.
//! Press Ctrl+C to exit.

use deskprops::{ListenerState, SystemProperties};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn main() {
    println!("deskprops topology watcher");
    println!("==========================\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let properties = SystemProperties::open();
    let updates = properties.subscribe();

    if let Err(e) = properties.start() {
        eprintln!("Failed to start listener: {e}");
        return;
    }

    match properties.listener_state() {
        Some(ListenerState::Running) | Some(ListenerState::Created) => {
            println!("Listening for topology changes...\n");
        }
        state => {
            println!("No change listener for {:?} ({state:?})", properties.strategy());
            println!("Current topology: {:?}", properties.screen_info().monitors());
            return;
        }
    }

    let mut generation = 0u32;
    while running.load(Ordering::SeqCst) {
        match updates.recv_timeout(Duration::from_millis(100)) {
            Ok(snapshot) => {
                generation += 1;
                println!("[{generation}] {} monitor(s)", snapshot.count());
                for monitor in snapshot.monitors() {
                    println!(
                        "    #{} at ({}, {}) {}x{}",
                        monitor.id, monitor.x, monitor.y, monitor.width, monitor.height
                    );
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    properties.shutdown();
    println!("\nStopped after {generation} update(s).");
}
