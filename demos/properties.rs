//! Print the monitor topology and input settings once.
//!
//! Run with: cargo run --example properties
//! For JSON output: cargo run --example properties --features serde

use deskprops::SystemProperties;

fn main() -> deskprops::Result<()> {
    let properties = SystemProperties::open();
    println!("Strategy: {:?}", properties.strategy());

    // Populates the topology cache under the resizable strategy.
    properties.start()?;

    let topology = properties.screen_info();
    let settings = properties.system_settings();

    #[cfg(feature = "serde")]
    {
        let report = serde_json::json!({
            "monitors": topology.monitors(),
            "settings": settings,
        });
        println!("{report:#}");
    }

    #[cfg(not(feature = "serde"))]
    {
        println!("Monitors ({})", topology.count());
        for monitor in topology.monitors() {
            println!("  {monitor:?}");
        }
        println!("System settings: {settings:?}");
    }

    properties.shutdown();
    Ok(())
}
