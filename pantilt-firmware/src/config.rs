//! Board configuration
//!
//! `pantilt.toml` is compiled into the firmware. build.rs rejects a bad
//! file, so a parse failure here only falls back to built-in defaults.

use defmt::*;

use pantilt_core::config::toml::parse_hardware_config;
use pantilt_core::config::HardwareConfig;

/// Embedded board configuration (compiled into firmware)
/// Edit pantilt.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../pantilt.toml");

/// Parse the embedded configuration, falling back to defaults
pub fn load_hardware_config() -> HardwareConfig {
    match parse_hardware_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Board config: frame={}us tick={}ms baud={} flood={}/s",
                config.frame_us, config.tick_ms, config.baud, config.flood_max_lines
            );
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using built-in defaults");
            HardwareConfig::default()
        }
    }
}
