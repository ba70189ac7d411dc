//! Build script for pantilt-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates pantilt.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate pantilt.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=pantilt.toml");

    let config_path = Path::new("pantilt.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: pantilt.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a pantilt.toml board configuration.       ║\n\
            ║  Please create one in the pantilt-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read pantilt.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in pantilt.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let frame_us = config
        .get("pwm")
        .and_then(|pwm| pwm.get("frame_us"))
        .and_then(toml::Value::as_integer)
        .unwrap_or(20_000);

    let mut errors = Vec::new();
    validate_servos(&config, frame_us, &mut errors);
    validate_ranges(&config, &mut errors);
    report("Invalid board configuration", &errors);

    println!("cargo:warning=pantilt.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with a boxed list of errors, if there are any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate [servo.pan] and [servo.tilt]
fn validate_servos(config: &toml::Value, frame_us: i64, errors: &mut Vec<String>) {
    let servos = match config.get("servo") {
        Some(toml::Value::Table(t)) => t,
        _ => {
            errors.push("Missing [servo.pan] and [servo.tilt] sections".to_string());
            return;
        }
    };

    for name in ["pan", "tilt"] {
        let servo = match servos.get(name) {
            Some(toml::Value::Table(t)) => t,
            Some(_) => {
                errors.push(format!("[servo.{}] must be a table", name));
                continue;
            }
            None => {
                errors.push(format!("Missing [servo.{}] section", name));
                continue;
            }
        };

        let min = servo.get("min_us").and_then(toml::Value::as_integer);
        let max = servo.get("max_us").and_then(toml::Value::as_integer);
        match (min, max) {
            (Some(min), Some(max)) => {
                if min <= 0 || min >= max {
                    errors.push(format!("[servo.{}] needs 0 < min_us < max_us", name));
                }
                if max >= frame_us {
                    errors.push(format!("[servo.{}] max_us must be below pwm.frame_us", name));
                }
            }
            _ => errors.push(format!("[servo.{}] needs integer min_us and max_us", name)),
        }
    }
}

/// Validate [pwm], [motion] and [serial] values when present
fn validate_ranges(config: &toml::Value, errors: &mut Vec<String>) {
    let checks: [(&str, &str, i64, i64); 4] = [
        ("pwm", "frame_us", 1, u16::MAX as i64),
        ("motion", "tick_ms", 1, 100),
        ("serial", "baud", 1, 4_000_000),
        ("serial", "flood_max_lines", 1, u32::MAX as i64),
    ];

    for (section, key, min, max) in checks {
        let Some(value) = config.get(section).and_then(|s| s.get(key)) else {
            continue;
        };
        match value.as_integer() {
            Some(v) if (min..=max).contains(&v) => {}
            _ => errors.push(format!("[{}] {} must be an integer {}-{}", section, key, min, max)),
        }
    }
}
