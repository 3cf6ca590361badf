//! Build script for gantry-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Parses and validates machine.toml, then embeds it as postcard bytes

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use gantry_core::config::MachineConfig;

fn main() {
    setup_linker();
    encode_config();
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

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse, validate and encode machine.toml into OUT_DIR/machine.bin
fn encode_config() {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: machine.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a machine.toml configuration file.        ║\n\
            ║  Please create one in the gantry-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read machine.toml", &e.to_string()),
    };

    let config: MachineConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => fail("Invalid machine.toml", &e.to_string()),
    };

    if let Err(e) = config.validate() {
        fail("machine.toml failed validation", &format!("{:?}", e));
    }

    let bytes = match postcard::to_stdvec(&config) {
        Ok(bytes) => bytes,
        Err(e) => fail("Failed to encode configuration", &e.to_string()),
    };

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("machine.bin"), &bytes).unwrap();

    println!(
        "cargo:warning=machine.toml validated: {} waypoint pairs, {} bytes",
        config.sequence.waypoints.len(),
        bytes.len()
    );
}

/// Abort the build with a boxed message
fn fail(title: &str, detail: &str) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(detail)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_lines_truncated_on_char_boundary() {
        let line = "é".repeat(80);
        let boxed = format_error_lines(&line);
        let inner: String = "é".repeat(61);
        assert!(boxed.contains(&format!("{}...", inner)));
    }

    #[test]
    fn test_short_lines_kept() {
        assert_eq!(format_error_lines("bad key"), format!("║  {:<64} ║", "bad key"));
    }
}
