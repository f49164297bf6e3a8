//! Build script for tandem-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Parses and validates link.toml at compile time
//! - Generates `link_config.rs` with the buffer size, the configuration
//!   and a peripheral split taking exactly the configured pins

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tandem_core::config::LinkConfig;
use tandem_core::RearmPolicy;
use tandem_hal::spi::BusRole;

/// Default configuration file; override with TANDEM_LINK_TOML
const DEFAULT_CONFIG: &str = "link.toml";

#[derive(Deserialize)]
struct LinkFile {
    link: LinkConfig,
}

fn main() {
    setup_linker();
    let config = load_config();
    generate_config(&config);
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

/// Read, parse and validate the link configuration
fn load_config() -> LinkConfig {
    println!("cargo:rerun-if-env-changed=TANDEM_LINK_TOML");
    let file = env::var("TANDEM_LINK_TOML").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    println!("cargo:rerun-if-changed={}", file);

    let config_path = Path::new(&file);
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail(&format!("Failed to read {}", file), &[e.to_string()]),
    };

    let config = match toml::from_str::<LinkFile>(&content) {
        Ok(parsed) => parsed.link,
        Err(e) => fail(
            &format!("Invalid configuration in {}", file),
            &e.to_string().lines().map(String::from).collect::<Vec<_>>(),
        ),
    };

    if let Err(e) = config.validate() {
        fail(
            &format!("Rejected configuration in {}", file),
            &[format!("{:?}", e)],
        );
    }

    println!(
        "cargo:warning={} validated: {:?} node, {} byte buffers at {} Hz",
        file, config.role, config.buffer_len, config.frequency_hz
    );
    config
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<57}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
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

/// Emit `link_config.rs` into OUT_DIR
fn generate_config(config: &LinkConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let pins = &config.pins;

    let role = match config.role {
        BusRole::Controller => "BusRole::Controller",
        BusRole::Follower => "BusRole::Follower",
    };
    let rearm = match config.rearm {
        RearmPolicy::SingleShot => "RearmPolicy::SingleShot",
        RearmPolicy::Rearm => "RearmPolicy::Rearm",
    };

    let code = format!(
        "// Generated by build.rs from link.toml. Do not edit.

use embassy_rp::peripherals;
use embassy_rp::Peri;
use tandem_core::config::{{LinkConfig, PinMap, WatchdogConfig}};
use tandem_core::RearmPolicy;
use tandem_hal::spi::BusRole;

/// Bytes per transfer, identical on both nodes
pub const BUFFER_LEN: usize = {buffer_len};

/// Validated link configuration
pub const CONFIG: LinkConfig = LinkConfig {{
    role: {role},
    buffer_len: BUFFER_LEN,
    frequency_hz: {frequency_hz},
    spi_mode: {spi_mode},
    rearm: {rearm},
    startup_delay_ms: {startup_delay_ms},
    pins: PinMap {{
        rx: {rx},
        csn: {csn},
        sck: {sck},
        tx: {tx},
        sync_in: {sync_in},
        sync_out: {sync_out},
    }},
    watchdog: WatchdogConfig {{
        sync_timeout_ms: {sync_timeout_ms},
        transfer_timeout_ms: {transfer_timeout_ms},
    }},
}};

/// Peripherals the link uses
pub struct LinkPeripherals {{
    pub spi: Peri<'static, peripherals::SPI0>,
    pub rx: Peri<'static, peripherals::PIN_{rx}>,
    pub csn: Peri<'static, peripherals::PIN_{csn}>,
    pub sck: Peri<'static, peripherals::PIN_{sck}>,
    pub tx: Peri<'static, peripherals::PIN_{tx}>,
    pub sync_in: Peri<'static, peripherals::PIN_{sync_in}>,
    pub sync_out: Peri<'static, peripherals::PIN_{sync_out}>,
    pub dma_tx: Peri<'static, peripherals::DMA_CH0>,
    pub dma_rx: Peri<'static, peripherals::DMA_CH1>,
}}

/// Take the configured peripherals
pub fn split(p: embassy_rp::Peripherals) -> LinkPeripherals {{
    LinkPeripherals {{
        spi: p.SPI0,
        rx: p.PIN_{rx},
        csn: p.PIN_{csn},
        sck: p.PIN_{sck},
        tx: p.PIN_{tx},
        sync_in: p.PIN_{sync_in},
        sync_out: p.PIN_{sync_out},
        dma_tx: p.DMA_CH0,
        dma_rx: p.DMA_CH1,
    }}
}}
",
        buffer_len = config.buffer_len,
        role = role,
        frequency_hz = config.frequency_hz,
        spi_mode = config.spi_mode,
        rearm = rearm,
        startup_delay_ms = config.startup_delay_ms,
        rx = pins.rx,
        csn = pins.csn,
        sck = pins.sck,
        tx = pins.tx,
        sync_in = pins.sync_in,
        sync_out = pins.sync_out,
        sync_timeout_ms = config.watchdog.sync_timeout_ms,
        transfer_timeout_ms = config.watchdog.transfer_timeout_ms,
    );

    let mut f = File::create(out_dir.join("link_config.rs")).unwrap();
    f.write_all(code.as_bytes()).unwrap();
}
