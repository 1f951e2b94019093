//! Shared core for the fleet status display.
//!
//! This crate drives a 53x11 RGB LED matrix where every pixel is one metric
//! of a multi-region service fleet. The library half holds everything that
//! can be tested without hardware:
//! - Grid dimensions and the status `Palette`
//! - A `Color` type decoupled from the hardware crate
//! - The metric table, value store, color policy, and both renderers
//! - Signal handling for clean shutdown

pub mod bubbles;
pub mod fetch;
pub mod grid;
pub mod map;
pub mod policy;
pub mod scheduler;
pub mod store;
pub mod surface;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Grid configuration ──────────────────────────────────────────────

/// Width of the panel in pixels (one metric per pixel in grid mode).
pub const GRID_WIDTH: usize = 53;
/// Height of the panel in pixels.
pub const GRID_HEIGHT: usize = 11;

/// Dimensions of the LED panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub cols: u32,
    pub rows: u32,
}

impl GridConfig {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Total number of pixels on the panel.
    pub fn pixel_count(&self) -> u32 {
        self.cols * self.rows
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: GRID_WIDTH as u32,
            rows: GRID_HEIGHT as u32,
        }
    }
}

// ── Color ───────────────────────────────────────────────────────────

/// Our own color type, decoupled from the hardware crate.
///
/// This lets the policy and renderers run on any host without
/// `rpi-led-matrix`. At the hardware boundary, we convert via
/// `Into<LedColor>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Apply a brightness scalar in `[0.0, 1.0]` to this color.
    pub fn scaled(self, brightness: f32) -> Self {
        if brightness >= 1.0 {
            return self;
        }
        let b = brightness.max(0.0);
        Self {
            r: (self.r as f32 * b) as u8,
            g: (self.g as f32 * b) as u8,
            b: (self.b as f32 * b) as u8,
        }
    }
}

/// Convert our Color to the hardware crate's LedColor at the boundary.
#[cfg(feature = "hardware")]
impl From<Color> for rpi_led_matrix::LedColor {
    fn from(c: Color) -> Self {
        rpi_led_matrix::LedColor {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

// ── Palette ─────────────────────────────────────────────────────────

/// The fixed set of status colors, built once at startup.
///
/// `off` and `unknown` are distinct signals: a counter at zero goes dark,
/// while a metric with no data at all shows the informational blue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub off: Color,
    pub healthy: Color,
    pub warning: Color,
    pub critical: Color,
    pub unknown: Color,
    pub activity: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            off: Color::new(0, 0, 0),
            healthy: Color::new(0, 255, 0),
            warning: Color::new(255, 200, 0),
            critical: Color::new(255, 0, 0),
            unknown: Color::new(0, 100, 255),
            activity: Color::new(0, 50, 0),
        }
    }
}

// ── Shutdown handling ───────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
pub fn setup_signal_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    running
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ───────────────────────────────────────────────────────────
