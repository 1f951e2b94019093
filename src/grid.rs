//! Grid mode: the full 53x11 pass where every pixel is one metric.

use std::time::Duration;

use crate::Palette;
use crate::map::MetricMap;
use crate::policy::{self, MetricKind};
use crate::store::StatusStore;
use crate::surface::Surface;

// ── Frame rendering ─────────────────────────────────────────────────

/// Render the whole grid: resolve each cell's value, color it, present
/// the finished frame.
///
/// Health cells read `<source>_health`, everything else reads the
/// descriptor's payload key; both fall back to the literal metric name.
/// Cells are independent and the surface starts blank, so the single
/// `present` at the end is the only visible transition.
pub fn render(map: &MetricMap, store: &StatusStore, palette: &Palette, surface: &mut dyn Surface) {
    surface.clear();

    for (x, y, desc) in map.iter() {
        let value = match desc.kind {
            MetricKind::Health => {
                let key = format!("{}_health", desc.source);
                store.get_or(&key, &desc.name)
            }
            _ => {
                let key = desc.key.as_deref().unwrap_or(&desc.name);
                store.get_or(key, &desc.name)
            }
        };
        let color = policy::resolve(&desc.kind, value, palette);
        surface.set_pixel(x as u32, y as u32, color);
    }

    surface.present();
}

// ── Attention patterns ──────────────────────────────────────────────

/// Startup sweep: a green column runs across the panel, the whole panel
/// flashes green, then everything clears.
pub async fn startup_animation(surface: &mut dyn Surface, palette: &Palette) {
    let size = surface.size();

    for x in 0..size.cols {
        surface.clear();
        for y in 0..size.rows {
            surface.set_pixel(x, y, palette.healthy);
        }
        surface.present();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    for x in 0..size.cols {
        for y in 0..size.rows {
            surface.set_pixel(x, y, palette.healthy);
        }
    }
    surface.present();
    tokio::time::sleep(Duration::from_millis(500)).await;

    surface.clear();
    surface.present();
}

/// Red diagonal X, substituted for the normal frame when a refresh cycle
/// fails outright.
pub fn error_pattern(surface: &mut dyn Surface, palette: &Palette) {
    let size = surface.size();
    surface.clear();

    let n = size.cols.min(size.rows);
    for i in 0..n {
        surface.set_pixel(i, i, palette.critical);
        surface.set_pixel(size.cols - 1 - i, i, palette.critical);
    }

    surface.present();
}

// ── Tests ───────────────────────────────────────────────────────────
