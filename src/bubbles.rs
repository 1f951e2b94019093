//! Bubble mode: a looping particle field where each bubble glows with the
//! coarse status of one fleet component.
//!
//! Bubbles rise, wobble sideways, and wrap back below the bottom edge at a
//! fresh horizontal position. This mode never reads thresholds; it consumes
//! the `operational | degraded | outage` vocabulary from the overview
//! endpoint, with anything else glowing the unknown blue.

use crate::GridConfig;
use crate::store::{StatusStore, Value};
use crate::surface::Surface;
use crate::Color;

/// The fleet components bound to bubbles, one each.
pub const BUBBLE_STATUSES: [&str; 17] = [
    "region_us",
    "region_eu",
    "billing",
    "proxy",
    "lens",
    "grafana",
    "dns",
    "caddy",
    "postgresql",
    "redis",
    "anthropic",
    "openai",
    "groq",
    "together",
    "openrouter",
    "mistral",
    "google",
];

const RADIUS_MIN: f32 = 1.2;
const RADIUS_MAX: f32 = 2.6;
const SPEED_MIN: f32 = 0.04;
const SPEED_MAX: f32 = 0.16;
const WOBBLE_SPEED_MIN: f32 = 0.05;
const WOBBLE_SPEED_MAX: f32 = 0.2;
const WOBBLE_AMP: f32 = 0.9;

// ── Glow tones ──────────────────────────────────────────────────────

/// Dim/mid/bright glow for one status word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneSet {
    pub dim: Color,
    pub mid: Color,
    pub bright: Color,
}

const OPERATIONAL_TONES: ToneSet = ToneSet {
    dim: Color { r: 0, g: 40, b: 10 },
    mid: Color { r: 0, g: 150, b: 40 },
    bright: Color { r: 80, g: 255, b: 120 },
};

const DEGRADED_TONES: ToneSet = ToneSet {
    dim: Color { r: 50, g: 40, b: 0 },
    mid: Color { r: 180, g: 140, b: 0 },
    bright: Color { r: 255, g: 220, b: 80 },
};

const OUTAGE_TONES: ToneSet = ToneSet {
    dim: Color { r: 50, g: 0, b: 0 },
    mid: Color { r: 180, g: 20, b: 10 },
    bright: Color { r: 255, g: 80, b: 60 },
};

const UNKNOWN_TONES: ToneSet = ToneSet {
    dim: Color { r: 0, g: 15, b: 50 },
    mid: Color { r: 0, g: 70, b: 180 },
    bright: Color { r: 90, g: 160, b: 255 },
};

/// Map a component's latest status reading to its glow tones.
pub fn tones_for(status: Option<&Value>) -> ToneSet {
    let word = match status {
        Some(Value::Text(s)) => s.as_str(),
        _ => "",
    };
    match word {
        "operational" => OPERATIONAL_TONES,
        "degraded" => DEGRADED_TONES,
        "outage" => OUTAGE_TONES,
        _ => UNKNOWN_TONES,
    }
}

// ── Particles ───────────────────────────────────────────────────────

/// One animated particle, bound to a single status name for its lifetime.
#[derive(Clone, Debug)]
pub struct Bubble {
    status: &'static str,
    x: f32,
    y: f32,
    radius: f32,
    speed: f32,
    wobble: f32,
    wobble_speed: f32,
}

impl Bubble {
    /// Horizontal draw position: the wobble perturbation applied to the
    /// anchor, clamped at least one pixel from either edge.
    fn draw_x(&self, width: f32) -> f32 {
        (self.x + self.wobble.sin() * WOBBLE_AMP).clamp(1.0, width - 2.0)
    }
}

/// The whole particle field. Created once at setup; bubbles are never
/// destroyed, only wrapped.
pub struct BubbleField {
    bubbles: Vec<Bubble>,
    rng: fastrand::Rng,
    width: f32,
    height: f32,
}

impl BubbleField {
    pub fn new(grid: GridConfig) -> Self {
        Self::with_rng(grid, fastrand::Rng::new())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(grid: GridConfig, seed: u64) -> Self {
        Self::with_rng(grid, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(grid: GridConfig, mut rng: fastrand::Rng) -> Self {
        let width = grid.cols as f32;
        let height = grid.rows as f32;

        let bubbles = BUBBLE_STATUSES
            .iter()
            .copied()
            .map(|status| Bubble {
                status,
                x: side_margin_position(&mut rng, width),
                // Stagger starting heights so the field never wraps in sync.
                y: rng.f32() * height,
                radius: rng.f32() * (RADIUS_MAX - RADIUS_MIN) + RADIUS_MIN,
                speed: rng.f32() * (SPEED_MAX - SPEED_MIN) + SPEED_MIN,
                wobble: rng.f32() * std::f32::consts::TAU,
                wobble_speed: rng.f32() * (WOBBLE_SPEED_MAX - WOBBLE_SPEED_MIN) + WOBBLE_SPEED_MIN,
            })
            .collect();

        Self {
            bubbles,
            rng,
            width,
            height,
        }
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Advance every bubble one tick: rise, wobble, wrap.
    pub fn update(&mut self) {
        for bubble in &mut self.bubbles {
            bubble.y -= bubble.speed;
            bubble.wobble += bubble.wobble_speed;

            // Fully off the top edge: reappear just below the bottom at a
            // fresh horizontal position with re-rolled motion.
            if bubble.y < -bubble.radius {
                bubble.y = self.height + bubble.radius;
                bubble.x = side_margin_position(&mut self.rng, self.width);
                bubble.speed = self.rng.f32() * (SPEED_MAX - SPEED_MIN) + SPEED_MIN;
                bubble.wobble_speed =
                    self.rng.f32() * (WOBBLE_SPEED_MAX - WOBBLE_SPEED_MIN) + WOBBLE_SPEED_MIN;
            }
        }
    }

    /// Clear to black and stamp every bubble's glow, then present.
    pub fn draw(&self, store: &StatusStore, surface: &mut dyn Surface) {
        surface.clear();

        for bubble in &self.bubbles {
            let tones = tones_for(store.get(bubble.status));
            stamp_glow(
                surface,
                bubble.draw_x(self.width),
                bubble.y,
                bubble.radius,
                tones,
            );
        }

        surface.present();
    }
}

/// A random horizontal anchor at least one pixel inside both edges.
fn side_margin_position(rng: &mut fastrand::Rng, width: f32) -> f32 {
    rng.f32() * (width - 3.0) + 1.0
}

/// Stamp a filled disc with a soft radial falloff: bright core within the
/// inner 30% of the squared radius, mid tone out to the radius, dim halo
/// one pixel beyond.
pub fn stamp_glow(surface: &mut dyn Surface, cx: f32, cy: f32, radius: f32, tones: ToneSet) {
    let halo = radius + 1.0;
    let r2 = radius * radius;

    let min_x = (cx - halo).floor() as i32;
    let max_x = (cx + halo).ceil() as i32;
    let min_y = (cy - halo).floor() as i32;
    let max_y = (cy + halo).ceil() as i32;

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            if px < 0 || py < 0 {
                continue;
            }
            let dx = px as f32 - cx;
            let dy = py as f32 - cy;
            let d2 = dx * dx + dy * dy;

            let color = if d2 <= r2 * 0.3 {
                tones.bright
            } else if d2 <= r2 {
                tones.mid
            } else if d2 <= halo * halo {
                tones.dim
            } else {
                continue;
            };
            surface.set_pixel(px as u32, py as u32, color);
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
