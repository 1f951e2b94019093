//! Pixel surface boundary: the trait both renderers draw through, an
//! in-memory double-buffered implementation, and the hardware matrix
//! behind the `hardware` feature.

use crate::{Color, GridConfig};

// ── Trait ───────────────────────────────────────────────────────────

/// The drawing surface collaborator.
///
/// Writes go to an offscreen buffer; nothing is visible until `present`,
/// so a render pass can never show a partial frame. The brightness scalar
/// lives here because it is a property of the panel, not of any metric;
/// it is applied at the hardware boundary.
pub trait Surface {
    fn size(&self) -> GridConfig;

    /// Blank the offscreen buffer.
    fn clear(&mut self);

    /// Write one pixel to the offscreen buffer. Out-of-range coordinates
    /// are ignored.
    fn set_pixel(&mut self, x: u32, y: u32, color: Color);

    /// Atomically make the offscreen buffer visible.
    fn present(&mut self);

    /// Set the global brightness scalar, clamped to `[0.0, 1.0]`.
    fn set_brightness(&mut self, value: f32);

    fn brightness(&self) -> f32;

    fn adjust_brightness(&mut self, delta: f32) {
        self.set_brightness(self.brightness() + delta);
    }
}

// ── In-memory surface ───────────────────────────────────────────────

/// Double-buffered in-memory surface used by tests and headless runs.
///
/// `pixel()` reads the *presented* frame, so tests observe exactly what a
/// viewer would: draws are invisible until `present`.
pub struct FrameSurface {
    grid: GridConfig,
    back: Vec<Color>,
    front: Vec<Color>,
    brightness: f32,
    presented_frames: u64,
}

impl FrameSurface {
    pub fn new(grid: GridConfig) -> Self {
        let n = grid.pixel_count() as usize;
        Self {
            grid,
            back: vec![Color::BLACK; n],
            front: vec![Color::BLACK; n],
            brightness: 0.5,
            presented_frames: 0,
        }
    }

    /// Read a pixel of the last presented frame.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.front[(y * self.grid.cols + x) as usize]
    }

    /// How many frames have been presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }
}

impl Default for FrameSurface {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl Surface for FrameSurface {
    fn size(&self) -> GridConfig {
        self.grid
    }

    fn clear(&mut self) {
        self.back.fill(Color::BLACK);
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x < self.grid.cols && y < self.grid.rows {
            self.back[(y * self.grid.cols + x) as usize] = color;
        }
    }

    fn present(&mut self) {
        self.front.copy_from_slice(&self.back);
        self.presented_frames += 1;
    }

    fn set_brightness(&mut self, value: f32) {
        self.brightness = value.clamp(0.0, 1.0);
    }

    fn brightness(&self) -> f32 {
        self.brightness
    }
}

// ── Hardware surface ────────────────────────────────────────────────

/// Create a matrix configured for our hardware:
/// Pi Zero 2 W + Adafruit Bonnet + the fleet display panel.
#[cfg(feature = "hardware")]
pub fn create_matrix(
    grid: GridConfig,
) -> Result<rpi_led_matrix::LedMatrix, Box<dyn std::error::Error>> {
    use rpi_led_matrix::{LedMatrixOptions, LedRuntimeOptions};

    let mut options = LedMatrixOptions::new();
    options.set_rows(grid.rows);
    options.set_cols(grid.cols);
    options.set_hardware_mapping("adafruit-hat");

    options.set_pwm_bits(8)?;
    options.set_pwm_lsb_nanoseconds(130);

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(2); // Pi Zero 2 W requires slowdown=2

    let matrix = rpi_led_matrix::LedMatrix::new(Some(options), Some(rt_options))?;

    Ok(matrix)
}

/// The real panel. Owns the matrix and its offscreen canvas; `present`
/// swaps them, which is the only point where pixels become visible.
#[cfg(feature = "hardware")]
pub struct MatrixSurface {
    grid: GridConfig,
    matrix: rpi_led_matrix::LedMatrix,
    canvas: Option<rpi_led_matrix::LedCanvas>,
    brightness: f32,
}

#[cfg(feature = "hardware")]
impl MatrixSurface {
    pub fn new(grid: GridConfig, brightness: f32) -> Result<Self, Box<dyn std::error::Error>> {
        let matrix = create_matrix(grid)?;
        let canvas = matrix.offscreen_canvas();
        Ok(Self {
            grid,
            matrix,
            canvas: Some(canvas),
            brightness: brightness.clamp(0.0, 1.0),
        })
    }
}

#[cfg(feature = "hardware")]
impl Surface for MatrixSurface {
    fn size(&self) -> GridConfig {
        self.grid
    }

    fn clear(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear();
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.grid.cols || y >= self.grid.rows {
            return;
        }
        if let Some(canvas) = self.canvas.as_mut() {
            let scaled = color.scaled(self.brightness);
            canvas.set(x as i32, y as i32, &scaled.into());
        }
    }

    fn present(&mut self) {
        if let Some(canvas) = self.canvas.take() {
            self.canvas = Some(self.matrix.swap(canvas));
        }
    }

    fn set_brightness(&mut self, value: f32) {
        self.brightness = value.clamp(0.0, 1.0);
    }

    fn brightness(&self) -> f32 {
        self.brightness
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn draws_are_invisible_until_present() {
        let mut surface = FrameSurface::default();
        surface.set_pixel(3, 2, Color::new(255, 0, 0));
        assert_eq!(surface.pixel(3, 2), Color::BLACK);

        surface.present();
        assert_eq!(surface.pixel(3, 2), Color::new(255, 0, 0));
    }

    #[test]
    fn clear_blanks_the_next_frame_only() {
        let mut surface = FrameSurface::default();
        surface.set_pixel(0, 0, Color::new(0, 255, 0));
        surface.present();

        surface.clear();
        assert_eq!(surface.pixel(0, 0), Color::new(0, 255, 0));
        surface.present();
        assert_eq!(surface.pixel(0, 0), Color::BLACK);
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut surface = FrameSurface::default();
        surface.set_pixel(53, 0, Color::new(1, 1, 1));
        surface.set_pixel(0, 11, Color::new(1, 1, 1));
        surface.present();
        assert_eq!(surface.presented_frames(), 1);
    }

    #[test]
    fn brightness_clamps_to_unit_range() {
        let mut surface = FrameSurface::default();
        surface.set_brightness(1.7);
        assert_eq!(surface.brightness(), 1.0);
        surface.set_brightness(-0.3);
        assert_eq!(surface.brightness(), 0.0);
    }

    #[test]
    fn adjust_brightness_steps_from_current() {
        let mut surface = FrameSurface::default();
        assert_eq!(surface.brightness(), 0.5);
        surface.adjust_brightness(0.1);
        assert!((surface.brightness() - 0.6).abs() < 1e-6);
        for _ in 0..10 {
            surface.adjust_brightness(0.1);
        }
        assert_eq!(surface.brightness(), 1.0);
    }
}
