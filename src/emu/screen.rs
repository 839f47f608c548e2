use std::sync::{Arc, Mutex, PoisonError};

use super::{DISPLAY_X, DISPLAY_Y, Display};

/// The 64x32 monochrome frame buffer mutated by CLS and DRW.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pixels: Display<bool>,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            pixels: [[false; DISPLAY_X]; DISPLAY_Y],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_X]; DISPLAY_Y];
    }

    /// XORs an 8-pixel-wide sprite onto the screen with its top left corner at
    /// (`x`, `y`). Each pixel wraps around the screen edges on its own.
    ///
    /// Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut any_erased = false;

        for (row, sprite_byte) in rows.iter().enumerate() {
            let y_pos = (y as usize + row) % DISPLAY_Y;

            for col in 0..8 {
                // If current sprite bit is non-zero
                if (sprite_byte & (0x80 >> col)) != 0 {
                    let x_pos = (x as usize + col) % DISPLAY_X;
                    let pixel = &mut self.pixels[y_pos][x_pos];

                    // Flip the pixel
                    *pixel ^= true;

                    if !*pixel {
                        any_erased = true;
                    }
                }
            }
        }

        any_erased
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[y % DISPLAY_Y][x % DISPLAY_X]
    }

    pub fn pixels(&self) -> &Display<bool> {
        &self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().flatten().all(|&p| !p)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, renderer-facing copy of the frame buffer.
///
/// The execution loop publishes a whole frame at a time after each CLS/DRW,
/// so readers only ever see complete sprites.
#[derive(Clone, Default)]
pub struct ScreenHandle {
    frame: Arc<Mutex<Screen>>,
}

impl ScreenHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, screen: &Screen) {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone_from(screen);
    }

    /// Copy of the latest published frame.
    pub fn snapshot(&self) -> Display<bool> {
        *self
            .frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pixels()
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pixel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLYPH_ZERO: [u8; 5] = [0xF0, 0x90, 0x90, 0x90, 0xF0];

    #[test]
    fn draw_sets_pixels_from_msb() {
        let mut screen = Screen::new();
        let erased = screen.draw_sprite(0, 0, &[0b1000_0001]);
        assert!(!erased);
        assert!(screen.pixel(0, 0));
        assert!(!screen.pixel(1, 0));
        assert!(screen.pixel(7, 0));
    }

    #[test]
    fn drawing_twice_restores_and_reports_collision() {
        let mut screen = Screen::new();
        screen.draw_sprite(10, 5, &[0xFF]);
        let before = screen.clone();

        assert!(!screen.draw_sprite(30, 12, &GLYPH_ZERO));
        assert!(screen.draw_sprite(30, 12, &GLYPH_ZERO));
        assert!(screen == before);
    }

    #[test]
    fn sprites_wrap_per_pixel() {
        let mut screen = Screen::new();
        screen.draw_sprite(62, 31, &[0xC0 | 0x30, 0x80]);

        // Row 0 lands on y=31, row 1 wraps to y=0.
        assert!(screen.pixel(62, 31));
        assert!(screen.pixel(63, 31));
        assert!(screen.pixel(0, 31));
        assert!(screen.pixel(1, 31));
        assert!(screen.pixel(62, 0));
    }

    #[test]
    fn empty_sprite_changes_nothing() {
        let mut screen = Screen::new();
        assert!(!screen.draw_sprite(3, 3, &[]));
        assert!(screen.is_blank());
    }

    #[test]
    fn clear_blanks_everything() {
        let mut screen = Screen::new();
        screen.draw_sprite(0, 0, &GLYPH_ZERO);
        assert!(!screen.is_blank());
        screen.clear();
        assert!(screen.is_blank());
    }

    #[test]
    fn handle_only_sees_published_frames() {
        let handle = ScreenHandle::new();
        let mut screen = Screen::new();
        screen.draw_sprite(0, 0, &[0x80]);
        assert!(!handle.pixel(0, 0));

        handle.publish(&screen);
        assert!(handle.pixel(0, 0));
        assert!(handle.snapshot()[0][0]);
    }
}
