use std::fmt::{Debug, Write};

/// The 64x32 monochrome framebuffer.
///
/// Pixels are packed eight to a byte, most significant bit leftmost,
/// rows stored one after another.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Screen {
    pixel_data: [u8; Self::WIDTH_BYTES * Self::HEIGHT as usize],
}

impl Screen {
    /// Screen width in bytes.
    pub const WIDTH_BYTES: usize = 8;
    /// Screen width in pixels.
    pub const WIDTH: u8 = Self::WIDTH_BYTES as u8 * u8::BITS as u8;
    /// Screen height in pixels.
    pub const HEIGHT: u8 = 32;

    /// Draw byte to the screen at position `byte_x*8` and `y`.
    ///
    /// Returns `true` if a set pixel has been unset, `false` otherwise.
    fn draw_byte(&mut self, byte_x: usize, y: usize, byte: u8) -> bool {
        let index = byte_x + y * Self::WIDTH_BYTES;
        // A one in the original byte and the shifted sprite byte's bits
        // will result in a set pixel being unset.
        let set_pixel_unset = (self.pixel_data[index] & byte) > 0;

        self.pixel_data[index] ^= byte;

        set_pixel_unset
    }

    /// XOR `sprite` onto the screen, one byte per row, with its top left corner at `x` and `y`.
    ///
    /// The start position always wraps around the screen edges,
    /// `partial_offscreen_drawing` decides what happens to the parts
    /// of the sprite that then cross an edge.
    ///
    /// Returns `true` if any set pixel has been unset.
    pub fn draw_sprite(
        &mut self,
        x: u8,
        y: u8,
        sprite: &[u8],
        partial_offscreen_drawing: PartialOffscreenDrawing,
    ) -> bool {
        let x = (x % Self::WIDTH) as usize;
        let y = (y % Self::HEIGHT) as usize;
        let mut set_pixel_unset = false;

        for (i, sprite_byte) in sprite.iter().copied().enumerate() {
            // Wrap y if we should, else we're done for the entire sprite.
            let y = if y + i < Self::HEIGHT as usize || partial_offscreen_drawing.should_wrap_y() {
                (y + i) % Self::HEIGHT as usize
            } else {
                break;
            };

            set_pixel_unset |= self.draw_byte(x / 8, y, sprite_byte >> (x % 8));

            // If x is exactly at the start of a screen byte, we're done.
            // We're also done if the next byte is offscreen and we shouldn't wrap in X.
            if x % 8 == 0
                || (x + 7 >= Self::WIDTH as usize && !partial_offscreen_drawing.should_wrap_x())
            {
                continue;
            }

            // Draw remaining bits into next byte (possibly wrapping around in X)
            let rem_sprite_byte = sprite_byte << (8 - (x % 8));
            let rem_x = (x + (8 - (x % 8))) % Self::WIDTH as usize;

            set_pixel_unset |= self.draw_byte(rem_x / 8, y, rem_sprite_byte);
        }

        set_pixel_unset
    }

    pub fn clear(&mut self) {
        self.pixel_data.fill(0);
    }

    /// Whether the pixel at `x` and `y` is on.
    ///
    /// Coordinates outside the screen wrap around, like sprite positions do.
    pub fn pixel(&self, x: u8, y: u8) -> bool {
        let x = (x % Self::WIDTH) as usize;
        let y = (y % Self::HEIGHT) as usize;
        self.pixel_data[x / 8 + y * Self::WIDTH_BYTES] >> (7 - x % 8) & 1 > 0
    }

    /// All pixels in row-major order, `true` being on.
    pub fn pixels(&self) -> impl Iterator<Item = bool> + '_ {
        self.pixel_data
            .iter()
            .copied()
            .flat_map(|byte| (0..8).rev().map(move |i| byte >> i & 1 > 0))
    }

    /// Copy the screen into a grid indexed by `[y][x]`.
    pub fn to_grid(&self) -> [[bool; Self::WIDTH as usize]; Self::HEIGHT as usize] {
        let mut grid = [[false; Self::WIDTH as usize]; Self::HEIGHT as usize];
        for (i, pixel) in self.pixels().enumerate() {
            grid[i / Self::WIDTH as usize][i % Self::WIDTH as usize] = pixel;
        }
        grid
    }

    /// The packed pixel bytes, eight pixels per byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixel_data
    }

    pub fn is_blank(&self) -> bool {
        self.pixel_data.iter().all(|&byte| byte == 0)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            pixel_data: [0; Self::WIDTH_BYTES * Self::HEIGHT as usize],
        }
    }
}

impl Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Screen(")?;
            for row in self.pixel_data.chunks_exact(Self::WIDTH_BYTES) {
                for c in row.iter().copied().flat_map(|screen_byte| {
                    (0..8)
                        .rev()
                        .map(move |i| if screen_byte >> i & 1 > 0 { '#' } else { '_' })
                }) {
                    f.write_char(c)?;
                }
                f.write_char('\n')?;
            }
            write!(f, ")")
        } else {
            f.debug_tuple("Screen").field(&&self.pixel_data[..]).finish()
        }
    }
}

/// Drawing behavior for sprites that are partially offscreen.
///
/// Sprites that are drawn at coordinates fully offscreen will *always*
/// have the modulo of the screen size applied to their coordinates.
/// The partial offscreen drawing behavior will be applied after this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialOffscreenDrawing {
    /// Clip offscreen parts of sprites in both X and Y.
    ClipXY,
    /// Clip offscreen parts of sprites in X, wrap in Y.
    ClipXWrapY,
    /// Wrap offscreen parts of sprites in X, clip in Y.
    WrapXClipY,
    /// Wrap offscreen parts of sprites in both X and Y.
    WrapXY,
}

impl Default for PartialOffscreenDrawing {
    fn default() -> Self {
        Self::WrapXY
    }
}

impl PartialOffscreenDrawing {
    pub fn should_wrap_x(self) -> bool {
        matches!(self, Self::WrapXY | Self::WrapXClipY)
    }

    pub fn should_wrap_y(self) -> bool {
        matches!(self, Self::WrapXY | Self::ClipXWrapY)
    }
}
