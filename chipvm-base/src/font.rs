macro_rules! pixel_to_bit {
    (#) => {
        1
    };
    (,) => {
        0
    };
}

macro_rules! sprite_4x5_font {
    (
        $(
            $(
                ($pixel0:tt $pixel1:tt $pixel2:tt $pixel3:tt)
            )*
            ------
        )*
    ) => {
        [
            $(
                $(
                    // Shift pixels into high nibble / left half of the sprite.
                    (pixel_to_bit!($pixel0) << 7
                        | pixel_to_bit!($pixel1) << 6
                        | pixel_to_bit!($pixel2) << 5
                        | pixel_to_bit!($pixel3) << 4),
                )*
            )*
        ]
    };
}

/// A sprite font of all hexadecimal digits for the CHIP-8.
///
/// Stored in processor memory starting at [`Font::BASE_ADDRESS`],
/// one glyph of [`Font::GLYPH_LEN`] bytes per digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// The font shipped with the COSMAC VIP interpreter.
    Classic,
    /// Caller supplied glyphs, digit `0` first.
    Custom([u8; Font::LEN]),
}

impl Font {
    /// Number of bytes per glyph, one byte per row.
    pub const GLYPH_LEN: usize = 5;
    /// Length of the font sprite data in bytes.
    pub const LEN: usize = Self::GLYPH_LEN * (0xF + 1);
    /// Address of the glyph for `0` in processor memory.
    pub const BASE_ADDRESS: u16 = 0x050;

    /// Get a reference to the font's sprite data bytes.
    ///
    /// Since a CHIP-8 sprite is always one byte wide,
    /// the low nibble is 0 for all of the built-in character sprites.
    pub const fn bytes(&self) -> &[u8; Font::LEN] {
        match self {
            Self::Classic => &SPRITE_4X5_FONT_CLASSIC,
            Self::Custom(bytes) => bytes,
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::Classic
    }
}

const SPRITE_4X5_FONT_CLASSIC: [u8; Font::LEN] = sprite_4x5_font![
    (####)
    (#,,#)
    (#,,#)
    (#,,#)
    (####)
    ------
    (,,#,)
    (,##,)
    (,,#,)
    (,,#,)
    (,###)
    ------
    (####)
    (,,,#)
    (####)
    (#,,,)
    (####)
    ------
    (####)
    (,,,#)
    (####)
    (,,,#)
    (####)
    ------
    (#,,#)
    (#,,#)
    (####)
    (,,,#)
    (,,,#)
    ------
    (####)
    (#,,,)
    (####)
    (,,,#)
    (####)
    ------
    (####)
    (#,,,)
    (####)
    (#,,#)
    (####)
    ------
    (####)
    (,,,#)
    (,,#,)
    (,#,,)
    (,#,,)
    ------
    (####)
    (#,,#)
    (####)
    (#,,#)
    (####)
    ------
    (####)
    (#,,#)
    (####)
    (,,,#)
    (####)
    ------
    (####)
    (#,,#)
    (####)
    (#,,#)
    (#,,#)
    ------
    (###,)
    (#,,#)
    (###,)
    (#,,#)
    (###,)
    ------
    (####)
    (#,,,)
    (#,,,)
    (#,,,)
    (####)
    ------
    (###,)
    (#,,#)
    (#,,#)
    (#,,#)
    (###,)
    ------
    (####)
    (#,,,)
    (####)
    (#,,,)
    (####)
    ------
    (####)
    (#,,,)
    (####)
    (#,,,)
    (#,,,)
    ------
];
