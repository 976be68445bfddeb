//! Behavior that differs between historical CHIP-8 interpreters.
//!
//! The defaults follow the commonly documented instruction set,
//! ROMs written for other interpreters may need some of these changed.

use crate::screen::PartialOffscreenDrawing;

/// Which register the shift instructions `8xy6` and `8xyE` read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftSource {
    /// Shift `Vx` in place, `Vy` is ignored.
    Vx,
    /// Shift the value of `Vy` and store it in `Vx`, as the COSMAC VIP did.
    Vy,
}

impl Default for ShiftSource {
    fn default() -> Self {
        Self::Vx
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub shift_source: ShiftSource,
    /// Leave `I` pointing past the last register stored or loaded by `Fx55` and `Fx65`.
    pub load_store_increments_i: bool,
    pub partial_offscreen_drawing: PartialOffscreenDrawing,
    /// Treat `0nnn` as a no-op instead of failing.
    pub skip_machine_subroutine: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Self {
            shift_source: ShiftSource::default(),
            load_store_increments_i: false,
            partial_offscreen_drawing: PartialOffscreenDrawing::default(),
            skip_machine_subroutine: true,
        }
    }
}

impl Quirks {
    /// Quirks matching the original COSMAC VIP interpreter.
    pub fn cosmac_vip() -> Self {
        Self {
            shift_source: ShiftSource::Vy,
            load_store_increments_i: true,
            partial_offscreen_drawing: PartialOffscreenDrawing::ClipXY,
            skip_machine_subroutine: true,
        }
    }
}
