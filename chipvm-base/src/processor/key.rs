use num_enum::{IntoPrimitive, TryFromPrimitive};
use static_assertions::const_assert;

use crate::nibble_ints::U4;

/// A key of the hexadecimal keypad as recognized by the CHIP-8 processor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum Key {
    K0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF,
}

impl Key {
    pub const COUNT: usize = 16;

    pub const ALL: [Key; Self::COUNT] = [
        Self::K0,
        Self::K1,
        Self::K2,
        Self::K3,
        Self::K4,
        Self::K5,
        Self::K6,
        Self::K7,
        Self::K8,
        Self::K9,
        Self::KA,
        Self::KB,
        Self::KC,
        Self::KD,
        Self::KE,
        Self::KF,
    ];

    pub const fn index(self) -> usize {
        self as u8 as usize
    }
}

const_assert!(Key::COUNT == U4::MAX.into_usize() + 1);

impl From<U4> for Key {
    fn from(val: U4) -> Self {
        Self::ALL[val.into_usize()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    NotPressed,
}

impl KeyState {
    pub const fn is_pressed(self) -> bool {
        matches!(self, Self::Pressed)
    }
}

impl Default for KeyState {
    fn default() -> Self {
        Self::NotPressed
    }
}

impl From<bool> for KeyState {
    fn from(pressed: bool) -> Self {
        if pressed {
            Self::Pressed
        } else {
            Self::NotPressed
        }
    }
}
