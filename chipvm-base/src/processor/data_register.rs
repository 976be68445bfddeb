use num_enum::{IntoPrimitive, TryFromPrimitive};
use static_assertions::const_assert;

use crate::nibble_ints::U4;

/// Data register of the CHIP-8 processor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum DataRegister {
    /// Used as the offset in [`Instruction::JumpOffset`][crate::instruction::Instruction::JumpOffset].
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    /// Used for carry/borrow flags, set to the shifted-out bit after bit shifts
    /// and to the collision flag after drawing a sprite.
    VF,
}

impl DataRegister {
    pub const COUNT: usize = 16;

    /// All registers, in order of their index.
    pub const ALL: [DataRegister; Self::COUNT] = [
        Self::V0,
        Self::V1,
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
        Self::V7,
        Self::V8,
        Self::V9,
        Self::VA,
        Self::VB,
        Self::VC,
        Self::VD,
        Self::VE,
        Self::VF,
    ];

    pub const fn index(self) -> usize {
        self as u8 as usize
    }

    /// Iterate over [`DataRegister::V0`] up to and including `last`.
    pub fn up_to(last: DataRegister) -> impl Iterator<Item = DataRegister> {
        Self::ALL[..=last.index()].iter().copied()
    }
}

const_assert!(DataRegister::COUNT == U4::MAX.into_usize() + 1);

impl From<DataRegister> for U4 {
    fn from(reg: DataRegister) -> Self {
        U4::from_u8(reg as u8, crate::nibble_ints::U8Nibble::Lo)
    }
}

impl From<U4> for DataRegister {
    fn from(val: U4) -> Self {
        // DataRegister has exactly U4::MAX + 1 variants, the index is always in bounds.
        Self::ALL[val.into_usize()]
    }
}
