use std::{convert::TryFrom, fmt};

use static_assertions::const_assert;
use thiserror::Error;

use crate::{
    nibble_ints::{U8Nibble, U12, U4},
    processor::DataRegister,
};

/// Extract the correct nibble(s) from the instruction bytes
/// and assign them to the variable with the given identifier.
/// If given a constant instead of an identifier, do nothing.
macro_rules! maybe_extract_instruction_nibbles_into_var {
    ($instruction:ident, $target:ident, byte: $byte:literal, $nibble:expr) => {
        let $target: U4 = U4::from_u8($instruction[$byte], $nibble);
    };
    ($instruction:ident, $constant:literal, byte: $_byte:literal, $_nibble:expr) => {};
    ($instruction:ident, byte_constant: $target:ident) => {
        let $target: u8 = $instruction[1];
    };
    ($instruction:ident, address: $target:ident) => {
        let $target: U12 = U12::from_u16_masked(u16::from_be_bytes($instruction));
    };
}

/// Expands to a pattern that matches a nibble constant in a match expression.
macro_rules! nibble_pattern_part_match_pattern {
    ($var:ident) => {
        _
    };
    ($constant:literal) => {
        $constant
    };
}

/// Expands to a pattern that matches all nibble constants in a given nibble pattern.
macro_rules! instruction_from_u8x2_match_arm_pattern {
    (($n0:literal, $n1:tt, $n2:tt, $n3:tt)) => {
        (
            $n0,
            nibble_pattern_part_match_pattern!($n1),
            nibble_pattern_part_match_pattern!($n2),
            nibble_pattern_part_match_pattern!($n3),
        )
    };
    (($n0:literal, $n1:tt, $byte_constant:ident)) => {
        ($n0, nibble_pattern_part_match_pattern!($n1), _, _)
    };
    (($n0:literal, $address:ident)) => {
        ($n0, _, _, _)
    };
}

/// If given a literal, `const_assert!`s that the literal is smaller than `0b1111`.
/// Does nothing if given an identifier.
macro_rules! nibble_literal_assertion {
    ($var:ident) => {};
    ($constant:literal) => {
        const_assert!($constant <= 0b1111);
    };
}

/// For all given literals, `const_assert!`s that the literals are smaller than `0b1111`.
/// Identifiers are ignored.
macro_rules! nibble_literals_assertions {
    (($n0:literal, $n1:tt, $n2:tt, $n3:tt)) => {
        nibble_literal_assertion!($n0);
        nibble_literal_assertion!($n1);
        nibble_literal_assertion!($n2);
        nibble_literal_assertion!($n3);
    };
    (($n0:literal, $n1:tt, $_byte_constant:ident)) => {
        nibble_literal_assertion!($n0);
        nibble_literal_assertion!($n1);
    };
    (($n0:literal, $_address:ident)) => {
        nibble_literal_assertion!($n0);
    };
}

macro_rules! instruction_from_u8x2_match_arm_code {
    ($instruction:ident, ($n0:literal, $n1:tt, $n2:tt, $n3:tt), $code:expr) => {{
        maybe_extract_instruction_nibbles_into_var!($instruction, $n1, byte: 0, U8Nibble::Lo);
        maybe_extract_instruction_nibbles_into_var!($instruction, $n2, byte: 1, U8Nibble::Hi);
        maybe_extract_instruction_nibbles_into_var!($instruction, $n3, byte: 1, U8Nibble::Lo);
        $code
    }};
    ($instruction:ident, ($n0:literal, $n1:tt, $byte_constant:ident), $code:expr) => {{
        maybe_extract_instruction_nibbles_into_var!($instruction, $n1, byte: 0, U8Nibble::Lo);
        maybe_extract_instruction_nibbles_into_var!($instruction, byte_constant: $byte_constant);
        $code
    }};
    ($instruction:ident, ($n0:literal, $address:ident), $code:expr) => {{
        maybe_extract_instruction_nibbles_into_var!($instruction, address: $address);
        $code
    }};
}

/// Turn a nibble literal or a nibble sized field into a `u8`.
macro_rules! u4_var_or_literal_to_u8 {
    ($nibble:literal) => {
        $nibble as u8
    };
    ($nibble:ident) => {
        u8::from(U4::from($nibble))
    };
}

macro_rules! instruction_to_u8x2_match_arm_code {
    (($n0:literal, $n1:tt, $n2:tt, $n3:tt)) => {{
        [
            (u4_var_or_literal_to_u8!($n0) << 4) | u4_var_or_literal_to_u8!($n1),
            (u4_var_or_literal_to_u8!($n2) << 4) | u4_var_or_literal_to_u8!($n3),
        ]
    }};
    (($n0:literal, $n1:tt, $byte_constant:ident)) => {{
        [
            (u4_var_or_literal_to_u8!($n0) << 4) | u4_var_or_literal_to_u8!($n1),
            $byte_constant,
        ]
    }};
    (($n0:literal, $address:ident)) => {{
        [
            (u4_var_or_literal_to_u8!($n0) << 4) | ((u16::from($address) >> (2 * 4)) as u8),
            u16::from($address) as u8,
        ]
    }};
}

/// The two instruction bytes didn't match any instruction pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid instruction nibbles `{0:X?}`")]
pub struct InvalidInstructionNibblesError([u8; 2]);

impl InvalidInstructionNibblesError {
    /// The rejected instruction as a big-endian opcode.
    pub const fn opcode(&self) -> u16 {
        u16::from_be_bytes(self.0)
    }
}

macro_rules! define_instruction {
    (
        $(#[$enum_attribute:meta])*
        pub enum $enum_name:ident {
            $(
                $(#[$field_attribute:meta])*
                $instruction_name:ident $( {
                    $(
                        $(#[$param_attribute:meta])*
                        $param:ident : $param_type:ty
                    ),*
                    $(,)?
                } )?
                =
                $nibble_pattern:tt
            ),*
            $(,)?
        }
    ) => {
        $(#[$enum_attribute])*
        pub enum $enum_name {
            $(
                $(#[$field_attribute])*
                $instruction_name $({
                    $($param: $param_type),*
                })?
            ),*
        }

        $(
            nibble_literals_assertions!($nibble_pattern);
        )*

        impl TryFrom<[u8; 2]> for Instruction {
            type Error = InvalidInstructionNibblesError;

            fn try_from(instruction: [u8; 2]) -> Result<Self, Self::Error> {
                let n0 = instruction[0] >> 4 & 0b1111;
                let n1 = instruction[0] & 0b1111;
                let n2 = instruction[1] >> 4 & 0b1111;
                let n3 = instruction[1] & 0b1111;

                // Arms are tried in declaration order, more specific patterns come first.
                match (n0, n1, n2, n3) {
                    $(
                        instruction_from_u8x2_match_arm_pattern!($nibble_pattern) => {
                            Ok(instruction_from_u8x2_match_arm_code!(instruction, $nibble_pattern, {
                                Self::$instruction_name $({ $($param: <$param_type>::from($param) ),* })?
                            }))
                        },
                    )*
                    (_, _, _, _) => Err(InvalidInstructionNibblesError(instruction))
                }
            }
        }

        impl From<Instruction> for [u8; 2] {
            fn from(instruction: Instruction) -> Self {
                match instruction {
                    $(
                        Instruction::$instruction_name $({ $($param),* })? => {
                            instruction_to_u8x2_match_arm_code!($nibble_pattern)
                        },
                    )*
                }
            }
        }
    };
}

define_instruction! {
    /// A CHIP-8 instruction
    ///
    /// References used are
    /// <https://github.com/mattmikolay/chip-8/wiki/CHIP%E2%80%908-Instruction-Set> (CC-BY-SA 4.0, Matthew Mikolay)
    /// and <http://devernay.free.fr/hacks/chip8/C8TECH10.HTM> (Thomas P. Greene).
    #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
    pub enum Instruction {
        /// `00E0`
        ClearDisplay = (0x0, 0x0, 0xE, 0x0),
        /// `00EE`, pop the return address off the call stack.
        Return = (0x0, 0x0, 0xE, 0xE),
        /// `0nnn`, a native COSMAC VIP routine. See [`Quirks::skip_machine_subroutine`].
        ///
        /// [`Quirks::skip_machine_subroutine`]: crate::quirks::Quirks::skip_machine_subroutine
        CallMachineSubroutine { target_address: U12 } = (0x0, target_address),
        /// `1nnn`
        Jump { target_address: U12 } = (0x1, target_address),
        /// `2nnn`, push the address of the following instruction and jump.
        CallSubroutine { target_address: U12 } = (0x2, target_address),
        /// `3xkk`, skip the following instruction when `register == constant`.
        SkipIfEqConst { register: DataRegister, constant: u8 } = (0x3, register, constant),
        /// `4xkk`, skip the following instruction when `register != constant`.
        SkipIfNeqConst { register: DataRegister, constant: u8 } = (0x4, register, constant),
        /// `5xy0`, skip the following instruction when both registers hold the same value.
        SkipIfEq {
            register1: DataRegister,
            register2: DataRegister,
        } = (0x5, register1, register2, 0x0),
        /// `6xkk`
        AssignConst {
            target_register: DataRegister,
            constant: u8,
        } = (0x6, target_register, constant),
        /// `7xkk`, wrapping add. Unlike the register to register arithmetic
        /// this leaves [`DataRegister::VF`] alone.
        AddAssignConst {
            target_register: DataRegister,
            constant: u8,
        } = (0x7, target_register, constant),
        /// `8xy0`
        Assign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x0),
        /// `8xy1`
        OrAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x1),
        /// `8xy2`
        AndAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x2),
        /// `8xy3`
        XorAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x3),
        /// `8xy4`, wrapping add with the carry in [`DataRegister::VF`].
        AddAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x4),
        /// `8xy5`, `Vx - Vy` wrapping. [`DataRegister::VF`] ends up `1` unless the subtraction borrowed.
        SubAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x5),
        /// `8xy6`, shift right by one. The bit shifted out goes to [`DataRegister::VF`].
        ///
        /// Which register is shifted depends on [`ShiftSource`][crate::quirks::ShiftSource].
        ShrAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x6),
        /// `8xy7`, `Vy - Vx` wrapping, stored in `Vx`. Flag as for [`Instruction::SubAssign`].
        RevSubAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0x7),
        /// `8xyE`, shift left by one. The bit shifted out goes to [`DataRegister::VF`].
        ///
        /// Which register is shifted depends on [`ShiftSource`][crate::quirks::ShiftSource].
        ShlAssign {
            target_register: DataRegister,
            source_register: DataRegister,
        } = (0x8, target_register, source_register, 0xE),
        /// `9xy0`, skip the following instruction when the registers differ.
        SkipIfNeq {
            register1: DataRegister,
            register2: DataRegister,
        } = (0x9, register1, register2, 0x0),
        /// `Annn`, `I := nnn`.
        AssignAddrToI { address: U12 } = (0xA, address),
        /// `Bnnn`, jump to `nnn + V0`.
        JumpOffset { address: U12 } = (0xB, address),
        /// `Cxkk`, a random byte masked with `kk`.
        AssignRandomMasked {
            target_register: DataRegister,
            mask: u8,
        } = (0xC, target_register, mask),
        /// `Dxyn`, XOR the `height` rows of sprite data at `I` onto the screen at `(Vx, Vy)`.
        ///
        /// [`DataRegister::VF`] reports a collision, i.e. whether a lit pixel was switched off.
        DrawSprite {
            position_x_register: DataRegister,
            position_y_register: DataRegister,
            height: U4,
        } = (0xD, position_x_register, position_y_register, height),
        /// `Ex9E`
        SkipIfKeyPressed { key_register: DataRegister } = (0xE, key_register, 0x9, 0xE),
        /// `ExA1`
        SkipIfKeyNotPressed { key_register: DataRegister } = (0xE, key_register, 0xA, 0x1),
        /// `Fx07`
        AssignDelayTimerVal { target_register: DataRegister } = (0xF, target_register, 0x0, 0x7),
        /// `Fx0A`, block until a key is down and store its value.
        WaitForKeyPress { target_register: DataRegister } = (0xF, target_register, 0x0, 0xA),
        /// `Fx15`
        SetDelayTimer { source_register: DataRegister } = (0xF, source_register, 0x1, 0x5),
        /// `Fx18`
        SetSoundTimer { source_register: DataRegister } = (0xF, source_register, 0x1, 0x8),
        /// `Fx1E`, wrapping 16 bit add without touching [`DataRegister::VF`].
        AddAssignI { source_register: DataRegister } = (0xF, source_register, 0x1, 0xE),
        /// `Fx29`, point `I` at the font glyph for the low nibble value in the register.
        /// See [`Font`][crate::font::Font].
        AssignHexCharSpriteAddrToI { hex_char_register: DataRegister } = (0xF, hex_char_register, 0x2, 0x9),
        /// `Fx33`, write hundreds, tens and ones of the register value to `I`, `I + 1` and `I + 2`.
        StoreBCD { source_register: DataRegister } = (0xF, source_register, 0x3, 0x3),
        /// `Fx55`, copy `V0` through `last_register` to memory at `I`.
        StoreRegisterValues { last_register: DataRegister } = (0xF, last_register, 0x5, 0x5),
        /// `Fx65`, fill `V0` through `last_register` from memory at `I`.
        LoadRegisterValues { last_register: DataRegister } = (0xF, last_register, 0x6, 0x5),
    }
}

impl TryFrom<u16> for Instruction {
    type Error = InvalidInstructionNibblesError;

    fn try_from(opcode: u16) -> Result<Self, Self::Error> {
        Self::try_from(opcode.to_be_bytes())
    }
}

impl From<Instruction> for u16 {
    fn from(instruction: Instruction) -> Self {
        u16::from_be_bytes(<[u8; 2]>::from(instruction))
    }
}

/// Assembly mnemonics in the common `LD Vx, byte` style.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearDisplay => write!(f, "CLS"),
            Return => write!(f, "RET"),
            CallMachineSubroutine { target_address } => write!(f, "SYS {:#05X}", u16::from(target_address)),
            Jump { target_address } => write!(f, "JP {:#05X}", u16::from(target_address)),
            CallSubroutine { target_address } => write!(f, "CALL {:#05X}", u16::from(target_address)),
            SkipIfEqConst { register, constant } => write!(f, "SE {:?}, {:#04X}", register, constant),
            SkipIfNeqConst { register, constant } => write!(f, "SNE {:?}, {:#04X}", register, constant),
            SkipIfEq { register1, register2 } => write!(f, "SE {:?}, {:?}", register1, register2),
            AssignConst { target_register, constant } => write!(f, "LD {:?}, {:#04X}", target_register, constant),
            AddAssignConst { target_register, constant } => write!(f, "ADD {:?}, {:#04X}", target_register, constant),
            Assign { target_register, source_register } => write!(f, "LD {:?}, {:?}", target_register, source_register),
            OrAssign { target_register, source_register } => write!(f, "OR {:?}, {:?}", target_register, source_register),
            AndAssign { target_register, source_register } => write!(f, "AND {:?}, {:?}", target_register, source_register),
            XorAssign { target_register, source_register } => write!(f, "XOR {:?}, {:?}", target_register, source_register),
            AddAssign { target_register, source_register } => write!(f, "ADD {:?}, {:?}", target_register, source_register),
            SubAssign { target_register, source_register } => write!(f, "SUB {:?}, {:?}", target_register, source_register),
            ShrAssign { target_register, source_register } => write!(f, "SHR {:?}, {:?}", target_register, source_register),
            RevSubAssign { target_register, source_register } => write!(f, "SUBN {:?}, {:?}", target_register, source_register),
            ShlAssign { target_register, source_register } => write!(f, "SHL {:?}, {:?}", target_register, source_register),
            SkipIfNeq { register1, register2 } => write!(f, "SNE {:?}, {:?}", register1, register2),
            AssignAddrToI { address } => write!(f, "LD I, {:#05X}", u16::from(address)),
            JumpOffset { address } => write!(f, "JP V0, {:#05X}", u16::from(address)),
            AssignRandomMasked { target_register, mask } => write!(f, "RND {:?}, {:#04X}", target_register, mask),
            DrawSprite { position_x_register, position_y_register, height } => {
                write!(f, "DRW {:?}, {:?}, {}", position_x_register, position_y_register, height)
            }
            SkipIfKeyPressed { key_register } => write!(f, "SKP {:?}", key_register),
            SkipIfKeyNotPressed { key_register } => write!(f, "SKNP {:?}", key_register),
            AssignDelayTimerVal { target_register } => write!(f, "LD {:?}, DT", target_register),
            WaitForKeyPress { target_register } => write!(f, "LD {:?}, K", target_register),
            SetDelayTimer { source_register } => write!(f, "LD DT, {:?}", source_register),
            SetSoundTimer { source_register } => write!(f, "LD ST, {:?}", source_register),
            AddAssignI { source_register } => write!(f, "ADD I, {:?}", source_register),
            AssignHexCharSpriteAddrToI { hex_char_register } => write!(f, "LD F, {:?}", hex_char_register),
            StoreBCD { source_register } => write!(f, "LD B, {:?}", source_register),
            StoreRegisterValues { last_register } => write!(f, "LD [I], {:?}", last_register),
            LoadRegisterValues { last_register } => write!(f, "LD {:?}, [I]", last_register),
        }
    }
}
