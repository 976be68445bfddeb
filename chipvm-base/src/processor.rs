use std::{convert::TryFrom, ops::Range};

use rand::{rngs::StdRng, Rng, RngCore};
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::{
    font::Font,
    instruction::Instruction,
    quirks::{Quirks, ShiftSource},
    screen::Screen,
};

mod builder;
mod call_stack;
mod data_register;
mod key;
mod state;

pub use builder::ProcessorBuilder;
pub use call_stack::{CallStack, CallStackCapacityExceededError};
pub use data_register::DataRegister;
pub use key::{Key, KeyState};
pub use state::{KeyWait, MachineState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    #[error("an out of bounds memory access of address {address:X} was requested at {program_counter:X}")]
    OutOfBoundsMemoryAccess { program_counter: u16, address: usize },
    #[error("the call request at {program_counter:X} exceeds the maximum call stack size of {max_len}")]
    MaxCallStackSizeExceeded { program_counter: u16, max_len: usize },
    #[error("return was requested at {program_counter:X} with an empty call stack")]
    ReturnWithEmptyCallStack { program_counter: u16 },
    #[error("a key with an invalid (greater than 0xF) key id {requested_key_id:X} was referenced at {program_counter:X}")]
    NotAValidKey {
        program_counter: u16,
        requested_key_id: u8,
    },
    #[error("call to machine subroutine {target_address:X} requested at {program_counter:X}, this is unsupported")]
    CallMachineSubroutineUnsupported {
        program_counter: u16,
        target_address: u16,
    },
    #[error("unknown instruction {opcode:04X} at {program_counter:X}")]
    UnknownInstruction { program_counter: u16, opcode: u16 },
    #[error("the processor halted after a fatal error at {program_counter:X}, it needs a reset")]
    Halted { program_counter: u16 },
}

impl ProcessorError {
    /// Whether the processor can't continue after this error.
    ///
    /// Only unknown instructions are skipped over,
    /// every other error halts the processor until it is reset.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnknownInstruction { .. })
    }

    /// Address of the instruction the error occurred at.
    pub fn program_counter(&self) -> u16 {
        match *self {
            Self::OutOfBoundsMemoryAccess {
                program_counter, ..
            }
            | Self::MaxCallStackSizeExceeded {
                program_counter, ..
            }
            | Self::ReturnWithEmptyCallStack { program_counter }
            | Self::NotAValidKey {
                program_counter, ..
            }
            | Self::CallMachineSubroutineUnsupported {
                program_counter, ..
            }
            | Self::UnknownInstruction {
                program_counter, ..
            }
            | Self::Halted { program_counter } => program_counter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(
        "a program with a length ({program_len:X}) greater than the usable length of memory ({max_len:X}) was supplied"
    )]
    ProgramTooLarge { program_len: usize, max_len: usize },
}

/// When the delay and sound timers count down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Once at the start of every [`Processor::step`].
    /// Steps then have to be paced at 60Hz for the timers to run at the intended speed.
    PerStep,
    /// Only on [`Processor::tick_timers`].
    Manual,
}

impl Default for TimerMode {
    fn default() -> Self {
        Self::PerStep
    }
}

/// What a call to [`Processor::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed {
        instruction: Instruction,
        /// The screen contents may have changed and should be presented again.
        screen_updated: bool,
    },
    /// No key is pressed yet, see [`Instruction::WaitForKeyPress`].
    WaitingForKeyPress,
}

/// A CHIP-8 processor with its memory, screen and keypad.
///
/// `R` is the source for [`Instruction::AssignRandomMasked`].
#[derive(Debug)]
pub struct Processor<R = StdRng> {
    state: MachineState,
    font: Font,
    rng: R,
    quirks: Quirks,
    timer_mode: TimerMode,
    /// Address of the instruction that caused a fatal error.
    halted_at: Option<u16>,
}

impl Default for Processor {
    fn default() -> Self {
        ProcessorBuilder::new().build()
    }
}

impl Processor {
    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::new()
    }
}

impl<R: RngCore> Processor<R> {
    /// Width of an instruction in bytes.
    pub const INSTRUCTION_LEN: u16 = std::mem::size_of::<u16>() as u16;

    /// Screen width in pixels.
    pub const SCREEN_WIDTH: u8 = Screen::WIDTH;
    /// Screen height in pixels.
    pub const SCREEN_HEIGHT: u8 = Screen::HEIGHT;

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn screen(&self) -> &Screen {
        &self.state.screen
    }

    /// Get the value of a data register.
    pub fn register(&self, register: DataRegister) -> u8 {
        self.state.register(register)
    }

    pub fn registers(&self) -> &[u8; DataRegister::COUNT] {
        &self.state.data_registers
    }

    pub fn address_register(&self) -> u16 {
        self.state.address_register
    }

    pub fn program_counter(&self) -> u16 {
        self.state.program_counter
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// Whether a tone should currently be playing.
    pub fn is_sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    pub fn is_waiting_for_key_press(&self) -> bool {
        self.state.key_wait != KeyWait::NotWaiting
    }

    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    pub fn quirks(&self) -> &Quirks {
        &self.quirks
    }

    pub fn timer_mode(&self) -> TimerMode {
        self.timer_mode
    }

    /// Get the state of a key.
    pub fn key_state(&self, key: Key) -> KeyState {
        self.state.key_state(key)
    }

    /// Set the state of a key.
    ///
    /// A processor waiting for a key press picks the press up on its next step.
    pub fn set_key_state(&mut self, key: Key, state: KeyState) {
        self.state.key_states[key.index()] = state;
    }

    /// Set the state of all keys at once, indexed by key value.
    pub fn set_keypad(&mut self, pressed: &[bool; Key::COUNT]) {
        for (key_state, &pressed) in self.state.key_states.iter_mut().zip(pressed.iter()) {
            *key_state = KeyState::from(pressed);
        }
    }

    /// Put the processor back into its power-on state.
    ///
    /// Memory is cleared apart from the font, so the program has to be loaded again.
    /// Configuration and the random source are kept.
    pub fn reset(&mut self) {
        debug!("resetting processor");
        self.state = MachineState::new(&self.font, self.state.call_stack.max_len());
        self.halted_at = None;
    }

    /// Copy `program` into memory starting at [`MachineState::PROGRAM_START`].
    ///
    /// Nothing is written if the program doesn't fit.
    /// Registers, timers and the program counter are left alone.
    #[instrument(level = "debug", skip(self, program), fields(program_len = program.len()))]
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.state.memory[program_range(program)?].copy_from_slice(program);
        debug!("program loaded");
        Ok(())
    }

    /// Count the delay and sound timers down by one.
    ///
    /// Meant to be called at 60Hz with [`TimerMode::Manual`].
    pub fn tick_timers(&mut self) {
        self.state.decrement_timers();
    }

    /// Run a single instruction cycle.
    ///
    /// Unknown instructions are reported as a non-fatal error and skipped.
    /// After any other error the processor is halted,
    /// all following steps fail with [`ProcessorError::Halted`] until [`Self::reset`].
    pub fn step(&mut self) -> Result<StepOutcome, ProcessorError> {
        if let Some(program_counter) = self.halted_at {
            return Err(ProcessorError::Halted { program_counter });
        }

        let result = self.cycle();

        if let Err(error) = &result {
            if error.is_fatal() {
                warn!(%error, "halting processor");
                self.halted_at = Some(error.program_counter());
            } else {
                warn!(%error, "skipping instruction");
            }
        }

        result
    }

    fn cycle(&mut self) -> Result<StepOutcome, ProcessorError> {
        if let KeyWait::Waiting { target_register } = self.state.key_wait {
            self.count_down_timers_for_step();
            return Ok(self.poll_key_press(target_register));
        }

        let program_counter = self.state.program_counter;
        let opcode =
            self.state
                .fetch(program_counter)
                .ok_or(ProcessorError::OutOfBoundsMemoryAccess {
                    program_counter,
                    address: program_counter as usize + 1,
                })?;

        self.state.program_counter = program_counter.wrapping_add(Self::INSTRUCTION_LEN);
        self.count_down_timers_for_step();

        let instruction =
            Instruction::try_from(opcode).map_err(|error| ProcessorError::UnknownInstruction {
                program_counter,
                opcode: error.opcode(),
            })?;

        trace!("{:#05X}: {:04X} {}", program_counter, opcode, instruction);

        self.execute(program_counter, instruction)
    }

    fn count_down_timers_for_step(&mut self) {
        if self.timer_mode == TimerMode::PerStep {
            self.state.decrement_timers();
        }
    }

    fn poll_key_press(&mut self, target_register: DataRegister) -> StepOutcome {
        match self.state.first_pressed_key() {
            Some(key) => {
                debug!(?key, ?target_register, "key press ended wait");
                self.state.set_register(target_register, key as u8);
                self.state.key_wait = KeyWait::NotWaiting;
                self.skip_instruction();
                StepOutcome::Executed {
                    instruction: Instruction::WaitForKeyPress { target_register },
                    screen_updated: false,
                }
            }
            None => StepOutcome::WaitingForKeyPress,
        }
    }

    fn skip_instruction(&mut self) {
        self.state.program_counter = self
            .state
            .program_counter
            .wrapping_add(Self::INSTRUCTION_LEN);
    }

    /// The range of `len` bytes of memory starting at the special address register `I`.
    fn address_register_range(
        &self,
        program_counter: u16,
        len: usize,
    ) -> Result<Range<usize>, ProcessorError> {
        let start = self.state.address_register as usize;
        if start + len > MachineState::MEMORY_LEN {
            return Err(ProcessorError::OutOfBoundsMemoryAccess {
                program_counter,
                address: start.max(MachineState::MEMORY_LEN),
            });
        }
        Ok(start..start + len)
    }

    /// Return decimal digits of a u8 value.
    /// The hundreds digit is the first element in the array,
    /// followed by the tens and single digits.
    ///
    /// 3 digits are always enough, since the maximum value of a u8 is 255.
    fn decimal_digits_of_u8(num: u8) -> [u8; 3] {
        [num / 100, num / 10 % 10, num % 10]
    }

    fn key_from_register(
        &self,
        program_counter: u16,
        key_register: DataRegister,
    ) -> Result<Key, ProcessorError> {
        let key_id = self.state.register(key_register);
        Key::try_from(key_id).map_err(|_| ProcessorError::NotAValidKey {
            program_counter,
            requested_key_id: key_id,
        })
    }

    /// Store an arithmetic result and its flag, the flag last so it wins if `target_register` is VF.
    fn set_register_with_flag(&mut self, target_register: DataRegister, val: u8, flag: bool) {
        self.state.set_register(target_register, val);
        self.state.set_register(DataRegister::VF, flag as u8);
    }

    /// The value a shift instruction operates on.
    fn shift_operand(&self, target_register: DataRegister, source_register: DataRegister) -> u8 {
        match self.quirks.shift_source {
            ShiftSource::Vx => self.state.register(target_register),
            ShiftSource::Vy => self.state.register(source_register),
        }
    }

    /// Apply the effect of `instruction`, fetched from `program_counter`.
    /// The program counter has already been advanced past it.
    fn execute(
        &mut self,
        program_counter: u16,
        instruction: Instruction,
    ) -> Result<StepOutcome, ProcessorError> {
        let mut screen_updated = false;

        match instruction {
            Instruction::ClearDisplay => {
                self.state.screen.clear();
                screen_updated = true;
            }
            Instruction::Return => {
                self.state.program_counter = self
                    .state
                    .call_stack
                    .pop()
                    .ok_or(ProcessorError::ReturnWithEmptyCallStack { program_counter })?;
            }
            Instruction::CallMachineSubroutine { target_address } => {
                if !self.quirks.skip_machine_subroutine {
                    return Err(ProcessorError::CallMachineSubroutineUnsupported {
                        program_counter,
                        target_address: target_address.into(),
                    });
                }
                debug!(%target_address, "skipping machine subroutine call");
            }
            Instruction::Jump { target_address } => {
                self.state.program_counter = target_address.into();
            }
            Instruction::CallSubroutine { target_address } => {
                self.state
                    .call_stack
                    .push(self.state.program_counter)
                    .map_err(|error| ProcessorError::MaxCallStackSizeExceeded {
                        program_counter,
                        max_len: error.max_len,
                    })?;
                self.state.program_counter = target_address.into();
            }
            Instruction::SkipIfEqConst { register, constant } => {
                if self.state.register(register) == constant {
                    self.skip_instruction();
                }
            }
            Instruction::SkipIfNeqConst { register, constant } => {
                if self.state.register(register) != constant {
                    self.skip_instruction();
                }
            }
            Instruction::SkipIfEq {
                register1,
                register2,
            } => {
                if self.state.register(register1) == self.state.register(register2) {
                    self.skip_instruction();
                }
            }
            Instruction::AssignConst {
                target_register,
                constant,
            } => self.state.set_register(target_register, constant),
            Instruction::AddAssignConst {
                target_register,
                constant,
            } => self.state.set_register(
                target_register,
                self.state.register(target_register).wrapping_add(constant),
            ),
            Instruction::Assign {
                target_register,
                source_register,
            } => self
                .state
                .set_register(target_register, self.state.register(source_register)),
            Instruction::OrAssign {
                target_register,
                source_register,
            } => self.state.set_register(
                target_register,
                self.state.register(target_register) | self.state.register(source_register),
            ),
            Instruction::AndAssign {
                target_register,
                source_register,
            } => self.state.set_register(
                target_register,
                self.state.register(target_register) & self.state.register(source_register),
            ),
            Instruction::XorAssign {
                target_register,
                source_register,
            } => self.state.set_register(
                target_register,
                self.state.register(target_register) ^ self.state.register(source_register),
            ),
            Instruction::AddAssign {
                target_register,
                source_register,
            } => {
                let (res, carry) = self
                    .state
                    .register(target_register)
                    .overflowing_add(self.state.register(source_register));
                self.set_register_with_flag(target_register, res, carry);
            }
            Instruction::SubAssign {
                target_register,
                source_register,
            } => {
                let (res, borrow) = self
                    .state
                    .register(target_register)
                    .overflowing_sub(self.state.register(source_register));
                self.set_register_with_flag(target_register, res, !borrow);
            }
            Instruction::ShrAssign {
                target_register,
                source_register,
            } => {
                let val = self.shift_operand(target_register, source_register);
                self.set_register_with_flag(target_register, val >> 1, val & 0b1 > 0);
            }
            Instruction::RevSubAssign {
                target_register,
                source_register,
            } => {
                let (res, borrow) = self
                    .state
                    .register(source_register)
                    .overflowing_sub(self.state.register(target_register));
                self.set_register_with_flag(target_register, res, !borrow);
            }
            Instruction::ShlAssign {
                target_register,
                source_register,
            } => {
                let val = self.shift_operand(target_register, source_register);
                self.set_register_with_flag(target_register, val << 1, val >> 7 > 0);
            }
            Instruction::SkipIfNeq {
                register1,
                register2,
            } => {
                if self.state.register(register1) != self.state.register(register2) {
                    self.skip_instruction();
                }
            }
            Instruction::AssignAddrToI { address } => self.state.address_register = address.into(),
            Instruction::JumpOffset { address } => {
                self.state.program_counter =
                    u16::from(address) + self.state.register(DataRegister::V0) as u16;
            }
            Instruction::AssignRandomMasked {
                target_register,
                mask,
            } => {
                let random = self.rng.gen::<u8>();
                self.state.set_register(target_register, random & mask);
            }
            Instruction::DrawSprite {
                position_x_register,
                position_y_register,
                height,
            } => {
                let sprite_range = self.address_register_range(program_counter, height.into_usize())?;
                let x = self.state.register(position_x_register);
                let y = self.state.register(position_y_register);
                let partial_offscreen_drawing = self.quirks.partial_offscreen_drawing;

                let set_pixel_unset = self.state.screen.draw_sprite(
                    x,
                    y,
                    &self.state.memory[sprite_range],
                    partial_offscreen_drawing,
                );

                self.state
                    .set_register(DataRegister::VF, set_pixel_unset as u8);
                screen_updated = true;
            }
            Instruction::SkipIfKeyPressed { key_register } => {
                let key = self.key_from_register(program_counter, key_register)?;
                if self.state.key_state(key).is_pressed() {
                    self.skip_instruction();
                }
            }
            Instruction::SkipIfKeyNotPressed { key_register } => {
                let key = self.key_from_register(program_counter, key_register)?;
                if !self.state.key_state(key).is_pressed() {
                    self.skip_instruction();
                }
            }
            Instruction::AssignDelayTimerVal { target_register } => self
                .state
                .set_register(target_register, self.state.delay_timer),
            Instruction::WaitForKeyPress { target_register } => {
                if let Some(key) = self.state.first_pressed_key() {
                    self.state.set_register(target_register, key as u8);
                } else {
                    debug!(?target_register, "waiting for key press");
                    self.state.key_wait = KeyWait::Waiting { target_register };
                    // Stay on this instruction until the wait ends.
                    self.state.program_counter = program_counter;
                    return Ok(StepOutcome::WaitingForKeyPress);
                }
            }
            Instruction::SetDelayTimer { source_register } => {
                self.state.delay_timer = self.state.register(source_register)
            }
            Instruction::SetSoundTimer { source_register } => {
                self.state.sound_timer = self.state.register(source_register)
            }
            Instruction::AddAssignI { source_register } => {
                self.state.address_register = self
                    .state
                    .address_register
                    .wrapping_add(self.state.register(source_register) as u16)
            }
            Instruction::AssignHexCharSpriteAddrToI { hex_char_register } => {
                self.state.address_register = Font::BASE_ADDRESS
                    + self.state.register(hex_char_register) as u16 * Font::GLYPH_LEN as u16;
            }
            Instruction::StoreBCD { source_register } => {
                let range = self.address_register_range(program_counter, 3)?;
                let val = self.state.register(source_register);

                self.state.memory[range].copy_from_slice(&Self::decimal_digits_of_u8(val));
            }
            Instruction::StoreRegisterValues { last_register } => {
                let range = self.address_register_range(program_counter, last_register.index() + 1)?;
                let len = range.len();

                self.state.memory[range].copy_from_slice(&self.state.data_registers[..len]);
                self.advance_address_register_after_load_store(len);
            }
            Instruction::LoadRegisterValues { last_register } => {
                let range = self.address_register_range(program_counter, last_register.index() + 1)?;
                let len = range.len();

                self.state.data_registers[..len].copy_from_slice(&self.state.memory[range]);
                self.advance_address_register_after_load_store(len);
            }
        }

        Ok(StepOutcome::Executed {
            instruction,
            screen_updated,
        })
    }

    fn advance_address_register_after_load_store(&mut self, len: usize) {
        if self.quirks.load_store_increments_i {
            self.state.address_register = self.state.address_register.wrapping_add(len as u16);
        }
    }
}

/// Where `program` goes in memory, if it fits.
fn program_range(program: &[u8]) -> Result<Range<usize>, LoadError> {
    if program.len() > MachineState::MAX_PROGRAM_LEN {
        return Err(LoadError::ProgramTooLarge {
            program_len: program.len(),
            max_len: MachineState::MAX_PROGRAM_LEN,
        });
    }
    let start = MachineState::PROGRAM_START as usize;
    Ok(start..start + program.len())
}
