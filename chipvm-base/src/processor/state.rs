use crate::{font::Font, screen::Screen};

use super::{CallStack, DataRegister, Key, KeyState};

/// Whether the processor is blocked on `Fx0A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    NotWaiting,
    /// The program counter points at the waiting instruction
    /// until a key press is stored in `target_register`.
    Waiting { target_register: DataRegister },
}

impl Default for KeyWait {
    fn default() -> Self {
        Self::NotWaiting
    }
}

/// Everything a CHIP-8 program can observe or change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub(crate) data_registers: [u8; DataRegister::COUNT],
    pub(crate) address_register: u16,
    pub(crate) memory: [u8; MachineState::MEMORY_LEN],
    pub(crate) program_counter: u16,
    pub(crate) call_stack: CallStack,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) screen: Screen,
    pub(crate) key_states: [KeyState; Key::COUNT],
    pub(crate) key_wait: KeyWait,
}

impl MachineState {
    /// Size of the addressable memory.
    pub const MEMORY_LEN: usize = 0x1000;
    /// Address programs are loaded to and executed from.
    pub const PROGRAM_START: u16 = 0x200;
    /// The longest program that fits in memory.
    pub const MAX_PROGRAM_LEN: usize = Self::MEMORY_LEN - Self::PROGRAM_START as usize;

    /// Power-on state: font in memory, program counter at [`Self::PROGRAM_START`],
    /// everything else zeroed.
    pub fn new(font: &Font, call_stack_depth: usize) -> Self {
        let mut memory = [0; Self::MEMORY_LEN];
        let font_start = Font::BASE_ADDRESS as usize;
        memory[font_start..font_start + Font::LEN].copy_from_slice(font.bytes());

        Self {
            data_registers: [0; DataRegister::COUNT],
            address_register: 0,
            memory,
            program_counter: Self::PROGRAM_START,
            call_stack: CallStack::new_with_max_len(call_stack_depth),
            delay_timer: 0,
            sound_timer: 0,
            screen: Screen::default(),
            key_states: [KeyState::default(); Key::COUNT],
            key_wait: KeyWait::default(),
        }
    }

    pub const fn register(&self, register: DataRegister) -> u8 {
        self.data_registers[register.index()]
    }

    pub(crate) fn set_register(&mut self, register: DataRegister, val: u8) {
        self.data_registers[register.index()] = val;
    }

    pub fn registers(&self) -> &[u8; DataRegister::COUNT] {
        &self.data_registers
    }

    pub fn address_register(&self) -> u16 {
        self.address_register
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn memory(&self) -> &[u8; Self::MEMORY_LEN] {
        &self.memory
    }

    pub const fn key_state(&self, key: Key) -> KeyState {
        self.key_states[key.index()]
    }

    pub fn key_wait(&self) -> KeyWait {
        self.key_wait
    }

    /// The pressed key with the lowest index, if any.
    pub(crate) fn first_pressed_key(&self) -> Option<Key> {
        Key::ALL
            .iter()
            .copied()
            .find(|&key| self.key_state(key).is_pressed())
    }

    /// Count both timers down by one, stopping at zero.
    pub(crate) fn decrement_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Read the big-endian instruction at `address`,
    /// `None` if it doesn't lie completely in memory.
    pub(crate) fn fetch(&self, address: u16) -> Option<u16> {
        let address = address as usize;
        match self.memory.get(address..address + 2) {
            Some(&[hi, lo]) => Some(u16::from_be_bytes([hi, lo])),
            _ => None,
        }
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new(&Font::default(), CallStack::DEFAULT_MAX_LEN)
    }
}
