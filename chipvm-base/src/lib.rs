//! The CHIP-8 interpreter engine behind chipvm.
//!
//! A [`Processor`] owns memory, registers, timers, the keypad and the screen
//! of one virtual machine and advances it an instruction at a time with
//! [`Processor::step`]. Pacing the steps, presenting the screen, playing
//! sound and feeding in key presses is left to the embedding driver.

pub mod font;
pub mod instruction;
mod nibble_ints;
pub mod processor;
pub mod quirks;
pub mod screen;

pub use nibble_ints::{UpperBoundExceededError, U12, U4};
pub use processor::{
    LoadError, Processor, ProcessorBuilder, ProcessorError, StepOutcome, TimerMode,
};
