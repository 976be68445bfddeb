use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{font::Font, quirks::Quirks};

use super::{program_range, CallStack, LoadError, MachineState, Processor, TimerMode};

/// Configures and creates a [`Processor`].
///
/// ```
/// use chipvm_base::processor::Processor;
///
/// let processor = Processor::builder()
///     .seed(0x5EED)
///     .program(&[0x60, 0x2A])
///     .unwrap()
///     .build();
/// assert_eq!(processor.program_counter(), 0x200);
/// ```
#[derive(Debug)]
pub struct ProcessorBuilder<R = StdRng> {
    program: Vec<u8>,
    font: Font,
    rng: R,
    quirks: Quirks,
    timer_mode: TimerMode,
    call_stack_depth: usize,
}

impl ProcessorBuilder {
    /// A builder with entropy seeded randomness and the default configuration.
    pub fn new() -> Self {
        Self {
            program: Vec::new(),
            font: Font::default(),
            rng: StdRng::from_entropy(),
            quirks: Quirks::default(),
            timer_mode: TimerMode::default(),
            call_stack_depth: CallStack::DEFAULT_MAX_LEN,
        }
    }

    /// Seed the random number generator, making [`Instruction::AssignRandomMasked`] deterministic.
    ///
    /// [`Instruction::AssignRandomMasked`]: crate::instruction::Instruction::AssignRandomMasked
    pub fn seed(self, seed: u64) -> Self {
        self.rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> ProcessorBuilder<R> {
    /// Use `rng` as the source of random bytes.
    pub fn rng<T: RngCore>(self, rng: T) -> ProcessorBuilder<T> {
        ProcessorBuilder {
            program: self.program,
            font: self.font,
            rng,
            quirks: self.quirks,
            timer_mode: self.timer_mode,
            call_stack_depth: self.call_stack_depth,
        }
    }

    /// The program to be copied into memory starting at [`MachineState::PROGRAM_START`].
    ///
    /// Fails if the program is longer than [`MachineState::MAX_PROGRAM_LEN`].
    pub fn program(mut self, program: &[u8]) -> Result<Self, LoadError> {
        program_range(program)?;
        self.program = program.to_vec();
        Ok(self)
    }

    /// Set the font the processor should use.
    /// The font will be stored in processor memory starting at [`Font::BASE_ADDRESS`].
    pub fn font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// See [`Quirks`].
    pub fn quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// See [`TimerMode`].
    pub fn timer_mode(mut self, timer_mode: TimerMode) -> Self {
        self.timer_mode = timer_mode;
        self
    }

    /// The maximum subroutine nesting depth.
    pub fn call_stack_depth(mut self, call_stack_depth: usize) -> Self {
        self.call_stack_depth = call_stack_depth;
        self
    }

    pub fn build(self) -> Processor<R> {
        let mut state = MachineState::new(&self.font, self.call_stack_depth);
        let start = MachineState::PROGRAM_START as usize;
        state.memory[start..start + self.program.len()].copy_from_slice(&self.program);

        Processor {
            state,
            font: self.font,
            rng: self.rng,
            quirks: self.quirks,
            timer_mode: self.timer_mode,
            halted_at: None,
        }
    }
}
