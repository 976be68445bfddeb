use std::{convert::TryFrom, io, path::PathBuf};

use chipvm_base::{
    processor::{Key, KeyState},
    quirks::{Quirks, ShiftSource},
    screen::PartialOffscreenDrawing,
    LoadError, Processor, ProcessorError, StepOutcome, TimerMode,
};
use clap::{Parser, ValueEnum};
use spin_sleep::LoopHelper;
use thiserror::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{self, fmt::format::FmtSpan, EnvFilter};

/// Rate the delay and sound timers count down at.
const TIMER_HZ: u32 = 60;
/// Emulated clock rate used for timer ticks when running unthrottled.
const NOMINAL_CLOCK_HZ: u32 = 500;

#[derive(Debug, Error)]
enum RunError {
    #[error("could not read ROM file {path:?}")]
    ReadRom {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTimerMode {
    PerStep,
    Manual,
}

impl From<CliTimerMode> for TimerMode {
    fn from(mode: CliTimerMode) -> Self {
        match mode {
            CliTimerMode::PerStep => TimerMode::PerStep,
            CliTimerMode::Manual => TimerMode::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliShiftSource {
    Vx,
    Vy,
}

impl From<CliShiftSource> for ShiftSource {
    fn from(source: CliShiftSource) -> Self {
        match source {
            CliShiftSource::Vx => ShiftSource::Vx,
            CliShiftSource::Vy => ShiftSource::Vy,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPartialOffscreenDrawing {
    ClipXy,
    ClipXWrapY,
    WrapXClipY,
    WrapXy,
}

impl From<CliPartialOffscreenDrawing> for PartialOffscreenDrawing {
    fn from(drawing: CliPartialOffscreenDrawing) -> Self {
        match drawing {
            CliPartialOffscreenDrawing::ClipXy => PartialOffscreenDrawing::ClipXY,
            CliPartialOffscreenDrawing::ClipXWrapY => PartialOffscreenDrawing::ClipXWrapY,
            CliPartialOffscreenDrawing::WrapXClipY => PartialOffscreenDrawing::WrapXClipY,
            CliPartialOffscreenDrawing::WrapXy => PartialOffscreenDrawing::WrapXY,
        }
    }
}

fn parse_key(key: &str) -> Result<Key, String> {
    let key_id = u8::from_str_radix(key.trim_start_matches("0x"), 16)
        .map_err(|error| format!("{:?} is not a hex digit: {}", key, error))?;
    Key::try_from(key_id).map_err(|_| format!("there is no key {:X}, keys go from 0 to F", key_id))
}

#[derive(Debug, Parser)]
#[clap(version, about)]
struct CliOpts {
    /// The path to the file containing the ROM.
    /// The file's contents will be loaded into the interpreter's memory,
    /// starting at address 0x200.
    rom_file: PathBuf,
    /// The maximum number of instruction cycles to run.
    #[clap(long, default_value_t = 1000)]
    cycles: u64,
    /// Instruction cycles per second, 0 runs as fast as possible.
    #[clap(long, default_value_t = 500)]
    clock_hz: u32,
    /// When the delay and sound timers count down.
    /// With `manual` they count down at 60Hz of emulated time.
    #[clap(long, value_enum, default_value = "per-step")]
    timer_mode: CliTimerMode,
    /// Seed for the random number generator, random if not given.
    #[clap(long)]
    seed: Option<u64>,
    /// The register the shift instructions read.
    #[clap(long, value_enum, default_value = "vx")]
    shift_source: CliShiftSource,
    /// Leave the address register past the registers stored or loaded by Fx55 and Fx65.
    #[clap(long)]
    load_store_increments_i: bool,
    /// The clipping/wrapping behavior for sprites that are drawn partially offscreen.
    #[clap(long, value_enum, default_value = "wrap-xy")]
    partial_offscreen_drawing: CliPartialOffscreenDrawing,
    /// Fail on machine subroutine calls (0nnn) instead of skipping them.
    #[clap(long)]
    strict_machine_subroutine: bool,
    /// A key (0 to F) to hold pressed for the whole run. May be given multiple times.
    #[clap(long = "hold-key", value_name = "HEX", value_parser = parse_key)]
    hold_keys: Vec<Key>,
}

impl CliOpts {
    fn quirks(&self) -> Quirks {
        Quirks {
            shift_source: self.shift_source.into(),
            load_store_increments_i: self.load_store_increments_i,
            partial_offscreen_drawing: self.partial_offscreen_drawing.into(),
            skip_machine_subroutine: !self.strict_machine_subroutine,
        }
    }
}

fn main() -> Result<(), RunError> {
    let cli_opts = CliOpts::parse();

    tracing_subscriber::fmt()
        .pretty()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let program = std::fs::read(&cli_opts.rom_file).map_err(|source| RunError::ReadRom {
        path: cli_opts.rom_file.clone(),
        source,
    })?;

    let mut builder = Processor::builder();
    if let Some(seed) = cli_opts.seed {
        builder = builder.seed(seed);
    }
    let mut processor = builder
        .quirks(cli_opts.quirks())
        .timer_mode(cli_opts.timer_mode.into())
        .program(&program)?
        .build();

    for &key in &cli_opts.hold_keys {
        processor.set_key_state(key, KeyState::Pressed);
    }

    let result = run(&mut processor, &cli_opts);
    println!("{:#?}", processor.screen());
    result
}

/// Step `processor` until the cycle limit or a fatal error.
#[instrument(skip(processor, cli_opts), fields(cycles = cli_opts.cycles, clock_hz = cli_opts.clock_hz))]
fn run(processor: &mut Processor, cli_opts: &CliOpts) -> Result<(), RunError> {
    let mut loop_helper = if cli_opts.clock_hz > 0 {
        Some(LoopHelper::builder().build_with_target_rate(cli_opts.clock_hz as f64))
    } else {
        None
    };
    let emulated_clock_hz = if cli_opts.clock_hz > 0 {
        cli_opts.clock_hz
    } else {
        NOMINAL_CLOCK_HZ
    };
    // Emulated time since the last timer tick, in units of 1 / (TIMER_HZ * emulated_clock_hz) s.
    let mut timer_phase = 0;
    let mut sound_active = processor.is_sound_active();

    for cycle in 0..cli_opts.cycles {
        if let Some(loop_helper) = &mut loop_helper {
            loop_helper.loop_start();
        }

        match processor.step() {
            Ok(StepOutcome::Executed {
                screen_updated: true,
                ..
            }) => debug!(cycle, "screen updated"),
            Ok(_) => (),
            // Already logged by the processor, the instruction has been skipped.
            Err(error) if !error.is_fatal() => (),
            Err(error) => return Err(error.into()),
        }

        if processor.timer_mode() == TimerMode::Manual {
            timer_phase += TIMER_HZ;
            while timer_phase >= emulated_clock_hz {
                timer_phase -= emulated_clock_hz;
                processor.tick_timers();
            }
        }

        if processor.is_sound_active() != sound_active {
            sound_active = processor.is_sound_active();
            info!(cycle, "sound {}", if sound_active { "on" } else { "off" });
        }

        if let Some(loop_helper) = &mut loop_helper {
            loop_helper.loop_sleep();
        }
    }

    info!("cycle limit reached");
    Ok(())
}
