use std::num::{NonZeroU32, NonZeroUsize};

use bitflags::bitflags;
use thiserror::Error;

pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

bitflags! {
    /// Diagnostic switches for a calculation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DebugFlags: u32 {
        /// Trace every band as it starts and finishes.
        const QUICK_TRACE = 1;
        /// Emit a STATS frame before the terminal status.
        const DRAWING_STATS = 1 << 1;
        /// Log the wall-clock duration of the job.
        const TIMING = 1 << 2;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("maximum iterations must be greater than zero")]
    ZeroMaxIterations,
    #[error("thread count must be greater than zero")]
    ZeroThreads,
    #[error("unknown debug flag bits {0:#x}")]
    UnknownDebugFlags(u32),
}

/// Options for one calculation job, read-only to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalcOptions {
    max_iterations: NonZeroU32,
    thread_count: Option<NonZeroUsize>,
    debug_flags: DebugFlags,
    y_flip: bool,
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self {
            max_iterations: NonZeroU32::new(DEFAULT_MAX_ITERATIONS).unwrap_or(NonZeroU32::MIN),
            thread_count: None,
            debug_flags: DebugFlags::empty(),
            y_flip: false,
        }
    }
}

impl CalcOptions {
    #[must_use]
    pub fn builder() -> CalcOptionsBuilder {
        CalcOptionsBuilder::default()
    }

    #[must_use]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations.get()
    }

    /// Requested worker count, `None` for one per hardware thread.
    #[must_use]
    pub fn thread_count(&self) -> Option<NonZeroUsize> {
        self.thread_count
    }

    #[must_use]
    pub fn debug_flags(&self) -> DebugFlags {
        self.debug_flags
    }

    #[must_use]
    pub fn y_flip(&self) -> bool {
        self.y_flip
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalcOptionsBuilder {
    max_iterations: Option<u32>,
    thread_count: Option<usize>,
    debug_bits: u32,
    y_flip: bool,
}

impl CalcOptionsBuilder {
    #[must_use]
    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Zero is rejected by [`CalcOptionsBuilder::build`]; leave unset for auto.
    #[must_use]
    pub fn thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = Some(thread_count);
        self
    }

    #[must_use]
    pub fn debug_flags(mut self, flags: DebugFlags) -> Self {
        self.debug_bits = flags.bits();
        self
    }

    /// Raw bitmask as given on a command line.
    #[must_use]
    pub fn debug_bits(mut self, bits: u32) -> Self {
        self.debug_bits = bits;
        self
    }

    #[must_use]
    pub fn y_flip(mut self, y_flip: bool) -> Self {
        self.y_flip = y_flip;
        self
    }

    pub fn build(self) -> Result<CalcOptions, OptionsError> {
        let max_iterations = match self.max_iterations {
            Some(value) => NonZeroU32::new(value).ok_or(OptionsError::ZeroMaxIterations)?,
            None => CalcOptions::default().max_iterations,
        };

        let thread_count = match self.thread_count {
            Some(value) => Some(NonZeroUsize::new(value).ok_or(OptionsError::ZeroThreads)?),
            None => None,
        };

        let debug_flags = DebugFlags::from_bits(self.debug_bits).ok_or(
            OptionsError::UnknownDebugFlags(self.debug_bits & !DebugFlags::all().bits()),
        )?;

        Ok(CalcOptions {
            max_iterations,
            thread_count,
            debug_flags,
            y_flip: self.y_flip,
        })
    }
}
