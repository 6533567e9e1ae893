//! Pluggable, multi-threaded fractal calculation with a framed progress channel.
//!
//! A [`ComputationHandle`] wraps a point function, either one compiled in
//! ([`BuiltinPlugin`]) or one loaded from a formula library with
//! [`PluginLoader`]. [`calculate`] runs it over an [`ImageBuffer`] on scoped
//! worker threads and reports progress as frames through a [`ProgressSink`].
//! A [`Site`] reads those frames on a watcher thread and releases
//! [`Site::wait`] once the job reached a terminal state. [`Job`] wires the
//! pieces together over a pipe.

pub mod controllers;
pub mod core;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod presenters;
pub mod protocol;
pub mod site;

pub use controllers::cli::calc_file::{CalcFileController, CalcFileRequest, CalcSummary};
pub use controllers::job::{Job, JobError, JobReport, RunningJob};
pub use controllers::ports::file_presenter::{FilePresenterPort, PresentError};
pub use crate::core::actions::calculate::driver::{CalcOutcome, calculate};
pub use crate::core::actions::calculate::errors::{
    CalculateError, EvaluateError, PluginInitError, WorkerFailure,
};
pub use crate::core::actions::calculate::handle::{ComputationHandle, HandleState};
pub use crate::core::actions::calculate::ports::computation_plugin::{ComputationPlugin, Concurrency};
pub use crate::core::actions::calculate::ports::progress_sink::ProgressSink;
pub use crate::core::actions::cancellation::{AbortFlag, CancelToken, NeverCancel};
pub use crate::core::colour_maps::list_colour_map::{ColourStop, ListColourMap};
pub use crate::core::data::calc_options::{CalcOptions, DebugFlags};
pub use crate::core::data::formula_param::{FormulaParam, FormulaParamKind, ParameterSpec};
pub use crate::core::data::image_buffer::{Fate, ImageBuffer, PixelResult};
pub use crate::core::data::position_params::PositionParams;
pub use crate::core::fractals::BuiltinPlugin;
pub use error::{Error, Result};
pub use plugin::{PluginLoadError, PluginLoader};
pub use presenters::file::factory::{ImageFileType, file_presenter_factory};
pub use protocol::{CalcState, CalcStats, ChannelSink, FrameReader, ProgressMessage};
pub use site::{Completion, CompletionSource, Site, SyncError};
