use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::controllers::job::Job;
use crate::controllers::ports::file_presenter::FilePresenterPort;
use crate::core::actions::calculate::driver::CalcOutcome;
use crate::core::actions::calculate::handle::ComputationHandle;
use crate::core::actions::generate_pixel_buffer::generate_pixel_buffer::generate_pixel_buffer;
use crate::core::colour_maps::list_colour_map::{ColourStop, ListColourMap};
use crate::core::data::calc_options::CalcOptions;
use crate::core::data::formula_param::FormulaParam;
use crate::core::data::image_buffer::ImageBuffer;
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::data::position_params::PositionParams;
use crate::error::Result;
use crate::site::Completion;

/// What to calculate and how to colour it.
#[derive(Debug, Clone)]
pub struct CalcFileRequest {
    pub options: CalcOptions,
    pub position: PositionParams,
    pub params: Vec<FormulaParam>,
    pub width: u32,
    pub height: u32,
    pub stops: Vec<ColourStop>,
}

#[derive(Debug)]
pub struct CalcSummary {
    pub completion: Completion,
    pub outcome: CalcOutcome,
    pub elapsed: Duration,
}

/// Runs one job to completion and keeps the coloured result for writing.
pub struct CalcFileController<P: FilePresenterPort> {
    presenter: P,
    buffer: Option<PixelBuffer>,
}

impl<P: FilePresenterPort> CalcFileController<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            buffer: None,
        }
    }

    /// Initializes `handle`, runs the job and tears the handle down again.
    ///
    /// The image is only coloured when the job completed with DONE.
    pub fn generate(&mut self, mut handle: ComputationHandle, request: &CalcFileRequest) -> Result<CalcSummary> {
        self.buffer = None;
        handle.initialize(&request.position, &request.params)?;

        let image = ImageBuffer::with_resolution(request.width, request.height)?;
        let colour_map = ListColourMap::new(request.stops.clone(), request.options.max_iterations())?;

        info!(
            width = request.width,
            height = request.height,
            max_iterations = request.options.max_iterations(),
            "calculating {}",
            handle.name()
        );

        let start = Instant::now();
        let job = Job::launch(handle, request.options, request.position, image)?;
        let completion = job.site().wait();
        info!(state = ?completion.state, source = ?completion.source, "calculation finished");

        let mut report = job.finish()?;
        let elapsed = start.elapsed();
        report.handle.teardown();
        let outcome = report.outcome?;

        if completion.is_done() {
            self.buffer = Some(generate_pixel_buffer(&report.image, &colour_map)?);
        } else {
            warn!(state = ?completion.state, "job did not complete, nothing to write");
        }

        Ok(CalcSummary {
            completion,
            outcome,
            elapsed,
        })
    }

    /// Returns whether an image was written.
    pub fn write(&self, filepath: impl AsRef<Path>) -> Result<bool> {
        let Some(buffer) = &self.buffer else {
            return Ok(false);
        };

        self.presenter.present(buffer, filepath.as_ref())?;
        info!(path = %filepath.as_ref().display(), "image saved");
        Ok(true)
    }
}
