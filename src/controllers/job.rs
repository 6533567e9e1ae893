use std::io::{self, PipeWriter};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info};

use crate::core::actions::calculate::driver::{CalcOutcome, calculate};
use crate::core::actions::calculate::errors::CalculateError;
use crate::core::actions::calculate::handle::ComputationHandle;
use crate::core::actions::cancellation::AbortFlag;
use crate::core::data::calc_options::CalcOptions;
use crate::core::data::image_buffer::ImageBuffer;
use crate::core::data::position_params::PositionParams;
use crate::protocol::sink::ChannelSink;
use crate::site::{Completion, Site};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("plugin must be initialized before a job is launched")]
    NotInitialized,
    #[error("cannot set up job: {0}")]
    Io(#[from] io::Error),
    #[error("calculation thread panicked")]
    CalculationPanicked,
}

/// Everything the calculation thread hands back when it ends.
struct CalcReturn {
    handle: ComputationHandle,
    image: ImageBuffer,
    outcome: Result<CalcOutcome, CalculateError>,
    writer: PipeWriter,
}

#[derive(Debug)]
pub struct JobReport {
    pub completion: Completion,
    pub image: ImageBuffer,
    pub handle: ComputationHandle,
    pub outcome: Result<CalcOutcome, CalculateError>,
}

/// A calculation running on its own thread, reporting through a pipe.
#[derive(Debug)]
pub struct RunningJob {
    site: Site,
    abort: AbortFlag,
    calc: JoinHandle<CalcReturn>,
}

pub struct Job;

impl Job {
    /// Starts the watcher, then the calculation thread.
    ///
    /// `handle` must already be initialized and `image` sized.
    pub fn launch(
        handle: ComputationHandle,
        options: CalcOptions,
        position: PositionParams,
        mut image: ImageBuffer,
    ) -> Result<RunningJob, JobError> {
        if !handle.is_initialized() {
            return Err(JobError::NotInitialized);
        }

        let (reader, writer) = io::pipe()?;
        let site = Site::watch(reader)?;
        let abort = AbortFlag::new();
        let cancel = abort.clone();

        let calc = thread::Builder::new()
            .name("fractal-calc".to_string())
            .spawn(move || {
                let mut sink = ChannelSink::new(writer);
                let outcome = calculate(&options, &position, &handle, &mut image, &mut sink, &cancel);
                debug!(frames = sink.frames_written(), "calculation thread done");

                CalcReturn {
                    handle,
                    image,
                    outcome,
                    writer: sink.into_inner(),
                }
            })?;

        site.set_worker_identity(calc.thread().id());
        info!("calculation launched");

        Ok(RunningJob { site, abort, calc })
    }
}

impl RunningJob {
    #[must_use]
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Handle that can stop the job from elsewhere.
    #[must_use]
    pub fn abort_flag(&self) -> AbortFlag {
        self.abort.clone()
    }

    pub fn abort(&self) {
        self.abort.raise();
    }

    /// Joins the calculation thread, closes the channel and joins the watcher.
    pub fn finish(self) -> Result<JobReport, JobError> {
        let CalcReturn {
            handle,
            image,
            outcome,
            writer,
        } = self.calc.join().map_err(|_| JobError::CalculationPanicked)?;

        drop(writer);
        let completion = self.site.join();

        Ok(JobReport {
            completion,
            image,
            handle,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fractals::BuiltinPlugin;
    use crate::protocol::message::CalcState;
    use crate::site::CompletionSource;
    use std::time::Duration;

    fn initialized_mandelbrot() -> ComputationHandle {
        let mut handle = BuiltinPlugin::Mandelbrot.handle();
        handle
            .initialize(&PositionParams::default(), &BuiltinPlugin::Mandelbrot.default_params())
            .unwrap();
        handle
    }

    #[test]
    fn test_job_runs_to_done() {
        let options = CalcOptions::builder().thread_count(2).build().unwrap();
        let image = ImageBuffer::with_resolution(32, 24).unwrap();

        let job = Job::launch(initialized_mandelbrot(), options, PositionParams::default(), image).unwrap();
        let completion = job.site().wait_timeout(Duration::from_secs(30)).unwrap();
        assert!(job.site().worker_identity().is_some());
        let report = job.finish().unwrap();

        assert_eq!(completion, Completion::reported(CalcState::Done));
        assert_eq!(report.completion, completion);
        assert!(report.image.is_complete());
        assert_eq!(report.outcome.unwrap().state, CalcState::Done);
        assert!(report.handle.is_initialized());
    }

    #[test]
    fn test_aborted_job_reports_aborted() {
        let options = CalcOptions::builder().thread_count(1).build().unwrap();
        let image = ImageBuffer::with_resolution(16, 16).unwrap();

        let job = Job::launch(initialized_mandelbrot(), options, PositionParams::default(), image).unwrap();
        job.abort();
        let report = job.finish().unwrap();

        // The job may finish before it sees the flag.
        assert_eq!(report.completion.source, CompletionSource::Reported);
        assert!(matches!(report.completion.state, CalcState::Aborted | CalcState::Done));
    }

    #[test]
    fn test_uninitialized_handle_is_rejected() {
        let result = Job::launch(
            BuiltinPlugin::Mandelbrot.handle(),
            CalcOptions::default(),
            PositionParams::default(),
            ImageBuffer::with_resolution(4, 4).unwrap(),
        );

        assert!(matches!(result, Err(JobError::NotInitialized)));
    }

    #[test]
    fn test_image_without_resolution_closes_channel() {
        let job = Job::launch(
            initialized_mandelbrot(),
            CalcOptions::default(),
            PositionParams::default(),
            ImageBuffer::new(),
        )
        .unwrap();

        let report = job.finish().unwrap();

        assert_eq!(report.completion, Completion::aborted(CompletionSource::ChannelClosed));
        assert!(report.outcome.is_err());
    }
}
