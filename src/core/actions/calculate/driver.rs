use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, instrument, trace, warn};

use crate::core::actions::calculate::errors::{CalculateError, WorkerFailure};
use crate::core::actions::calculate::handle::ComputationHandle;
use crate::core::actions::calculate::ports::progress_sink::ProgressSink;
use crate::core::actions::cancellation::{CANCEL_CHECK_INTERVAL_PIXELS, CancelToken};
use crate::core::data::calc_options::{CalcOptions, DebugFlags};
use crate::core::data::image_buffer::{Fate, ImageBand, ImageBuffer, ImageError};
use crate::core::data::point::Point;
use crate::core::data::position_params::PositionParams;
use crate::core::util::calculate_threads::calculate_threads_for_banding;
use crate::core::util::pixel_to_view_coords::ViewBasis;
use crate::protocol::errors::ChannelProtocolError;
use crate::protocol::message::{CalcState, CalcStats, ImageRegion, ProgressMessage};

/// How a calculation ended.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcOutcome {
    pub state: CalcState,
    pub stats: CalcStats,
    pub failures: Vec<WorkerFailure>,
}

#[derive(Debug)]
enum WorkerEvent {
    RowDone { row: u32 },
}

#[derive(Debug, Default)]
struct BandReport {
    stats: CalcStats,
    completed: bool,
}

fn compute_band<C: CancelToken>(
    mut band: ImageBand<'_>,
    basis: &ViewBasis,
    handle: &ComputationHandle,
    max_iterations: u32,
    stop: &C,
    events: &Sender<WorkerEvent>,
) -> Result<BandReport, WorkerFailure> {
    let mut report = BandReport::default();
    let mut since_check = 0usize;

    for local_row in 0..band.rows() {
        if stop.is_cancelled() {
            return Ok(report);
        }

        let y = band.first_row() + local_row;
        let band_index = band.index();

        for (x, slot) in band.row_mut(local_row).iter_mut().enumerate() {
            since_check += 1;
            if since_check == CANCEL_CHECK_INTERVAL_PIXELS {
                since_check = 0;
                if stop.is_cancelled() {
                    return Ok(report);
                }
            }

            let pixel = Point { x: x as u32, y };
            let mut result = handle
                .evaluate(basis.point_at(pixel.x, y), pixel, max_iterations)
                .map_err(|source| WorkerFailure::Evaluate {
                    band: band_index,
                    pixel,
                    source,
                })?;

            result.iterations = result.iterations.min(max_iterations);
            report.stats.pixels += 1;
            report.stats.iterations += u64::from(result.iterations);
            if result.fate == Fate::Inside {
                report.stats.inside += 1;
            }

            *slot = result;
        }

        // The driver may already have stopped listening after a sink failure.
        let _ = events.send(WorkerEvent::RowDone { row: y });
    }

    report.completed = true;
    Ok(report)
}

/// Raises the shared failure flag when a worker unwinds.
struct FailOnUnwind<'a>(&'a AtomicBool);

impl Drop for FailOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::Release);
        }
    }
}

/// Tracks rows finished so far and decides which frames to emit.
struct ProgressTracker {
    width: u32,
    height: u32,
    rows_done: u32,
    last_percent: u32,
}

impl ProgressTracker {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rows_done: 0,
            last_percent: 0,
        }
    }

    fn row_done<S: ProgressSink>(&mut self, row: u32, sink: &mut S) -> Result<(), ChannelProtocolError> {
        self.rows_done += 1;

        sink.send(&ProgressMessage::Image(ImageRegion {
            x: 0,
            y: row,
            width: self.width,
            height: 1,
        }))?;

        let percent = self.rows_done * 100 / self.height;
        if percent > self.last_percent {
            self.last_percent = percent;
            sink.send(&ProgressMessage::Progress(self.rows_done as f32 / self.height as f32))?;
        }

        Ok(())
    }
}

/// Runs one calculation job over `image` using the initialized `handle`.
///
/// The image is cut into one band of whole rows per worker. Workers run on
/// scoped threads and report finished rows back here; this thread is the
/// only writer to `sink`. The job always ends with exactly one terminal
/// STATUS frame unless the sink itself fails, which is returned as
/// [`CalculateError::Channel`].
///
/// `cancel` is polled by every worker at each row and every
/// [`CANCEL_CHECK_INTERVAL_PIXELS`] pixels. A failing worker stops the others
/// the same way.
#[instrument(level = "debug", skip_all, fields(plugin = handle.name()))]
pub fn calculate<S: ProgressSink, C: CancelToken>(
    options: &CalcOptions,
    position: &PositionParams,
    handle: &ComputationHandle,
    image: &mut ImageBuffer,
    sink: &mut S,
    cancel: &C,
) -> Result<CalcOutcome, CalculateError> {
    if !handle.is_initialized() {
        return Err(CalculateError::NotInitialized);
    }

    let started = Instant::now();
    let flags = options.debug_flags();
    let resolution = image.resolution().ok_or(ImageError::NoResolution)?;
    let basis = ViewBasis::new(position, resolution, options.y_flip());
    let max_iterations = options.max_iterations();
    let num_threads =
        calculate_threads_for_banding(options.thread_count(), handle.concurrency(), resolution.height());

    info!("Running with {num_threads} threads");

    sink.send(&ProgressMessage::Status(CalcState::Calculating))?;
    sink.send(&ProgressMessage::Progress(0.0))?;

    let bands = image.split_bands(num_threads)?;
    let failed = AtomicBool::new(false);
    let stop = || cancel.is_cancelled() || failed.load(Ordering::Acquire);
    let mut tracker = ProgressTracker::new(resolution.width(), resolution.height());
    let mut channel_error: Option<ChannelProtocolError> = None;
    let mut stats = CalcStats::default();
    let mut failures = Vec::new();
    let mut completed = true;

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        let stop = &stop;
        let failed = &failed;

        let workers = bands
            .into_iter()
            .map(|band| {
                let tx = tx.clone();
                let index = band.index();
                let worker = scope.spawn(move || {
                    let _unwind = FailOnUnwind(failed);
                    let band_started = Instant::now();
                    if flags.contains(DebugFlags::QUICK_TRACE) {
                        trace!(band = index, first_row = band.first_row(), rows = band.rows(), "band started");
                    }

                    let result = compute_band(band, &basis, handle, max_iterations, stop, &tx);
                    if result.is_err() {
                        failed.store(true, Ordering::Release);
                    }

                    if flags.contains(DebugFlags::QUICK_TRACE) {
                        trace!(band = index, ok = result.is_ok(), "band finished");
                    }
                    if flags.contains(DebugFlags::TIMING) {
                        debug!(band = index, elapsed_ms = band_started.elapsed().as_millis(), "band timing");
                    }

                    result
                });
                (index, worker)
            })
            .collect::<Vec<_>>();

        drop(tx);

        for event in rx {
            let WorkerEvent::RowDone { row } = event;
            if channel_error.is_some() {
                continue;
            }
            if let Err(err) = tracker.row_done(row, sink) {
                error!(%err, "progress channel write failed, stopping workers");
                failed.store(true, Ordering::Release);
                channel_error = Some(err);
            }
        }

        for (index, worker) in workers {
            match worker.join() {
                Ok(Ok(report)) => {
                    stats.merge(&report.stats);
                    completed &= report.completed;
                }
                Ok(Err(failure)) => {
                    warn!(%failure, "worker failed");
                    failures.push(failure);
                    completed = false;
                }
                Err(_) => {
                    error!(band = index, "worker panicked");
                    failures.push(WorkerFailure::Panicked { band: index });
                    completed = false;
                }
            }
        }
    });

    if let Some(err) = channel_error {
        return Err(err.into());
    }

    let state = if !failures.is_empty() {
        CalcState::Error
    } else if !completed {
        CalcState::Aborted
    } else {
        CalcState::Done
    };

    if flags.contains(DebugFlags::DRAWING_STATS) {
        sink.send(&ProgressMessage::Stats(stats))?;
    }
    sink.send(&ProgressMessage::Status(state))?;

    if flags.contains(DebugFlags::TIMING) {
        info!(elapsed_ms = started.elapsed().as_millis(), "calculation timing");
    }
    info!(?state, pixels = stats.pixels, "calculation finished");

    Ok(CalcOutcome {
        state,
        stats,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::calculate::errors::{EvaluateError, PluginInitError};
    use crate::core::actions::calculate::handle::tests::StubPlugin;
    use crate::core::actions::calculate::ports::computation_plugin::{ComputationPlugin, Concurrency};
    use crate::core::actions::cancellation::{AbortFlag, NeverCancel};
    use crate::core::data::formula_param::{FormulaParam, ParameterSpec};
    use crate::core::data::image_buffer::PixelResult;
    use crate::core::util::pixel_to_view_coords::Point4;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Panics on its first pixel; the other band waits for that before starting.
    struct PanickingPlugin {
        spec: ParameterSpec,
        split_row: u32,
        panicked: AtomicBool,
        later_band_evaluations: AtomicUsize,
    }

    impl ComputationPlugin for PanickingPlugin {
        fn name(&self) -> &str {
            "panicking"
        }

        fn parameter_spec(&self) -> &ParameterSpec {
            &self.spec
        }

        fn initialize(&mut self, _: &PositionParams, _: &[FormulaParam]) -> Result<(), PluginInitError> {
            Ok(())
        }

        fn evaluate(&self, _: Point4, pixel: Point, _: u32) -> Result<PixelResult, EvaluateError> {
            if pixel.y < self.split_row {
                self.panicked.store(true, Ordering::SeqCst);
                panic!("formula crashed");
            }

            if self.later_band_evaluations.fetch_add(1, Ordering::SeqCst) == 0 {
                let deadline = Instant::now() + Duration::from_secs(5);
                while !self.panicked.load(Ordering::SeqCst) && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(1));
                }
                // Let the unwinding worker finish raising the failure flag.
                thread::sleep(Duration::from_millis(50));
            }

            Ok(PixelResult::escaped(1))
        }

        fn teardown(&mut self) {}
    }

    /// Records how often each pixel was evaluated.
    #[derive(Debug)]
    struct CountingPlugin {
        spec: ParameterSpec,
        width: u32,
        counts: Arc<Mutex<Vec<u32>>>,
        fail_at: Option<Point>,
        concurrency: Concurrency,
    }

    impl CountingPlugin {
        fn new(width: u32, height: u32) -> Self {
            Self {
                spec: ParameterSpec::new(),
                width,
                counts: Arc::new(Mutex::new(vec![0; (width * height) as usize])),
                fail_at: None,
                concurrency: Concurrency::Shared,
            }
        }
    }

    impl ComputationPlugin for CountingPlugin {
        fn name(&self) -> &str {
            "counting"
        }

        fn parameter_spec(&self) -> &ParameterSpec {
            &self.spec
        }

        fn concurrency(&self) -> Concurrency {
            self.concurrency
        }

        fn initialize(&mut self, _: &PositionParams, _: &[FormulaParam]) -> Result<(), PluginInitError> {
            Ok(())
        }

        fn evaluate(&self, _: Point4, pixel: Point, max: u32) -> Result<PixelResult, EvaluateError> {
            if self.fail_at == Some(pixel) {
                return Err(EvaluateError::Plugin("stub failure".to_string()));
            }

            self.counts.lock().unwrap()[(pixel.y * self.width + pixel.x) as usize] += 1;

            if pixel.x % 2 == 0 {
                Ok(PixelResult::inside(max + 50))
            } else {
                Ok(PixelResult::escaped(pixel.y))
            }
        }

        fn teardown(&mut self) {}
    }

    fn initialized(plugin: impl ComputationPlugin + 'static) -> ComputationHandle {
        let mut handle = ComputationHandle::new(Box::new(plugin));
        handle.initialize(&PositionParams::default(), &[]).unwrap();
        handle
    }

    fn options(threads: usize) -> CalcOptions {
        CalcOptions::builder()
            .max_iterations(20)
            .thread_count(threads)
            .build()
            .unwrap()
    }

    fn statuses(messages: &[ProgressMessage]) -> Vec<CalcState> {
        messages
            .iter()
            .filter_map(|m| match m {
                ProgressMessage::Status(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_done_job_evaluates_every_pixel_once() {
        let plugin = CountingPlugin::new(13, 7);
        let counts = plugin.counts.clone();
        let handle = initialized(plugin);
        let mut image = ImageBuffer::with_resolution(13, 7).unwrap();
        let mut messages = Vec::new();

        let outcome = calculate(
            &options(3),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut messages,
            &NeverCancel,
        )
        .unwrap();

        assert_eq!(outcome.state, CalcState::Done);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.stats.pixels, 91);
        assert!(image.is_complete());
        assert!(counts.lock().unwrap().iter().all(|&n| n == 1));
        assert_eq!(statuses(&messages), vec![CalcState::Calculating, CalcState::Done]);
        assert_eq!(messages.last(), Some(&ProgressMessage::Status(CalcState::Done)));
    }

    #[test]
    fn test_iterations_are_clamped_to_maximum() {
        let handle = initialized(CountingPlugin::new(4, 2));
        let mut image = ImageBuffer::with_resolution(4, 2).unwrap();

        calculate(
            &options(2),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut Vec::new(),
            &NeverCancel,
        )
        .unwrap();

        assert_eq!(image.get(Point { x: 0, y: 0 }), Some(PixelResult::inside(20)));
        assert_eq!(image.get(Point { x: 1, y: 1 }), Some(PixelResult::escaped(1)));
    }

    #[test]
    fn test_one_image_frame_per_row_and_progress_reaches_one() {
        let handle = initialized(CountingPlugin::new(5, 9));
        let mut image = ImageBuffer::with_resolution(5, 9).unwrap();
        let mut messages = Vec::new();

        calculate(
            &options(4),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut messages,
            &NeverCancel,
        )
        .unwrap();

        let mut rows: Vec<u32> = messages
            .iter()
            .filter_map(|m| match m {
                ProgressMessage::Image(region) => Some(region.y),
                _ => None,
            })
            .collect();
        rows.sort_unstable();

        assert_eq!(rows, (0..9).collect::<Vec<_>>());
        assert!(messages.contains(&ProgressMessage::Progress(1.0)));
        assert_eq!(messages[1], ProgressMessage::Progress(0.0));
    }

    #[test]
    fn test_raised_abort_flag_ends_with_aborted() {
        let handle = initialized(CountingPlugin::new(8, 8));
        let mut image = ImageBuffer::with_resolution(8, 8).unwrap();
        let mut messages = Vec::new();
        let abort = AbortFlag::new();
        abort.raise();

        let outcome = calculate(
            &options(2),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut messages,
            &abort,
        )
        .unwrap();

        assert_eq!(outcome.state, CalcState::Aborted);
        assert_eq!(outcome.stats.pixels, 0);
        assert_eq!(messages.last(), Some(&ProgressMessage::Status(CalcState::Aborted)));
    }

    #[test]
    fn test_failing_worker_ends_with_error() {
        let mut plugin = CountingPlugin::new(6, 6);
        plugin.fail_at = Some(Point { x: 2, y: 4 });
        let handle = initialized(plugin);
        let mut image = ImageBuffer::with_resolution(6, 6).unwrap();
        let mut messages = Vec::new();

        let outcome = calculate(
            &options(2),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut messages,
            &NeverCancel,
        )
        .unwrap();

        assert_eq!(outcome.state, CalcState::Error);
        assert_eq!(
            outcome.failures,
            vec![WorkerFailure::Evaluate {
                band: 1,
                pixel: Point { x: 2, y: 4 },
                source: EvaluateError::Plugin("stub failure".to_string()),
            }]
        );
        assert_eq!(statuses(&messages).last(), Some(&CalcState::Error));
        assert_eq!(statuses(&messages).len(), 2);
    }

    #[test]
    fn test_panicking_worker_stops_the_other_bands() {
        let plugin = PanickingPlugin {
            spec: ParameterSpec::new(),
            split_row: 100,
            panicked: AtomicBool::new(false),
            later_band_evaluations: AtomicUsize::new(0),
        };
        let mut handle = ComputationHandle::new(Box::new(plugin));
        handle.initialize(&PositionParams::default(), &[]).unwrap();
        let mut image = ImageBuffer::with_resolution(100, 200).unwrap();
        let mut messages = Vec::new();

        let outcome = calculate(
            &options(2),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut messages,
            &NeverCancel,
        )
        .unwrap();

        assert_eq!(outcome.state, CalcState::Error);
        assert_eq!(outcome.failures, vec![WorkerFailure::Panicked { band: 0 }]);
        // The second band stops at its next row check instead of computing all 10000 pixels.
        assert!(outcome.stats.pixels <= 100, "evaluated {}", outcome.stats.pixels);
        assert_eq!(messages.last(), Some(&ProgressMessage::Status(CalcState::Error)));
    }

    #[test]
    fn test_serialized_plugin_runs_single_band() {
        let mut plugin = CountingPlugin::new(4, 4);
        plugin.concurrency = Concurrency::Serialized;
        let handle = initialized(plugin);
        let mut image = ImageBuffer::with_resolution(4, 4).unwrap();

        let outcome = calculate(
            &options(8),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut Vec::new(),
            &NeverCancel,
        )
        .unwrap();

        assert_eq!(outcome.state, CalcState::Done);
        assert!(image.is_complete());
    }

    #[test]
    fn test_drawing_stats_frame_precedes_terminal_status() {
        let handle = initialized(StubPlugin::default());
        let mut image = ImageBuffer::with_resolution(3, 3).unwrap();
        let mut messages = Vec::new();
        let options = CalcOptions::builder()
            .debug_flags(DebugFlags::DRAWING_STATS | DebugFlags::QUICK_TRACE)
            .build()
            .unwrap();

        calculate(
            &options,
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut messages,
            &NeverCancel,
        )
        .unwrap();

        let n = messages.len();
        assert!(matches!(messages[n - 2], ProgressMessage::Stats(CalcStats { pixels: 9, .. })));
        assert_eq!(messages[n - 1], ProgressMessage::Status(CalcState::Done));
    }

    #[test]
    fn test_uninitialized_handle_is_rejected() {
        let handle = ComputationHandle::new(Box::new(StubPlugin::default()));
        let mut image = ImageBuffer::with_resolution(2, 2).unwrap();
        let mut messages = Vec::new();

        let result = calculate(
            &options(1),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut messages,
            &NeverCancel,
        );

        assert!(matches!(result, Err(CalculateError::NotInitialized)));
        assert!(messages.is_empty());
    }

    #[test]
    fn test_image_without_resolution_is_rejected() {
        let handle = initialized(StubPlugin::default());
        let mut image = ImageBuffer::new();

        let result = calculate(
            &options(1),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut Vec::new(),
            &NeverCancel,
        );

        assert!(matches!(result, Err(CalculateError::Image(ImageError::NoResolution))));
    }

    #[test]
    fn test_sink_failure_is_returned() {
        struct FailingSink {
            accepted: usize,
        }

        impl ProgressSink for FailingSink {
            fn send(&mut self, _: &ProgressMessage) -> Result<(), ChannelProtocolError> {
                if self.accepted == 2 {
                    return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
                }
                self.accepted += 1;
                Ok(())
            }
        }

        let handle = initialized(StubPlugin::default());
        let mut image = ImageBuffer::with_resolution(4, 4).unwrap();

        let result = calculate(
            &options(2),
            &PositionParams::default(),
            &handle,
            &mut image,
            &mut FailingSink { accepted: 0 },
            &NeverCancel,
        );

        assert!(matches!(result, Err(CalculateError::Channel(ChannelProtocolError::Io(_)))));
    }
}
