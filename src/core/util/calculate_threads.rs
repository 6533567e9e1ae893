use std::num::{NonZeroU32, NonZeroUsize};

use crate::core::actions::calculate::ports::computation_plugin::Concurrency;
use crate::core::util::calculate_bands::calculate_bands;

#[must_use]
pub fn available_threads() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Number of worker threads for an image of `height` rows.
///
/// `requested` overrides hardware parallelism. A plugin that cannot take
/// concurrent calls always gets a single worker.
pub fn calculate_threads_for_banding(
    requested: Option<NonZeroUsize>,
    concurrency: Concurrency,
    height: u32,
) -> u32 {
    if concurrency == Concurrency::Serialized {
        return calculate_bands(NonZeroU32::MIN, height);
    }

    let threads = requested.unwrap_or_else(available_threads).get();
    let threads = u32::try_from(threads).unwrap_or(u32::MAX);

    calculate_bands(NonZeroU32::new(threads).unwrap_or(NonZeroU32::MIN), height)
}
