use thiserror::Error;

use crate::controllers::job::JobError;
use crate::controllers::ports::file_presenter::PresentError;
use crate::core::actions::calculate::errors::{CalculateError, PluginInitError};
use crate::core::actions::generate_pixel_buffer::generate_pixel_buffer::GeneratePixelBufferError;
use crate::core::colour_maps::errors::ColourMapError;
use crate::core::data::calc_options::OptionsError;
use crate::core::data::image_buffer::ImageError;
use crate::core::data::position_params::PositionError;
use crate::plugin::errors::PluginLoadError;
use crate::site::SyncError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    PluginLoad(#[from] PluginLoadError),
    #[error(transparent)]
    PluginInit(#[from] PluginInitError),
    #[error(transparent)]
    Calculate(#[from] CalculateError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    ColourMap(#[from] ColourMapError),
    #[error("cannot colour image: {0}")]
    PixelBuffer(#[from] GeneratePixelBufferError<ColourMapError>),
    #[error(transparent)]
    Present(#[from] PresentError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type Result<T> = std::result::Result<T, Error>;
