use std::path::Path;

use crate::controllers::ports::file_presenter::{FilePresenterPort, PresentError};
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::presenters::file::create_parent_dir;

#[derive(Debug, Default)]
pub struct PngFilePresenter {}

impl PngFilePresenter {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }
}

impl FilePresenterPort for PngFilePresenter {
    fn present(&self, buffer: &PixelBuffer, filepath: &Path) -> Result<(), PresentError> {
        create_parent_dir(filepath)?;
        let resolution = buffer.resolution();

        image::save_buffer_with_format(
            filepath,
            buffer.buffer(),
            resolution.width(),
            resolution.height(),
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|source| PresentError::Encode {
            path: filepath.to_path_buf(),
            source: Box::new(source),
        })
    }
}
