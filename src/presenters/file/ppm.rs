use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::controllers::ports::file_presenter::{FilePresenterPort, PresentError};
use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer};
use crate::presenters::file::create_parent_dir;

/// Binary PPM (P6). Alpha is dropped.
#[derive(Debug, Default)]
pub struct PpmFilePresenter {}

impl PpmFilePresenter {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    fn write(buffer: &PixelBuffer, filepath: &Path) -> std::io::Result<()> {
        let mut file = BufWriter::new(File::create(filepath)?);
        let resolution = buffer.resolution();

        // P6: binary RGB, then width, height and max colour value
        writeln!(file, "P6")?;
        writeln!(file, "{} {}", resolution.width(), resolution.height())?;
        writeln!(file, "255")?;

        for pixel in buffer.buffer().chunks_exact(BYTES_PER_PIXEL) {
            file.write_all(&pixel[..3])?;
        }

        file.flush()
    }
}

impl FilePresenterPort for PpmFilePresenter {
    fn present(&self, buffer: &PixelBuffer, filepath: &Path) -> Result<(), PresentError> {
        create_parent_dir(filepath)?;

        Self::write(buffer, filepath).map_err(|source| PresentError::Io {
            path: filepath.to_path_buf(),
            source,
        })
    }
}
