use std::error::Error;
use std::path::Path;

use thiserror::Error;

use crate::core::data::pixel_buffer::PixelBuffer;

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("cannot encode {}: {source}", .path.display())]
    Encode {
        path: std::path::PathBuf,
        source: Box<dyn Error + Send + Sync>,
    },
}

pub trait FilePresenterPort {
    fn present(&self, buffer: &PixelBuffer, filepath: &Path) -> Result<(), PresentError>;
}

impl<T: FilePresenterPort + ?Sized> FilePresenterPort for Box<T> {
    fn present(&self, buffer: &PixelBuffer, filepath: &Path) -> Result<(), PresentError> {
        (**self).present(buffer, filepath)
    }
}
