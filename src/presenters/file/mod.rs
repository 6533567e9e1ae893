pub mod factory;
pub mod png;
pub mod ppm;

use std::path::Path;

use crate::controllers::ports::file_presenter::PresentError;

fn create_parent_dir(filepath: &Path) -> Result<(), PresentError> {
    match filepath.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| PresentError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
