use std::fmt;
use std::str::FromStr;

use crate::controllers::ports::file_presenter::FilePresenterPort;
use crate::presenters::file::png::PngFilePresenter;
use crate::presenters::file::ppm::PpmFilePresenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFileType {
    #[default]
    Png,
    Ppm,
}

impl ImageFileType {
    pub const ALL: &'static [Self] = &[Self::Png, Self::Ppm];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Ppm => "ppm",
        }
    }
}

impl fmt::Display for ImageFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown image format `{s}`, expected png or ppm"))
    }
}

#[must_use]
pub fn file_presenter_factory(kind: ImageFileType) -> Box<dyn FilePresenterPort> {
    match kind {
        ImageFileType::Png => Box::new(PngFilePresenter::new()),
        ImageFileType::Ppm => Box::new(PpmFilePresenter::new()),
    }
}
