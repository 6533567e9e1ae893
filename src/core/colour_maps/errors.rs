use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColourMapError {
    #[error("a colour map needs at least one stop")]
    NoStops,
    #[error("stop position {0} is outside 0.0..=1.0")]
    PositionOutOfRange(f64),
    #[error("pixel was never calculated")]
    UnsetPixel,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColourStopError {
    #[error("expected `position:r,g,b[,a]`, got `{0}`")]
    Format(String),
    #[error("invalid stop position `{0}`")]
    Position(String),
    #[error("invalid colour channel `{0}`, expected 0 to 255")]
    Channel(String),
}
