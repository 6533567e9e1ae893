use std::str::FromStr;

use crate::core::actions::generate_pixel_buffer::ports::colour_map::ColourMap;
use crate::core::colour_maps::errors::{ColourMapError, ParseColourStopError};
use crate::core::data::colour::Colour;
use crate::core::data::image_buffer::{Fate, PixelResult};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColourStop {
    pub position: f64,
    pub colour: Colour,
}

impl ColourStop {
    #[must_use]
    pub const fn new(position: f64, colour: Colour) -> Self {
        Self { position, colour }
    }
}

/// Parses `0.5:255,128,0` or `0.5:255,128,0,255`.
impl FromStr for ColourStop {
    type Err = ParseColourStopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (position, channels) = s
            .split_once(':')
            .ok_or_else(|| ParseColourStopError::Format(s.to_string()))?;

        let position: f64 = position
            .trim()
            .parse()
            .map_err(|_| ParseColourStopError::Position(position.to_string()))?;

        let channels = channels
            .split(',')
            .map(|c| {
                c.trim()
                    .parse::<u8>()
                    .map_err(|_| ParseColourStopError::Channel(c.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let colour = match channels[..] {
            [r, g, b] => Colour::rgba(r, g, b, 255),
            [r, g, b, a] => Colour::rgba(r, g, b, a),
            _ => return Err(ParseColourStopError::Format(s.to_string())),
        };

        Ok(Self { position, colour })
    }
}

fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    (from as f64 + (to as f64 - from as f64) * t).round() as u8
}

/// Piecewise-linear gradient over `[0, 1]`.
///
/// Escaped pixels are placed on the gradient at `iterations / max_iterations`.
/// Inside pixels take the inside colour.
#[derive(Debug, Clone, PartialEq)]
pub struct ListColourMap {
    stops: Vec<ColourStop>,
    max_iterations: u32,
    inside: Colour,
}

impl ListColourMap {
    pub fn new(mut stops: Vec<ColourStop>, max_iterations: u32) -> Result<Self, ColourMapError> {
        if stops.is_empty() {
            return Err(ColourMapError::NoStops);
        }

        if let Some(stop) = stops.iter().find(|s| !(0.0..=1.0).contains(&s.position)) {
            return Err(ColourMapError::PositionOutOfRange(stop.position));
        }

        stops.sort_by(|a, b| a.position.total_cmp(&b.position));

        Ok(Self {
            stops,
            max_iterations: max_iterations.max(1),
            inside: Colour::BLACK,
        })
    }

    /// Black at 0, white from 0.004 on.
    #[must_use]
    pub fn default_stops() -> Vec<ColourStop> {
        vec![
            ColourStop::new(0.0, Colour::BLACK),
            ColourStop::new(0.004, Colour::WHITE),
            ColourStop::new(1.0, Colour::WHITE),
        ]
    }

    #[must_use]
    pub fn with_inside_colour(mut self, inside: Colour) -> Self {
        self.inside = inside;
        self
    }

    #[must_use]
    pub fn stops(&self) -> &[ColourStop] {
        &self.stops
    }

    #[must_use]
    pub fn colour_at(&self, position: f64) -> Colour {
        let upper = self.stops.partition_point(|s| s.position <= position);

        match (upper.checked_sub(1).map(|i| self.stops[i]), self.stops.get(upper)) {
            (Some(low), Some(high)) => {
                let span = high.position - low.position;
                let t = if span > 0.0 { (position - low.position) / span } else { 0.0 };

                Colour::rgba(
                    lerp_channel(low.colour.r, high.colour.r, t),
                    lerp_channel(low.colour.g, high.colour.g, t),
                    lerp_channel(low.colour.b, high.colour.b, t),
                    lerp_channel(low.colour.a, high.colour.a, t),
                )
            }
            (Some(low), None) => low.colour,
            (None, Some(high)) => high.colour,
            (None, None) => self.inside,
        }
    }
}

impl ColourMap for ListColourMap {
    type T = PixelResult;
    type Failure = ColourMapError;

    fn map(&self, value: PixelResult) -> Result<Colour, ColourMapError> {
        match value.fate {
            Fate::Unset => Err(ColourMapError::UnsetPixel),
            Fate::Inside => Ok(self.inside),
            Fate::Escaped => {
                let position = (value.iterations as f64 / self.max_iterations as f64).min(1.0);
                Ok(self.colour_at(position))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stop_with_and_without_alpha() {
        assert_eq!(
            "0.5:255,128,0".parse(),
            Ok(ColourStop::new(0.5, Colour::rgba(255, 128, 0, 255)))
        );
        assert_eq!(
            "1:1,2,3,4".parse(),
            Ok(ColourStop::new(1.0, Colour::rgba(1, 2, 3, 4)))
        );
    }

    #[test]
    fn test_parse_stop_errors() {
        assert!(matches!("0.5".parse::<ColourStop>(), Err(ParseColourStopError::Format(_))));
        assert!(matches!("x:1,2,3".parse::<ColourStop>(), Err(ParseColourStopError::Position(_))));
        assert!(matches!("0:1,2,300".parse::<ColourStop>(), Err(ParseColourStopError::Channel(_))));
        assert!(matches!("0:1,2".parse::<ColourStop>(), Err(ParseColourStopError::Format(_))));
    }

    #[test]
    fn test_rejects_empty_and_out_of_range_stops() {
        assert_eq!(ListColourMap::new(vec![], 100), Err(ColourMapError::NoStops));
        assert_eq!(
            ListColourMap::new(vec![ColourStop::new(1.5, Colour::WHITE)], 100),
            Err(ColourMapError::PositionOutOfRange(1.5))
        );
    }

    #[test]
    fn test_interpolates_between_stops() {
        let map = ListColourMap::new(
            vec![
                ColourStop::new(1.0, Colour::rgba(200, 100, 0, 255)),
                ColourStop::new(0.0, Colour::rgba(0, 0, 0, 255)),
            ],
            100,
        )
        .unwrap();

        assert_eq!(map.colour_at(0.5), Colour::rgba(100, 50, 0, 255));
        assert_eq!(map.map(PixelResult::escaped(25)), Ok(Colour::rgba(50, 25, 0, 255)));
    }

    #[test]
    fn test_default_stops_are_black_then_white() {
        let map = ListColourMap::new(ListColourMap::default_stops(), 100).unwrap();

        assert_eq!(map.map(PixelResult::escaped(0)), Ok(Colour::BLACK));
        assert_eq!(map.map(PixelResult::escaped(1)), Ok(Colour::WHITE));
        assert_eq!(map.map(PixelResult::inside(100)), Ok(Colour::BLACK));
    }

    #[test]
    fn test_positions_before_first_stop_clamp() {
        let map = ListColourMap::new(vec![ColourStop::new(0.5, Colour::WHITE)], 10).unwrap();

        assert_eq!(map.colour_at(0.1), Colour::WHITE);
        assert_eq!(map.colour_at(0.9), Colour::WHITE);
    }

    #[test]
    fn test_unset_pixel_is_an_error() {
        let map = ListColourMap::new(ListColourMap::default_stops(), 100).unwrap();

        assert_eq!(map.map(PixelResult::default()), Err(ColourMapError::UnsetPixel));
    }

    #[test]
    fn test_custom_inside_colour() {
        let red = Colour::rgba(255, 0, 0, 255);
        let map = ListColourMap::new(ListColourMap::default_stops(), 100)
            .unwrap()
            .with_inside_colour(red);

        assert_eq!(map.map(PixelResult::inside(100)), Ok(red));
    }
}
