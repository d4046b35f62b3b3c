use serde::Serialize;
use std::fmt;

/// Compass direction of an approach, seen from the intersection center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    /// Clockwise order starting at north.
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::N => Direction::S,
            Direction::NE => Direction::SW,
            Direction::E => Direction::W,
            Direction::SE => Direction::NW,
            Direction::S => Direction::N,
            Direction::SW => Direction::NE,
            Direction::W => Direction::E,
            Direction::NW => Direction::SE,
        }
    }

    /// 90 degrees clockwise.
    pub fn right_of(self) -> Direction {
        match self {
            Direction::N => Direction::E,
            Direction::NE => Direction::SE,
            Direction::E => Direction::S,
            Direction::SE => Direction::SW,
            Direction::S => Direction::W,
            Direction::SW => Direction::NW,
            Direction::W => Direction::N,
            Direction::NW => Direction::NE,
        }
    }

    /// 90 degrees counter-clockwise.
    pub fn left_of(self) -> Direction {
        match self {
            Direction::N => Direction::W,
            Direction::NE => Direction::NW,
            Direction::E => Direction::N,
            Direction::SE => Direction::NE,
            Direction::S => Direction::E,
            Direction::SW => Direction::SE,
            Direction::W => Direction::S,
            Direction::NW => Direction::SW,
        }
    }

    /// Sector for a compass bearing in degrees (0 = north, clockwise). Each sector is 45 degrees
    /// wide and centered on its direction, so N covers [337.5, 360) and [0, 22.5).
    pub fn from_bearing(bearing: f64) -> Direction {
        let bearing = bearing.rem_euclid(360.0);
        let sector = ((bearing + 22.5) / 45.0).floor() as usize % 8;
        Direction::ALL[sector]
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
