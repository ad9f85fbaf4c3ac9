//! Swipe directions.
//!
//! The core treats a [`Direction`] as an opaque comparable tag. The angle
//! mapping exists for adapters that translate drag gestures into directions;
//! angles are in degrees, counter-clockwise, with `0°` pointing right and
//! `90°` pointing up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a card left the stack in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Swiped right (0°)
    Right,
    /// Swiped up and right (45°)
    UpRight,
    /// Swiped up (90°)
    Up,
    /// Swiped up and left (135°)
    UpLeft,
    /// Swiped left (180°)
    Left,
    /// Swiped down and left (225°)
    DownLeft,
    /// Swiped down (270°)
    Down,
    /// Swiped down and right (315°)
    DownRight,
}

impl Direction {
    /// Nominal angle of this direction in degrees.
    #[must_use]
    pub fn angle(self) -> f64 {
        match self {
            Self::Right => 0.0,
            Self::UpRight => 45.0,
            Self::Up => 90.0,
            Self::UpLeft => 135.0,
            Self::Left => 180.0,
            Self::DownLeft => 225.0,
            Self::Down => 270.0,
            Self::DownRight => 315.0,
        }
    }

    /// The direction pointing the other way.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::UpRight => Self::DownLeft,
            Self::Up => Self::Down,
            Self::UpLeft => Self::DownRight,
            Self::Left => Self::Right,
            Self::DownLeft => Self::UpRight,
            Self::Down => Self::Up,
            Self::DownRight => Self::UpLeft,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::UpRight => "up_right",
            Self::Up => "up",
            Self::UpLeft => "up_left",
            Self::Left => "left",
            Self::DownLeft => "down_left",
            Self::Down => "down",
            Self::DownRight => "down_right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Closed set of directions a stack accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionScheme {
    /// Left and right only
    #[default]
    TwoWay,
    /// Left, right, up and down
    FourWay,
    /// Cardinal and diagonal directions
    EightWay,
}

impl DirectionScheme {
    /// Directions allowed by this scheme.
    #[must_use]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Self::TwoWay => &[Direction::Right, Direction::Left],
            Self::FourWay => &[
                Direction::Right,
                Direction::Up,
                Direction::Left,
                Direction::Down,
            ],
            Self::EightWay => &[
                Direction::Right,
                Direction::UpRight,
                Direction::Up,
                Direction::UpLeft,
                Direction::Left,
                Direction::DownLeft,
                Direction::Down,
                Direction::DownRight,
            ],
        }
    }

    /// Whether `direction` belongs to this scheme.
    #[must_use]
    pub fn contains(self, direction: Direction) -> bool {
        self.directions().contains(&direction)
    }

    /// Map an angle to the nearest allowed direction.
    ///
    /// Ties resolve to the direction listed first in [`Self::directions`].
    /// Non-finite angles map to the first direction.
    #[must_use]
    pub fn from_angle(self, degrees: f64) -> Direction {
        let directions = self.directions();
        if !degrees.is_finite() {
            return directions[0];
        }
        let normalized = degrees.rem_euclid(360.0);
        let mut best = directions[0];
        let mut best_distance = f64::MAX;
        for &candidate in directions {
            let raw = (normalized - candidate.angle()).abs();
            let distance = raw.min(360.0 - raw);
            if distance < best_distance {
                best = candidate;
                best_distance = distance;
            }
        }
        best
    }
}
