//! Cardinal directions and the grid-move maneuver table.
//!
//! A grid move is fully described by the desired absolute travel direction and
//! the robot's current facing. The required primitive falls out of a single
//! rotation offset `(target - facing) mod 4`, which replaces a per-direction
//! dispatch with one lookup.

use serde::{Deserialize, Serialize};

/// Absolute compass direction on the maze grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compass {
    North,
    East,
    South,
    West,
}

impl Compass {
    /// Quadrant index, North = 0 increasing clockwise.
    pub fn index(self) -> u8 {
        match self {
            Compass::North => 0,
            Compass::East => 1,
            Compass::South => 2,
            Compass::West => 3,
        }
    }
}

/// Turn primitive to run before driving forward into the next cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    /// Already facing the target direction.
    Forward,
    /// Quarter turn clockwise.
    TurnRight90,
    /// Half turn (run as a 180 degree left pivot).
    TurnAround,
    /// Quarter turn counter-clockwise.
    TurnLeft90,
}

/// Maneuver required to travel `target` while currently facing `facing`.
pub fn maneuver(
    target: Compass,
    facing: Compass,
) -> Maneuver {
    match (4 + target.index() - facing.index()) % 4 {
        0 => Maneuver::Forward,
        1 => Maneuver::TurnRight90,
        2 => Maneuver::TurnAround,
        _ => Maneuver::TurnLeft90,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Compass::*;
    use Maneuver::*;

    #[test]
    fn maneuver_table_is_exhaustive() {
        // (target, facing) -> expected primitive, all 16 pairs.
        let table = [
            (North, North, Forward),
            (North, East, TurnLeft90),
            (North, South, TurnAround),
            (North, West, TurnRight90),
            (East, North, TurnRight90),
            (East, East, Forward),
            (East, South, TurnLeft90),
            (East, West, TurnAround),
            (South, North, TurnAround),
            (South, East, TurnRight90),
            (South, South, Forward),
            (South, West, TurnLeft90),
            (West, North, TurnLeft90),
            (West, East, TurnAround),
            (West, South, TurnRight90),
            (West, West, Forward),
        ];
        for (target, facing, expected) in table {
            assert_eq!(
                maneuver(target, facing),
                expected,
                "target {:?} facing {:?}",
                target,
                facing
            );
        }
    }

    #[test]
    fn facing_matches_target_means_no_turn() {
        for dir in [North, East, South, West] {
            assert_eq!(maneuver(dir, dir), Forward);
        }
    }
}
