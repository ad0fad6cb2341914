//! # Steering Command Module
//!
//! Defines the four-way steering decision and the command link boundary over
//! which it is transmitted to the actuator controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The steering decision for one control cycle.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    /// Drive towards the target
    Forward,

    /// Turn left to centre the target
    Left,

    /// Turn right to centre the target
    Right,

    /// Hold position
    Stop,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The command link boundary.
///
/// Transmission is best effort: a failure is reported through the return
/// value only and must never stall or abort the control loop.
pub trait CommandLink {
    /// Transmit the given command string, returning success or failure.
    fn send(&mut self, command: &str) -> bool;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Direction {
    /// Single-character wire code for this direction.
    pub fn wire_char(&self) -> char {
        match self {
            Direction::Forward => 'F',
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stop => 'S',
        }
    }

    /// Encode this direction for the command link: the wire code terminated
    /// with a newline.
    pub fn to_wire(&self) -> String {
        format!("{}\n", self.wire_char())
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Stop
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wire_encoding() {
        assert_eq!(Direction::Forward.to_wire(), "F\n");
        assert_eq!(Direction::Left.to_wire(), "L\n");
        assert_eq!(Direction::Right.to_wire(), "R\n");
        assert_eq!(Direction::Stop.to_wire(), "S\n");
    }
}
