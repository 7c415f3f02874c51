//! Game-rule failure types returned to unit programs.

use std::fmt;

use crate::world::Loc;

/// A recoverable game-rule failure raised by an effect call.
///
/// Every variant is visible to the issuing unit program and never
/// corrupts world state: effects validate fully before mutating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameError {
    /// Target is outside the unit's current sensor range.
    CantSenseThat {
        /// The location that could not be sensed.
        loc: Loc,
    },
    /// The unit's action cooldown has not expired.
    NotReady {
        /// Remaining cooldown turns.
        cooldown: f32,
    },
    /// The movement preconditions do not hold for the target cell.
    CantMoveThere {
        /// Where the unit currently stands.
        from: Loc,
        /// The rejected destination.
        to: Loc,
    },
    /// Catch-all capability or precondition mismatch for an action.
    CantDoThat {
        /// Which precondition failed.
        reason: &'static str,
    },
    /// A team or carried balance is too small to pay for the action.
    NotEnoughResource {
        /// Units of resource the action requires.
        needed: u32,
        /// Units of resource actually available.
        available: u32,
    },
    /// A broadcast payload exceeds the per-message word limit.
    MessageTooLong {
        /// Number of words submitted.
        len: usize,
        /// Maximum number of words allowed.
        max: usize,
    },
    /// A broadcast history query named a round that is not yet readable.
    RoundOutOfRange {
        /// The requested round.
        round: i32,
        /// The round currently being played.
        current: u32,
    },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CantSenseThat { loc } => {
                write!(f, "location {loc} is outside sensor range")
            }
            Self::NotReady { cooldown } => {
                write!(f, "action cooldown has not expired ({cooldown:.1} turns left)")
            }
            Self::CantMoveThere { from, to } => {
                write!(f, "cannot move from {from} to {to}")
            }
            Self::CantDoThat { reason } => write!(f, "cannot do that: {reason}"),
            Self::NotEnoughResource { needed, available } => {
                write!(f, "not enough resource: need {needed}, have {available}")
            }
            Self::MessageTooLong { len, max } => {
                write!(f, "message of {len} words exceeds the {max}-word limit")
            }
            Self::RoundOutOfRange { round, current } => {
                write!(
                    f,
                    "round {round} is not readable during round {current}; only past rounds are"
                )
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Result type for effect-layer operations.
pub type GameResult<T> = Result<T, GameError>;
