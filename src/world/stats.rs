//! Match outcome bookkeeping.

use serde::{Deserialize, Serialize};

use crate::world::Team;

/// Enumerated reason a match was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DominationFactor {
    /// The losing team has no units left.
    Eliminated,
    /// Round limit reached; winner had the larger soup balance.
    GreaterSoup,
    /// Round limit reached; soup tied, winner had more live units.
    GreaterForce,
    /// Round limit reached with everything tied; Team A wins by fiat.
    DubiousVictory,
}

/// Winner and win reason for a match.
///
/// The winner is set at most once: the first cause sticks and later
/// attempts are silent no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameStats {
    winner: Option<Team>,
    factor: Option<DominationFactor>,
}

impl GameStats {
    /// Create empty stats with no winner.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            winner: None,
            factor: None,
        }
    }

    /// The winning team, if decided.
    #[must_use]
    pub const fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Why the match was won, if decided.
    #[must_use]
    pub const fn domination_factor(&self) -> Option<DominationFactor> {
        self.factor
    }

    /// Record the winner. A no-op when a winner is already set.
    pub const fn set_winner(&mut self, team: Team, factor: DominationFactor) {
        if self.winner.is_none() {
            self.winner = Some(team);
            self.factor = Some(factor);
        }
    }
}
