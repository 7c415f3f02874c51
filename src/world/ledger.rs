//! Per-team fungible soup accounts.

use crate::world::Team;

/// Per-team soup balances.
///
/// The ledger is a pure accumulator: every legality check (including
/// "can the team afford this") lives in the effect layer so that failure
/// messages stay precise. Debits must be pre-verified by the caller; the
/// balance saturates at zero rather than re-validating.
#[derive(Debug, Clone, Copy)]
pub struct Ledger {
    balances: [u32; 3],
}

impl Ledger {
    /// Create a ledger with the same starting balance for both player
    /// teams. Neutral holds no soup.
    #[must_use]
    pub const fn new(starting_soup: u32) -> Self {
        Self {
            balances: [starting_soup, starting_soup, 0],
        }
    }

    /// Current balance for a team.
    #[must_use]
    pub const fn soup(&self, team: Team) -> u32 {
        self.balances[team.index()]
    }

    /// Apply a signed adjustment to a team's balance.
    ///
    /// A negative delta is only legal when the caller has already
    /// verified the balance covers it.
    pub fn adjust(&mut self, team: Team, delta: i32) {
        let idx = team.index();
        self.balances[idx] = self.balances[idx].saturating_add_signed(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_balances() {
        let ledger = Ledger::new(200);
        assert_eq!(ledger.soup(Team::A), 200);
        assert_eq!(ledger.soup(Team::B), 200);
        assert_eq!(ledger.soup(Team::Neutral), 0);
    }

    #[test]
    fn test_adjust() {
        let mut ledger = Ledger::new(50);
        ledger.adjust(Team::A, 25);
        assert_eq!(ledger.soup(Team::A), 75);
        ledger.adjust(Team::A, -75);
        assert_eq!(ledger.soup(Team::A), 0);
        assert_eq!(ledger.soup(Team::B), 50);
    }
}
