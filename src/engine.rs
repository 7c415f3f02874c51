//! Round orchestrator: drives the per-round lifecycle and owns the
//! match state machine.

use std::fmt;

use crate::control::{ControlError, ControlProvider};
use crate::mapgen::{InitialMap, MapError};
use crate::replay::{Event, ReplayWriter};
use crate::world::{
    ControlNotice, DominationFactor, Team, UnitController, UnitId, World,
};

/// Lifecycle of a match. Done is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// No round has been run yet.
    NotStarted,
    /// At least one round has run and no winner is set.
    Running,
    /// The match is over; further `run_round` calls are no-ops.
    Done,
}

/// A match in progress: the world plus its two collaborators.
///
/// The orchestrator is the single mutation thread. Within a round it
/// executes unit turns strictly sequentially in spawn order, which is
/// the entire concurrency-correctness mechanism: no two effects ever
/// interleave.
pub struct Match {
    world: World,
    control: Box<dyn ControlProvider>,
    replay: Box<dyn ReplayWriter>,
    state: MatchState,
}

// Manual Debug since both collaborators are bare trait objects.
impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("round", &self.world.round())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Match {
    /// Set up a match: validate the map, build the world, notify the
    /// collaborators, and spawn the initial placements.
    ///
    /// # Errors
    ///
    /// Returns a [`MapError`] when the map is structurally invalid.
    pub fn new(
        map: &InitialMap,
        control: Box<dyn ControlProvider>,
        replay: Box<dyn ReplayWriter>,
    ) -> Result<Self, MapError> {
        map.validate()?;

        let mut world = World::new(map);
        let mut control = control;
        let mut replay = replay;

        replay.match_header(map);
        control.match_started(&world);

        for placement in &map.placements {
            world
                .spawn_unit(placement.kind, placement.loc, placement.team, replay.as_mut())
                .map_err(|e| MapError::new(format!("invalid placement: {e}")))?;
        }
        Self::flush_notices(&mut world, control.as_mut());

        // Setup block: everything so far is "round 0" in the replay.
        replay.end_round(0);

        Ok(Self {
            world,
            control,
            replay,
            state: MatchState::NotStarted,
        })
    }

    /// Read access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MatchState {
        self.state
    }

    /// Run the match to completion and return the winner, if any.
    pub fn run_to_completion(&mut self) -> Option<Team> {
        while self.run_round() != MatchState::Done {}
        self.world.winner()
    }

    /// Run one round.
    ///
    /// Calling this after the match reached Done is idempotent: it
    /// returns Done without mutating anything.
    pub fn run_round(&mut self) -> MatchState {
        if self.state == MatchState::Done {
            return MatchState::Done;
        }
        self.state = MatchState::Running;

        if let Err(fault) = self.round_inner() {
            // A provider fault abandons the match rather than crashing
            // or corrupting it.
            tracing::error!(round = self.world.round(), %fault, "match abandoned");
            self.finish();
            return self.state;
        }

        if self.world.winner().is_some() {
            self.control.match_ended();
            tracing::info!(
                round = self.world.round(),
                winner = ?self.world.winner(),
                factor = ?self.world.domination_factor(),
                "match ended"
            );
            self.finish();
        }
        self.state
    }

    fn finish(&mut self) {
        self.state = MatchState::Done;
        self.replay
            .match_footer(self.world.winner(), self.world.round());
    }

    fn flush_notices(world: &mut World, control: &mut dyn ControlProvider) {
        for notice in world.take_notices() {
            match notice {
                ControlNotice::Spawned(id) => control.unit_spawned(id),
                ControlNotice::Killed(id) => control.unit_killed(id),
            }
        }
    }

    fn round_inner(&mut self) -> Result<(), ControlError> {
        // (1)-(2) Advance the round; per-unit cooldown decrements.
        self.world.begin_round();

        // (3) Provider hook.
        self.control.round_started();

        // (4) One turn per dynamic unit, in the fixed execution order
        // snapshotted now. Units spawned below first act next round.
        for id in self.world.execution_order() {
            if !self.world.contains(id) {
                continue;
            }
            self.run_turn(id)?;
        }

        // (5) Provider hook.
        self.control.round_ended();

        // (6) End-of-round per unit: non-flying units drown on flooded
        // cells.
        self.drown_units();

        // (7) Broadcast drain.
        for message in self.world.drain_broadcasts() {
            self.replay.record(Event::MessageBroadcast { message });
        }

        // (8) Victory evaluation.
        self.evaluate_victory();

        // Per-team resource snapshots, then close out the round.
        for team in [Team::A, Team::B] {
            self.replay.record(Event::TeamSoup {
                team,
                amount: self.world.team_soup(team),
            });
        }
        self.replay.end_round(self.world.round());
        Ok(())
    }

    fn run_turn(&mut self, id: UnitId) -> Result<(), ControlError> {
        {
            let mut ctl = UnitController::new(&mut self.world, self.replay.as_mut(), id)?;
            self.control.run_unit(&mut ctl)?;
        }

        // End-of-turn bookkeeping: computation usage, then deferred
        // notifications from this turn's effects.
        let used = self.control.bytecodes_used(id);
        self.world.set_bytecodes_used(id, used);
        Self::flush_notices(&mut self.world, self.control.as_mut());

        // A terminated program loses its unit, exactly once.
        if self.control.terminated(id) && self.world.contains(id) {
            self.world.destroy_unit(id, self.replay.as_mut());
            Self::flush_notices(&mut self.world, self.control.as_mut());
        }
        Ok(())
    }

    fn drown_units(&mut self) {
        let doomed: Vec<UnitId> = self
            .world
            .units()
            .filter(|unit| {
                !unit.kind.spec().flies
                    && self.world.occupant(unit.loc) == Some(unit.id)
                    && self.world.terrain().flooded(unit.loc)
            })
            .map(|unit| unit.id)
            .collect();
        for id in doomed {
            self.world.destroy_unit(id, self.replay.as_mut());
        }
        Self::flush_notices(&mut self.world, self.control.as_mut());
    }

    /// Time-limit tie-break: greater soup, then greater live unit
    /// count, then Team A by fiat.
    fn evaluate_victory(&mut self) {
        let at_limit = self.world.round() >= self.world.round_limit().saturating_sub(1);
        if !at_limit || self.world.winner().is_some() {
            return;
        }

        let soup_a = self.world.team_soup(Team::A);
        let soup_b = self.world.team_soup(Team::B);
        let count_a = self.world.team_count(Team::A);
        let count_b = self.world.team_count(Team::B);

        let (winner, factor) = if soup_a != soup_b {
            let team = if soup_a > soup_b { Team::A } else { Team::B };
            (team, DominationFactor::GreaterSoup)
        } else if count_a != count_b {
            let team = if count_a > count_b { Team::A } else { Team::B };
            (team, DominationFactor::GreaterForce)
        } else {
            (Team::A, DominationFactor::DubiousVictory)
        };
        self.world.stats.set_winner(winner, factor);
    }
}
