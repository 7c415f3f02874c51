//! The world-state container: one explicit object owning every shared
//! component, passed by reference into the effect layer and orchestrator.

use crate::error::GameResult;
use crate::mapgen::InitialMap;
use crate::replay::{Event, ReplayWriter};
use crate::world::{
    BroadcastLog, DominationFactor, GameStats, Ledger, Loc, Message, Roster, Team, Terrain, Unit,
    UnitId, UnitKind,
};

/// Provider notification produced while the provider itself is busy
/// executing a turn; the orchestrator delivers these right after the turn
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlNotice {
    /// A unit was spawned.
    Spawned(UnitId),
    /// A unit was destroyed.
    Killed(UnitId),
}

/// Authoritative world state for one match.
///
/// Owns the terrain, the unit roster, the team ledger, the broadcast log
/// and the match stats. All mutation goes through the effect layer and
/// the round orchestrator; nothing here is global or ambient.
#[derive(Debug)]
pub struct World {
    pub(crate) terrain: Terrain,
    pub(crate) roster: Roster,
    pub(crate) ledger: Ledger,
    pub(crate) broadcasts: BroadcastLog,
    pub(crate) stats: GameStats,
    round: u32,
    round_limit: u32,
    seed: u64,
    notices: Vec<ControlNotice>,
}

impl World {
    /// Build a world from a validated initial map.
    ///
    /// Initial placements are spawned by the orchestrator, not here, so
    /// that spawn notifications reach the collaborators.
    #[must_use]
    pub fn new(map: &InitialMap) -> Self {
        Self {
            terrain: Terrain::from_map(map),
            roster: Roster::new(),
            ledger: Ledger::new(map.starting_soup),
            broadcasts: BroadcastLog::new(),
            stats: GameStats::new(),
            round: 0,
            round_limit: map.round_limit,
            seed: map.seed,
            notices: Vec::new(),
        }
    }

    /// The round currently being played (0 before the first round).
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// The configured round limit.
    #[must_use]
    pub const fn round_limit(&self) -> u32 {
        self.round_limit
    }

    /// The match seed from the map input.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read access to the terrain model.
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// A team's current soup balance.
    #[must_use]
    pub const fn team_soup(&self, team: Team) -> u32 {
        self.ledger.soup(team)
    }

    /// Number of live units on a team.
    #[must_use]
    pub const fn team_count(&self, team: Team) -> u32 {
        self.roster.team_count(team)
    }

    /// Look up a live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.roster.get(id)
    }

    /// Whether a unit with this id is live.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.roster.contains(id)
    }

    /// The id occupying a cell, if any.
    #[must_use]
    pub fn occupant(&self, loc: Loc) -> Option<UnitId> {
        self.roster.occupant(loc)
    }

    /// Iterate live units in spawn order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.roster.iter_in_spawn_order()
    }

    /// The winner, if decided.
    #[must_use]
    pub const fn winner(&self) -> Option<Team> {
        self.stats.winner()
    }

    /// Why the match was won, if decided.
    #[must_use]
    pub const fn domination_factor(&self) -> Option<DominationFactor> {
        self.stats.domination_factor()
    }

    /// Messages broadcast at the end of a past round.
    #[must_use]
    pub fn broadcast_history(&self, round: u32) -> Option<&[Message]> {
        self.broadcasts.round_list(round)
    }

    /// Beginning-of-round processing: advance the round counter and run
    /// per-unit cooldown decrements in execution order.
    pub(crate) fn begin_round(&mut self) {
        self.round += 1;
        for id in self.roster.ids_in_spawn_order() {
            if let Some(unit) = self.roster.get_mut(id) {
                unit.begin_round();
            }
        }
    }

    /// Snapshot of the per-round execution order.
    pub(crate) fn execution_order(&self) -> Vec<UnitId> {
        self.roster.ids_in_spawn_order()
    }

    /// Record the sandbox's computation report for a unit's turn.
    pub(crate) fn set_bytecodes_used(&mut self, id: UnitId, used: u32) {
        if let Some(unit) = self.roster.get_mut(id) {
            unit.bytecodes_used = used;
        }
    }

    /// End-of-round broadcast drain.
    pub(crate) fn drain_broadcasts(&mut self) -> Vec<Message> {
        self.broadcasts.drain()
    }

    /// Spawn a unit, registering it with the grid and queueing the
    /// provider notification.
    ///
    /// # Errors
    ///
    /// Fails only when the cell is already occupied.
    pub(crate) fn spawn_unit(
        &mut self,
        kind: UnitKind,
        loc: Loc,
        team: Team,
        replay: &mut dyn ReplayWriter,
    ) -> GameResult<UnitId> {
        let id = self.roster.register(kind, loc, team)?;
        self.notices.push(ControlNotice::Spawned(id));
        replay.record(Event::Spawned {
            id,
            kind,
            team,
            loc,
        });
        Ok(id)
    }

    /// Destroy a unit exactly once.
    ///
    /// A held passenger is force-dropped at the carrier's cell first and
    /// is itself destroyed when that cell is flooded. Destroying an
    /// already-absent id is a no-op, so a termination observed a turn
    /// late cannot double-destroy.
    pub(crate) fn destroy_unit(&mut self, id: UnitId, replay: &mut dyn ReplayWriter) {
        let Some(unit) = self.roster.remove(id) else {
            return;
        };

        if let Some(passenger) = unit.held {
            if self.roster.contains(passenger) {
                self.roster.place(passenger, unit.loc);
                replay.record(Event::Moved {
                    id: passenger,
                    loc: unit.loc,
                });
                if self.terrain.flooded(unit.loc) {
                    self.destroy_unit(passenger, replay);
                }
            }
        }

        self.notices.push(ControlNotice::Killed(id));
        replay.record(Event::Died { id });
        self.check_elimination();
    }

    /// Set the winner when a player team has been wiped out.
    fn check_elimination(&mut self) {
        if self.roster.team_count(Team::A) == 0 {
            self.stats
                .set_winner(Team::B, DominationFactor::Eliminated);
        } else if self.roster.team_count(Team::B) == 0 {
            self.stats
                .set_winner(Team::A, DominationFactor::Eliminated);
        }
    }

    /// Take the queued provider notifications.
    pub(crate) fn take_notices(&mut self) -> Vec<ControlNotice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::MapBuilder;
    use crate::replay::NullReplay;

    fn test_world() -> World {
        let map = MapBuilder::new("state", 10, 10, 1).build().unwrap();
        World::new(&map)
    }

    #[test]
    fn test_spawn_destroy_round_trip() {
        let mut world = test_world();
        let mut replay = NullReplay;

        let before_count = world.team_count(Team::A);
        let id = world
            .spawn_unit(UnitKind::Prospector, Loc::new(3, 3), Team::A, &mut replay)
            .unwrap();
        assert_eq!(world.occupant(Loc::new(3, 3)), Some(id));
        assert_eq!(world.team_count(Team::A), before_count + 1);

        world.destroy_unit(id, &mut replay);
        assert_eq!(world.occupant(Loc::new(3, 3)), None);
        assert_eq!(world.team_count(Team::A), before_count);
        assert!(!world.contains(id));
    }

    #[test]
    fn test_destroy_is_exactly_once() {
        let mut world = test_world();
        let mut replay = NullReplay;
        let id = world
            .spawn_unit(UnitKind::Prospector, Loc::new(3, 3), Team::A, &mut replay)
            .unwrap();

        world.destroy_unit(id, &mut replay);
        let notices = world.take_notices();
        world.destroy_unit(id, &mut replay);
        assert!(world.take_notices().is_empty());
        assert!(notices.contains(&ControlNotice::Killed(id)));
    }

    #[test]
    fn test_elimination_sets_winner() {
        let mut world = test_world();
        let mut replay = NullReplay;
        let a = world
            .spawn_unit(UnitKind::Depot, Loc::new(1, 1), Team::A, &mut replay)
            .unwrap();
        world
            .spawn_unit(UnitKind::Depot, Loc::new(8, 8), Team::B, &mut replay)
            .unwrap();

        assert!(world.winner().is_none());
        world.destroy_unit(a, &mut replay);
        assert_eq!(world.winner(), Some(Team::B));
        assert_eq!(
            world.domination_factor(),
            Some(DominationFactor::Eliminated)
        );
    }

    #[test]
    fn test_destroying_carrier_drops_passenger() {
        let mut world = test_world();
        let mut replay = NullReplay;
        let courier = world
            .spawn_unit(UnitKind::Courier, Loc::new(2, 2), Team::A, &mut replay)
            .unwrap();
        let passenger = world
            .spawn_unit(UnitKind::Prospector, Loc::new(2, 3), Team::A, &mut replay)
            .unwrap();
        // Also a unit on team B so elimination logic stays quiet.
        world
            .spawn_unit(UnitKind::Depot, Loc::new(9, 9), Team::B, &mut replay)
            .unwrap();

        // Simulate a held passenger.
        world.roster.lift(passenger);
        if let Some(unit) = world.roster.get_mut(passenger) {
            unit.loc = Loc::new(2, 2);
        }
        if let Some(unit) = world.roster.get_mut(courier) {
            unit.held = Some(passenger);
        }

        world.destroy_unit(courier, &mut replay);
        assert!(!world.contains(courier));
        assert!(world.contains(passenger));
        assert_eq!(world.occupant(Loc::new(2, 2)), Some(passenger));
    }

    #[test]
    fn test_destroying_carrier_over_water_drowns_passenger() {
        let mut builder = MapBuilder::new("wet", 10, 10, 1);
        builder.set_dirt(2, 2, -4);
        builder.set_flood(2, 2, true);
        let mut world = World::new(&builder.build().unwrap());
        let mut replay = NullReplay;

        let courier = world
            .spawn_unit(UnitKind::Courier, Loc::new(2, 2), Team::A, &mut replay)
            .unwrap();
        let passenger = world
            .spawn_unit(UnitKind::Dredger, Loc::new(2, 3), Team::A, &mut replay)
            .unwrap();
        world
            .spawn_unit(UnitKind::Depot, Loc::new(9, 9), Team::B, &mut replay)
            .unwrap();

        world.roster.lift(passenger);
        if let Some(unit) = world.roster.get_mut(courier) {
            unit.held = Some(passenger);
        }

        world.destroy_unit(courier, &mut replay);
        assert!(!world.contains(passenger));
    }

    #[test]
    fn test_begin_round_advances_and_decrements() {
        let mut world = test_world();
        let mut replay = NullReplay;
        let id = world
            .spawn_unit(UnitKind::Prospector, Loc::new(3, 3), Team::A, &mut replay)
            .unwrap();
        if let Some(unit) = world.roster.get_mut(id) {
            unit.cooldown = 2.5;
        }

        world.begin_round();
        assert_eq!(world.round(), 1);
        let cooldown = world.unit(id).unwrap().cooldown;
        assert!((cooldown - 1.5).abs() < 1e-6);
    }
}
