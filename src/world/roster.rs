//! Authoritative unit registry and grid occupancy.

use std::collections::HashMap;

use crate::error::{GameError, GameResult};
use crate::world::{Loc, Team, Unit, UnitId, UnitKind};

/// The registry of all live units.
///
/// Holds the id table, the cell occupancy map, per-team counts and the
/// spawn-order execution list. Spawn order is the sole source of
/// turn-order determinism: it is identical across replays of the same
/// match inputs.
#[derive(Debug, Default)]
pub struct Roster {
    units: HashMap<UnitId, Unit>,
    occupancy: HashMap<Loc, UnitId>,
    spawn_order: Vec<UnitId>,
    counts: [u32; 3],
    next_id: UnitId,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new unit at an unoccupied cell.
    ///
    /// # Errors
    ///
    /// Fails only when the cell is already occupied; checking candidate
    /// cells ahead of time is the caller's responsibility.
    pub fn register(&mut self, kind: UnitKind, loc: Loc, team: Team) -> GameResult<UnitId> {
        if self.occupancy.contains_key(&loc) {
            return Err(GameError::CantDoThat {
                reason: "spawn cell is already occupied",
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.units.insert(id, Unit::new(id, kind, loc, team));
        self.occupancy.insert(loc, id);
        self.spawn_order.push(id);
        self.counts[team.index()] += 1;
        Ok(id)
    }

    /// Deregister a unit, clearing its cell if it occupies one.
    ///
    /// Returns the removed unit, or `None` if the id is unknown.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        if self.occupancy.get(&unit.loc) == Some(&id) {
            self.occupancy.remove(&unit.loc);
        }
        self.counts[unit.team.index()] -= 1;
        Some(unit)
    }

    /// Look up a unit by id. Absence means "not existent".
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Whether a unit with this id is registered.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// The unit occupying a cell, if any. Held units occupy no cell.
    #[must_use]
    pub fn at(&self, loc: Loc) -> Option<&Unit> {
        self.occupancy.get(&loc).and_then(|id| self.units.get(id))
    }

    /// The id occupying a cell, if any.
    #[must_use]
    pub fn occupant(&self, loc: Loc) -> Option<UnitId> {
        self.occupancy.get(&loc).copied()
    }

    /// Relocate grid occupancy from one cell to another.
    ///
    /// Touches only the occupancy map; the unit's own location field is
    /// mutated separately by the effect layer after legality checks.
    pub fn relocate(&mut self, from: Loc, to: Loc) {
        if let Some(id) = self.occupancy.remove(&from) {
            self.occupancy.insert(to, id);
        }
    }

    /// Remove a unit from grid occupancy without deregistering it.
    ///
    /// Used when a carrier picks the unit up.
    pub fn lift(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get(&id) {
            if self.occupancy.get(&unit.loc) == Some(&id) {
                self.occupancy.remove(&unit.loc);
            }
        }
    }

    /// Place a previously lifted unit back onto a cell.
    pub fn place(&mut self, id: UnitId, loc: Loc) {
        self.occupancy.insert(loc, id);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.loc = loc;
        }
    }

    /// Number of live units on a team. Held units still count.
    #[must_use]
    pub const fn team_count(&self, team: Team) -> u32 {
        self.counts[team.index()]
    }

    /// Snapshot of live unit ids in spawn order.
    ///
    /// The round orchestrator iterates this snapshot; units spawned while
    /// it runs first act the following round.
    #[must_use]
    pub fn ids_in_spawn_order(&self) -> Vec<UnitId> {
        self.spawn_order
            .iter()
            .copied()
            .filter(|id| self.units.contains_key(id))
            .collect()
    }

    /// Iterate live units in spawn order.
    pub fn iter_in_spawn_order(&self) -> impl Iterator<Item = &Unit> {
        self.spawn_order.iter().filter_map(|id| self.units.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut roster = Roster::new();
        let id = roster
            .register(UnitKind::Prospector, Loc::new(2, 3), Team::A)
            .unwrap();

        assert!(roster.contains(id));
        assert_eq!(roster.get(id).unwrap().loc, Loc::new(2, 3));
        assert_eq!(roster.occupant(Loc::new(2, 3)), Some(id));
        assert_eq!(roster.team_count(Team::A), 1);
        assert_eq!(roster.team_count(Team::B), 0);
    }

    #[test]
    fn test_register_occupied_cell_fails() {
        let mut roster = Roster::new();
        roster
            .register(UnitKind::Prospector, Loc::new(0, 0), Team::A)
            .unwrap();
        let err = roster
            .register(UnitKind::Dredger, Loc::new(0, 0), Team::B)
            .unwrap_err();
        assert!(matches!(err, GameError::CantDoThat { .. }));
        assert_eq!(roster.team_count(Team::B), 0);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut roster = Roster::new();
        let a = roster
            .register(UnitKind::Prospector, Loc::new(0, 0), Team::A)
            .unwrap();
        roster.remove(a);
        let b = roster
            .register(UnitKind::Prospector, Loc::new(0, 0), Team::A)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_round_trip() {
        let mut roster = Roster::new();
        let id = roster
            .register(UnitKind::Dredger, Loc::new(1, 1), Team::B)
            .unwrap();
        let unit = roster.remove(id).unwrap();
        assert_eq!(unit.id, id);
        assert!(!roster.contains(id));
        assert_eq!(roster.occupant(Loc::new(1, 1)), None);
        assert_eq!(roster.team_count(Team::B), 0);
        assert!(roster.remove(id).is_none());
    }

    #[test]
    fn test_relocate_moves_occupancy_only() {
        let mut roster = Roster::new();
        let id = roster
            .register(UnitKind::Prospector, Loc::new(0, 0), Team::A)
            .unwrap();
        roster.relocate(Loc::new(0, 0), Loc::new(0, 1));

        assert_eq!(roster.occupant(Loc::new(0, 1)), Some(id));
        assert_eq!(roster.occupant(Loc::new(0, 0)), None);
        // Location field untouched until the effect layer writes it.
        assert_eq!(roster.get(id).unwrap().loc, Loc::new(0, 0));
    }

    #[test]
    fn test_lift_and_place() {
        let mut roster = Roster::new();
        let id = roster
            .register(UnitKind::Prospector, Loc::new(4, 4), Team::A)
            .unwrap();
        roster.lift(id);
        assert_eq!(roster.occupant(Loc::new(4, 4)), None);
        assert!(roster.contains(id));
        assert_eq!(roster.team_count(Team::A), 1);

        roster.place(id, Loc::new(5, 5));
        assert_eq!(roster.occupant(Loc::new(5, 5)), Some(id));
        assert_eq!(roster.get(id).unwrap().loc, Loc::new(5, 5));
    }

    #[test]
    fn test_spawn_order_is_stable() {
        let mut roster = Roster::new();
        let a = roster
            .register(UnitKind::Prospector, Loc::new(0, 0), Team::A)
            .unwrap();
        let b = roster
            .register(UnitKind::Prospector, Loc::new(1, 0), Team::B)
            .unwrap();
        let c = roster
            .register(UnitKind::Prospector, Loc::new(2, 0), Team::A)
            .unwrap();

        assert_eq!(roster.ids_in_spawn_order(), vec![a, b, c]);
        roster.remove(b);
        assert_eq!(roster.ids_in_spawn_order(), vec![a, c]);
    }
}
