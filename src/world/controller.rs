//! Action validation and effect layer.
//!
//! A [`UnitController`] is the narrow capability surface handed to the
//! sandbox for exactly one unit-turn. Every capability comes as a pair: a
//! total predicate (`can_*`, never fails, safe to call speculatively) and
//! an effect that re-validates internally and only then mutates state,
//! emitting exactly one action event to the replay writer. Validation is
//! fully separated from mutation, so a failed effect never leaves a
//! partial change behind.

use crate::error::{GameError, GameResult};
use crate::replay::{ActionKind, Event, ReplayWriter};
use crate::world::{Loc, Message, Team, UnitId, UnitInfo, UnitKind, World, MAX_MESSAGE_WORDS};

/// Largest elevation gap a ground unit can step across.
pub const MAX_ELEVATION_STEP: i32 = 3;

/// Carrier pickup range in cells.
pub const PICKUP_RADIUS: i32 = 3;

/// Shooting range in cells.
pub const SHOOT_RADIUS: i32 = 6;

/// One unit's handle on the world for the duration of its turn.
pub struct UnitController<'a> {
    world: &'a mut World,
    replay: &'a mut dyn ReplayWriter,
    id: UnitId,
    team: Team,
    kind: UnitKind,
}

// Manual Debug since the replay writer is a bare trait object.
impl std::fmt::Debug for UnitController<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitController")
            .field("id", &self.id)
            .field("team", &self.team)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<'a> UnitController<'a> {
    /// Create a controller for a live unit.
    ///
    /// # Errors
    ///
    /// Fails when the unit is not registered.
    pub(crate) fn new(
        world: &'a mut World,
        replay: &'a mut dyn ReplayWriter,
        id: UnitId,
    ) -> GameResult<Self> {
        let unit = world.roster.get(id).ok_or(GameError::CantDoThat {
            reason: "acting unit is not registered",
        })?;
        let team = unit.team;
        let kind = unit.kind;
        Ok(Self {
            world,
            replay,
            id,
            team,
            kind,
        })
    }

    fn me(&self) -> GameResult<&crate::world::Unit> {
        self.world.roster.get(self.id).ok_or(GameError::CantDoThat {
            reason: "acting unit is no longer registered",
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// This unit's id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// This unit's team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// This unit's kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// The round currently being played.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.world.round()
    }

    /// The configured round limit.
    #[must_use]
    pub const fn round_limit(&self) -> u32 {
        self.world.round_limit()
    }

    /// This team's soup balance.
    #[must_use]
    pub const fn team_soup(&self) -> u32 {
        self.world.team_soup(self.team)
    }

    /// Number of live units on this team.
    #[must_use]
    pub const fn team_count(&self) -> u32 {
        self.world.team_count(self.team)
    }

    /// This unit's current cell.
    ///
    /// # Errors
    ///
    /// Fails when the unit is no longer registered.
    pub fn loc(&self) -> GameResult<Loc> {
        Ok(self.me()?.loc)
    }

    /// Carried crude soup.
    ///
    /// # Errors
    ///
    /// Fails when the unit is no longer registered.
    pub fn soup_carried(&self) -> GameResult<u32> {
        Ok(self.me()?.soup)
    }

    /// Carried dirt.
    ///
    /// # Errors
    ///
    /// Fails when the unit is no longer registered.
    pub fn dirt_carried(&self) -> GameResult<u32> {
        Ok(self.me()?.dirt)
    }

    /// Remaining cooldown turns.
    ///
    /// # Errors
    ///
    /// Fails when the unit is no longer registered.
    pub fn cooldown(&self) -> GameResult<f32> {
        Ok(self.me()?.cooldown)
    }

    /// Whether an action is legal this turn (cooldown below 1).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.me().is_ok_and(|unit| unit.is_ready())
    }

    /// Whether this unit currently holds another unit.
    ///
    /// # Errors
    ///
    /// Fails when the unit is no longer registered.
    pub fn is_holding(&self) -> GameResult<bool> {
        Ok(self.me()?.held.is_some())
    }

    // ------------------------------------------------------------------
    // Sensing
    // ------------------------------------------------------------------

    /// Whether a location is on the grid.
    #[must_use]
    pub fn on_grid(&self, loc: Loc) -> bool {
        self.world.terrain.on_grid(loc)
    }

    fn pollution_here(&self) -> GameResult<u32> {
        Ok(self.world.terrain.pollution(self.me()?.loc))
    }

    /// Whether a location is within this unit's current sensor range.
    ///
    /// Pollution at the unit's own cell shrinks the range.
    #[must_use]
    pub fn can_sense_loc(&self, loc: Loc) -> bool {
        self.me().is_ok_and(|unit| {
            let pollution = self.world.terrain.pollution(unit.loc);
            unit.can_sense(loc, pollution)
        })
    }

    fn check_sense(&self, loc: Loc) -> GameResult<()> {
        if self.can_sense_loc(loc) {
            Ok(())
        } else {
            Err(GameError::CantSenseThat { loc })
        }
    }

    /// Soup at a sensed location.
    ///
    /// # Errors
    ///
    /// `CantSenseThat` outside sensor range.
    pub fn sense_soup(&self, loc: Loc) -> GameResult<u32> {
        self.check_sense(loc)?;
        Ok(self.world.terrain.soup(loc))
    }

    /// Pollution at a sensed location.
    ///
    /// # Errors
    ///
    /// `CantSenseThat` outside sensor range.
    pub fn sense_pollution(&self, loc: Loc) -> GameResult<u32> {
        self.check_sense(loc)?;
        Ok(self.world.terrain.pollution(loc))
    }

    /// Elevation at a sensed location.
    ///
    /// # Errors
    ///
    /// `CantSenseThat` outside sensor range.
    pub fn sense_elevation(&self, loc: Loc) -> GameResult<i32> {
        self.check_sense(loc)?;
        Ok(self.world.terrain.elevation(loc))
    }

    /// Flood state at a sensed location.
    ///
    /// # Errors
    ///
    /// `CantSenseThat` outside sensor range.
    pub fn sense_flooded(&self, loc: Loc) -> GameResult<bool> {
        self.check_sense(loc)?;
        Ok(self.world.terrain.flooded(loc))
    }

    /// Whether a sensed cell is occupied.
    ///
    /// # Errors
    ///
    /// `CantSenseThat` outside sensor range.
    pub fn is_occupied(&self, loc: Loc) -> GameResult<bool> {
        self.check_sense(loc)?;
        Ok(self.world.roster.occupant(loc).is_some())
    }

    /// Snapshot of the unit occupying a sensed cell, if any.
    ///
    /// # Errors
    ///
    /// `CantSenseThat` outside sensor range.
    pub fn sense_unit_at(&self, loc: Loc) -> GameResult<Option<UnitInfo>> {
        self.check_sense(loc)?;
        Ok(self.world.roster.at(loc).map(crate::world::Unit::info))
    }

    /// Whether the unit with this id exists and is within sensor range.
    #[must_use]
    pub fn can_sense_unit(&self, id: UnitId) -> bool {
        self.world
            .roster
            .get(id)
            .is_some_and(|unit| self.can_sense_loc(unit.loc))
    }

    /// Snapshot of a sensed unit. Absence means "not sensed or not
    /// existent" — the two are indistinguishable by design.
    ///
    /// # Errors
    ///
    /// `CantSenseThat` when the unit is unknown or out of range.
    pub fn sense_unit(&self, id: UnitId) -> GameResult<UnitInfo> {
        let Some(unit) = self.world.roster.get(id) else {
            return Err(GameError::CantSenseThat {
                loc: self.me()?.loc,
            });
        };
        self.check_sense(unit.loc)?;
        Ok(unit.info())
    }

    /// Snapshots of all sensed units near this one, excluding itself.
    ///
    /// `radius` of `None` means the current sensor range; a team filter
    /// keeps only that team's units.
    ///
    /// # Errors
    ///
    /// Fails when the acting unit is no longer registered.
    #[allow(clippy::cast_possible_truncation)]
    pub fn sense_nearby(
        &self,
        radius: Option<i32>,
        team: Option<Team>,
    ) -> GameResult<Vec<UnitInfo>> {
        let center = self.me()?.loc;
        let range = match radius {
            Some(r) => r,
            None => {
                let pollution = self.pollution_here()?;
                self.me()?.sensor_range(pollution).ceil() as i32
            }
        };

        let mut found = Vec::new();
        for loc in self.world.terrain.locations_within(center, range) {
            let Some(unit) = self.world.roster.at(loc) else {
                continue;
            };
            if unit.id == self.id || !self.can_sense_loc(loc) {
                continue;
            }
            if team.is_some_and(|t| t != unit.team) {
                continue;
            }
            found.push(unit.info());
        }
        Ok(found)
    }

    // ------------------------------------------------------------------
    // Shared checks
    // ------------------------------------------------------------------

    fn check_ready(&self) -> GameResult<()> {
        let unit = self.me()?;
        if unit.is_ready() {
            Ok(())
        } else {
            Err(GameError::NotReady {
                cooldown: unit.cooldown,
            })
        }
    }

    fn check_adjacent(&self, to: Loc, reason: &'static str) -> GameResult<()> {
        if self.me()?.loc.is_within(to, 1) {
            Ok(())
        } else {
            Err(GameError::CantDoThat { reason })
        }
    }

    fn check_on_grid(&self, to: Loc, reason: &'static str) -> GameResult<()> {
        if self.world.terrain.on_grid(to) {
            Ok(())
        } else {
            Err(GameError::CantDoThat { reason })
        }
    }

    fn reset_cooldown(&mut self, base: f32) {
        let Some(loc) = self.world.roster.get(self.id).map(|unit| unit.loc) else {
            return;
        };
        let pollution = self.world.terrain.pollution(loc);
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.reset_cooldown(base, pollution);
        }
    }

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    fn check_move(&self, to: Loc) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().moves {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot move",
            });
        }
        self.check_ready()?;
        let from = unit.loc;
        let blocked = !self.world.terrain.on_grid(to)
            || from.distance(to) > 1
            || self
                .world
                .roster
                .occupant(to)
                .is_some_and(|occupant| occupant != self.id)
            || (!unit.kind.spec().flies
                && self.world.terrain.elevation_gap(from, to) > MAX_ELEVATION_STEP);
        if blocked {
            return Err(GameError::CantMoveThere { from, to });
        }
        Ok(())
    }

    /// Whether a move to `to` would succeed.
    #[must_use]
    pub fn can_move(&self, to: Loc) -> bool {
        self.check_move(to).is_ok()
    }

    /// Move to an adjacent cell. A held passenger moves along without a
    /// cooldown reset of its own.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for a non-moving kind, `NotReady` under cooldown,
    /// `CantMoveThere` for any other violated movement rule.
    pub fn move_to(&mut self, to: Loc) -> GameResult<()> {
        self.check_move(to)?;
        let from = self.me()?.loc;

        // Reset against pollution at the departure cell.
        self.reset_cooldown(self.kind.spec().move_cooldown);

        self.world.roster.relocate(from, to);
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.loc = to;
        }
        self.replay.record(Event::Moved { id: self.id, loc: to });

        let passenger = self.me()?.held;
        if let Some(passenger) = passenger {
            if let Some(unit) = self.world.roster.get_mut(passenger) {
                unit.loc = to;
            }
            self.replay.record(Event::Moved {
                id: passenger,
                loc: to,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    fn check_build(&self, kind: UnitKind, to: Loc) -> GameResult<()> {
        if !self.kind.can_build(kind) {
            return Err(GameError::CantDoThat {
                reason: "this kind is not the build source of the target kind",
            });
        }
        self.check_ready()?;
        self.check_on_grid(to, "build cell is off the grid")?;
        self.check_adjacent(to, "build cell is not adjacent")?;
        if self.world.roster.occupant(to).is_some() {
            return Err(GameError::CantDoThat {
                reason: "build cell is occupied",
            });
        }
        let cost = kind.spec().cost;
        let available = self.world.team_soup(self.team);
        if available < cost {
            return Err(GameError::NotEnoughResource {
                needed: cost,
                available,
            });
        }
        Ok(())
    }

    /// Whether building `kind` at `to` would succeed.
    #[must_use]
    pub fn can_build(&self, kind: UnitKind, to: Loc) -> bool {
        self.check_build(kind, to).is_ok()
    }

    /// Build a unit of `kind` on an adjacent cell, paying its soup cost.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/cell violations, `NotReady` under
    /// cooldown, `NotEnoughResource` when the team cannot pay.
    #[allow(clippy::cast_possible_wrap)]
    pub fn build(&mut self, kind: UnitKind, to: Loc) -> GameResult<UnitId> {
        self.check_build(kind, to)?;
        self.reset_cooldown(kind.spec().build_cooldown);
        self.world.ledger.adjust(self.team, -(kind.spec().cost as i32));
        let new_id = self.world.spawn_unit(kind, to, self.team, &mut *self.replay)?;
        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::Build,
            target: Some(new_id),
        });
        Ok(new_id)
    }

    // ------------------------------------------------------------------
    // Mining and soup transfer
    // ------------------------------------------------------------------

    fn check_mine(&self, at: Loc) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().mines {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot mine",
            });
        }
        self.check_ready()?;
        self.check_on_grid(at, "mine cell is off the grid")?;
        self.check_adjacent(at, "mine cell is not adjacent")?;
        if unit.soup >= unit.kind.spec().soup_limit {
            return Err(GameError::CantDoThat {
                reason: "soup hold is full",
            });
        }
        if self.world.terrain.soup(at) == 0 {
            return Err(GameError::CantDoThat {
                reason: "no soup to mine there",
            });
        }
        Ok(())
    }

    /// Whether mining at `at` would succeed.
    #[must_use]
    pub fn can_mine(&self, at: Loc) -> bool {
        self.check_mine(at).is_ok()
    }

    /// Mine one soup unit from an adjacent cell.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/cell/limit violations, `NotReady`
    /// under cooldown.
    pub fn mine(&mut self, at: Loc) -> GameResult<()> {
        self.check_mine(at)?;
        self.reset_cooldown(self.kind.spec().mine_cooldown);
        self.world.terrain.remove_soup(at, 1);
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.soup += 1;
        }
        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::Mine,
            target: None,
        });
        Ok(())
    }

    fn check_give(&self, to: Loc, amount: u32) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().gives {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot give soup",
            });
        }
        self.check_ready()?;
        self.check_on_grid(to, "give cell is off the grid")?;
        self.check_adjacent(to, "give cell is not adjacent")?;
        if amount > unit.soup {
            return Err(GameError::NotEnoughResource {
                needed: amount,
                available: unit.soup,
            });
        }
        match self.world.roster.at(to) {
            None => Err(GameError::CantDoThat {
                reason: "no unit there to receive soup",
            }),
            Some(recipient) if !recipient.kind.spec().refines => Err(GameError::CantDoThat {
                reason: "receiving unit cannot refine",
            }),
            Some(recipient) if recipient.soup + amount > recipient.kind.spec().soup_limit => {
                Err(GameError::CantDoThat {
                    reason: "receiving unit's hold is full",
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Whether giving `amount` soup to the occupant of `to` would
    /// succeed.
    #[must_use]
    pub fn can_give(&self, to: Loc, amount: u32) -> bool {
        self.check_give(to, amount).is_ok()
    }

    /// Transfer carried soup to an adjacent refiner.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/recipient violations, `NotReady`
    /// under cooldown, `NotEnoughResource` when carrying less than
    /// `amount`.
    pub fn give(&mut self, to: Loc, amount: u32) -> GameResult<()> {
        self.check_give(to, amount)?;
        self.reset_cooldown(self.kind.spec().give_cooldown);
        let recipient = self.world.roster.occupant(to);
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.soup -= amount;
        }
        if let Some(recipient) = recipient {
            if let Some(unit) = self.world.roster.get_mut(recipient) {
                unit.soup += amount;
            }
        }
        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::Give,
            target: recipient,
        });
        Ok(())
    }

    fn check_refine(&self, amount: u32) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().refines {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot refine",
            });
        }
        self.check_ready()?;
        if amount == 0 {
            return Err(GameError::CantDoThat {
                reason: "refine amount must be positive",
            });
        }
        if amount > unit.kind.spec().refine_limit {
            return Err(GameError::CantDoThat {
                reason: "refine amount exceeds per-action throughput",
            });
        }
        if amount > unit.soup {
            return Err(GameError::NotEnoughResource {
                needed: amount,
                available: unit.soup,
            });
        }
        Ok(())
    }

    /// Whether refining `amount` soup would succeed.
    #[must_use]
    pub fn can_refine(&self, amount: u32) -> bool {
        self.check_refine(amount).is_ok()
    }

    /// Refine carried crude soup into the team balance. Emits this
    /// kind's pollution output over its pollution radius.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/amount violations, `NotReady` under
    /// cooldown, `NotEnoughResource` when carrying less than `amount`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn refine(&mut self, amount: u32) -> GameResult<()> {
        self.check_refine(amount)?;
        self.reset_cooldown(self.kind.spec().refine_cooldown);

        let loc = self.me()?.loc;
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.soup -= amount;
        }
        self.world.ledger.adjust(self.team, amount as i32);

        let spec = self.kind.spec();
        if spec.pollution_output != 0 {
            for cell in self.world.terrain.locations_within(loc, spec.pollution_radius) {
                let applied = self.world.terrain.adjust_pollution(cell, spec.pollution_output);
                if applied != 0 {
                    self.replay.record(Event::PollutionChanged {
                        loc: cell,
                        delta: applied,
                    });
                }
            }
        }

        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::Refine,
            target: None,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dirt work
    // ------------------------------------------------------------------

    fn check_dig(&self, at: Loc) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().digs {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot dig",
            });
        }
        self.check_ready()?;
        self.check_on_grid(at, "dig cell is off the grid")?;
        self.check_adjacent(at, "dig cell is not adjacent")?;
        if unit.dirt >= unit.kind.spec().dirt_limit {
            return Err(GameError::CantDoThat {
                reason: "dirt hold is full",
            });
        }
        Ok(())
    }

    /// Whether digging at `at` would succeed.
    #[must_use]
    pub fn can_dig(&self, at: Loc) -> bool {
        self.check_dig(at).is_ok()
    }

    /// Dig one dirt unit from an adjacent cell, lowering its elevation.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/cell/limit violations, `NotReady`
    /// under cooldown.
    pub fn dig(&mut self, at: Loc) -> GameResult<()> {
        self.check_dig(at)?;
        self.reset_cooldown(self.kind.spec().dig_cooldown);
        self.world.terrain.add_dirt(at, -1);
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.dirt += 1;
        }
        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::Dig,
            target: None,
        });
        Ok(())
    }

    fn check_deposit(&self, at: Loc) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().deposits {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot deposit dirt",
            });
        }
        self.check_ready()?;
        self.check_on_grid(at, "deposit cell is off the grid")?;
        self.check_adjacent(at, "deposit cell is not adjacent")?;
        if unit.dirt == 0 {
            return Err(GameError::CantDoThat {
                reason: "no dirt to deposit",
            });
        }
        Ok(())
    }

    /// Whether depositing at `at` would succeed.
    #[must_use]
    pub fn can_deposit(&self, at: Loc) -> bool {
        self.check_deposit(at).is_ok()
    }

    /// Deposit one dirt unit onto an adjacent cell, raising its
    /// elevation (and possibly unflooding it).
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/cell violations, `NotReady` under
    /// cooldown.
    pub fn deposit(&mut self, at: Loc) -> GameResult<()> {
        self.check_deposit(at)?;
        self.reset_cooldown(self.kind.spec().deposit_cooldown);
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.dirt -= 1;
        }
        self.world.terrain.add_dirt(at, 1);
        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::Deposit,
            target: None,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Carrying
    // ------------------------------------------------------------------

    fn check_pick_up(&self, target: UnitId) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().carries {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot carry units",
            });
        }
        self.check_ready()?;
        if unit.held.is_some() {
            return Err(GameError::CantDoThat {
                reason: "already holding a unit",
            });
        }
        let Some(other) = self.world.roster.get(target) else {
            return Err(GameError::CantDoThat {
                reason: "no such unit to pick up",
            });
        };
        if !other.kind.spec().carryable {
            return Err(GameError::CantDoThat {
                reason: "that unit cannot be carried",
            });
        }
        if self.world.roster.occupant(other.loc) != Some(target) {
            return Err(GameError::CantDoThat {
                reason: "that unit is already held",
            });
        }
        if !unit.loc.is_within(other.loc, PICKUP_RADIUS) {
            return Err(GameError::CantDoThat {
                reason: "that unit is out of pickup range",
            });
        }
        Ok(())
    }

    /// Whether picking up `target` would succeed.
    #[must_use]
    pub fn can_pick_up_unit(&self, target: UnitId) -> bool {
        self.check_pick_up(target).is_ok()
    }

    /// Pick up a carryable unit within range. The passenger leaves grid
    /// occupancy and rides along until dropped.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/target violations, `NotReady` under
    /// cooldown.
    pub fn pick_up_unit(&mut self, target: UnitId) -> GameResult<()> {
        self.check_pick_up(target)?;
        self.reset_cooldown(self.kind.spec().carry_cooldown);

        let my_loc = self.me()?.loc;
        self.world.roster.lift(target);
        if let Some(unit) = self.world.roster.get_mut(target) {
            unit.loc = my_loc;
        }
        if let Some(unit) = self.world.roster.get_mut(self.id) {
            unit.held = Some(target);
        }
        self.replay.record(Event::Moved {
            id: target,
            loc: my_loc,
        });
        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::PickUp,
            target: Some(target),
        });
        Ok(())
    }

    fn check_drop(&self, to: Loc) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().carries {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot carry units",
            });
        }
        self.check_ready()?;
        if unit.held.is_none() {
            return Err(GameError::CantDoThat {
                reason: "not holding a unit",
            });
        }
        self.check_on_grid(to, "drop cell is off the grid")?;
        self.check_adjacent(to, "drop cell is not adjacent")?;
        Ok(())
    }

    /// Whether dropping the held unit at `to` would succeed.
    ///
    /// An occupied or flooded target is still a legal drop; it destroys
    /// the passenger as a consequence, not a precondition failure.
    #[must_use]
    pub fn can_drop_unit(&self, to: Loc) -> bool {
        self.check_drop(to).is_ok()
    }

    /// Drop the held unit onto an adjacent cell.
    ///
    /// Dropping onto an occupied or flooded cell destroys the passenger
    /// — an un-rescindable consequence of the drop.
    ///
    /// # Errors
    ///
    /// `CantDoThat` when not carrying or for cell violations, `NotReady`
    /// under cooldown.
    pub fn drop_unit(&mut self, to: Loc) -> GameResult<()> {
        self.check_drop(to)?;
        self.reset_cooldown(self.kind.spec().carry_cooldown);

        let Some(passenger) = self
            .world
            .roster
            .get_mut(self.id)
            .and_then(|unit| unit.held.take())
        else {
            return Err(GameError::CantDoThat {
                reason: "not holding a unit",
            });
        };

        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::DropOff,
            target: Some(passenger),
        });

        let doomed =
            self.world.roster.occupant(to).is_some() || self.world.terrain.flooded(to);
        if doomed {
            if let Some(unit) = self.world.roster.get_mut(passenger) {
                unit.loc = to;
            }
            self.world.destroy_unit(passenger, &mut *self.replay);
        } else {
            self.world.roster.place(passenger, to);
            self.replay.record(Event::Moved {
                id: passenger,
                loc: to,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shooting
    // ------------------------------------------------------------------

    fn check_shoot(&self, target: UnitId) -> GameResult<()> {
        let unit = self.me()?;
        if !unit.kind.spec().shoots {
            return Err(GameError::CantDoThat {
                reason: "this kind cannot shoot",
            });
        }
        self.check_ready()?;
        let Some(other) = self.world.roster.get(target) else {
            return Err(GameError::CantDoThat {
                reason: "no such unit to shoot",
            });
        };
        if !other.kind.spec().shootable {
            return Err(GameError::CantDoThat {
                reason: "that unit cannot be shot down",
            });
        }
        if !unit.loc.is_within(other.loc, SHOOT_RADIUS) {
            return Err(GameError::CantDoThat {
                reason: "that unit is out of range",
            });
        }
        Ok(())
    }

    /// Whether shooting `target` would succeed.
    #[must_use]
    pub fn can_shoot(&self, target: UnitId) -> bool {
        self.check_shoot(target).is_ok()
    }

    /// Shoot a shootable unit within range, destroying it immediately.
    ///
    /// # Errors
    ///
    /// `CantDoThat` for capability/target violations, `NotReady` under
    /// cooldown.
    pub fn shoot(&mut self, target: UnitId) -> GameResult<()> {
        self.check_shoot(target)?;
        self.reset_cooldown(self.kind.spec().shoot_cooldown);
        self.replay.record(Event::Action {
            id: self.id,
            kind: ActionKind::Shoot,
            target: Some(target),
        });
        self.world.destroy_unit(target, &mut *self.replay);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Broadcasts
    // ------------------------------------------------------------------

    /// Submit a paid message to the broadcast queue.
    ///
    /// The message competes in this round's own end-of-round drain. No
    /// cooldown applies.
    ///
    /// # Errors
    ///
    /// `MessageTooLong` over the word limit, `NotEnoughResource` when
    /// the team balance cannot cover `cost`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn send_message(&mut self, payload: Vec<i32>, cost: u32) -> GameResult<()> {
        if payload.len() > MAX_MESSAGE_WORDS {
            return Err(GameError::MessageTooLong {
                len: payload.len(),
                max: MAX_MESSAGE_WORDS,
            });
        }
        let available = self.world.team_soup(self.team);
        if available < cost {
            return Err(GameError::NotEnoughResource {
                needed: cost,
                available,
            });
        }
        self.world.ledger.adjust(self.team, -(cost as i32));
        let message = Message { cost, payload };
        self.replay.record(Event::MessageEnqueued {
            message: message.clone(),
        });
        self.world.broadcasts.enqueue(message);
        Ok(())
    }

    /// Messages broadcast at the end of a past round.
    ///
    /// # Errors
    ///
    /// `RoundOutOfRange` for negative, zero, current or future rounds.
    #[allow(clippy::cast_sign_loss)]
    pub fn round_messages(&self, round: i32) -> GameResult<Vec<Message>> {
        let current = self.world.round();
        if round < 1 || round as u32 >= current {
            return Err(GameError::RoundOutOfRange { round, current });
        }
        Ok(self
            .world
            .broadcasts
            .round_list(round as u32)
            .map(<[Message]>::to_vec)
            .unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Indicators
    // ------------------------------------------------------------------

    /// Attach a debug dot annotation to the replay. No game effect.
    pub fn indicator_dot(&mut self, loc: Loc, color: (u8, u8, u8)) {
        self.replay.record(Event::IndicatorDot {
            id: self.id,
            loc,
            color,
        });
    }

    /// Attach a debug line annotation to the replay. No game effect.
    pub fn indicator_line(&mut self, from: Loc, to: Loc, color: (u8, u8, u8)) {
        self.replay.record(Event::IndicatorLine {
            id: self.id,
            from,
            to,
            color,
        });
    }
}
