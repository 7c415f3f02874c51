//! Unit kinds, the per-kind capability table, and per-unit state.

use serde::{Deserialize, Serialize};

use crate::world::Loc;

/// Unique identifier for a unit. Never reused within a match.
pub type UnitId = u32;

/// Local pollution slows cooldown recovery: a reset is scaled by
/// `1 + pollution / COOLDOWN_POLLUTION_DIVISOR`.
pub const COOLDOWN_POLLUTION_DIVISOR: f32 = 2000.0;

/// Local pollution shrinks sensing: the effective radius is
/// `base / (1 + pollution / SENSOR_POLLUTION_DIVISOR)`.
pub const SENSOR_POLLUTION_DIVISOR: f32 = 4000.0;

/// A team in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// First player team.
    A,
    /// Second player team.
    B,
    /// Units owned by the map itself (grazers).
    Neutral,
}

impl Team {
    /// Dense index for per-team arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::Neutral => 2,
        }
    }

    /// The opposing player team. Neutral has no opponent.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            Self::Neutral => Self::Neutral,
        }
    }
}

/// Enumerated capability profile of a unit.
///
/// All rules data lives in [`UnitSpec`]; a kind is just a key into the
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Mobile soup miner.
    Prospector,
    /// Mobile earth-mover: digs and deposits dirt.
    Dredger,
    /// Flying carrier: picks up and drops ground units.
    Courier,
    /// Neutral wanderer.
    Grazer,
    /// Stationary anti-courier gun.
    Harpoon,
    /// Converts carried soup into team soup; pollutes.
    Refinery,
    /// Low-throughput refiner that removes pollution.
    Scrubber,
    /// Starting structure: builds prospectors, refines, shoots.
    Depot,
    /// Builds dredgers.
    Workshop,
    /// Builds couriers.
    Hangar,
}

/// Capability flags and numeric limits for one unit kind.
///
/// One row of the rules table. Cooldowns are in round units; a value of
/// zero means the action leaves the unit immediately ready again.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)] // one capability flag per verb
pub struct UnitSpec {
    /// Kind that may build this one, if any.
    pub built_by: Option<UnitKind>,
    /// Cooldown applied to the builder after a successful build.
    pub build_cooldown: f32,
    /// Team soup cost to build.
    pub cost: u32,
    /// Carried-dirt cap.
    pub dirt_limit: u32,
    /// Carried-soup cap.
    pub soup_limit: u32,
    /// Cooldown after a move.
    pub move_cooldown: f32,
    /// Cooldown after a dig.
    pub dig_cooldown: f32,
    /// Cooldown after a dirt deposit.
    pub deposit_cooldown: f32,
    /// Cooldown after mining.
    pub mine_cooldown: f32,
    /// Cooldown after giving soup away.
    pub give_cooldown: f32,
    /// Cooldown after refining.
    pub refine_cooldown: f32,
    /// Cooldown after a pickup or drop.
    pub carry_cooldown: f32,
    /// Cooldown after a shot.
    pub shoot_cooldown: f32,
    /// Base sensor radius in cells.
    pub sensor_radius: i32,
    /// Radius of the pollution adjustment emitted by refining.
    pub pollution_radius: i32,
    /// Signed pollution delta applied per cell on refine.
    pub pollution_output: i32,
    /// Maximum soup refined per action.
    pub refine_limit: u32,
    /// Computation budget per turn, enforced by the sandbox.
    pub bytecode_limit: u32,
    /// Ignores elevation gaps when moving.
    pub flies: bool,
    /// Can pick up and drop carryable units.
    pub carries: bool,
    /// Can be picked up by a carrier.
    pub carryable: bool,
    /// Can be shot down.
    pub shootable: bool,
    /// Can move.
    pub moves: bool,
    /// Can dig dirt.
    pub digs: bool,
    /// Can deposit dirt.
    pub deposits: bool,
    /// Can mine soup.
    pub mines: bool,
    /// Can give carried soup to an adjacent refiner.
    pub gives: bool,
    /// Accepts given soup and can refine it.
    pub refines: bool,
    /// Can shoot shootable units.
    pub shoots: bool,
}

/// All-zeros, all-false base row.
const INERT: UnitSpec = UnitSpec {
    built_by: None,
    build_cooldown: 0.0,
    cost: 0,
    dirt_limit: 0,
    soup_limit: 0,
    move_cooldown: 0.0,
    dig_cooldown: 0.0,
    deposit_cooldown: 0.0,
    mine_cooldown: 0.0,
    give_cooldown: 0.0,
    refine_cooldown: 0.0,
    carry_cooldown: 0.0,
    shoot_cooldown: 0.0,
    sensor_radius: 0,
    pollution_radius: 0,
    pollution_output: 0,
    refine_limit: 0,
    bytecode_limit: 15_000,
    flies: false,
    carries: false,
    carryable: false,
    shootable: false,
    moves: false,
    digs: false,
    deposits: false,
    mines: false,
    gives: false,
    refines: false,
    shoots: false,
};

const PROSPECTOR: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Depot),
    build_cooldown: 20.0,
    cost: 10,
    soup_limit: 40,
    move_cooldown: 2.0,
    mine_cooldown: 5.0,
    give_cooldown: 1.0,
    sensor_radius: 8,
    moves: true,
    mines: true,
    gives: true,
    carryable: true,
    ..INERT
};

const DREDGER: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Workshop),
    build_cooldown: 20.0,
    cost: 10,
    dirt_limit: 40,
    move_cooldown: 4.0,
    dig_cooldown: 4.0,
    deposit_cooldown: 8.0,
    sensor_radius: 4,
    moves: true,
    digs: true,
    deposits: true,
    carryable: true,
    ..INERT
};

const COURIER: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Hangar),
    build_cooldown: 20.0,
    cost: 10,
    move_cooldown: 8.0,
    carry_cooldown: 1.0,
    sensor_radius: 4,
    moves: true,
    flies: true,
    carries: true,
    shootable: true,
    ..INERT
};

const GRAZER: UnitSpec = UnitSpec {
    move_cooldown: 6.0,
    sensor_radius: 1,
    bytecode_limit: 0,
    moves: true,
    carryable: true,
    ..INERT
};

const HARPOON: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Prospector),
    build_cooldown: 1.0,
    cost: 7,
    shoot_cooldown: 5.0,
    sensor_radius: 6,
    shoots: true,
    ..INERT
};

const REFINERY: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Prospector),
    build_cooldown: 5.0,
    cost: 20,
    soup_limit: 1_000,
    refine_cooldown: 1.0,
    pollution_radius: 4,
    pollution_output: 1,
    refine_limit: 10,
    refines: true,
    ..INERT
};

const SCRUBBER: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Prospector),
    build_cooldown: 5.0,
    cost: 20,
    soup_limit: 1_000,
    refine_cooldown: 1.0,
    pollution_radius: 4,
    pollution_output: -1,
    refine_limit: 5,
    refines: true,
    ..INERT
};

const DEPOT: UnitSpec = UnitSpec {
    cost: 20,
    soup_limit: 1_000,
    refine_cooldown: 1.0,
    shoot_cooldown: 5.0,
    sensor_radius: 7,
    pollution_radius: 4,
    pollution_output: 1,
    refine_limit: 10,
    refines: true,
    shoots: true,
    ..INERT
};

const WORKSHOP: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Prospector),
    build_cooldown: 5.0,
    cost: 20,
    ..INERT
};

const HANGAR: UnitSpec = UnitSpec {
    built_by: Some(UnitKind::Prospector),
    build_cooldown: 5.0,
    cost: 20,
    ..INERT
};

impl UnitKind {
    /// The rules-table row for this kind.
    #[must_use]
    pub const fn spec(self) -> &'static UnitSpec {
        match self {
            Self::Prospector => &PROSPECTOR,
            Self::Dredger => &DREDGER,
            Self::Courier => &COURIER,
            Self::Grazer => &GRAZER,
            Self::Harpoon => &HARPOON,
            Self::Refinery => &REFINERY,
            Self::Scrubber => &SCRUBBER,
            Self::Depot => &DEPOT,
            Self::Workshop => &WORKSHOP,
            Self::Hangar => &HANGAR,
        }
    }

    /// Check whether this kind is the declared build source of `target`.
    #[must_use]
    pub fn can_build(self, target: Self) -> bool {
        target.spec().built_by == Some(self)
    }
}

/// A live unit.
#[derive(Debug, Clone, Copy)]
pub struct Unit {
    /// Unique identifier, never reused.
    pub id: UnitId,
    /// Owning team.
    pub team: Team,
    /// Capability profile.
    pub kind: UnitKind,
    /// Current cell. While held by a carrier this tracks the carrier.
    pub loc: Loc,
    /// Continuous action cooldown; an action is legal when below 1.
    pub cooldown: f32,
    /// Carried crude soup.
    pub soup: u32,
    /// Carried dirt.
    pub dirt: u32,
    /// Unit currently held by this one, if any.
    pub held: Option<UnitId>,
    /// Computation used on the most recent turn, per the sandbox.
    pub bytecodes_used: u32,
}

impl Unit {
    /// Create a freshly spawned unit, immediately ready to act.
    #[must_use]
    pub const fn new(id: UnitId, kind: UnitKind, loc: Loc, team: Team) -> Self {
        Self {
            id,
            team,
            kind,
            loc,
            cooldown: 0.0,
            soup: 0,
            dirt: 0,
            held: None,
            bytecodes_used: 0,
        }
    }

    /// Whether the unit may take an action this turn.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown < 1.0
    }

    /// Beginning-of-round bookkeeping: cooldown drops by one, floored at
    /// zero.
    pub fn begin_round(&mut self) {
        self.cooldown = (self.cooldown - 1.0).max(0.0);
    }

    /// Reset the cooldown after a successful action.
    ///
    /// Pollution at the unit's cell stretches the reset.
    #[allow(clippy::cast_precision_loss)]
    pub fn reset_cooldown(&mut self, base: f32, pollution: u32) {
        self.cooldown = base * (1.0 + pollution as f32 / COOLDOWN_POLLUTION_DIVISOR);
    }

    /// Effective sensor radius under the given local pollution.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sensor_range(&self, pollution: u32) -> f32 {
        self.kind.spec().sensor_radius as f32 / (1.0 + pollution as f32 / SENSOR_POLLUTION_DIVISOR)
    }

    /// Whether `loc` is within sensor range under the given pollution.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn can_sense(&self, loc: Loc, pollution: u32) -> bool {
        self.loc.distance(loc) as f32 <= self.sensor_range(pollution)
    }

    /// Snapshot handed out by sensor queries.
    #[must_use]
    pub const fn info(&self) -> UnitInfo {
        UnitInfo {
            id: self.id,
            team: self.team,
            kind: self.kind,
            loc: self.loc,
            soup: self.soup,
            dirt: self.dirt,
            held: self.held,
        }
    }
}

/// Public snapshot of a sensed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInfo {
    /// Unit identifier.
    pub id: UnitId,
    /// Owning team.
    pub team: Team,
    /// Capability profile.
    pub kind: UnitKind,
    /// Cell the unit occupies (or its carrier's cell while held).
    pub loc: Loc,
    /// Carried crude soup.
    pub soup: u32,
    /// Carried dirt.
    pub dirt: u32,
    /// Identifier of a held unit, if any.
    pub held: Option<UnitId>,
}
