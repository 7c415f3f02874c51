//! Game world: state container, rules data, and the effect layer.
//!
//! Everything the round orchestrator mutates lives here:
//! - terrain (soup, pollution, elevation, flood)
//! - the unit roster and grid occupancy
//! - per-team soup accounts
//! - the paid broadcast queue and its history
//! - match stats and the effect layer handed to unit programs

mod broadcast;
mod controller;
mod ledger;
mod roster;
mod stats;
mod state;
mod terrain;
mod unit;

pub use broadcast::{BroadcastLog, Message, BROADCASTS_PER_ROUND, MAX_MESSAGE_WORDS};
pub use controller::{UnitController, MAX_ELEVATION_STEP, PICKUP_RADIUS, SHOOT_RADIUS};
pub use ledger::Ledger;
pub use roster::Roster;
pub use stats::{DominationFactor, GameStats};
pub use state::World;
pub(crate) use state::ControlNotice;
pub use terrain::{Loc, Terrain};
pub use unit::{
    Team, Unit, UnitId, UnitInfo, UnitKind, UnitSpec, COOLDOWN_POLLUTION_DIVISOR,
    SENSOR_POLLUTION_DIVISOR,
};
