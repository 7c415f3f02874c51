// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Brine: a deterministic round engine for grid-based programming games.
//!
//! The engine advances a shared grid world one discrete round at a time.
//! Each round, every live unit gets exactly one turn of its (untrusted,
//! externally sandboxed) program, which acts on the world through a
//! narrow validated capability surface. Determinism comes from one rule:
//! turns run strictly sequentially in spawn order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     Round Orchestrator (Match)      │
//! ├──────────────────┬──────────────────┤
//! │  Control Provider│  Replay Writer   │
//! ├──────────────────┴──────────────────┤
//! │  Effect Layer (UnitController)      │
//! ├─────────────────────────────────────┤
//! │  World: terrain · roster · ledger   │
//! │         broadcasts · stats          │
//! └─────────────────────────────────────┘
//! ```

pub mod control;
pub mod engine;
pub mod error;
pub mod mapgen;
pub mod replay;
pub mod world;

pub use control::{ControlError, ControlProvider, IdleControl, Script, ScriptedControl};
pub use engine::{Match, MatchState};
pub use error::{GameError, GameResult};
pub use mapgen::{generate_map, InitialMap, MapBuilder, MapError, Placement};
pub use replay::{
    ActionKind, Event, NullReplay, Recording, ReplayError, ReplayWriter, SharedRecording,
};
pub use world::{
    BroadcastLog, DominationFactor, GameStats, Ledger, Loc, Message, Roster, Team, Terrain, Unit,
    UnitController, UnitId, UnitInfo, UnitKind, UnitSpec, World, BROADCASTS_PER_ROUND,
    MAX_ELEVATION_STEP, MAX_MESSAGE_WORDS, PICKUP_RADIUS, SHOOT_RADIUS,
};
