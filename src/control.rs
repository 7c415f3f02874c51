//! Control provider contract: the seam between the engine and the
//! sandbox that executes untrusted unit programs.
//!
//! The engine treats execution as synchronous and opaque: it hands the
//! provider a [`UnitController`] for exactly one unit-turn and blocks
//! until the provider returns. Budget metering, isolation strategy
//! (thread, process or interpreter) and program faults are all the
//! provider's business; the engine only sees the narrow interface below.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::GameError;
use crate::world::{UnitController, UnitId, World};

/// Fault reported by a control provider.
///
/// An unhandled fault during a turn abandons the match: the orchestrator
/// reports it and transitions to Done rather than crashing the process.
#[derive(Debug, Clone)]
pub struct ControlError {
    /// Description of the fault.
    pub message: String,
}

impl ControlError {
    /// Create a new control fault.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "control provider fault: {}", self.message)
    }
}

impl std::error::Error for ControlError {}

impl From<GameError> for ControlError {
    /// A game error that escapes a unit program unhandled is a program
    /// fault, not a recoverable rule failure.
    fn from(err: GameError) -> Self {
        Self::new(err.to_string())
    }
}

/// Executes unit programs for the round orchestrator.
///
/// Notification hooks have no-op defaults; only [`run_unit`] is
/// mandatory.
///
/// [`run_unit`]: ControlProvider::run_unit
pub trait ControlProvider {
    /// The match is starting with the given world.
    fn match_started(&mut self, world: &World) {
        let _ = world;
    }

    /// A round is starting.
    fn round_started(&mut self) {}

    /// Execute one turn of the unit's program.
    ///
    /// The program may call any number of predicates and effects through
    /// the controller; the engine applies game legality, the provider
    /// applies the computation budget.
    ///
    /// # Errors
    ///
    /// An error abandons the match.
    fn run_unit(&mut self, ctl: &mut UnitController<'_>) -> Result<(), ControlError>;

    /// Computation used by the unit's most recent turn.
    fn bytecodes_used(&self, id: UnitId) -> u32 {
        let _ = id;
        0
    }

    /// Whether the unit's program has terminated (crash, timeout or
    /// explicit exit). The engine destroys such units exactly once, even
    /// when termination is observed a turn late.
    fn terminated(&self, id: UnitId) -> bool {
        let _ = id;
        false
    }

    /// A unit entered the world.
    fn unit_spawned(&mut self, id: UnitId) {
        let _ = id;
    }

    /// A unit left the world.
    fn unit_killed(&mut self, id: UnitId) {
        let _ = id;
    }

    /// The round ended.
    fn round_ended(&mut self) {}

    /// The match ended.
    fn match_ended(&mut self) {}
}

/// Provider whose units do nothing. Useful as a baseline and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleControl;

impl ControlProvider for IdleControl {
    fn run_unit(&mut self, _ctl: &mut UnitController<'_>) -> Result<(), ControlError> {
        Ok(())
    }
}

/// A deterministic per-unit program.
pub type Script = Box<dyn FnMut(&mut UnitController<'_>) -> Result<(), ControlError>>;

/// Provider driven by per-unit closures.
///
/// Units without a script idle. Marking a unit terminated makes the
/// orchestrator destroy it after its next turn, mimicking a sandbox
/// reporting a dead program.
#[derive(Default)]
pub struct ScriptedControl {
    scripts: HashMap<UnitId, Script>,
    terminated: HashSet<UnitId>,
}

impl fmt::Debug for ScriptedControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedControl")
            .field("scripts", &self.scripts.len())
            .field("terminated", &self.terminated)
            .finish()
    }
}

impl ScriptedControl {
    /// Create a provider with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a program to a unit.
    pub fn set_script(&mut self, id: UnitId, script: Script) {
        self.scripts.insert(id, script);
    }

    /// Report a unit's program as terminated.
    pub fn mark_terminated(&mut self, id: UnitId) {
        self.terminated.insert(id);
    }
}

impl ControlProvider for ScriptedControl {
    fn run_unit(&mut self, ctl: &mut UnitController<'_>) -> Result<(), ControlError> {
        match self.scripts.get_mut(&ctl.id()) {
            Some(script) => script(ctl),
            None => Ok(()),
        }
    }

    fn terminated(&self, id: UnitId) -> bool {
        self.terminated.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_error_becomes_control_fault() {
        let err = ControlError::from(GameError::NotReady { cooldown: 3.0 });
        assert!(format!("{err}").contains("cooldown"));
    }

    #[test]
    fn test_scripted_control_termination_flag() {
        let mut control = ScriptedControl::new();
        assert!(!control.terminated(4));
        control.mark_terminated(4);
        assert!(control.terminated(4));
        assert!(!control.terminated(5));
    }
}
