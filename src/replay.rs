//! Replay writer contract and an in-memory recording implementation.
//!
//! The engine reports everything that happens to a [`ReplayWriter`] as
//! pure notifications; writer failures are not the engine's concern, so
//! the interface is infallible. [`Recording`] collects the event stream
//! grouped by round and serializes it to JSON.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mapgen::InitialMap;
use crate::world::{Loc, Message, Team, UnitId, UnitKind};

/// Action kinds reported in replay events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// A unit built another unit.
    Build,
    /// A unit mined soup.
    Mine,
    /// A unit gave carried soup to a refiner.
    Give,
    /// A unit refined carried soup into team soup.
    Refine,
    /// A unit dug dirt.
    Dig,
    /// A unit deposited dirt.
    Deposit,
    /// A carrier picked up a unit.
    PickUp,
    /// A carrier dropped a unit.
    DropOff,
    /// A unit shot another unit down.
    Shoot,
}

/// One replay notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A unit entered the world.
    Spawned {
        /// New unit id.
        id: UnitId,
        /// Its kind.
        kind: UnitKind,
        /// Its team.
        team: Team,
        /// Its spawn cell.
        loc: Loc,
    },
    /// A unit's recorded location changed.
    Moved {
        /// Unit id.
        id: UnitId,
        /// New location.
        loc: Loc,
    },
    /// A unit performed an action.
    Action {
        /// Acting unit.
        id: UnitId,
        /// What it did.
        kind: ActionKind,
        /// Auxiliary target unit, when the action has one.
        target: Option<UnitId>,
    },
    /// A unit left the world.
    Died {
        /// Unit id.
        id: UnitId,
    },
    /// Pollution changed at a cell.
    PollutionChanged {
        /// Affected cell.
        loc: Loc,
        /// Applied (post-clamp) delta.
        delta: i32,
    },
    /// End-of-round team resource snapshot.
    TeamSoup {
        /// Team the balance belongs to.
        team: Team,
        /// Balance at end of round.
        amount: u32,
    },
    /// A paid message entered the broadcast queue.
    MessageEnqueued {
        /// The message.
        message: Message,
    },
    /// A message was broadcast by the end-of-round drain.
    MessageBroadcast {
        /// The message.
        message: Message,
    },
    /// Debug dot annotation.
    IndicatorDot {
        /// Annotating unit.
        id: UnitId,
        /// Dot location.
        loc: Loc,
        /// RGB color.
        color: (u8, u8, u8),
    },
    /// Debug line annotation.
    IndicatorLine {
        /// Annotating unit.
        id: UnitId,
        /// Line start.
        from: Loc,
        /// Line end.
        to: Loc,
        /// RGB color.
        color: (u8, u8, u8),
    },
}

/// Sink for replay notifications.
///
/// Every method has a no-op default so writers implement only what they
/// need.
pub trait ReplayWriter {
    /// Match header: the initial map.
    fn match_header(&mut self, map: &InitialMap) {
        let _ = map;
    }

    /// One in-round event.
    fn record(&mut self, event: Event) {
        let _ = event;
    }

    /// Round `round` finished; events recorded since the previous call
    /// belong to it. Round 0 is the pre-round setup block.
    fn end_round(&mut self, round: u32) {
        let _ = round;
    }

    /// Match footer: winner (if any) and the final round number.
    fn match_footer(&mut self, winner: Option<Team>, final_round: u32) {
        let _ = (winner, final_round);
    }
}

/// Replay writer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReplay;

impl ReplayWriter for NullReplay {}

/// In-memory replay recording with JSON save/load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    /// The initial map, once the header arrives.
    pub map: Option<InitialMap>,
    /// Event blocks indexed by round; index 0 is the setup block.
    pub rounds: Vec<Vec<Event>>,
    /// Winner from the footer, if the match finished decided.
    pub winner: Option<Team>,
    /// Final round number from the footer.
    pub final_round: u32,
    #[serde(skip)]
    current: Vec<Event>,
}

impl Recording {
    /// Create an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded during `round` (0 = setup block).
    #[must_use]
    pub fn round_events(&self, round: u32) -> Option<&[Event]> {
        self.rounds.get(round as usize).map(Vec::as_slice)
    }

    /// Save the recording as JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`ReplayError`] if encoding or file I/O fails.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let text = serde_json::to_string(self).map_err(ReplayError::Format)?;
        fs::write(path, text).map_err(ReplayError::Io)
    }

    /// Load a recording from JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`ReplayError`] if reading or decoding fails.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = fs::read_to_string(path).map_err(ReplayError::Io)?;
        serde_json::from_str(&text).map_err(ReplayError::Format)
    }
}

impl ReplayWriter for Recording {
    fn match_header(&mut self, map: &InitialMap) {
        self.map = Some(map.clone());
    }

    fn record(&mut self, event: Event) {
        self.current.push(event);
    }

    fn end_round(&mut self, _round: u32) {
        self.rounds.push(std::mem::take(&mut self.current));
    }

    fn match_footer(&mut self, winner: Option<Team>, final_round: u32) {
        self.winner = winner;
        self.final_round = final_round;
    }
}

/// Cheaply cloneable handle to a recording shared with a running match.
///
/// The engine takes its replay writer by ownership; a shared handle lets
/// the caller keep reading (or save) the recording after the match ends.
#[derive(Debug, Clone, Default)]
pub struct SharedRecording {
    inner: std::rc::Rc<std::cell::RefCell<Recording>>,
}

impl SharedRecording {
    /// Create a handle to a fresh recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone out the current recording contents.
    #[must_use]
    pub fn snapshot(&self) -> Recording {
        self.inner.borrow().clone()
    }
}

impl ReplayWriter for SharedRecording {
    fn match_header(&mut self, map: &InitialMap) {
        self.inner.borrow_mut().match_header(map);
    }

    fn record(&mut self, event: Event) {
        self.inner.borrow_mut().record(event);
    }

    fn end_round(&mut self, round: u32) {
        self.inner.borrow_mut().end_round(round);
    }

    fn match_footer(&mut self, winner: Option<Team>, final_round: u32) {
        self.inner.borrow_mut().match_footer(winner, final_round);
    }
}

/// Error raised while saving or loading a recording.
#[derive(Debug)]
pub enum ReplayError {
    /// File I/O failed.
    Io(io::Error),
    /// JSON encoding or decoding failed.
    Format(serde_json::Error),
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "replay I/O error: {e}"),
            Self::Format(e) => write!(f, "replay format error: {e}"),
        }
    }
}

impl std::error::Error for ReplayError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::MapBuilder;

    #[test]
    fn test_events_group_by_round() {
        let mut recording = Recording::new();
        let map = MapBuilder::new("tiny", 8, 8, 1).build().unwrap();

        recording.match_header(&map);
        recording.record(Event::Spawned {
            id: 0,
            kind: UnitKind::Depot,
            team: Team::A,
            loc: Loc::new(1, 1),
        });
        recording.end_round(0);
        recording.record(Event::Moved {
            id: 0,
            loc: Loc::new(1, 2),
        });
        recording.end_round(1);
        recording.match_footer(Some(Team::A), 1);

        assert_eq!(recording.rounds.len(), 2);
        assert_eq!(recording.round_events(0).unwrap().len(), 1);
        assert!(matches!(
            recording.round_events(1).unwrap()[0],
            Event::Moved { id: 0, .. }
        ));
        assert_eq!(recording.winner, Some(Team::A));
        assert_eq!(recording.final_round, 1);
        assert!(recording.round_events(2).is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.json");

        let mut recording = Recording::new();
        recording.match_header(&MapBuilder::new("tiny", 8, 8, 1).build().unwrap());
        recording.record(Event::TeamSoup {
            team: Team::B,
            amount: 150,
        });
        recording.end_round(0);
        recording.match_footer(None, 3);
        recording.save(&path).unwrap();

        let loaded = Recording::load(&path).unwrap();
        assert_eq!(loaded.rounds, recording.rounds);
        assert_eq!(loaded.winner, None);
        assert_eq!(loaded.final_round, 3);
        assert!(loaded.map.is_some());
    }
}
