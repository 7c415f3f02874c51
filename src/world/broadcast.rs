//! Paid broadcast queue and append-only per-round history.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// Maximum number of messages broadcast per round. Entries beyond this
/// stay queued; a message that is always outranked may wait forever.
pub const BROADCASTS_PER_ROUND: usize = 7;

/// Maximum payload length in words.
pub const MAX_MESSAGE_WORDS: usize = 7;

/// A paid broadcast message. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Soup paid for the message; doubles as its queue priority.
    pub cost: u32,
    /// Payload words.
    pub payload: Vec<i32>,
}

/// Heap entry pairing a message with its submission sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Queued {
    message: Message,
    seq: u64,
}

impl Ord for Queued {
    /// Total order: cost descending, then submission sequence ascending.
    fn cmp(&self, other: &Self) -> Ordering {
        self.message
            .cost
            .cmp(&other.message.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The broadcast subsystem: a priority queue of pending messages plus a
/// round-indexed, append-only history of past broadcasts.
#[derive(Debug, Default)]
pub struct BroadcastLog {
    queue: BinaryHeap<Queued>,
    history: Vec<Vec<Message>>,
    next_seq: u64,
}

impl BroadcastLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a paid message.
    ///
    /// Always succeeds structurally; the payment precondition is checked
    /// by the effect layer before the message is constructed. A message
    /// enqueued during round R is eligible for round R's own end-of-round
    /// drain.
    pub fn enqueue(&mut self, message: Message) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Queued { message, seq });
    }

    /// Number of messages still waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// End-of-round drain: pop up to [`BROADCASTS_PER_ROUND`] entries in
    /// priority order, append them as this round's broadcast list, and
    /// return the list.
    ///
    /// Must be called exactly once per round; an empty round still
    /// appends an (empty) history entry to keep the index round-stable.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut round_messages = Vec::new();
        for _ in 0..BROADCASTS_PER_ROUND {
            match self.queue.pop() {
                Some(entry) => round_messages.push(entry.message),
                None => break,
            }
        }
        self.history.push(round_messages.clone());
        round_messages
    }

    /// Messages broadcast at the end of round `round` (1-based), or
    /// `None` when that round has not been drained yet.
    #[must_use]
    pub fn round_list(&self, round: u32) -> Option<&[Message]> {
        if round == 0 {
            return None;
        }
        self.history.get(round as usize - 1).map(Vec::as_slice)
    }
}
