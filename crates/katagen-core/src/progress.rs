//! Append-only, replayable progress events.
//!
//! Events carry a monotonically increasing sequence number per run; a late
//! subscriber receives the full buffered history, then live events. The
//! buffer is bounded by event count and only `heartbeat` events are ever
//! dropped, oldest first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::FailureKind;
use crate::types::{Difficulty, Language, ObligationResult, RewriteRecord, SoftFallback};

/// Structured generation events, per-slot granular.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ProgressEvent {
    GenerationStarted {
        run_id: String,
        language: Language,
        problem_count: u32,
    },
    SlotStarted {
        slot_index: usize,
        difficulty: Difficulty,
        topics: Vec<String>,
    },
    SlotLlmAttemptStarted {
        slot_index: usize,
        attempt: u32,
    },
    SlotContractValidated {
        slot_index: usize,
        attempt: u32,
    },
    /// Obligation results and applied rewrites for a validated draft.
    SlotEvidence {
        slot_index: usize,
        obligations: Vec<ObligationResult>,
        rewrites: Vec<RewriteRecord>,
        /// Present only when `trace_test_suites` is set; events are
        /// otherwise redacted of code.
        #[serde(skip_serializing_if = "Option::is_none")]
        test_suite: Option<String>,
    },
    SlotContractFailed {
        slot_index: usize,
        attempt: u32,
        obligation_id: Option<String>,
        message: String,
    },
    SlotDockerValidationStarted {
        slot_index: usize,
        attempt: u32,
    },
    SlotDockerValidationFailed {
        slot_index: usize,
        attempt: u32,
        kind: FailureKind,
        message: String,
    },
    SlotCompleted {
        slot_index: usize,
        problem_id: String,
        title: String,
    },
    GenerationSoftFallbackApplied(SoftFallback),
    GenerationCompleted {
        activity_id: String,
        problem_count: usize,
    },
    GenerationFailed {
        kind: String,
        slot_index: Option<usize>,
        message: String,
    },
    Heartbeat,
}

impl ProgressEvent {
    fn is_heartbeat(&self) -> bool {
        matches!(self, ProgressEvent::Heartbeat)
    }
}

/// An emitted event with its run-scoped sequence number. Ordering is
/// guaranteed by `seq`; the timestamp is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: ProgressEvent,
}

struct StreamInner {
    buffer: VecDeque<SequencedEvent>,
    next_seq: u64,
}

/// The replay buffer plus live fan-out for one run.
pub struct ProgressStream {
    inner: Mutex<StreamInner>,
    capacity: usize,
    tx: broadcast::Sender<SequencedEvent>,
}

const DEFAULT_CAPACITY: usize = 1024;

impl ProgressStream {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(16));
        Self {
            inner: Mutex::new(StreamInner {
                buffer: VecDeque::new(),
                next_seq: 0,
            }),
            capacity,
            tx,
        }
    }

    /// Append an event: assign the next sequence number, buffer it, and
    /// fan it out to live subscribers. Returns the assigned sequence.
    pub fn emit(&self, event: ProgressEvent) -> u64 {
        let sequenced = {
            let mut inner = self.inner.lock();
            let sequenced = SequencedEvent {
                seq: inner.next_seq,
                at: Utc::now(),
                event,
            };
            inner.next_seq += 1;
            inner.buffer.push_back(sequenced.clone());
            if inner.buffer.len() > self.capacity {
                // Only heartbeats are droppable; other events stay even if
                // the buffer runs over.
                if let Some(pos) = inner.buffer.iter().position(|e| e.event.is_heartbeat()) {
                    let _ = inner.buffer.remove(pos);
                }
            }
            sequenced
        };
        let seq = sequenced.seq;
        let _ = self.tx.send(sequenced);
        seq
    }

    /// Full buffered history plus a live receiver. A subscriber that joins
    /// late replays everything still buffered, then follows live events.
    pub fn subscribe(&self) -> (Vec<SequencedEvent>, broadcast::Receiver<SequencedEvent>) {
        let inner = self.inner.lock();
        let history = inner.buffer.iter().cloned().collect();
        (history, self.tx.subscribe())
    }

    /// Snapshot of the buffered history.
    pub fn history(&self) -> Vec<SequencedEvent> {
        self.inner.lock().buffer.iter().cloned().collect()
    }
}

impl Default for ProgressStream {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::external::ProgressSink for ProgressStream {
    fn emit(&self, event: ProgressEvent) {
        ProgressStream::emit(self, event);
    }
}
