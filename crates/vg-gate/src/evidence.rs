#![forbid(unsafe_code)]

//! Bounded FIFO evidence ledger for gate decision audit trail.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::controller::{GateOutcome, GateState};

/// Record of one controller transition or decision, for forensic
/// reconstruction of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvidenceEntry {
    /// Controller state when the event was recorded.
    pub state: GateState,
    pub stage: String,
    /// Present only on terminal decisions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GateOutcome>,
    pub note: String,
    pub timestamp_ms: u128,
}

/// Bounded FIFO evidence buffer recording gate events.
///
/// Capacity is enforced via `capacity.max(1)`, minimum 1 entry. When
/// full, the oldest entry (front of `VecDeque`) is evicted before a new
/// entry is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvidenceLedger {
    capacity: usize,
    entries: VecDeque<GateEvidenceEntry>,
}

impl GateEvidenceLedger {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn record(&mut self, entry: GateEvidenceEntry) {
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently recorded entry.
    #[must_use]
    pub fn latest(&self) -> Option<&GateEvidenceEntry> {
        self.entries.back()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Serialize the ledger to JSONL for audit artifacts.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        self.entries
            .iter()
            .filter_map(|entry| serde_json::to_string(entry).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(stage: &str) -> GateEvidenceEntry {
        GateEvidenceEntry {
            state: GateState::AwaitingBuild,
            stage: stage.to_owned(),
            outcome: None,
            note: String::from("ok"),
            timestamp_ms: 0,
        }
    }

    #[test]
    fn ledger_is_bounded_fifo() {
        let mut ledger = GateEvidenceLedger::new(2);
        ledger.record(entry("a"));
        ledger.record(entry("b"));
        ledger.record(entry("c"));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.latest().map(|e| e.stage.as_str()), Some("c"));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut ledger = GateEvidenceLedger::new(0);
        ledger.record(entry("a"));
        ledger.record(entry("b"));
        assert_eq!(ledger.capacity(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn jsonl_serialization_is_line_per_entry() {
        let mut ledger = GateEvidenceLedger::new(4);
        ledger.record(entry("a"));
        ledger.record(entry("b"));
        let jsonl = ledger.to_jsonl();
        assert_eq!(jsonl.lines().count(), 2);
        for line in jsonl.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
            assert!(parsed.get("stage").is_some());
        }
    }
}
