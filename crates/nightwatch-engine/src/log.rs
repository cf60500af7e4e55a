//! Append-only narration.
//!
//! Every component writes here. Presentation renders it, tests assert on
//! it. Entries are never edited or removed, so a consumer can keep a
//! cursor and read only what is new with [`EventLog::since`].

use nightwatch_protocol::Phase;
use serde::{Deserialize, Serialize};

/// What an entry is about. Lets a renderer style entries differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    /// Game setup and private role information.
    System,
    /// A phase began.
    Phase,
    /// The human's own action, echoed back.
    Action,
    /// A vote was cast or tallied.
    Vote,
    /// Someone died or survived an attack.
    Death,
    /// A check result shown to the human investigator.
    Reveal,
    /// The game ended.
    Outcome,
}

/// One narration line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Position in the log, starting at 0.
    pub seq: usize,
    pub day: u32,
    pub phase: Phase,
    pub kind: EntryKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, day: u32, phase: Phase, kind: EntryKind, text: impl Into<String>) {
        let text = text.into();
        tracing::trace!(day, %phase, ?kind, %text, "narration");
        self.entries.push(LogEntry {
            seq: self.entries.len(),
            day,
            phase,
            kind,
            text,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries appended at or after `cursor`. An out-of-range cursor
    /// yields an empty slice.
    pub fn since(&self, cursor: usize) -> &[LogEntry] {
        self.entries.get(cursor..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Whether any entry's text contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.text.contains(needle))
    }
}
