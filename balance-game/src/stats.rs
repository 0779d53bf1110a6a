//! Long-running practice statistics: per-operation accuracy and a short
//! session history, kept separately from the save blob.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::KeyValueStorage;
use crate::constants::{SESSION_HISTORY_CAP, STATS_KEY};
use crate::instruction::{Action, Instruction, Ticket};
use crate::numbers::percent_of;
use crate::storage::StorageError;

/// One of the four `(action, ticket)` combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub action: Action,
    pub ticket: Ticket,
}

impl OperationKey {
    pub const ALL: [Self; 4] = [
        Self::new(Action::Take, Ticket::Positive),
        Self::new(Action::Take, Ticket::Negative),
        Self::new(Action::Give, Ticket::Positive),
        Self::new(Action::Give, Ticket::Negative),
    ];

    #[must_use]
    pub const fn new(action: Action, ticket: Ticket) -> Self {
        Self { action, ticket }
    }

    #[must_use]
    pub const fn of(instruction: &Instruction) -> Self {
        Self::new(instruction.action, instruction.ticket)
    }

    /// Map key, e.g. `"give|negative"`.
    #[must_use]
    pub fn key(self) -> String {
        format!("{}|{}", self.action.key(), self.ticket.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationTally {
    pub correct: u32,
    pub total: u32,
}

impl OperationTally {
    #[must_use]
    pub const fn errors(self) -> u32 {
        self.total.saturating_sub(self.correct)
    }
}

/// Totals handed over when a game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub correct: u32,
    pub total: u32,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub date: DateTime<Utc>,
    pub correct: u32,
    pub total: u32,
    pub streak: u32,
}

impl SessionRecord {
    #[must_use]
    pub fn accuracy_percent(&self) -> u8 {
        percent_of(i64::from(self.correct), i64::from(self.total))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsLedger {
    pub sessions: Vec<SessionRecord>,
    pub operation_errors: BTreeMap<String, OperationTally>,
    pub total_correct: u32,
    pub total_attempts: u32,
    pub max_streak: u32,
}

impl Default for StatsLedger {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            operation_errors: OperationKey::ALL
                .iter()
                .map(|op| (op.key(), OperationTally::default()))
                .collect(),
            total_correct: 0,
            total_attempts: 0,
            max_streak: 0,
        }
    }
}

impl StatsLedger {
    pub fn record_attempt(&mut self, correct: bool, instruction: &Instruction) {
        self.total_attempts = self.total_attempts.saturating_add(1);
        if correct {
            self.total_correct = self.total_correct.saturating_add(1);
        }
        let tally = self
            .operation_errors
            .entry(OperationKey::of(instruction).key())
            .or_default();
        tally.total = tally.total.saturating_add(1);
        if correct {
            tally.correct = tally.correct.saturating_add(1);
        }
    }

    pub fn record_session(&mut self, summary: SessionSummary, date: DateTime<Utc>) {
        self.sessions.push(SessionRecord {
            date,
            correct: summary.correct,
            total: summary.total,
            streak: summary.streak,
        });
        if self.sessions.len() > SESSION_HISTORY_CAP {
            let excess = self.sessions.len() - SESSION_HISTORY_CAP;
            self.sessions.drain(..excess);
        }
        self.max_streak = self.max_streak.max(summary.streak);
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u8 {
        percent_of(i64::from(self.total_correct), i64::from(self.total_attempts))
    }

    #[must_use]
    pub fn tally(&self, op: OperationKey) -> OperationTally {
        self.operation_errors
            .get(&op.key())
            .copied()
            .unwrap_or_default()
    }

    /// `None` until the operation has been attempted.
    #[must_use]
    pub fn operation_accuracy(&self, op: OperationKey) -> Option<u8> {
        let tally = self.tally(op);
        (tally.total > 0).then(|| percent_of(i64::from(tally.correct), i64::from(tally.total)))
    }

    /// Errors on `op` relative to the most error-prone operation, in `0.0..=1.0`.
    #[must_use]
    pub fn error_heat(&self, op: OperationKey) -> f64 {
        let worst = OperationKey::ALL
            .iter()
            .map(|other| self.tally(*other).errors())
            .max()
            .unwrap_or(0)
            .max(1);
        f64::from(self.tally(op).errors()) / f64::from(worst)
    }

    /// Accuracy of the last `n` sessions, oldest first.
    #[must_use]
    pub fn recent_accuracy(&self, n: usize) -> Vec<u8> {
        let start = self.sessions.len().saturating_sub(n);
        self.sessions[start..]
            .iter()
            .map(SessionRecord::accuracy_percent)
            .collect()
    }
}

/// Persists a [`StatsLedger`] under its own key. Like the save repository,
/// the plain methods swallow storage failures after logging them.
#[derive(Debug, Clone)]
pub struct StatsRecorder<S> {
    storage: S,
}

impl<S: KeyValueStorage> StatsRecorder<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails or the ledger is not
    /// valid JSON.
    pub fn try_load(&self) -> Result<StatsLedger, StorageError> {
        match self
            .storage
            .read(STATS_KEY)
            .map_err(|e| StorageError::backend(STATS_KEY, e))?
        {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: STATS_KEY.to_string(),
                source,
            }),
            None => Ok(StatsLedger::default()),
        }
    }

    #[must_use]
    pub fn load(&self) -> StatsLedger {
        self.try_load().unwrap_or_else(|err| {
            log::warn!("could not load statistics: {err}");
            StatsLedger::default()
        })
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] when the ledger cannot be encoded or written.
    pub fn try_store(&self, ledger: &StatsLedger) -> Result<(), StorageError> {
        let raw = serde_json::to_string(ledger).map_err(|source| StorageError::Encode {
            key: STATS_KEY.to_string(),
            source,
        })?;
        self.storage
            .write(STATS_KEY, &raw)
            .map_err(|e| StorageError::backend(STATS_KEY, e))
    }

    pub fn record_attempt(&self, correct: bool, instruction: &Instruction) {
        let mut ledger = self.load();
        ledger.record_attempt(correct, instruction);
        self.store(&ledger);
    }

    pub fn record_session(&self, summary: SessionSummary) {
        let mut ledger = self.load();
        ledger.record_session(summary, Utc::now());
        self.store(&ledger);
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(STATS_KEY) {
            log::warn!("could not clear statistics: {err}");
        }
    }

    fn store(&self, ledger: &StatsLedger) {
        if let Err(err) = self.try_store(ledger) {
            log::warn!("could not store statistics: {err}");
        }
    }
}
