//! Classroom overrides: locked level, turn timer, cheat sheet and a custom
//! amount range, plus the typed phrase that unlocks them.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{TEACHER_UNLOCK_BUFFER, TEACHER_UNLOCK_PHRASE, TURN_TIMER_WARNING_SECS};
use crate::instruction::Instruction;
use crate::levels::{is_valid_level, level};

#[derive(Debug, Error)]
pub enum TeacherConfigError {
    #[error("level {0} does not exist")]
    UnknownLevel(usize),
    #[error("amount range {min}..={max} is invalid; need 1 <= min <= max")]
    InvalidRange { min: u32, max: u32 },
    #[error("teacher settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Overrides are only honoured while `active` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherSettings {
    pub active: bool,
    pub locked_level: Option<usize>,
    /// Seconds per user turn; `0` disables the timer.
    pub timer_secs: u32,
    pub cheat_sheet: bool,
    pub custom_range: Option<(u32, u32)>,
}

impl TeacherSettings {
    /// Parse and validate settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TeacherConfigError`] on malformed JSON or out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, TeacherConfigError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns [`TeacherConfigError::UnknownLevel`] for a locked level past
    /// the table and [`TeacherConfigError::InvalidRange`] for a bad range.
    pub fn validate(&self) -> Result<(), TeacherConfigError> {
        if let Some(idx) = self.locked_level
            && !is_valid_level(idx)
        {
            return Err(TeacherConfigError::UnknownLevel(idx));
        }
        if let Some((min, max)) = self.custom_range
            && (min == 0 || min > max)
        {
            return Err(TeacherConfigError::InvalidRange { min, max });
        }
        Ok(())
    }

    /// Level used to draw instructions: the locked one when active, else the
    /// progression level.
    #[must_use]
    pub fn effective_level(&self, progression_level: usize) -> usize {
        match self.locked_level {
            Some(idx) if self.active => idx,
            _ => progression_level,
        }
    }

    /// Amount range for the next instruction.
    #[must_use]
    pub fn amount_range(&self, progression_level: usize) -> (u32, u32) {
        match self.custom_range {
            Some(range) if self.active => range,
            _ => level(self.effective_level(progression_level)).number_range,
        }
    }

    #[must_use]
    pub const fn timer_enabled(&self) -> bool {
        self.active && self.timer_secs > 0
    }

    #[must_use]
    pub fn cheat_sheet_for(&self, instruction: &Instruction) -> Option<CheatSheet> {
        (self.active && self.cheat_sheet).then(|| CheatSheet {
            expression: instruction.canonical_expression.clone(),
            resulting_balance: instruction.resulting_balance,
        })
    }
}

/// The answer for the active instruction, shown to the teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatSheet {
    pub expression: String,
    pub resulting_balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Running { remaining: u32, warning: bool },
    Expired,
}

/// Countdown for one user turn, advanced one second per [`TurnTimer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTimer {
    total: u32,
    remaining: u32,
}

impl TurnTimer {
    #[must_use]
    pub const fn new(secs: u32) -> Self {
        Self {
            total: secs,
            remaining: secs,
        }
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    pub const fn tick(&mut self) -> TimerTick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            TimerTick::Expired
        } else {
            TimerTick::Running {
                remaining: self.remaining,
                warning: self.remaining <= TURN_TIMER_WARNING_SECS,
            }
        }
    }
}

/// Rolling buffer of the last typed keys.
#[derive(Debug, Clone, Default)]
pub struct TeacherUnlock {
    buffer: String,
}

impl TeacherUnlock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key; `true` once the buffer spells the unlock phrase.
    pub fn push(&mut self, key: char) -> bool {
        self.buffer.extend(key.to_lowercase());
        let excess = self.buffer.chars().count().saturating_sub(TEACHER_UNLOCK_BUFFER);
        if excess > 0 {
            let cut = self
                .buffer
                .char_indices()
                .nth(excess)
                .map_or(self.buffer.len(), |(i, _)| i);
            self.buffer.drain(..cut);
        }
        unlock_phrase_matches(&self.buffer)
    }
}

/// Whether the most recent keys spell the unlock phrase.
#[must_use]
pub fn unlock_phrase_matches(buffer: &str) -> bool {
    buffer.ends_with(TEACHER_UNLOCK_PHRASE)
}
