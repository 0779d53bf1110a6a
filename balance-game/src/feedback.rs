//! Feedback cues emitted by a round, for whatever plays sounds or animations.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Success,
    Error,
    /// The streak hit a multiple of five.
    Streak,
    /// A balance moved.
    Ticket,
    LevelUp,
    Achievement,
}

/// Receives cues in the order a round produced them.
pub trait FeedbackSink {
    fn cue(&mut self, cue: Cue);
}

/// Sink that remembers every cue; handy for headless runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueLog {
    pub cues: Vec<Cue>,
}

impl CueLog {
    #[must_use]
    pub fn count(&self, cue: Cue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }
}

impl FeedbackSink for CueLog {
    fn cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}

/// Drops every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl FeedbackSink for Silent {
    fn cue(&mut self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_counts_by_kind() {
        let mut log = CueLog::default();
        for cue in [Cue::Success, Cue::Ticket, Cue::Success] {
            log.cue(cue);
        }
        assert_eq!(log.count(Cue::Success), 2);
        assert_eq!(log.count(Cue::Error), 0);
        Silent.cue(Cue::Error);
    }
}
