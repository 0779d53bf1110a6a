use std::fmt;

use balance_game::Instruction;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// What a policy does on its turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyAnswer {
    /// Type an answer; `expect_correct` says whether the policy meant to
    /// get it right.
    Submit {
        expression: String,
        balance: String,
        expect_correct: bool,
    },
    /// Leave the fields empty and wait for the turn timer.
    Idle,
}

impl PolicyAnswer {
    fn correct(expression: String, balance: String) -> Self {
        Self::Submit {
            expression,
            balance,
            expect_correct: true,
        }
    }
}

/// Policy interface for automated players.
pub trait AnswerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Decide how to answer the user's current instruction.
    fn answer(&mut self, instruction: &Instruction) -> PolicyAnswer;
}

/// Built-in answering styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerStyle {
    /// Always types the canonical `-(-5)` form.
    Canonical,
    /// Types the bare signed delta, e.g. `5`.
    BareValue,
    /// Types both signs in a row, e.g. `--5`, with a decimal balance.
    ChainedSigns,
    /// Cycles through the three correct forms above.
    Mixed,
    /// Canonical expression, but gets the balance wrong `mistake_pct` percent
    /// of the time.
    Sloppy { mistake_pct: u8 },
    /// Never answers.
    Idle,
}

impl AnswerStyle {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Canonical => "Canonical",
            Self::BareValue => "Bare value",
            Self::ChainedSigns => "Chained signs",
            Self::Mixed => "Mixed forms",
            Self::Sloppy { .. } => "Sloppy",
            Self::Idle => "Idle",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn AnswerPolicy> {
        match self {
            Self::Canonical => Box::new(CanonicalPolicy),
            Self::BareValue => Box::new(BareValuePolicy),
            Self::ChainedSigns => Box::new(ChainedSignsPolicy),
            Self::Mixed => Box::new(MixedPolicy { turn: 0 }),
            Self::Sloppy { mistake_pct } => Box::new(SloppyPolicy {
                rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5EED_0F_BAD),
                mistake_pct,
            }),
            Self::Idle => Box::new(IdlePolicy),
        }
    }
}

impl fmt::Display for AnswerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sloppy { mistake_pct } => write!(f, "{} ({mistake_pct}%)", self.label()),
            _ => f.write_str(self.label()),
        }
    }
}

struct CanonicalPolicy;
struct BareValuePolicy;
struct ChainedSignsPolicy;
struct IdlePolicy;

struct MixedPolicy {
    turn: usize,
}

struct SloppyPolicy {
    rng: ChaCha20Rng,
    mistake_pct: u8,
}

fn canonical(instruction: &Instruction) -> PolicyAnswer {
    PolicyAnswer::correct(
        instruction.canonical_expression.clone(),
        instruction.resulting_balance.to_string(),
    )
}

fn bare_value(instruction: &Instruction) -> PolicyAnswer {
    PolicyAnswer::correct(
        instruction.signed_delta.to_string(),
        instruction.resulting_balance.to_string(),
    )
}

fn chained_signs(instruction: &Instruction) -> PolicyAnswer {
    PolicyAnswer::correct(
        format!(
            "{}{}{}",
            instruction.action.symbol(),
            instruction.ticket.symbol(),
            instruction.amount
        ),
        format!("{}.0", instruction.resulting_balance),
    )
}

impl AnswerPolicy for CanonicalPolicy {
    fn name(&self) -> &'static str {
        "Canonical"
    }

    fn answer(&mut self, instruction: &Instruction) -> PolicyAnswer {
        canonical(instruction)
    }
}

impl AnswerPolicy for BareValuePolicy {
    fn name(&self) -> &'static str {
        "Bare value"
    }

    fn answer(&mut self, instruction: &Instruction) -> PolicyAnswer {
        bare_value(instruction)
    }
}

impl AnswerPolicy for ChainedSignsPolicy {
    fn name(&self) -> &'static str {
        "Chained signs"
    }

    fn answer(&mut self, instruction: &Instruction) -> PolicyAnswer {
        chained_signs(instruction)
    }
}

impl AnswerPolicy for MixedPolicy {
    fn name(&self) -> &'static str {
        "Mixed forms"
    }

    fn answer(&mut self, instruction: &Instruction) -> PolicyAnswer {
        let pick = self.turn % 3;
        self.turn += 1;
        match pick {
            0 => canonical(instruction),
            1 => bare_value(instruction),
            _ => chained_signs(instruction),
        }
    }
}

impl AnswerPolicy for SloppyPolicy {
    fn name(&self) -> &'static str {
        "Sloppy"
    }

    fn answer(&mut self, instruction: &Instruction) -> PolicyAnswer {
        if self.rng.gen_range(0..100) < self.mistake_pct {
            let off_by = if self.rng.gen_bool(0.5) { 1 } else { -1 };
            PolicyAnswer::Submit {
                expression: instruction.canonical_expression.clone(),
                balance: (instruction.resulting_balance + off_by).to_string(),
                expect_correct: false,
            }
        } else {
            canonical(instruction)
        }
    }
}

impl AnswerPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn answer(&mut self, _instruction: &Instruction) -> PolicyAnswer {
        PolicyAnswer::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balance_game::{Action, Ticket, validate_answer};

    fn accepted(answer: &PolicyAnswer, instruction: &Instruction) -> bool {
        match answer {
            PolicyAnswer::Submit {
                expression,
                balance,
                ..
            } => validate_answer(expression, balance, instruction).both_accepted,
            PolicyAnswer::Idle => false,
        }
    }

    #[test]
    fn correct_styles_produce_accepted_answers() {
        let instructions = [
            Instruction::new(Action::Give, Ticket::Negative, 5, 0),
            Instruction::new(Action::Take, Ticket::Negative, 3, -4),
            Instruction::new(Action::Give, Ticket::Positive, 1, 2),
            Instruction::new(Action::Take, Ticket::Positive, 7, 9),
        ];
        for style in [
            AnswerStyle::Canonical,
            AnswerStyle::BareValue,
            AnswerStyle::ChainedSigns,
            AnswerStyle::Mixed,
        ] {
            let mut policy = style.create_policy(1);
            for instr in &instructions {
                let answer = policy.answer(instr);
                assert!(accepted(&answer, instr), "{style} failed on {instr:?}");
            }
        }
    }

    #[test]
    fn sloppy_policy_announces_its_mistakes() {
        let mut policy = AnswerStyle::Sloppy { mistake_pct: 50 }.create_policy(9);
        let instr = Instruction::new(Action::Give, Ticket::Negative, 4, 1);
        let mut mistakes = 0;
        for _ in 0..200 {
            let answer = policy.answer(&instr);
            let PolicyAnswer::Submit { expect_correct, .. } = &answer else {
                panic!("sloppy policy always answers");
            };
            assert_eq!(*expect_correct, accepted(&answer, &instr));
            if !expect_correct {
                mistakes += 1;
            }
        }
        assert!((40..=160).contains(&mistakes));
    }

    #[test]
    fn idle_policy_never_answers() {
        let mut policy = AnswerStyle::Idle.create_policy(0);
        let instr = Instruction::new(Action::Take, Ticket::Positive, 1, 0);
        assert_eq!(policy.answer(&instr), PolicyAnswer::Idle);
        assert_eq!(AnswerStyle::Sloppy { mistake_pct: 20 }.to_string(), "Sloppy (20%)");
    }
}
