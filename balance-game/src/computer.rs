//! The computer opponent: draws its own instruction and never errs.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::instruction::{Instruction, generate_in_range, generate_instruction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerMove {
    pub instruction: Instruction,
    pub new_computer_balance: i64,
}

pub fn computer_turn<R>(rng: &mut R, level_index: usize, computer_balance: i64) -> ComputerMove
where
    R: Rng + ?Sized,
{
    resolve(generate_instruction(rng, level_index, computer_balance))
}

/// Same as [`computer_turn`] with an explicit amount range (teacher override).
pub fn computer_turn_in_range<R>(
    rng: &mut R,
    range: (u32, u32),
    computer_balance: i64,
) -> ComputerMove
where
    R: Rng + ?Sized,
{
    resolve(generate_in_range(rng, range, computer_balance))
}

fn resolve(instruction: Instruction) -> ComputerMove {
    ComputerMove {
        new_computer_balance: instruction.resulting_balance,
        instruction,
    }
}
