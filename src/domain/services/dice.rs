//! Dice rolling
//!
//! Everything random in combat goes through [`DiceRoller`], so encounters can
//! be replayed from a seed and tests can script exact rolls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::value_objects::DiceFormula;

pub trait DiceRoller: Send {
    /// Roll one die with `sides` faces, returning 1..=sides
    fn roll_die(&mut self, sides: u32) -> u32;

    fn d20(&mut self) -> u32 {
        self.roll_die(20)
    }

    /// Roll every die in the formula and add its bonus
    fn roll(&mut self, formula: &DiceFormula) -> i32 {
        let dice: i32 = (0..formula.count)
            .map(|_| self.roll_die(formula.sides) as i32)
            .sum();
        dice + formula.bonus
    }
}

/// Production roller backed by a seedable RNG
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl DiceRoller for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.gen_range(1..=sides)
    }
}
