//! Domain services - Combat rules that span several entities

mod action_resolver;
mod dice;

pub use action_resolver::ActionResolver;
pub use dice::{DiceRoller, SeededDice};

#[cfg(test)]
pub(crate) use dice::testing;
