//! Dice formulas such as `1d8`, `2d6+3` or `3d4-1`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A parsed dice expression: `count` dice with `sides` faces plus a flat bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceFormula {
    pub count: u32,
    pub sides: u32,
    pub bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid dice formula '{0}'")]
pub struct DiceFormulaError(pub String);

impl DiceFormula {
    pub const fn new(count: u32, sides: u32, bonus: i32) -> Self {
        Self { count, sides, bonus }
    }

    /// The same formula with its dice doubled, as on a critical hit.
    pub fn doubled_dice(&self) -> Self {
        Self {
            count: self.count * 2,
            ..*self
        }
    }
}

impl FromStr for DiceFormula {
    type Err = DiceFormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DiceFormulaError(s.to_string());
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(invalid());
        }

        let (dice_part, bonus) = match compact.find(['+', '-']) {
            Some(idx) => {
                let bonus: i32 = compact[idx..]
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|_| invalid())?;
                (&compact[..idx], bonus)
            }
            None => (compact.as_str(), 0),
        };

        if dice_part.is_empty() {
            return Err(invalid());
        }

        match dice_part.split_once(['d', 'D']) {
            Some((count, sides)) => {
                let count = if count.is_empty() {
                    1
                } else {
                    count.parse().map_err(|_| invalid())?
                };
                let sides: u32 = sides.parse().map_err(|_| invalid())?;
                if sides == 0 {
                    return Err(invalid());
                }
                Ok(Self { count, sides, bonus })
            }
            // Flat value with no dice
            None => {
                let flat: i32 = dice_part.parse().map_err(|_| invalid())?;
                Ok(Self {
                    count: 0,
                    sides: 1,
                    bonus: flat + bonus,
                })
            }
        }
    }
}

impl TryFrom<String> for DiceFormula {
    type Error = DiceFormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceFormula> for String {
    fn from(formula: DiceFormula) -> Self {
        formula.to_string()
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "{}", self.bonus);
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{}", b),
            b => write!(f, "{}", b),
        }
    }
}
