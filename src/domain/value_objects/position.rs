//! Grid coordinates on the battlefield

use serde::{Deserialize, Serialize};

/// A cell on the battlefield grid. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Grid distance where diagonal steps count as one square.
    pub fn chebyshev_distance(&self, other: &Position) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    /// One orthogonal step away
    pub fn is_orthogonally_adjacent(&self, other: &Position) -> bool {
        let dx = (i64::from(self.x) - i64::from(other.x)).abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).abs();
        dx + dy == 1
    }

    /// Orthogonally adjacent cells, in a fixed order.
    pub fn neighbours(&self) -> [Position; 4] {
        [
            Position::new(self.x + 1, self.y),
            Position::new(self.x - 1, self.y),
            Position::new(self.x, self.y + 1),
            Position::new(self.x, self.y - 1),
        ]
    }
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [i32; 2] {
    fn from(pos: Position) -> Self {
        [pos.x, pos.y]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance_counts_diagonals_once() {
        let a = Position::new(2, 3);
        assert_eq!(a.chebyshev_distance(&Position::new(3, 4)), 1);
        assert_eq!(a.chebyshev_distance(&Position::new(7, 3)), 5);
        assert_eq!(a.chebyshev_distance(&a), 0);
    }

    #[test]
    fn test_position_serializes_as_pair() {
        let json = serde_json::to_string(&Position::new(7, 4)).unwrap();
        assert_eq!(json, "[7,4]");
        let parsed: Position = serde_json::from_str("[2,3]").unwrap();
        assert_eq!(parsed, Position::new(2, 3));
    }
}
