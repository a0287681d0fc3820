//! Battlefield entity - the combat grid with terrain and object overlays

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::errors::CombatError;
use crate::domain::value_objects::Position;

/// Largest accepted width or height
pub const MAX_BATTLEFIELD_SIDE: u32 = 100;

/// Ground type of a cell, ordered from least to most restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Normal,
    Difficult,
    Impassable,
}

/// Object standing on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridObject {
    #[default]
    None,
    Tree,
    Wall,
    Rock,
    Water,
}

impl GridObject {
    /// Least restrictive terrain a cell holding this object can have
    pub fn implied_terrain(&self) -> Terrain {
        match self {
            Self::None => Terrain::Normal,
            Self::Tree | Self::Water => Terrain::Difficult,
            Self::Wall | Self::Rock => Terrain::Impassable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Cell {
    terrain: Terrain,
    object: GridObject,
}

/// A change to one cell applied while building a battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellOverride {
    pub position: Position,
    #[serde(default)]
    pub terrain: Option<Terrain>,
    #[serde(default)]
    pub object: Option<GridObject>,
}

impl CellOverride {
    pub fn terrain(position: Position, terrain: Terrain) -> Self {
        Self {
            position,
            terrain: Some(terrain),
            object: None,
        }
    }

    pub fn object(position: Position, object: GridObject) -> Self {
        Self {
            position,
            terrain: None,
            object: Some(object),
        }
    }
}

/// Fixed-size grid. Read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battlefield {
    width: u32,
    height: u32,
    /// Column-major: index = x * height + y
    cells: Vec<Cell>,
}

impl Battlefield {
    pub fn new(width: u32, height: u32, overrides: &[CellOverride]) -> Result<Self, CombatError> {
        if width == 0 || height == 0 {
            return Err(CombatError::InvalidSetup(
                "battlefield width and height must be positive".to_string(),
            ));
        }
        if width > MAX_BATTLEFIELD_SIDE || height > MAX_BATTLEFIELD_SIDE {
            return Err(CombatError::InvalidSetup(format!(
                "battlefield cannot exceed {}x{}",
                MAX_BATTLEFIELD_SIDE, MAX_BATTLEFIELD_SIDE
            )));
        }

        let mut battlefield = Self {
            width,
            height,
            cells: vec![Cell::default(); (width * height) as usize],
        };
        for cell_override in overrides {
            battlefield.apply(cell_override)?;
        }
        Ok(battlefield)
    }

    /// Build a battlefield from an environment preset, then apply `overrides`.
    ///
    /// Preset features that fall outside a small grid are dropped.
    pub fn for_environment(
        environment: &str,
        width: u32,
        height: u32,
        overrides: &[CellOverride],
    ) -> Result<Self, CombatError> {
        let mut battlefield = Self::new(width, height, &[])?;
        for preset in environment_preset(environment) {
            if battlefield.contains(preset.position) {
                battlefield.apply(&preset)?;
            }
        }
        for cell_override in overrides {
            battlefield.apply(cell_override)?;
        }
        Ok(battlefield)
    }

    fn apply(&mut self, cell_override: &CellOverride) -> Result<(), CombatError> {
        let idx = self.index(cell_override.position)?;
        let cell = &mut self.cells[idx];
        if let Some(object) = cell_override.object {
            cell.object = object;
        }
        if let Some(terrain) = cell_override.terrain {
            cell.terrain = terrain;
        }
        // An object never sits on ground less restrictive than it implies
        cell.terrain = cell.terrain.max(cell.object.implied_terrain());
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Result<usize, CombatError> {
        if !self.contains(pos) {
            return Err(CombatError::OutOfBounds(pos));
        }
        Ok(pos.x as usize * self.height as usize + pos.y as usize)
    }

    /// Terrain and object at a cell
    pub fn at(&self, pos: Position) -> Result<(Terrain, GridObject), CombatError> {
        let cell = self.cells[self.index(pos)?];
        Ok((cell.terrain, cell.object))
    }

    /// True iff the cell is not impassable and no position in `occupied` is on it
    pub fn is_occupiable(&self, pos: Position, occupied: &[Position]) -> Result<bool, CombatError> {
        let (terrain, _) = self.at(pos)?;
        Ok(terrain != Terrain::Impassable && !occupied.contains(&pos))
    }

    /// Least cost of walking from `from` to `to` in orthogonal steps.
    ///
    /// Entering a normal cell costs 1, a difficult cell `difficult_cost`.
    /// Impassable and occupied cells cannot be entered. Paths costing more
    /// than `max_cost` are not explored.
    pub fn path_cost(
        &self,
        from: Position,
        to: Position,
        occupied: &[Position],
        difficult_cost: u32,
        max_cost: u32,
    ) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        let blocked: HashSet<Position> = occupied.iter().copied().collect();
        let mut best: HashMap<Position, u32> = HashMap::from([(from, 0)]);
        let mut frontier = BinaryHeap::from([Reverse((0u32, from.x, from.y))]);

        while let Some(Reverse((cost, x, y))) = frontier.pop() {
            let current = Position::new(x, y);
            if current == to {
                return Some(cost);
            }
            if best.get(&current).is_some_and(|&known| cost > known) {
                continue;
            }
            for next in current.neighbours() {
                let Ok((terrain, _)) = self.at(next) else {
                    continue;
                };
                let step = match terrain {
                    Terrain::Normal => 1,
                    Terrain::Difficult => difficult_cost,
                    Terrain::Impassable => continue,
                };
                if blocked.contains(&next) {
                    continue;
                }
                let next_cost = cost + step;
                if next_cost > max_cost {
                    continue;
                }
                if best.get(&next).map_or(true, |&known| next_cost < known) {
                    best.insert(next, next_cost);
                    frontier.push(Reverse((next_cost, next.x, next.y)));
                }
            }
        }
        None
    }

    /// Cost of walking a given route from `from`, one orthogonal step per cell.
    ///
    /// Every cell must be inside the grid, passable and unoccupied.
    pub fn walk_cost(
        &self,
        from: Position,
        path: &[Position],
        occupied: &[Position],
        difficult_cost: u32,
    ) -> Result<u32, CombatError> {
        let mut cost = 0u32;
        let mut current = from;
        for &next in path {
            if !current.is_orthogonally_adjacent(&next) {
                return Err(CombatError::IllegalMove(format!(
                    "path steps from {} to {}, which are not adjacent",
                    current, next
                )));
            }
            let (terrain, _) = self.at(next)?;
            let step = match terrain {
                Terrain::Normal => 1,
                Terrain::Difficult => difficult_cost,
                Terrain::Impassable => {
                    return Err(CombatError::IllegalMove(format!("path crosses blocked cell {}", next)))
                }
            };
            if occupied.contains(&next) {
                return Err(CombatError::IllegalMove(format!("path crosses occupied cell {}", next)));
            }
            cost = cost.saturating_add(step);
            current = next;
        }
        Ok(cost)
    }

    /// No impassable cell lies strictly between `from` and `to` on the grid line
    pub fn has_line_of_sight(&self, from: Position, to: Position) -> bool {
        line_between(from, to)
            .into_iter()
            .all(|pos| !matches!(self.at(pos), Ok((Terrain::Impassable, _))))
    }

    /// Terrain grid indexed `[x][y]`
    pub fn terrain_grid(&self) -> Vec<Vec<Terrain>> {
        (0..self.width as usize)
            .map(|x| {
                (0..self.height as usize)
                    .map(|y| self.cells[x * self.height as usize + y].terrain)
                    .collect()
            })
            .collect()
    }

    /// Object grid indexed `[x][y]`
    pub fn object_grid(&self) -> Vec<Vec<GridObject>> {
        (0..self.width as usize)
            .map(|x| {
                (0..self.height as usize)
                    .map(|y| self.cells[x * self.height as usize + y].object)
                    .collect()
            })
            .collect()
    }
}

/// Cells strictly between two points on a Bresenham line
fn line_between(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut cells = Vec::new();

    loop {
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        if x != to.x || y != to.y {
            cells.push(Position::new(x, y));
        }
    }
    cells
}

fn environment_preset(environment: &str) -> Vec<CellOverride> {
    let object = |x, y, o| CellOverride::object(Position::new(x, y), o);
    let terrain = |x, y, t| CellOverride::terrain(Position::new(x, y), t);

    match environment.to_lowercase().as_str() {
        "forest" => vec![
            object(1, 1, GridObject::Tree),
            object(3, 4, GridObject::Tree),
            object(6, 7, GridObject::Tree),
            object(8, 2, GridObject::Tree),
            terrain(2, 2, Terrain::Difficult),
            terrain(2, 3, Terrain::Difficult),
            terrain(3, 2, Terrain::Difficult),
            terrain(3, 3, Terrain::Difficult),
        ],
        "dungeon" => vec![
            object(0, 5, GridObject::Wall),
            object(1, 5, GridObject::Wall),
            object(2, 5, GridObject::Wall),
            object(3, 5, GridObject::Wall),
            terrain(5, 5, Terrain::Difficult),
        ],
        "cave" => vec![
            object(2, 3, GridObject::Rock),
            object(7, 6, GridObject::Rock),
            object(4, 4, GridObject::Water),
            object(4, 5, GridObject::Water),
            object(5, 4, GridObject::Water),
            object(5, 5, GridObject::Water),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_field() -> Battlefield {
        Battlefield::new(10, 10, &[]).unwrap()
    }

    #[test]
    fn test_at_rejects_out_of_bounds() {
        let field = open_field();
        assert_eq!(field.at(Position::new(0, 0)).unwrap(), (Terrain::Normal, GridObject::None));
        for pos in [Position::new(-1, 0), Position::new(10, 0), Position::new(0, 10)] {
            assert_eq!(field.at(pos), Err(CombatError::OutOfBounds(pos)));
        }
    }

    #[test]
    fn test_rejects_invalid_dimensions() {
        assert!(Battlefield::new(0, 5, &[]).is_err());
        assert!(Battlefield::new(5, MAX_BATTLEFIELD_SIDE + 1, &[]).is_err());
        let outside = CellOverride::terrain(Position::new(5, 5), Terrain::Difficult);
        assert_eq!(
            Battlefield::new(5, 5, &[outside]),
            Err(CombatError::OutOfBounds(Position::new(5, 5)))
        );
    }

    #[test]
    fn test_blocking_objects_make_cells_impassable() {
        let field = Battlefield::new(
            5,
            5,
            &[
                CellOverride::object(Position::new(1, 1), GridObject::Wall),
                CellOverride {
                    position: Position::new(2, 2),
                    terrain: Some(Terrain::Normal),
                    object: Some(GridObject::Tree),
                },
            ],
        )
        .unwrap();
        assert_eq!(field.at(Position::new(1, 1)).unwrap().0, Terrain::Impassable);
        assert_eq!(field.at(Position::new(2, 2)).unwrap().0, Terrain::Difficult);
    }

    #[test]
    fn test_is_occupiable() {
        let field = Battlefield::new(
            5,
            5,
            &[CellOverride::terrain(Position::new(1, 1), Terrain::Impassable)],
        )
        .unwrap();
        let occupied = [Position::new(2, 2)];
        assert!(field.is_occupiable(Position::new(0, 0), &occupied).unwrap());
        assert!(!field.is_occupiable(Position::new(1, 1), &occupied).unwrap());
        assert!(!field.is_occupiable(Position::new(2, 2), &occupied).unwrap());
        assert!(field.is_occupiable(Position::new(9, 9), &occupied).is_err());
    }

    #[test]
    fn test_forest_preset_matches_layout() {
        let field = Battlefield::for_environment("forest", 10, 10, &[]).unwrap();
        assert_eq!(field.at(Position::new(1, 1)).unwrap().1, GridObject::Tree);
        assert_eq!(field.at(Position::new(2, 3)).unwrap().0, Terrain::Difficult);
        assert_eq!(field.at(Position::new(5, 5)).unwrap(), (Terrain::Normal, GridObject::None));
    }

    #[test]
    fn test_preset_is_clipped_to_small_grids() {
        let field = Battlefield::for_environment("cave", 4, 4, &[]).unwrap();
        assert_eq!(field.at(Position::new(2, 3)).unwrap().1, GridObject::Rock);
        assert!(field.at(Position::new(7, 6)).is_err());
    }

    #[test]
    fn test_path_cost_counts_difficult_terrain_double() {
        let field = Battlefield::new(
            5,
            1,
            &[CellOverride::terrain(Position::new(2, 0), Terrain::Difficult)],
        )
        .unwrap();
        let cost = field.path_cost(Position::new(0, 0), Position::new(4, 0), &[], 2, 100);
        assert_eq!(cost, Some(5));
        assert_eq!(
            field.path_cost(Position::new(0, 0), Position::new(4, 0), &[], 2, 4),
            None
        );
    }

    #[test]
    fn test_path_cost_routes_around_walls_and_occupants() {
        // Wall across x=2 except the top row
        let walls: Vec<CellOverride> = (1..5)
            .map(|y| CellOverride::object(Position::new(2, y), GridObject::Wall))
            .collect();
        let field = Battlefield::new(5, 5, &walls).unwrap();
        let from = Position::new(0, 4);
        let to = Position::new(4, 4);
        assert_eq!(field.path_cost(from, to, &[], 2, 100), Some(12));
        // Blocking the only gap leaves no route
        assert_eq!(field.path_cost(from, to, &[Position::new(2, 0)], 2, 100), None);
    }

    #[test]
    fn test_walk_cost_checks_every_step() {
        let field = Battlefield::new(
            5,
            5,
            &[
                CellOverride::object(Position::new(2, 3), GridObject::Wall),
                CellOverride::terrain(Position::new(3, 2), Terrain::Difficult),
            ],
        )
        .unwrap();
        let from = Position::new(2, 2);
        let path = |cells: &[(i32, i32)]| -> Vec<Position> {
            cells.iter().map(|&(x, y)| Position::new(x, y)).collect()
        };

        assert_eq!(field.walk_cost(from, &path(&[(3, 2), (3, 3)]), &[], 2), Ok(3));
        assert!(matches!(
            field.walk_cost(from, &path(&[(2, 3), (2, 4)]), &[], 2),
            Err(CombatError::IllegalMove(_))
        ));
        assert!(matches!(
            field.walk_cost(from, &path(&[(3, 3)]), &[], 2),
            Err(CombatError::IllegalMove(_))
        ));
        assert!(matches!(
            field.walk_cost(from, &path(&[(1, 2)]), &[Position::new(1, 2)], 2),
            Err(CombatError::IllegalMove(_))
        ));
        assert_eq!(
            field.walk_cost(Position::new(4, 4), &path(&[(5, 4)]), &[], 2),
            Err(CombatError::OutOfBounds(Position::new(5, 4)))
        );
    }

    #[test]
    fn test_line_of_sight_blocked_by_impassable_cells() {
        let field = Battlefield::new(
            10,
            10,
            &[CellOverride::object(Position::new(4, 3), GridObject::Wall)],
        )
        .unwrap();
        assert!(!field.has_line_of_sight(Position::new(2, 3), Position::new(7, 3)));
        assert!(field.has_line_of_sight(Position::new(2, 5), Position::new(7, 5)));
        // Adjacent cells always see each other
        assert!(field.has_line_of_sight(Position::new(3, 3), Position::new(4, 4)));
    }

    #[test]
    fn test_grids_are_indexed_x_then_y() {
        let field = Battlefield::new(
            3,
            2,
            &[CellOverride::object(Position::new(2, 1), GridObject::Rock)],
        )
        .unwrap();
        let objects = field.object_grid();
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].len(), 2);
        assert_eq!(objects[2][1], GridObject::Rock);
        assert_eq!(field.terrain_grid()[2][1], Terrain::Impassable);
    }
}
