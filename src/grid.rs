//! Tile grid and destruction registry.
//!
//! The level's destructible geometry is an axis-aligned grid of tiles keyed by
//! cell coordinates. Each material carries a short deterministic durability
//! chain; a confirmed hit advances the chain exactly one stage and removing a
//! tile deletes its entry, making the cell passable. This registry is the only
//! place level geometry is mutated during play, and the destruction system is
//! its only writer.

use crate::collision::SurfaceTag;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Durability sentinel marking an indestructible tile.
pub const INDESTRUCTIBLE: i32 = -1;

/// Tile material. Damaged variants are distinct materials so the damage chain
/// is visible to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileMaterial {
    Scaffolding,
    Timber,
    TimberDamaged,
    Brick,
    BrickDamaged1,
    BrickDamaged2,
    /// Structural beam/girder/support. Never destructible.
    Beam,
}

impl TileMaterial {
    /// Parse a level-document material string. Unknown strings return `None`;
    /// the loader maps them to an indestructible tile with a warning.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scaffolding" => Some(TileMaterial::Scaffolding),
            "timber" => Some(TileMaterial::Timber),
            "timber_damaged" => Some(TileMaterial::TimberDamaged),
            "brick" => Some(TileMaterial::Brick),
            "brick_damaged_1" => Some(TileMaterial::BrickDamaged1),
            "brick_damaged_2" => Some(TileMaterial::BrickDamaged2),
            "beam" | "girder" | "support" => Some(TileMaterial::Beam),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TileMaterial::Scaffolding => "scaffolding",
            TileMaterial::Timber => "timber",
            TileMaterial::TimberDamaged => "timber_damaged",
            TileMaterial::Brick => "brick",
            TileMaterial::BrickDamaged1 => "brick_damaged_1",
            TileMaterial::BrickDamaged2 => "brick_damaged_2",
            TileMaterial::Beam => "beam",
        }
    }

    /// Hits remaining before removal for a fresh tile of this material.
    pub fn default_durability(&self) -> i32 {
        match self {
            TileMaterial::Scaffolding => 1,
            TileMaterial::Timber => 2,
            TileMaterial::TimberDamaged => 1,
            TileMaterial::Brick => 3,
            TileMaterial::BrickDamaged1 => 2,
            TileMaterial::BrickDamaged2 => 1,
            TileMaterial::Beam => INDESTRUCTIBLE,
        }
    }

    /// The next stage of the damage chain, or `None` when the next hit removes
    /// the tile. Indestructible materials return themselves.
    pub fn damaged(&self) -> Option<Self> {
        match self {
            TileMaterial::Scaffolding => None,
            TileMaterial::Timber => Some(TileMaterial::TimberDamaged),
            TileMaterial::TimberDamaged => None,
            TileMaterial::Brick => Some(TileMaterial::BrickDamaged1),
            TileMaterial::BrickDamaged1 => Some(TileMaterial::BrickDamaged2),
            TileMaterial::BrickDamaged2 => None,
            TileMaterial::Beam => Some(TileMaterial::Beam),
        }
    }

    pub fn is_destructible(&self) -> bool {
        !matches!(self, TileMaterial::Beam)
    }
}

/// A single tile in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub material: TileMaterial,
    /// Hits remaining before removal; `INDESTRUCTIBLE` (-1) never changes.
    pub durability: i32,
    pub destructible: bool,
    /// Rotation metadata (quarter turns), preserved across damage transitions.
    pub orientation: u8,
}

impl Tile {
    pub fn new(material: TileMaterial) -> Self {
        Self {
            material,
            durability: material.default_durability(),
            destructible: material.is_destructible(),
            orientation: 0,
        }
    }

    pub fn with_orientation(mut self, orientation: u8) -> Self {
        self.orientation = orientation;
        self
    }
}

/// Outcome of applying one hit to a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// Empty cell or indestructible tile: nothing changed.
    Ignored,
    /// The tile advanced one damage stage.
    Damaged { from: TileMaterial, to: TileMaterial },
    /// The tile's durability chain terminated and the entry was deleted.
    Removed { material: TileMaterial },
}

/// The active tile grid for the loaded level.
#[derive(Resource, Debug, Clone)]
pub struct TileGrid {
    /// Size of each cell in world units.
    pub tile_size: f32,
    /// World bounds in world units.
    pub width: f32,
    pub height: f32,
    cells: HashMap<(i32, i32), Tile>,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(0.0, 0.0, 16.0)
    }
}

impl TileGrid {
    pub fn new(width: f32, height: f32, tile_size: f32) -> Self {
        Self {
            tile_size,
            width,
            height,
            cells: HashMap::new(),
        }
    }

    /// Convert world coordinates to the containing cell.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.tile_size).floor() as i32,
            (y / self.tile_size).floor() as i32,
        )
    }

    /// World-space center of a cell.
    pub fn cell_center(&self, cell: (i32, i32)) -> (f32, f32) {
        (
            (cell.0 as f32 + 0.5) * self.tile_size,
            (cell.1 as f32 + 0.5) * self.tile_size,
        )
    }

    pub fn insert(&mut self, cell: (i32, i32), tile: Tile) {
        self.cells.insert(cell, tile);
    }

    pub fn get(&self, cell: (i32, i32)) -> Option<&Tile> {
        self.cells.get(&cell)
    }

    pub fn is_empty_cell(&self, cell: (i32, i32)) -> bool {
        !self.cells.contains_key(&cell)
    }

    pub fn tile_count(&self) -> usize {
        self.cells.len()
    }

    /// Collision tag for a cell: beams and destructible tiles are both solid
    /// but collide under different tags.
    pub fn solid_tag(&self, cell: (i32, i32)) -> Option<SurfaceTag> {
        self.cells.get(&cell).map(|tile| {
            if tile.destructible {
                SurfaceTag::Tile
            } else {
                SurfaceTag::Beam
            }
        })
    }

    /// Apply one confirmed hit to a cell and advance its durability chain.
    ///
    /// Hits against empty cells and indestructible tiles are no-ops. A removed
    /// tile's entry is deleted; a later lookup at the cell reports empty.
    pub fn apply_hit(&mut self, cell: (i32, i32)) -> HitOutcome {
        let Some(tile) = self.cells.get_mut(&cell) else {
            return HitOutcome::Ignored;
        };
        if !tile.destructible || tile.durability == INDESTRUCTIBLE {
            return HitOutcome::Ignored;
        }

        tile.durability -= 1;
        debug_assert!(tile.durability >= 0, "destructible durability underflow");

        if tile.durability <= 0 {
            let material = tile.material;
            self.cells.remove(&cell);
            return HitOutcome::Removed { material };
        }

        let from = tile.material;
        match from.damaged() {
            Some(next) => {
                // Orientation survives every stage of the chain.
                tile.material = next;
                HitOutcome::Damaged { from, to: next }
            }
            // Durability says the tile survives but the chain says remove;
            // trust the chain (covers durability overrides from level data).
            None => {
                let material = tile.material;
                self.cells.remove(&cell);
                HitOutcome::Removed { material }
            }
        }
    }

    /// Iterate all live cells.
    pub fn iter(&self) -> impl Iterator<Item = (&(i32, i32), &Tile)> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(cell: (i32, i32), material: TileMaterial) -> TileGrid {
        let mut grid = TileGrid::new(320.0, 240.0, 16.0);
        grid.insert(cell, Tile::new(material));
        grid
    }

    #[test]
    fn test_scaffolding_removed_on_first_hit() {
        let mut grid = grid_with((5, 3), TileMaterial::Scaffolding);

        let outcome = grid.apply_hit((5, 3));
        assert_eq!(
            outcome,
            HitOutcome::Removed {
                material: TileMaterial::Scaffolding
            }
        );
        assert!(grid.is_empty_cell((5, 3)));
        assert!(grid.get((5, 3)).is_none());
    }

    #[test]
    fn test_timber_two_hit_chain() {
        let mut grid = grid_with((0, 0), TileMaterial::Timber);

        match grid.apply_hit((0, 0)) {
            HitOutcome::Damaged { from, to } => {
                assert_eq!(from, TileMaterial::Timber);
                assert_eq!(to, TileMaterial::TimberDamaged);
            }
            other => panic!("expected Damaged, got {:?}", other),
        }
        assert!(matches!(
            grid.apply_hit((0, 0)),
            HitOutcome::Removed {
                material: TileMaterial::TimberDamaged
            }
        ));
        assert!(grid.is_empty_cell((0, 0)));
    }

    #[test]
    fn test_brick_three_hit_chain() {
        let mut grid = grid_with((2, 2), TileMaterial::Brick);

        assert!(matches!(
            grid.apply_hit((2, 2)),
            HitOutcome::Damaged {
                to: TileMaterial::BrickDamaged1,
                ..
            }
        ));
        assert_eq!(grid.get((2, 2)).unwrap().material, TileMaterial::BrickDamaged1);

        assert!(matches!(
            grid.apply_hit((2, 2)),
            HitOutcome::Damaged {
                to: TileMaterial::BrickDamaged2,
                ..
            }
        ));
        assert_eq!(grid.get((2, 2)).unwrap().material, TileMaterial::BrickDamaged2);

        assert!(matches!(grid.apply_hit((2, 2)), HitOutcome::Removed { .. }));
        assert!(grid.is_empty_cell((2, 2)));
    }

    #[test]
    fn test_beam_is_invariant_under_hits() {
        let mut grid = grid_with((1, 1), TileMaterial::Beam);

        for _ in 0..10 {
            assert_eq!(grid.apply_hit((1, 1)), HitOutcome::Ignored);
        }
        let tile = grid.get((1, 1)).unwrap();
        assert_eq!(tile.material, TileMaterial::Beam);
        assert_eq!(tile.durability, INDESTRUCTIBLE);
    }

    #[test]
    fn test_hit_on_empty_cell_is_noop() {
        let mut grid = TileGrid::new(320.0, 240.0, 16.0);
        assert_eq!(grid.apply_hit((7, 7)), HitOutcome::Ignored);
    }

    #[test]
    fn test_durability_never_regresses() {
        // Repeated hits strictly advance the chain; no stage repeats.
        let mut grid = grid_with((0, 0), TileMaterial::Brick);
        let mut seen = vec![TileMaterial::Brick];
        loop {
            match grid.apply_hit((0, 0)) {
                HitOutcome::Damaged { to, .. } => {
                    assert!(!seen.contains(&to), "damage chain revisited {:?}", to);
                    seen.push(to);
                }
                HitOutcome::Removed { .. } => break,
                HitOutcome::Ignored => panic!("destructible hit ignored"),
            }
        }
        assert_eq!(
            seen,
            vec![
                TileMaterial::Brick,
                TileMaterial::BrickDamaged1,
                TileMaterial::BrickDamaged2
            ]
        );
    }

    #[test]
    fn test_orientation_preserved_across_damage() {
        let mut grid = TileGrid::new(320.0, 240.0, 16.0);
        grid.insert((4, 4), Tile::new(TileMaterial::Brick).with_orientation(3));

        grid.apply_hit((4, 4));
        assert_eq!(grid.get((4, 4)).unwrap().orientation, 3);
        grid.apply_hit((4, 4));
        assert_eq!(grid.get((4, 4)).unwrap().orientation, 3);
    }

    #[test]
    fn test_world_to_cell() {
        let grid = TileGrid::new(320.0, 240.0, 16.0);
        assert_eq!(grid.world_to_cell(0.0, 0.0), (0, 0));
        assert_eq!(grid.world_to_cell(31.9, 16.0), (1, 1));
        assert_eq!(grid.world_to_cell(-0.1, 5.0), (-1, 0));
    }

    #[test]
    fn test_solid_tags() {
        let mut grid = TileGrid::new(320.0, 240.0, 16.0);
        grid.insert((0, 0), Tile::new(TileMaterial::Brick));
        grid.insert((1, 0), Tile::new(TileMaterial::Beam));

        assert_eq!(grid.solid_tag((0, 0)), Some(SurfaceTag::Tile));
        assert_eq!(grid.solid_tag((1, 0)), Some(SurfaceTag::Beam));
        assert_eq!(grid.solid_tag((2, 0)), None);
    }
}
