//! Level document loading.
//!
//! Levels arrive as JSON describing world size, the spawn point, camera
//! segments, the tile layout, and interactive props (springs, hazards,
//! targets, elevators). Loading is atomic: the document is parsed and fully
//! validated before any resource is touched, so a bad document never leaves
//! the world half-loaded.

use crate::grid::{Tile, TileGrid, TileMaterial, INDESTRUCTIBLE};
use crate::segments::{Segment, SegmentMap};
use bevy_ecs::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors produced while parsing or validating a level document.
#[derive(Debug)]
pub enum LevelError {
    /// The document is not valid JSON for the level schema.
    Parse(serde_json::Error),
    /// World dimensions are zero or negative.
    InvalidSize { width: f32, height: f32 },
    /// The document declares no camera segments.
    NoSegments,
    /// Two segments share an id.
    DuplicateSegment(u32),
    /// A segment's min_x is not below its max_x.
    InvalidSegmentBounds(u32),
    /// The spawn point lies outside the world rectangle.
    SpawnOutOfBounds { x: f32, y: f32 },
    /// A tile lies outside the world rectangle.
    TileOutOfBounds { x: i32, y: i32 },
    /// A tile declares a durability override that is neither positive nor the
    /// indestructible sentinel.
    InvalidDurability { x: i32, y: i32, value: i32 },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Parse(err) => write!(f, "level document parse error: {}", err),
            LevelError::InvalidSize { width, height } => {
                write!(f, "invalid world size {}x{}", width, height)
            }
            LevelError::NoSegments => write!(f, "level declares no camera segments"),
            LevelError::DuplicateSegment(id) => write!(f, "duplicate segment id {}", id),
            LevelError::InvalidSegmentBounds(id) => {
                write!(f, "segment {} has min_x >= max_x", id)
            }
            LevelError::SpawnOutOfBounds { x, y } => {
                write!(f, "spawn point ({}, {}) outside world bounds", x, y)
            }
            LevelError::TileOutOfBounds { x, y } => {
                write!(f, "tile at cell ({}, {}) outside world bounds", x, y)
            }
            LevelError::InvalidDurability { x, y, value } => {
                write!(
                    f,
                    "tile at cell ({}, {}) has invalid durability override {}",
                    x, y, value
                )
            }
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(err: serde_json::Error) -> Self {
        LevelError::Parse(err)
    }
}

fn default_tile_size() -> f32 {
    16.0
}

/// Top-level level document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    /// World width in world units.
    pub width: f32,
    /// World height in world units.
    pub height: f32,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Player spawn point `[x, y]`.
    pub spawn: [f32; 2],
    pub segments: Vec<SegmentDef>,
    #[serde(default)]
    pub tiles: Vec<TileDef>,
    #[serde(default)]
    pub props: Vec<PropDef>,
}

/// One camera segment. Segments partition the level along x; ids increase in
/// the direction of travel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentDef {
    pub id: u32,
    pub min_x: f32,
    pub max_x: f32,
    /// Camera anchor overrides; default to the segment bounds.
    #[serde(default)]
    pub camera_min: Option<f32>,
    #[serde(default)]
    pub camera_max: Option<f32>,
    /// Entering this segment kills a ball left behind in an earlier segment.
    #[serde(default)]
    pub kill_ball: Option<bool>,
}

/// One tile placement, in cell coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileDef {
    pub x: i32,
    pub y: i32,
    pub material: String,
    /// Override of the material's default durability chain length.
    #[serde(default)]
    pub durability: Option<i32>,
    #[serde(default)]
    pub destructible: Option<bool>,
    #[serde(default)]
    pub orientation: Option<u8>,
}

/// An interactive prop rectangle, in world units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropDef {
    /// One of "spring", "hazard", "target", "elevator".
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Hazards only: whether the zone also kills the ball.
    #[serde(default)]
    pub kills_ball: Option<bool>,
}

/// Axis-aligned prop rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    /// Overlap test against an AABB given by center and half extents.
    pub fn overlaps_aabb(&self, cx: f32, cy: f32, hx: f32, hy: f32) -> bool {
        cx + hx >= self.x && cx - hx <= self.x + self.w && cy + hy >= self.y && cy - hy <= self.y + self.h
    }
}

/// A kill zone. Always lethal to the player; optionally lethal to the ball.
#[derive(Debug, Clone, Copy)]
pub struct HazardZone {
    pub rect: Rect,
    pub kills_ball: bool,
}

/// An elevator trigger volume. Fires once.
#[derive(Debug, Clone, Copy)]
pub struct ElevatorZone {
    pub rect: Rect,
    pub triggered: bool,
}

/// Interactive level props, grouped by behavior.
#[derive(Resource, Debug, Clone, Default)]
pub struct Props {
    pub springs: Vec<Rect>,
    pub hazards: Vec<HazardZone>,
    pub targets: Vec<Rect>,
    pub elevators: Vec<ElevatorZone>,
}

impl Props {
    pub fn spring_at(&self, cx: f32, cy: f32, hx: f32, hy: f32) -> bool {
        self.springs.iter().any(|r| r.overlaps_aabb(cx, cy, hx, hy))
    }

    pub fn hazard_at(&self, cx: f32, cy: f32, hx: f32, hy: f32) -> bool {
        self.hazards
            .iter()
            .any(|h| h.rect.overlaps_aabb(cx, cy, hx, hy))
    }

    pub fn ball_hazard_at(&self, x: f32, y: f32) -> bool {
        self.hazards
            .iter()
            .any(|h| h.kills_ball && h.rect.contains(x, y))
    }

    pub fn target_at(&self, cx: f32, cy: f32, hx: f32, hy: f32) -> bool {
        self.targets.iter().any(|r| r.overlaps_aabb(cx, cy, hx, hy))
    }
}

/// Static facts about the loaded level.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct LevelInfo {
    pub spawn_x: f32,
    pub spawn_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything a loaded level contributes to the world, built atomically.
pub struct LoadedLevel {
    pub grid: TileGrid,
    pub segments: SegmentMap,
    pub props: Props,
    pub info: LevelInfo,
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let data: LevelData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.width <= 0.0 || self.height <= 0.0 || self.tile_size <= 0.0 {
            return Err(LevelError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.segments.is_empty() {
            return Err(LevelError::NoSegments);
        }
        let mut seen = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            if seen.contains(&seg.id) {
                return Err(LevelError::DuplicateSegment(seg.id));
            }
            seen.push(seg.id);
            if seg.min_x >= seg.max_x {
                return Err(LevelError::InvalidSegmentBounds(seg.id));
            }
        }
        let [sx, sy] = self.spawn;
        if sx < 0.0 || sx > self.width || sy < 0.0 || sy > self.height {
            return Err(LevelError::SpawnOutOfBounds { x: sx, y: sy });
        }
        let cols = (self.width / self.tile_size).ceil() as i32;
        let rows = (self.height / self.tile_size).ceil() as i32;
        for tile in &self.tiles {
            if tile.x < 0 || tile.x >= cols || tile.y < 0 || tile.y >= rows {
                return Err(LevelError::TileOutOfBounds {
                    x: tile.x,
                    y: tile.y,
                });
            }
            // Valid overrides: a positive hit count or the -1 sentinel.
            if let Some(value) = tile.durability {
                if value == 0 || value < INDESTRUCTIBLE {
                    return Err(LevelError::InvalidDurability {
                        x: tile.x,
                        y: tile.y,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Build the world resources this document describes. Call only on a
    /// validated document.
    pub fn build(&self) -> LoadedLevel {
        let mut grid = TileGrid::new(self.width, self.height, self.tile_size);
        for def in &self.tiles {
            let material = TileMaterial::from_name(&def.material).unwrap_or_else(|| {
                warn!(
                    "unknown tile material '{}' at ({}, {}); treating as beam",
                    def.material, def.x, def.y
                );
                TileMaterial::Beam
            });
            let mut tile = Tile::new(material);
            if let Some(durability) = def.durability {
                tile.durability = durability;
            }
            if let Some(destructible) = def.destructible {
                tile.destructible = destructible;
            }
            if let Some(orientation) = def.orientation {
                tile.orientation = orientation;
            }
            grid.insert((def.x, def.y), tile);
        }

        let segments: Vec<Segment> = self
            .segments
            .iter()
            .map(|def| Segment {
                id: def.id,
                min_x: def.min_x,
                max_x: def.max_x,
                camera_min: def.camera_min.unwrap_or(def.min_x),
                camera_max: def.camera_max.unwrap_or(def.max_x),
                kill_ball: def.kill_ball.unwrap_or(false),
            })
            .collect();

        let mut props = Props::default();
        for def in &self.props {
            let rect = Rect {
                x: def.x,
                y: def.y,
                w: def.w,
                h: def.h,
            };
            match def.kind.as_str() {
                "spring" => props.springs.push(rect),
                "hazard" => props.hazards.push(HazardZone {
                    rect,
                    kills_ball: def.kills_ball.unwrap_or(false),
                }),
                "target" => props.targets.push(rect),
                "elevator" => props.elevators.push(ElevatorZone {
                    rect,
                    triggered: false,
                }),
                other => warn!("unknown prop kind '{}' ignored", other),
            }
        }

        LoadedLevel {
            grid,
            segments: SegmentMap::new(segments),
            props,
            info: LevelInfo {
                spawn_x: self.spawn[0],
                spawn_y: self.spawn[1],
                width: self.width,
                height: self.height,
            },
        }
    }
}
