//! Feedback buffers bridging gameplay systems to the presentation layer.
//!
//! Systems push plain event values into these resources; the snapshot drains
//! them once per tick. Nothing here is consumed by gameplay logic, so a host
//! that ignores them loses no simulation behavior.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// A gameplay event worth surfacing to the host for sound or VFX.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    Jump {
        spring: bool,
    },
    Landed,
    BallSpawned,
    BallLaunched,
    BallBounced {
        x: f32,
        y: f32,
    },
    BallRemoved,
    TileDamaged {
        cell_x: i32,
        cell_y: i32,
        material: String,
    },
    TileRemoved {
        cell_x: i32,
        cell_y: i32,
        material: String,
    },
    PlayerDied,
    PlayerRespawned,
    SegmentEntered {
        id: u32,
    },
    TargetReached,
    ElevatorEntered,
}

/// A camera shake request with a directional hint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ShakeRequest {
    pub dx: f32,
    pub dy: f32,
    pub strength: f32,
}

/// Per-tick event accumulator, drained into the snapshot.
#[derive(Resource, Debug, Default)]
pub struct FeedbackBuffer {
    pub events: Vec<SimEvent>,
    pub shakes: Vec<ShakeRequest>,
}

impl FeedbackBuffer {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn shake(&mut self, dx: f32, dy: f32, strength: f32) {
        self.shakes.push(ShakeRequest { dx, dy, strength });
    }

    pub fn drain(&mut self) -> (Vec<SimEvent>, Vec<ShakeRequest>) {
        (
            std::mem::take(&mut self.events),
            std::mem::take(&mut self.shakes),
        )
    }
}

/// Confirmed ball-on-tile hits awaiting the destruction system, as
/// `(cell, impact normal)` pairs.
#[derive(Resource, Debug, Default)]
pub struct PendingHits(pub Vec<((i32, i32), (f32, f32))>);

/// Tile-state changes accumulated since the last snapshot, as
/// `(cell, material name)` pairs.
#[derive(Resource, Debug, Default)]
pub struct TileDeltas {
    pub changed: Vec<((i32, i32), String)>,
    pub removed: Vec<((i32, i32), String)>,
}
