//! Serializable snapshot of the simulation state.
//!
//! Taken once per frame by the host; everything the presentation layer needs
//! to draw and react to the simulation is here. Accumulated deltas (tile
//! changes, events, shakes) are drained when the snapshot is taken, so each
//! delta is observed exactly once.

use crate::components::{
    AssistIndicator, Ball, BallPhase, Facing, Player, PlayerState, Position, SurfaceContact,
    Velocity,
};
use crate::events::{FeedbackBuffer, ShakeRequest, SimEvent, TileDeltas};
use crate::segments::{CameraState, SegmentMap};
use crate::systems::player::ObjectiveState;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: i8,
    pub state: String,
    pub grounded: bool,
    pub on_spring: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub tracking: bool,
    /// Aim-assist indicator length; meaningful while tracking.
    pub assist: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraSnapshot {
    pub x: f32,
    pub min_x: f32,
    pub max_x: f32,
    pub segment_id: u32,
}

/// One tile delta, in cell coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileDelta {
    pub x: i32,
    pub y: i32,
    pub material: String,
}

/// Complete observable state for one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f32,
    pub player: PlayerSnapshot,
    pub ball: Option<BallSnapshot>,
    pub camera: CameraSnapshot,
    /// Tiles that advanced a damage stage since the last snapshot.
    pub tile_changes: Vec<TileDelta>,
    /// Tiles removed since the last snapshot.
    pub tile_removals: Vec<TileDelta>,
    pub events: Vec<SimEvent>,
    pub shakes: Vec<ShakeRequest>,
    pub objective_reached: bool,
}

impl Snapshot {
    /// Capture the current state, draining accumulated deltas.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let player = world
            .query_filtered::<(
                &Position,
                &Velocity,
                &Facing,
                &PlayerState,
                &SurfaceContact,
            ), With<Player>>()
            .get_single(world)
            .map(|(pos, vel, facing, state, contact)| PlayerSnapshot {
                x: pos.x,
                y: pos.y,
                vx: vel.vx,
                vy: vel.vy,
                facing: facing.0,
                state: state.as_str().to_string(),
                grounded: contact.grounded,
                on_spring: contact.on_spring,
            })
            .unwrap_or_default();

        let ball = world
            .query_filtered::<(&Position, &Velocity, &BallPhase, &AssistIndicator), With<Ball>>()
            .get_single(world)
            .ok()
            .filter(|(_, _, phase, _)| !phase.dead)
            .map(|(pos, vel, phase, assist)| BallSnapshot {
                x: pos.x,
                y: pos.y,
                vx: vel.vx,
                vy: vel.vy,
                tracking: phase.tracking,
                assist: assist.0,
            });

        let camera_state = *world.resource::<CameraState>();
        let segment_id = world.resource::<SegmentMap>().current_id();
        let camera = CameraSnapshot {
            x: camera_state.x,
            min_x: camera_state.min_x,
            max_x: camera_state.max_x,
            segment_id,
        };

        let (tile_changes, tile_removals) = {
            let mut deltas = world.resource_mut::<TileDeltas>();
            let changed = std::mem::take(&mut deltas.changed);
            let removed = std::mem::take(&mut deltas.removed);
            (to_deltas(changed), to_deltas(removed))
        };
        let (events, shakes) = world.resource_mut::<FeedbackBuffer>().drain();
        let objective_reached = world.resource::<ObjectiveState>().reached;

        Self {
            tick,
            time,
            player,
            ball,
            camera,
            tile_changes,
            tile_removals,
            events,
            shakes,
            objective_reached,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn to_deltas(raw: Vec<((i32, i32), String)>) -> Vec<TileDelta> {
    raw.into_iter()
        .map(|((x, y), material)| TileDelta { x, y, material })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerBundle;

    fn snapshot_world() -> World {
        let mut world = World::new();
        world.insert_resource(CameraState::default());
        world.insert_resource(SegmentMap::default());
        world.insert_resource(TileDeltas::default());
        world.insert_resource(FeedbackBuffer::default());
        world.insert_resource(ObjectiveState::default());
        world.spawn(PlayerBundle::at(42.0, 64.0));
        world
    }

    #[test]
    fn test_snapshot_captures_player() {
        let mut world = snapshot_world();
        let snapshot = Snapshot::from_world(&mut world, 7, 0.12);
        assert_eq!(snapshot.tick, 7);
        assert_eq!(snapshot.player.x, 42.0);
        assert_eq!(snapshot.player.state, "Idle");
        assert!(snapshot.ball.is_none());
    }

    #[test]
    fn test_snapshot_drains_deltas_once() {
        let mut world = snapshot_world();
        world
            .resource_mut::<TileDeltas>()
            .removed
            .push(((3, 4), "brick_damaged_2".to_string()));
        world.resource_mut::<FeedbackBuffer>().push(SimEvent::Landed);

        let first = Snapshot::from_world(&mut world, 1, 0.0);
        assert_eq!(first.tile_removals.len(), 1);
        assert_eq!(first.tile_removals[0].x, 3);
        assert_eq!(first.events.len(), 1);

        let second = Snapshot::from_world(&mut world, 2, 0.0);
        assert!(second.tile_removals.is_empty());
        assert!(second.events.is_empty());
    }

    #[test]
    fn test_snapshot_round_trips_json() {
        let mut world = snapshot_world();
        let snapshot = Snapshot::from_world(&mut world, 3, 0.05);
        let json = snapshot.to_json();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tick, 3);
        assert_eq!(back.player.x, snapshot.player.x);
    }
}
