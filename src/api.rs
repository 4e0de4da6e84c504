//! Public facade over the simulation.
//!
//! [`SimWorld`] owns the ECS world and the fixed-order schedule. The host
//! loads a level, feeds one [`InputSnapshot`] per frame through [`step`]
//! (or drives fixed updates directly with [`tick`]), and reads the results
//! back as a [`Snapshot`] or a packed flat buffer.
//!
//! [`step`]: SimWorld::step
//! [`tick`]: SimWorld::tick

use crate::bridge;
use crate::components::{PlayerBundle, PlayerState};
use crate::config::{DeltaTime, SimConfig, SimTick};
use crate::events::{FeedbackBuffer, PendingHits, TileDeltas};
use crate::grid::TileGrid;
use crate::level::{LevelData, LevelError, LevelInfo, Props};
use crate::segments::{CameraState, SegmentMap};
use crate::systems::ball::AimBlocked;
use crate::systems::camera::CameraForceUpdate;
use crate::systems::input::InputSnapshot;
use crate::systems::player::{ObjectiveState, RespawnRequest};
use crate::systems::{
    ball_flight_system, ball_tracking_system, camera_update_system, destruction_system,
    player_motion_system, player_state_system, respawn_system, segment_system, timer_system,
};
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use log::info;

/// Cap on fixed updates consumed by one `step` call, so a long stall never
/// spirals into an unbounded catch-up burst.
const MAX_UPDATES_PER_STEP: u32 = 8;

/// The simulation core: ECS world, schedule, and time accumulator.
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    time: f32,
    accumulator: f32,
    paused: bool,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(config);
        world.insert_resource(SimTick::default());
        world.insert_resource(InputSnapshot::default());
        world.insert_resource(TileGrid::default());
        world.insert_resource(SegmentMap::default());
        world.insert_resource(Props::default());
        world.insert_resource(LevelInfo::default());
        world.insert_resource(CameraState::default());
        world.insert_resource(CameraForceUpdate::default());
        world.insert_resource(AimBlocked::default());
        world.insert_resource(RespawnRequest::default());
        world.insert_resource(ObjectiveState::default());
        world.insert_resource(PendingHits::default());
        world.insert_resource(TileDeltas::default());
        world.insert_resource(FeedbackBuffer::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                timer_system,
                player_state_system,
                player_motion_system,
                ball_tracking_system,
                ball_flight_system,
                destruction_system,
                segment_system,
                camera_update_system,
                respawn_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            time: 0.0,
            accumulator: 0.0,
            paused: false,
        }
    }

    /// Load a level document, replacing any previous level.
    ///
    /// Loading is atomic: a document that fails to parse or validate leaves
    /// the current world untouched.
    pub fn load_level(&mut self, json: &str) -> Result<(), LevelError> {
        let data = LevelData::from_json(json)?;
        let level = data.build();

        self.world.clear_entities();
        info!(
            "level loaded: {} tiles, {} props, spawn ({:.0}, {:.0})",
            level.grid.tile_count(),
            level.props.springs.len() + level.props.hazards.len() + level.props.targets.len(),
            level.info.spawn_x,
            level.info.spawn_y
        );

        let spawn = (level.info.spawn_x, level.info.spawn_y);
        self.world.insert_resource(level.grid);
        self.world.insert_resource(level.segments);
        self.world.insert_resource(level.props);
        self.world.insert_resource(level.info);
        self.world.insert_resource(CameraState::default());
        self.world.insert_resource(CameraForceUpdate(true));
        self.world.insert_resource(AimBlocked::default());
        self.world.insert_resource(RespawnRequest::default());
        self.world.insert_resource(ObjectiveState::default());
        self.world.insert_resource(PendingHits::default());
        self.world.insert_resource(TileDeltas::default());
        self.world.insert_resource(FeedbackBuffer::default());
        self.world.insert_resource(SimTick::default());

        self.world.spawn(PlayerBundle::at(spawn.0, spawn.1));
        self.time = 0.0;
        self.accumulator = 0.0;
        self.paused = false;
        Ok(())
    }

    /// Run exactly one fixed update with the given input.
    ///
    /// A pause press only toggles the flag; the toggle tick itself never
    /// advances the simulation, in either direction.
    pub fn tick(&mut self, input: &InputSnapshot) {
        self.world.insert_resource(*input);
        if input.pause_pressed {
            self.paused = !self.paused;
            return;
        }
        if self.paused {
            return;
        }
        let dt = self.world.resource::<SimConfig>().fixed_timestep;
        self.world.insert_resource(DeltaTime(dt));
        self.schedule.run(&mut self.world);
        self.world.resource_mut::<SimTick>().increment();
        self.time += dt;
    }

    /// Advance by wall-clock `dt`, running as many fixed updates as the
    /// accumulator allows. Input edges are consumed by the first update only.
    pub fn step(&mut self, dt: f32, input: &InputSnapshot) {
        self.accumulator += dt;
        let fixed = self.world.resource::<SimConfig>().fixed_timestep;
        let mut current = *input;
        let mut updates = 0;
        while self.accumulator >= fixed && updates < MAX_UPDATES_PER_STEP {
            self.tick(&current);
            current.clear_edges();
            self.accumulator -= fixed;
            updates += 1;
        }
        if updates == MAX_UPDATES_PER_STEP {
            // Drop the backlog instead of spiraling.
            self.accumulator = 0.0;
        }
    }

    /// Capture the observable state, draining per-frame deltas and events.
    pub fn snapshot(&mut self) -> Snapshot {
        let tick = self.world.resource::<SimTick>().0;
        Snapshot::from_world(&mut self.world, tick, self.time)
    }

    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json()
    }

    /// Snapshot packed into a flat `f32` buffer for engine bindings.
    pub fn snapshot_buffer(&mut self) -> Vec<f32> {
        bridge::encode_snapshot(&self.snapshot())
    }

    /// Camera travel anchors of the current segment.
    pub fn camera_bounds(&self) -> (f32, f32) {
        let camera = self.world.resource::<CameraState>();
        (camera.min_x, camera.max_x)
    }

    pub fn current_segment(&self) -> u32 {
        self.world.resource::<SegmentMap>().current_id()
    }

    /// Host-driven segment transition (scripted doors, cutscenes). Subject to
    /// the same forward-only rule as position-driven transitions.
    pub fn notify_segment_entered(&mut self, id: u32) -> bool {
        self.world.resource_mut::<SegmentMap>().enter(id)
    }

    /// Put the player into the elevator state from a host-side trigger.
    pub fn enter_elevator(&mut self) {
        self.set_player_state(PlayerState::Elevator);
    }

    /// The host's elevator ride finished; the player drops back into play.
    pub fn elevator_finished(&mut self) {
        let mut query = self.world.query::<&mut PlayerState>();
        if let Ok(mut state) = query.get_single_mut(&mut self.world) {
            if *state == PlayerState::Elevator {
                *state = PlayerState::Fall;
            }
        }
    }

    /// Force an immediate respawn (menu retry).
    pub fn respawn(&mut self) {
        self.world.resource_mut::<RespawnRequest>().0 = true;
        self.tick(&InputSnapshot::default());
    }

    pub fn tick_count(&self) -> u64 {
        self.world.resource::<SimTick>().0
    }

    pub fn sim_time(&self) -> f32 {
        self.time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn objective_reached(&self) -> bool {
        self.world.resource::<ObjectiveState>().reached
    }

    /// Direct world access for hosts with needs the facade does not cover.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    fn set_player_state(&mut self, new_state: PlayerState) {
        let mut query = self.world.query::<&mut PlayerState>();
        if let Ok(mut state) = query.get_single_mut(&mut self.world) {
            *state = new_state;
        }
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
