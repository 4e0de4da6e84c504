//! Rubble Runner simulation core.
//!
//! A headless, deterministic simulation for a destructible puzzle-platformer:
//! a finite-state character controller with coyote time and jump buffering, a
//! single aim-and-launch projectile with specular bouncing, a tile-durability
//! destruction registry, and a monotonic segment-based camera. The core runs
//! on a fixed timestep over `bevy_ecs` and knows nothing about rendering,
//! audio, or input devices; hosts feed it input snapshots and read back
//! serializable state.
//!
//! Typical embedding:
//!
//! ```no_run
//! use rubble_sim::{InputSnapshot, SimWorld};
//!
//! let mut sim = SimWorld::new();
//! sim.load_level(include_str!("../demos/level.json")).unwrap();
//!
//! let input = InputSnapshot { axis: 1.0, ..Default::default() };
//! sim.step(1.0 / 60.0, &input);
//! let snapshot = sim.snapshot();
//! println!("player at ({}, {})", snapshot.player.x, snapshot.player.y);
//! ```

pub mod api;
pub mod bridge;
pub mod collision;
pub mod components;
pub mod config;
pub mod events;
pub mod grid;
pub mod level;
pub mod segments;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use components::PlayerState;
pub use config::SimConfig;
pub use events::{ShakeRequest, SimEvent};
pub use grid::{HitOutcome, Tile, TileGrid, TileMaterial};
pub use level::{LevelData, LevelError};
pub use segments::{CameraState, SegmentMap};
pub use systems::input::InputSnapshot;
pub use world::Snapshot;
