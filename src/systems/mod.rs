//! Simulation systems, run in a fixed chained order each tick.

pub mod ball;
pub mod camera;
pub mod destruction;
pub mod input;
pub mod player;

pub use ball::{ball_flight_system, ball_tracking_system};
pub use camera::{camera_update_system, segment_system};
pub use destruction::destruction_system;
pub use player::{player_motion_system, player_state_system, respawn_system, timer_system};
