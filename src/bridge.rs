//! Flat-buffer encoding of the snapshot for engine hosts.
//!
//! Engine bindings move data fastest through a packed `f32` array, so the
//! snapshot is flattened into a fixed header followed by two variable-length
//! tile-delta sections. Offsets are published as constants; the host decodes
//! by index, no JSON parse on the frame path.
//!
//! Layout:
//! ```text
//! [HEADER_LEN floats]                  fixed header, see FIELD_* constants
//! [changed_count] [x y material]*     tiles that advanced a damage stage
//! [removed_count] [x y material]*     tiles removed
//! ```

use crate::grid::TileMaterial;
use crate::world::{Snapshot, TileDelta};

pub const FIELD_TICK: usize = 0;
pub const FIELD_TIME: usize = 1;
pub const FIELD_PLAYER_X: usize = 2;
pub const FIELD_PLAYER_Y: usize = 3;
pub const FIELD_PLAYER_VX: usize = 4;
pub const FIELD_PLAYER_VY: usize = 5;
pub const FIELD_PLAYER_FACING: usize = 6;
pub const FIELD_PLAYER_STATE: usize = 7;
pub const FIELD_PLAYER_GROUNDED: usize = 8;
pub const FIELD_PLAYER_ON_SPRING: usize = 9;
pub const FIELD_BALL_PRESENT: usize = 10;
pub const FIELD_BALL_X: usize = 11;
pub const FIELD_BALL_Y: usize = 12;
pub const FIELD_BALL_VX: usize = 13;
pub const FIELD_BALL_VY: usize = 14;
pub const FIELD_BALL_TRACKING: usize = 15;
pub const FIELD_BALL_ASSIST: usize = 16;
pub const FIELD_CAMERA_X: usize = 17;
pub const FIELD_CAMERA_MIN_X: usize = 18;
pub const FIELD_CAMERA_MAX_X: usize = 19;
pub const FIELD_SEGMENT_ID: usize = 20;
pub const FIELD_OBJECTIVE: usize = 21;
pub const HEADER_LEN: usize = 22;

/// Floats per tile-delta entry: cell x, cell y, material id.
pub const TILE_DELTA_STRIDE: usize = 3;

/// Stable numeric id for a player state, for hosts that switch on it.
pub fn state_id(state: &str) -> f32 {
    let id = match state {
        "Idle" => 0,
        "Run" => 1,
        "Jump" => 2,
        "Fall" => 3,
        "CoyoteTime" => 4,
        "JumpQueued" => 5,
        "Aim" => 6,
        "Strike" => 7,
        "Death" => 8,
        "Elevator" => 9,
        _ => 0,
    };
    id as f32
}

/// Stable numeric id for a material name; unknown names map to beam.
pub fn material_id(name: &str) -> f32 {
    let id = match TileMaterial::from_name(name) {
        Some(TileMaterial::Scaffolding) => 0,
        Some(TileMaterial::Timber) => 1,
        Some(TileMaterial::TimberDamaged) => 2,
        Some(TileMaterial::Brick) => 3,
        Some(TileMaterial::BrickDamaged1) => 4,
        Some(TileMaterial::BrickDamaged2) => 5,
        Some(TileMaterial::Beam) | None => 6,
    };
    id as f32
}

fn push_deltas(buffer: &mut Vec<f32>, deltas: &[TileDelta]) {
    buffer.push(deltas.len() as f32);
    for delta in deltas {
        buffer.push(delta.x as f32);
        buffer.push(delta.y as f32);
        buffer.push(material_id(&delta.material));
    }
}

/// Flatten a snapshot into a packed `f32` buffer.
pub fn encode_snapshot(snapshot: &Snapshot) -> Vec<f32> {
    let mut buffer = Vec::with_capacity(
        HEADER_LEN
            + 2
            + (snapshot.tile_changes.len() + snapshot.tile_removals.len()) * TILE_DELTA_STRIDE,
    );
    buffer.resize(HEADER_LEN, 0.0);

    buffer[FIELD_TICK] = snapshot.tick as f32;
    buffer[FIELD_TIME] = snapshot.time;
    buffer[FIELD_PLAYER_X] = snapshot.player.x;
    buffer[FIELD_PLAYER_Y] = snapshot.player.y;
    buffer[FIELD_PLAYER_VX] = snapshot.player.vx;
    buffer[FIELD_PLAYER_VY] = snapshot.player.vy;
    buffer[FIELD_PLAYER_FACING] = snapshot.player.facing as f32;
    buffer[FIELD_PLAYER_STATE] = state_id(&snapshot.player.state);
    buffer[FIELD_PLAYER_GROUNDED] = snapshot.player.grounded as u8 as f32;
    buffer[FIELD_PLAYER_ON_SPRING] = snapshot.player.on_spring as u8 as f32;

    if let Some(ball) = &snapshot.ball {
        buffer[FIELD_BALL_PRESENT] = 1.0;
        buffer[FIELD_BALL_X] = ball.x;
        buffer[FIELD_BALL_Y] = ball.y;
        buffer[FIELD_BALL_VX] = ball.vx;
        buffer[FIELD_BALL_VY] = ball.vy;
        buffer[FIELD_BALL_TRACKING] = ball.tracking as u8 as f32;
        buffer[FIELD_BALL_ASSIST] = ball.assist;
    }

    buffer[FIELD_CAMERA_X] = snapshot.camera.x;
    buffer[FIELD_CAMERA_MIN_X] = snapshot.camera.min_x;
    buffer[FIELD_CAMERA_MAX_X] = snapshot.camera.max_x;
    buffer[FIELD_SEGMENT_ID] = snapshot.camera.segment_id as f32;
    buffer[FIELD_OBJECTIVE] = snapshot.objective_reached as u8 as f32;

    push_deltas(&mut buffer, &snapshot.tile_changes);
    push_deltas(&mut buffer, &snapshot.tile_removals);
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BallSnapshot, PlayerSnapshot};

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            tick: 120,
            time: 2.0,
            player: PlayerSnapshot {
                x: 64.0,
                y: 48.0,
                vx: 160.0,
                vy: 0.0,
                facing: -1,
                state: "Run".to_string(),
                grounded: true,
                on_spring: false,
            },
            ball: Some(BallSnapshot {
                x: 80.0,
                y: 50.0,
                vx: 0.0,
                vy: 0.0,
                tracking: true,
                assist: 120.0,
            }),
            tile_removals: vec![TileDelta {
                x: 5,
                y: 3,
                material: "scaffolding".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_header_fields() {
        let buffer = encode_snapshot(&sample_snapshot());
        assert_eq!(buffer[FIELD_TICK], 120.0);
        assert_eq!(buffer[FIELD_PLAYER_X], 64.0);
        assert_eq!(buffer[FIELD_PLAYER_FACING], -1.0);
        assert_eq!(buffer[FIELD_PLAYER_STATE], state_id("Run"));
        assert_eq!(buffer[FIELD_PLAYER_GROUNDED], 1.0);
        assert_eq!(buffer[FIELD_BALL_PRESENT], 1.0);
        assert_eq!(buffer[FIELD_BALL_TRACKING], 1.0);
        assert_eq!(buffer[FIELD_BALL_ASSIST], 120.0);
    }

    #[test]
    fn test_missing_ball_zeroes_section() {
        let mut snapshot = sample_snapshot();
        snapshot.ball = None;
        let buffer = encode_snapshot(&snapshot);
        assert_eq!(buffer[FIELD_BALL_PRESENT], 0.0);
        assert_eq!(buffer[FIELD_BALL_X], 0.0);
    }

    #[test]
    fn test_tile_sections_follow_header() {
        let buffer = encode_snapshot(&sample_snapshot());
        // No changes, one removal.
        assert_eq!(buffer[HEADER_LEN], 0.0);
        let removed_base = HEADER_LEN + 1;
        assert_eq!(buffer[removed_base], 1.0);
        assert_eq!(buffer[removed_base + 1], 5.0);
        assert_eq!(buffer[removed_base + 2], 3.0);
        assert_eq!(buffer[removed_base + 3], material_id("scaffolding"));
        assert_eq!(buffer.len(), removed_base + 4);
    }

    #[test]
    fn test_state_ids_are_distinct() {
        let names = [
            "Idle",
            "Run",
            "Jump",
            "Fall",
            "CoyoteTime",
            "JumpQueued",
            "Aim",
            "Strike",
            "Death",
            "Elevator",
        ];
        let mut ids: Vec<f32> = names.iter().map(|n| state_id(n)).collect();
        ids.sort_by(f32::total_cmp);
        ids.dedup();
        assert_eq!(ids.len(), names.len());
    }
}
