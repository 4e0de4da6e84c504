//! Segment progression and camera follow.
//!
//! `segment_system` advances the monotonic segment id from the player's
//! position and enforces the leave-the-ball-behind rule; `camera_update_system`
//! derives the camera focus from the current segment's anchors.

use crate::components::{Ball, BallPhase, BallRef, Player, Position};
use crate::events::{FeedbackBuffer, SimEvent};
use crate::segments::{CameraState, SegmentMap};
use bevy_ecs::prelude::*;
use log::debug;

/// Set to snap the camera to the segment start on the next update instead of
/// easing from its previous position.
#[derive(Resource, Debug, Default)]
pub struct CameraForceUpdate(pub bool);

/// Track which segment the player and ball are in; forward transitions only.
pub fn segment_system(
    mut segments: ResMut<SegmentMap>,
    mut feedback: ResMut<FeedbackBuffer>,
    q_player: Query<(&Position, &BallRef), With<Player>>,
    mut q_ball: Query<(&Position, &mut BallPhase), (With<Ball>, Without<Player>)>,
) {
    let Ok((player_pos, ball_ref)) = q_player.get_single() else {
        return;
    };

    if let Some(entity) = ball_ref.0 {
        if let Ok((ball_pos, _)) = q_ball.get(entity) {
            if let Some(id) = segments.segment_id_at(ball_pos.x) {
                segments.note_ball_segment(id);
            }
        }
    }

    let Some(id) = segments.segment_id_at(player_pos.x) else {
        return;
    };
    if segments.enter(id) {
        feedback.push(SimEvent::SegmentEntered { id });

        // Crossing into a kill-ball segment abandons a ball left behind.
        let kill_ball = segments
            .current_segment()
            .map(|s| s.kill_ball)
            .unwrap_or(false);
        if kill_ball && segments.ball_segment_id() < id {
            if let Some(entity) = ball_ref.0 {
                if let Ok((_, mut phase)) = q_ball.get_mut(entity) {
                    // The owner observes the dead flag and despawns it.
                    if !phase.tracking {
                        debug!("ball abandoned behind segment {}", id);
                        phase.dead = true;
                    }
                }
            }
        }
    }
}

/// Clamp the camera focus to the current segment's travel anchors.
pub fn camera_update_system(
    segments: Res<SegmentMap>,
    mut camera: ResMut<CameraState>,
    mut force: ResMut<CameraForceUpdate>,
    q_player: Query<&Position, With<Player>>,
) {
    let Some(segment) = segments.current_segment() else {
        return;
    };
    camera.min_x = segment.camera_min;
    camera.max_x = segment.camera_max;

    if force.0 {
        force.0 = false;
        camera.x = camera.min_x;
        return;
    }
    let Ok(pos) = q_player.get_single() else {
        return;
    };
    camera.x = pos.x.clamp(camera.min_x, camera.max_x);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BallBundle, PlayerBundle};
    use crate::segments::Segment;

    fn segment(id: u32, min_x: f32, max_x: f32, kill_ball: bool) -> Segment {
        Segment {
            id,
            min_x,
            max_x,
            camera_min: min_x + 40.0,
            camera_max: max_x - 40.0,
            kill_ball,
        }
    }

    fn test_world(kill_ball_second: bool) -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(SegmentMap::new(vec![
            segment(0, 0.0, 320.0, false),
            segment(1, 320.0, 640.0, kill_ball_second),
        ]));
        world.insert_resource(CameraState::default());
        world.insert_resource(CameraForceUpdate::default());
        world.insert_resource(FeedbackBuffer::default());

        let mut schedule = Schedule::default();
        schedule.add_systems((segment_system, camera_update_system).chain());
        (world, schedule)
    }

    #[test]
    fn test_camera_follows_within_anchors() {
        let (mut world, mut schedule) = test_world(false);
        let player = world.spawn(PlayerBundle::at(10.0, 50.0)).id();

        schedule.run(&mut world);
        // Player left of the first anchor: camera pinned at min.
        assert_eq!(world.resource::<CameraState>().x, 40.0);

        world.get_mut::<Position>(player).unwrap().x = 150.0;
        schedule.run(&mut world);
        assert_eq!(world.resource::<CameraState>().x, 150.0);

        world.get_mut::<Position>(player).unwrap().x = 310.0;
        schedule.run(&mut world);
        assert_eq!(world.resource::<CameraState>().x, 280.0);
    }

    #[test]
    fn test_entering_next_segment_swaps_anchors() {
        let (mut world, mut schedule) = test_world(false);
        let player = world.spawn(PlayerBundle::at(10.0, 50.0)).id();
        schedule.run(&mut world);

        world.get_mut::<Position>(player).unwrap().x = 400.0;
        schedule.run(&mut world);
        assert_eq!(world.resource::<SegmentMap>().current_id(), 1);
        let camera = *world.resource::<CameraState>();
        assert_eq!(camera.min_x, 360.0);
        assert_eq!(camera.max_x, 600.0);

        let events = &world.resource::<FeedbackBuffer>().events;
        assert!(events.contains(&SimEvent::SegmentEntered { id: 1 }));
    }

    #[test]
    fn test_backtracking_keeps_camera_forward() {
        let (mut world, mut schedule) = test_world(false);
        let player = world.spawn(PlayerBundle::at(400.0, 50.0)).id();
        schedule.run(&mut world);
        assert_eq!(world.resource::<SegmentMap>().current_id(), 1);

        // Walking back into segment 0 does not rewind the camera.
        world.get_mut::<Position>(player).unwrap().x = 100.0;
        schedule.run(&mut world);
        assert_eq!(world.resource::<SegmentMap>().current_id(), 1);
        assert_eq!(world.resource::<CameraState>().min_x, 360.0);
        // Player is left of the segment's anchor range.
        assert_eq!(world.resource::<CameraState>().x, 360.0);
    }

    #[test]
    fn test_kill_ball_segment_abandons_launched_ball() {
        let (mut world, mut schedule) = test_world(true);
        let player = world.spawn(PlayerBundle::at(10.0, 50.0)).id();
        schedule.run(&mut world);

        // Launch a ball and leave it in segment 0.
        let ball = world.spawn(BallBundle::tracking_at(100.0, 50.0, 1)).id();
        world.get_mut::<BallPhase>(ball).unwrap().tracking = false;
        world.get_mut::<BallRef>(player).unwrap().0 = Some(ball);

        world.get_mut::<Position>(player).unwrap().x = 400.0;
        schedule.run(&mut world);
        assert!(world.get::<BallPhase>(ball).unwrap().dead);
    }

    #[test]
    fn test_ball_in_same_segment_survives_transition() {
        let (mut world, mut schedule) = test_world(true);
        let player = world.spawn(PlayerBundle::at(10.0, 50.0)).id();
        schedule.run(&mut world);

        // The ball crossed ahead into segment 1 before the player.
        let ball = world.spawn(BallBundle::tracking_at(400.0, 50.0, 1)).id();
        world.get_mut::<BallPhase>(ball).unwrap().tracking = false;
        world.get_mut::<BallRef>(player).unwrap().0 = Some(ball);

        world.get_mut::<Position>(player).unwrap().x = 400.0;
        schedule.run(&mut world);
        assert!(!world.get::<BallPhase>(ball).unwrap().dead);
    }

    #[test]
    fn test_force_update_snaps_to_segment_start() {
        let (mut world, mut schedule) = test_world(false);
        world.spawn(PlayerBundle::at(150.0, 50.0));
        world.resource_mut::<CameraForceUpdate>().0 = true;

        schedule.run(&mut world);
        assert_eq!(world.resource::<CameraState>().x, 40.0);
        assert!(!world.resource::<CameraForceUpdate>().0);

        // Next tick resumes following.
        schedule.run(&mut world);
        assert_eq!(world.resource::<CameraState>().x, 150.0);
    }
}
