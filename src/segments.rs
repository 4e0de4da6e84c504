//! Camera segments.
//!
//! A level is partitioned along x into ordered segments. Progression is
//! monotonic: the current segment id only ever increases, so backtracking
//! never scrolls the camera backwards. The camera itself is a clamped
//! follower between the current segment's two anchors.

use bevy_ecs::prelude::*;
use log::{debug, warn};

/// One camera segment, resolved from the level document.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub id: u32,
    /// Horizontal extent of the segment in world units.
    pub min_x: f32,
    pub max_x: f32,
    /// Camera travel anchors inside the segment.
    pub camera_min: f32,
    pub camera_max: f32,
    /// Entering this segment kills a ball left in an earlier segment.
    pub kill_ball: bool,
}

impl Segment {
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x
    }
}

/// Segment registry and progression state for the loaded level.
#[derive(Resource, Debug, Clone, Default)]
pub struct SegmentMap {
    segments: Vec<Segment>,
    current_id: u32,
    initial_id: u32,
    /// Highest segment id the ball has been seen in.
    ball_segment_id: u32,
}

impl SegmentMap {
    /// Build from the level's segments. The lowest id is the starting segment.
    pub fn new(mut segments: Vec<Segment>) -> Self {
        segments.sort_by_key(|s| s.id);
        let initial_id = segments.first().map(|s| s.id).unwrap_or(0);
        Self {
            segments,
            current_id: initial_id,
            initial_id,
            ball_segment_id: initial_id,
        }
    }

    pub fn current_id(&self) -> u32 {
        self.current_id
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == self.current_id)
    }

    pub fn get(&self, id: u32) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Highest-id segment containing `x`, if any. Overlap at a boundary
    /// resolves forward.
    pub fn segment_id_at(&self, x: f32) -> Option<u32> {
        self.segments
            .iter()
            .filter(|s| s.contains_x(x))
            .map(|s| s.id)
            .max()
    }

    /// Advance to segment `id`. Returns true if this was a forward transition;
    /// requests to re-enter the current or an earlier segment are refused.
    pub fn enter(&mut self, id: u32) -> bool {
        if self.get(id).is_none() {
            warn!("segment transition to unknown id {} refused", id);
            return false;
        }
        if id <= self.current_id {
            return false;
        }
        debug!("segment {} -> {}", self.current_id, id);
        self.current_id = id;
        true
    }

    /// Record the ball's segment, monotonically.
    pub fn note_ball_segment(&mut self, id: u32) {
        if id > self.ball_segment_id {
            self.ball_segment_id = id;
        }
    }

    pub fn ball_segment_id(&self) -> u32 {
        self.ball_segment_id
    }

    /// Reset progression to the starting segment (respawn).
    pub fn reset(&mut self) {
        self.current_id = self.initial_id;
        self.ball_segment_id = self.initial_id;
    }
}

/// Camera follow state, derived from the current segment every tick.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CameraState {
    pub min_x: f32,
    pub max_x: f32,
    /// Current camera focus x, clamped to `[min_x, max_x]`.
    pub x: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SegmentMap {
        SegmentMap::new(vec![
            Segment {
                id: 2,
                min_x: 320.0,
                max_x: 640.0,
                camera_min: 360.0,
                camera_max: 600.0,
                kill_ball: true,
            },
            Segment {
                id: 0,
                min_x: 0.0,
                max_x: 160.0,
                camera_min: 40.0,
                camera_max: 120.0,
                kill_ball: false,
            },
            Segment {
                id: 1,
                min_x: 160.0,
                max_x: 320.0,
                camera_min: 200.0,
                camera_max: 280.0,
                kill_ball: false,
            },
        ])
    }

    #[test]
    fn test_starts_at_lowest_id() {
        let map = map();
        assert_eq!(map.current_id(), 0);
        assert_eq!(map.current_segment().unwrap().min_x, 0.0);
    }

    #[test]
    fn test_forward_transitions_only() {
        let mut map = map();
        assert!(map.enter(1));
        assert_eq!(map.current_id(), 1);

        // Backtracking is refused and leaves the id unchanged.
        assert!(!map.enter(0));
        assert_eq!(map.current_id(), 1);

        // Skipping ahead is a valid forward transition.
        assert!(map.enter(2));
        assert_eq!(map.current_id(), 2);
    }

    #[test]
    fn test_reentering_current_is_refused() {
        let mut map = map();
        map.enter(1);
        assert!(!map.enter(1));
    }

    #[test]
    fn test_unknown_segment_refused() {
        let mut map = map();
        assert!(!map.enter(9));
        assert_eq!(map.current_id(), 0);
    }

    #[test]
    fn test_segment_lookup_by_x() {
        let map = map();
        assert_eq!(map.segment_id_at(80.0), Some(0));
        assert_eq!(map.segment_id_at(200.0), Some(1));
        // Shared boundary resolves to the forward segment.
        assert_eq!(map.segment_id_at(160.0), Some(1));
        assert_eq!(map.segment_id_at(900.0), None);
    }

    #[test]
    fn test_ball_segment_is_monotonic() {
        let mut map = map();
        map.note_ball_segment(1);
        assert_eq!(map.ball_segment_id(), 1);
        map.note_ball_segment(0);
        assert_eq!(map.ball_segment_id(), 1);
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut map = map();
        map.enter(2);
        map.note_ball_segment(2);
        map.reset();
        assert_eq!(map.current_id(), 0);
        assert_eq!(map.ball_segment_id(), 0);
    }
}
