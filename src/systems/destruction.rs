//! Tile destruction.
//!
//! Drains the hits queued by the ball flight system and applies them to the
//! grid, one durability stage per hit. This system is the grid's only writer
//! during play; everything downstream observes the change through events and
//! the per-snapshot tile deltas.

use crate::events::{FeedbackBuffer, PendingHits, SimEvent, TileDeltas};
use crate::grid::{HitOutcome, TileGrid};
use bevy_ecs::prelude::*;
use log::debug;

pub fn destruction_system(
    mut grid: ResMut<TileGrid>,
    mut pending: ResMut<PendingHits>,
    mut deltas: ResMut<TileDeltas>,
    mut feedback: ResMut<FeedbackBuffer>,
) {
    for (cell, (nx, ny)) in pending.0.drain(..) {
        match grid.apply_hit(cell) {
            HitOutcome::Ignored => {}
            HitOutcome::Damaged { from, to } => {
                debug!("tile {:?} damaged: {} -> {}", cell, from.as_str(), to.as_str());
                deltas.changed.push((cell, to.as_str().to_string()));
                feedback.push(SimEvent::TileDamaged {
                    cell_x: cell.0,
                    cell_y: cell.1,
                    material: to.as_str().to_string(),
                });
            }
            HitOutcome::Removed { material } => {
                debug!("tile {:?} removed ({})", cell, material.as_str());
                deltas.removed.push((cell, material.as_str().to_string()));
                feedback.push(SimEvent::TileRemoved {
                    cell_x: cell.0,
                    cell_y: cell.1,
                    material: material.as_str().to_string(),
                });
                // Shake into the wall, opposite the impact normal.
                feedback.shake(-nx, -ny, 0.6);
            }
        }
    }
}
