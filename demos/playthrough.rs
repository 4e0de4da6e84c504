//! Scripted playthrough of the demo level.
//!
//! Drives the simulation with a canned input script: spawn and launch the
//! ball to break the scaffolding wall, run right, jump the hazard pit and the
//! timber block, and reach the target in the second segment. Prints a status
//! line every half second of simulated time plus every gameplay event.
//!
//! Run with: cargo run --example playthrough

use rubble_sim::{InputSnapshot, SimWorld};

fn scripted_input(tick: u32) -> InputSnapshot {
    let mut input = InputSnapshot::default();
    match tick {
        // Spawn the ball and hold the aim for a quarter second.
        30 => {
            input.strike_pressed = true;
            input.strike_held = true;
        }
        31..=45 => input.strike_held = true,
        46 => input.strike_released = true,
        // Run right; jump the pit, then the timber block.
        60..=500 => {
            input.axis = 1.0;
            if tick == 146 || tick == 194 {
                input.jump_pressed = true;
            }
            if (146..=156).contains(&tick) || (194..=204).contains(&tick) {
                input.jump_held = true;
            }
        }
        _ => {}
    }
    input
}

fn main() {
    env_logger::init();

    let mut sim = SimWorld::new();
    sim.load_level(include_str!("level.json"))
        .expect("demo level is valid");

    println!("=== Rubble Runner playthrough ===");
    for tick in 0..600u32 {
        sim.tick(&scripted_input(tick));
        let snapshot = sim.snapshot();

        for event in &snapshot.events {
            println!("[{:4}] event: {:?}", snapshot.tick, event);
        }
        for removal in &snapshot.tile_removals {
            println!(
                "[{:4}] tile removed at ({}, {}): {}",
                snapshot.tick, removal.x, removal.y, removal.material
            );
        }

        if tick % 30 == 0 {
            let ball = match &snapshot.ball {
                Some(b) => format!("ball ({:5.1}, {:5.1})", b.x, b.y),
                None => "no ball".to_string(),
            };
            println!(
                "[{:4}] {:10} at ({:5.1}, {:5.1}) | {} | segment {} camera {:.0}",
                snapshot.tick,
                snapshot.player.state,
                snapshot.player.x,
                snapshot.player.y,
                ball,
                snapshot.camera.segment_id,
                snapshot.camera.x,
            );
        }

        if snapshot.objective_reached {
            println!(
                "[{:4}] target reached after {:.2}s",
                snapshot.tick,
                sim.sim_time()
            );
            break;
        }
    }

    if !sim.objective_reached() {
        println!("script finished without reaching the target");
    }
}
