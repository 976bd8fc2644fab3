use glam::Vec3;
use infinite_track::prelude::*;
use infinite_track_examples::{init_tracing, log_summary, sample_catalog};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GeneratorConfig::new(120.0, -25.0).with_seed(2024);
    let mut generator = TrackGenerator::try_new(config, sample_catalog())?;
    generator.start_game();

    let mut player = PlayerPose::default();
    let mut choices = StdRng::seed_from_u64(99);
    let mut turns = 0;
    let mut frames = 0;
    let dt = 1.0 / 30.0;

    while turns < 5 && frames < 20_000 {
        frames += 1;
        generator.tick(dt, 20.0 * dt, &mut player, &mut ());

        let Some(head) = generator.pending_turn() else {
            continue;
        };
        // Turn once the junction center reaches the player.
        let reached = generator
            .pool()
            .get(head)
            .map(|e| player.transform().inverse_transform_point(e.transform.position).z <= 0.0)
            .unwrap_or(false);
        if !reached {
            continue;
        }

        log_summary("at junction", &generator);
        let lane = if choices.random::<bool>() {
            Lane::Left
        } else {
            Lane::Right
        };
        let offset = generator.choose_turn(lane, true);
        // Face the new direction and step onto the new center lane.
        player.forward = generator.move_direction();
        player.position = Vec3::new(offset.x, player.position.y, offset.z);
        turns += 1;
        println!(
            "turn {turns}: {lane:?}, now heading {:.2?}, lateral offset {:.2?}",
            generator.move_direction(),
            offset
        );
    }

    log_summary("done", &generator);
    Ok(())
}
