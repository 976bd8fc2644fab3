use infinite_track::prelude::*;
use infinite_track_examples::{init_tracing, log_summary, sample_catalog};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Straight-only track: drop the junction by making it never occur.
    let mut catalog = sample_catalog();
    catalog.prototypes_mut(ObjectCategory::Platform)[infinite_track_examples::JUNCTION]
        .appearance = AppearanceRules::with_occur(DistanceCurve::constant(0.0));

    let config = GeneratorConfig::new(150.0, -30.0)
        .with_seed(7)
        .with_no_collidable_probability(DistanceCurve::constant(0.25));
    let mut generator = TrackGenerator::try_new(config, catalog)?;

    let mut events = VecSink::new();
    generator.start_game_with_events(&mut events);
    log_summary("start", &generator);

    let mut player = PlayerPose::default();
    let mut camera = HeightOffset::default();
    let dt = 1.0 / 60.0;
    let speed = 18.0;
    for frame in 1..=3600 {
        generator.tick_with_events(dt, speed * dt, &mut player, &mut camera, &mut events);
        if frame % 600 == 0 {
            log_summary(&format!("frame {frame}"), &generator);
        }
    }

    let spawned = events.count(|e| matches!(e, TrackEvent::Spawned { .. }));
    let retired = events.count(|e| matches!(e, TrackEvent::Retired { .. }));
    let climbs = events.count(|e| matches!(e, TrackEvent::HeightTransition { .. }));
    println!(
        "spawned {spawned}, retired {retired}, height transitions {climbs}, camera offset {:.1}",
        camera.0
    );
    println!(
        "pool: {} instances for a high-water mark of {}",
        generator.pool().total_instances(),
        generator.pool().high_water()
    );
    Ok(())
}
