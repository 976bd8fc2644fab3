use glam::Vec3;
use infinite_track::prelude::*;
use infinite_track_examples::{init_tracing, log_summary};

/// Three themed sections, each with its own straight and backdrop, joined by transition pieces.
fn themed_catalog() -> PrototypeCatalog {
    let mut catalog = PrototypeCatalog::new();
    for (section, name) in ["forest", "desert", "ice"].into_iter().enumerate() {
        let section = section as i32;
        catalog.add(
            ObjectCategory::Platform,
            Prototype::platform(name, Vec3::new(6.0, 0.5, 20.0)).with_sections(vec![section]),
        );
        catalog.add(
            ObjectCategory::Scene,
            Prototype::scene(format!("{name}-backdrop"), Vec3::new(30.0, 10.0, 15.0))
                .with_sections(vec![section]),
        );
        for to in 0..3 {
            if to != section {
                catalog.add(
                    ObjectCategory::Platform,
                    Prototype::platform(format!("{name}-gate-{to}"), Vec3::new(6.0, 2.0, 8.0))
                        .with_transition(section, to),
                );
                catalog.add(
                    ObjectCategory::Scene,
                    Prototype::scene(format!("{name}-fade-{to}"), Vec3::new(30.0, 10.0, 5.0))
                        .with_transition(section, to),
                );
            }
        }
    }
    catalog
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let sections = SectionConfig::new(SectionMode::ProbabilityLoop {
        probability: DistanceCurve::constant(0.2),
        start: 0,
        end: 2,
    })
    .with_section_transitions(true);
    let config = GeneratorConfig::new(100.0, -20.0)
        .with_seed(5)
        .with_sections(sections);
    let mut generator = TrackGenerator::try_new(config, themed_catalog())?;

    let intro = StartupLayout::new().with_platform(0).with_platform(0);
    generator.show_startup_objects(&intro)?;

    let mut log = FnSink::new(|event| match event {
        TrackEvent::Spawned {
            prototype,
            distance,
            ..
        } if prototype.category == ObjectCategory::Platform => {
            println!("{distance:>7.1}  platform #{}", prototype.index);
        }
        TrackEvent::Reset | TrackEvent::ReadyFromReset => println!("-- {event:?}"),
        _ => {}
    });

    generator.start_game_with_events(&mut log);
    let mut player = PlayerPose::default();
    for _ in 0..400 {
        generator.move_objects_with_events(1.0, &mut player, &mut (), &mut log);
    }
    log_summary("before reset", &generator);

    generator.reset_with_events(&mut log);
    log_summary("staged", &generator);
    generator.ready_from_reset_with_events(&mut log);
    log_summary("after reset", &generator);
    Ok(())
}
