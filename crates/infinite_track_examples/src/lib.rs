#![forbid(unsafe_code)]

use glam::Vec3;
use infinite_track::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a compact `fmt` subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Index of the T-junction in [`sample_catalog`].
pub const JUNCTION: usize = 2;

/// A small themed catalog: two straights, a junction, a ramp, scenery and collidables.
pub fn sample_catalog() -> PrototypeCatalog {
    let straight = |name: &str, length: f32| {
        Prototype::platform(name, Vec3::new(6.0, 0.5, length)).with_platform(|p| {
            p.collidable_positions = 3;
        })
    };
    let junction = Prototype::platform("t-junction", Vec3::new(18.0, 0.5, 18.0))
        .with_appearance(
            AppearanceRules::with_occur(DistanceCurve::constant(0.15))
                .with_spacing(SpacingRule::new(PrototypeId::platform(JUNCTION), 240.0)),
        )
        .with_platform(|p| {
            p.left_turn = true;
            p.right_turn = true;
            p.turn_center_offset = Vec3::new(9.0, 0.0, 0.0);
            p.slots = SlotMask::CENTER;
        });
    let mut ramp = Prototype::platform("ramp", Vec3::new(6.0, 3.0, 24.0)).with_platform(|p| {
        p.slope = PlatformSlope::Up;
    });
    ramp.appearance = AppearanceRules::with_occur(DistanceCurve::new(vec![
        DistanceValue::new(0.0, 0.0, 100.0, 0.0, true),
        DistanceValue::constant(100.0, 0.1),
    ]));

    let barrier = Prototype::collidable("barrier", Vec3::new(2.0, 1.0, 0.5), SlotMask::all())
        .with_appearance(AppearanceRules::with_occur(DistanceCurve::new(vec![
            DistanceValue::new(0.0, 0.1, 500.0, 0.6, true),
            DistanceValue::constant(500.0, 0.6),
        ])))
        .with_collidable(|c| {
            c.destruction = Some(OnceOffAnimation {
                name: "Shatter".into(),
                delay: 0.4,
            })
        });

    PrototypeCatalog::new()
        .with(ObjectCategory::Platform, straight("straight-short", 12.0))
        .with(ObjectCategory::Platform, straight("straight-long", 30.0))
        .with(ObjectCategory::Platform, junction)
        .with(ObjectCategory::Platform, ramp)
        .with(ObjectCategory::Scene, Prototype::scene("cliffs", Vec3::new(40.0, 12.0, 20.0)))
        .with(ObjectCategory::Scene, Prototype::scene("ruins", Vec3::new(40.0, 8.0, 10.0)))
        .with(ObjectCategory::Obstacle, barrier)
        .with(
            ObjectCategory::Coin,
            Prototype::collidable("coin", Vec3::splat(0.5), SlotMask::all()),
        )
        .with(
            ObjectCategory::PowerUp,
            Prototype::collidable("magnet", Vec3::splat(0.7), SlotMask::CENTER)
                .with_appearance(AppearanceRules::with_occur(DistanceCurve::constant(0.05))),
        )
        .with_suppress(ObjectCategory::PowerUp, DistanceCurve::constant(0.5))
}

/// Prints a one-line summary of the generator's pool and lanes.
pub fn log_summary(label: &str, generator: &TrackGenerator) {
    let history = generator.history();
    info!(
        label,
        state = ?generator.state(),
        score = generator.score(),
        in_use = generator.pool().in_use(),
        instances = generator.pool().total_instances(),
        high_water = generator.pool().high_water(),
        center = history.live_count(Lane::Center, false),
        left = history.live_count(Lane::Left, false),
        right = history.live_count(Lane::Right, false),
        scenes = history.live_count(Lane::Center, true),
        "Track summary"
    );
}
