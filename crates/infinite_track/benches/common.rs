use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::Vec3;
use infinite_track::prelude::*;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// A catalog with `platforms` straight pieces of varying length, scenery and collidables.
#[allow(dead_code)]
pub fn make_catalog(platforms: usize) -> PrototypeCatalog {
    let mut catalog = PrototypeCatalog::new();
    for i in 0..platforms.max(1) {
        let length = 10.0 + (i % 4) as f32 * 5.0;
        catalog.add(
            ObjectCategory::Platform,
            Prototype::platform(format!("P{i}"), Vec3::new(4.0, 0.0, length)).with_platform(
                |p| {
                    p.collidable_positions = 3;
                },
            ),
        );
    }
    for i in 0..4 {
        catalog.add(
            ObjectCategory::Scene,
            Prototype::scene(format!("S{i}"), Vec3::new(12.0, 6.0, 8.0 + i as f32 * 4.0)),
        );
    }
    catalog
        .with(
            ObjectCategory::Obstacle,
            Prototype::collidable("barrier", Vec3::new(1.5, 1.0, 0.5), SlotMask::all())
                .with_appearance(AppearanceRules::with_occur(DistanceCurve::constant(0.3))),
        )
        .with(
            ObjectCategory::Coin,
            Prototype::collidable("coin", Vec3::splat(0.5), SlotMask::all()),
        )
        .with(
            ObjectCategory::PowerUp,
            Prototype::collidable("magnet", Vec3::splat(0.5), SlotMask::CENTER)
                .with_appearance(AppearanceRules::with_occur(DistanceCurve::constant(0.05))),
        )
}
