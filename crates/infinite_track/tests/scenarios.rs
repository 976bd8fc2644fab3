use glam::Vec3;
use infinite_track::prelude::*;
use infinite_track::section::{SectionQuery, SectionSelector};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn straight() -> Prototype {
    Prototype::platform("straight", Vec3::new(4.0, 0.0, 20.0))
}

/// Straight pieces everywhere except at distance 40, where only a T-junction fits.
fn junction_catalog() -> PrototypeCatalog {
    let straight = straight().with_appearance(AppearanceRules::with_occur(DistanceCurve::new(
        vec![
            DistanceValue::new(0.0, 1.0, 39.0, 1.0, true),
            DistanceValue::constant(41.0, 1.0),
        ],
    )));
    let junction = Prototype::platform("junction", Vec3::new(20.0, 0.0, 20.0))
        .with_appearance(AppearanceRules::with_occur(DistanceCurve::new(vec![
            DistanceValue::new(40.0, 1.0, 40.0, 1.0, true),
        ])))
        .with_platform(|p| {
            p.left_turn = true;
            p.right_turn = true;
            p.turn_center_offset = Vec3::new(10.0, 0.0, 0.0);
        });
    PrototypeCatalog::new()
        .with(ObjectCategory::Platform, straight)
        .with(ObjectCategory::Platform, junction)
}

/// Linear sections: 0 up to distance 30, then 1.
fn two_sections() -> GeneratorConfig {
    let curve = DistanceCurve::new(vec![
        DistanceValue::new(0.0, 0.0, 30.0, 0.0, true),
        DistanceValue::constant(30.0, 1.0),
    ]);
    GeneratorConfig::new(100.0, -10.0)
        .with_spawn_full_length(true)
        .with_sections(SectionConfig::new(SectionMode::Linear(curve)).with_section_transitions(true))
}

fn themed_platforms(bridge: bool) -> PrototypeCatalog {
    let catalog = PrototypeCatalog::new()
        .with(ObjectCategory::Platform, straight().with_sections(vec![0]))
        .with(ObjectCategory::Platform, straight().with_sections(vec![1]));
    if bridge {
        catalog.with(ObjectCategory::Platform, straight().with_transition(0, 1))
    } else {
        catalog
    }
}

fn chain_prototypes(g: &TrackGenerator, lane: Lane, is_scene: bool) -> Vec<usize> {
    g.history()
        .chain(lane, is_scene)
        .map(|id| g.pool().get(id).unwrap().prototype.index)
        .collect()
}

fn walk_to_top(g: &TrackGenerator, lane: Lane) -> (ObjectId, usize) {
    let mut cursor = g.history().bottom(lane, false).unwrap();
    let mut hops = 0;
    while let Some(parent) = g.pool().get(cursor).unwrap().parent() {
        cursor = parent;
        hops += 1;
    }
    (cursor, hops)
}

#[test]
fn one_run_fills_the_spawn_horizon() {
    let catalog = PrototypeCatalog::new().with(ObjectCategory::Platform, straight());
    let mut g = TrackGenerator::try_new(GeneratorConfig::new(100.0, -10.0), catalog).unwrap();

    assert_eq!(g.spawn_run(true), 5);
    assert_eq!(g.history().live_count(Lane::Center, false), 5);
    assert_eq!(g.history().total_distance(Lane::Center, false), 100.0);
    assert_eq!(g.spawn_run(true), 0);
}

#[test]
fn held_curve_clamps_past_its_end() {
    let mut curve = DistanceCurve::try_new(vec![DistanceValue::new(0.0, 0.0, 50.0, 1.0, true)])
        .unwrap()
        .with_hold_past_end(true);
    assert_eq!(curve.value(25.0), 0.5);
    assert_eq!(curve.value(50.0), 1.0);
    assert_eq!(curve.value(60.0), 1.0);
    assert_eq!(curve.value(-1.0), 0.0);
}

#[test]
fn unheld_curve_drops_to_zero_past_its_end() {
    let mut curve =
        DistanceCurve::try_new(vec![DistanceValue::new(0.0, 0.0, 50.0, 1.0, true)]).unwrap();
    assert_eq!(curve.value(10.0), 0.2);
    assert_eq!(curve.value(50.5), 0.0);
    assert_eq!(curve.value(200.0), 0.0);
}

#[test]
fn loop_mode_cycles_through_sections() {
    let config = SectionConfig::new(SectionMode::ProbabilityLoop {
        probability: DistanceCurve::constant(1.0),
        start: 0,
        end: 2,
    });
    let mut selector = SectionSelector::new(config);
    let mut rng = StdRng::seed_from_u64(7);
    let sections: Vec<i32> = (0..7)
        .map(|i| selector.section(i as f32 * 20.0, SectionQuery::Platform, &mut rng))
        .collect();
    assert_eq!(sections, vec![0, 1, 2, 0, 1, 2, 0]);
}

#[test]
fn crossing_the_removal_horizon_retires_exactly_one_piece() {
    let catalog = PrototypeCatalog::new().with(ObjectCategory::Platform, straight());
    let mut g = TrackGenerator::try_new(GeneratorConfig::new(100.0, -10.0), catalog).unwrap();
    g.start_game();
    let oldest = g.history().bottom(Lane::Center, false).unwrap();

    let mut player = PlayerPose::default();
    let mut sink = VecSink::new();
    // Centers move from z = 10 to z = -11.
    g.move_objects_with_events(21.0, &mut player, &mut (), &mut sink);

    assert_eq!(sink.count(|e| matches!(e, TrackEvent::Retired { .. })), 1);
    assert_eq!(g.pool().get(oldest).unwrap().state, ObjectState::Pooled);
    assert_ne!(g.history().bottom(Lane::Center, false), Some(oldest));
    // The released instance is reused by the refill.
    assert_eq!(g.pool().total_instances(), g.pool().high_water());
    assert_eq!(g.score(), 21);
}

#[test]
fn chains_stay_linked_while_the_world_moves() {
    let catalog = PrototypeCatalog::new()
        .with(ObjectCategory::Platform, straight())
        .with(ObjectCategory::Scene, Prototype::scene("hill", Vec3::new(8.0, 3.0, 15.0)));
    let config = GeneratorConfig::new(100.0, -10.0).with_seed(3);
    let mut g = TrackGenerator::try_new(config, catalog).unwrap();
    g.start_game();

    let mut player = PlayerPose::default();
    for _ in 0..200 {
        g.move_objects(3.5, &mut player, &mut ());
        for is_scene in [false, true] {
            let live = g.history().live_count(Lane::Center, is_scene);
            if live == 0 {
                continue;
            }
            let mut cursor = g.history().bottom(Lane::Center, is_scene).unwrap();
            let mut hops = 0;
            while let Some(parent) = g.pool().get(cursor).unwrap().parent() {
                cursor = parent;
                hops += 1;
            }
            assert_eq!(Some(cursor), g.history().top(Lane::Center, is_scene));
            assert_eq!(hops, live - 1);
        }
    }
    assert_eq!(g.pool().in_use(), g.history().live_objects().count());
}

#[test]
fn turn_platform_spawns_branches_and_reroots_center() {
    let config = GeneratorConfig::new(100.0, -10.0);
    let mut g = TrackGenerator::try_new(config, junction_catalog()).unwrap();
    let mut sink = VecSink::new();
    g.spawn_run_with_events(true, &mut sink);

    assert_eq!(g.state(), GeneratorState::SpawningBranch);
    assert_eq!(g.history().live_count(Lane::Center, false), 3);
    assert_eq!(g.history().live_count(Lane::Right, false), 5);
    assert_eq!(g.history().live_count(Lane::Left, false), 5);
    assert_eq!(sink.count(|e| matches!(e, TrackEvent::TurnPending { .. })), 1);

    let head = g.pending_turn().unwrap();
    let right_first = g.history().bottom(Lane::Right, false).unwrap();
    let first_pos = g.pool().get(right_first).unwrap().transform.position;
    assert!((first_pos - Vec3::new(20.0, 0.0, 50.0)).length() < 1e-4);
    assert!(g.pool().get(head).unwrap().parent().is_none());

    let branch_top = g.history().top(Lane::Right, false).unwrap();
    let offset = g.choose_turn(Lane::Right, true);

    assert_eq!(g.history().top(Lane::Center, false), Some(branch_top));
    assert_eq!(g.history().live_count(Lane::Center, false), 13);
    assert_eq!(g.history().live_count(Lane::Right, false), 0);
    assert_eq!(g.history().live_count(Lane::Left, false), 0);
    assert!(g.pending_turn().is_none());
    assert!((g.spawn_direction() - Vec3::X).length() < 1e-5);
    assert!((g.move_direction() - Vec3::X).length() < 1e-5);
    assert!((offset - Vec3::new(0.0, 0.0, 50.0)).length() < 1e-3);

    let (top, hops) = walk_to_top(&g, Lane::Center);
    assert_eq!(top, branch_top);
    assert_eq!(hops, 12);
}

#[test]
fn turning_away_from_a_junction_stops_spawning() {
    let mut g = TrackGenerator::try_new(GeneratorConfig::new(100.0, -10.0), junction_catalog())
        .unwrap();
    g.start_game();
    let mut sink = VecSink::new();
    assert_eq!(g.choose_turn_with_events(Lane::Left, false, &mut sink), Vec3::ZERO);
    assert!(g.spawns_stopped());
    assert_eq!(sink.as_slice(), &[TrackEvent::SpawnsStopped]);

    let live = g.pool().in_use();
    let mut player = PlayerPose::default();
    g.move_objects(5.0, &mut player, &mut ());
    assert_eq!(g.pool().in_use(), live);
    assert_eq!(g.score(), 0);
    assert_eq!(g.spawn_run(true), 0);
}

#[test]
fn reset_archives_the_run_until_ready() {
    let catalog = PrototypeCatalog::new().with(ObjectCategory::Platform, straight());
    let mut g = TrackGenerator::try_new(GeneratorConfig::new(100.0, -10.0), catalog).unwrap();
    g.start_game();
    let old: Vec<ObjectId> = g.history().live_objects().collect();

    let mut sink = VecSink::new();
    g.reset_with_events(&mut sink);
    assert_eq!(sink.as_slice()[0], TrackEvent::Reset);
    assert_eq!(g.history().saved(), old.as_slice());
    assert_eq!(g.pool().in_use(), 10);
    let staged: Vec<ObjectId> = g.history().live_objects().collect();
    assert!(staged
        .iter()
        .all(|id| g.pool().get(*id).unwrap().state == ObjectState::Staged));

    g.ready_from_reset();
    assert!(g.history().saved().is_empty());
    assert_eq!(g.pool().in_use(), 5);
    assert!(old
        .iter()
        .all(|id| g.pool().get(*id).unwrap().state == ObjectState::Pooled));
    assert!(staged
        .iter()
        .all(|id| g.pool().get(*id).unwrap().state == ObjectState::Active));
    assert_eq!(g.pool().high_water(), 10);
}

#[test]
fn startup_layout_leads_into_generated_track() {
    let catalog = junction_catalog();
    let mut g = TrackGenerator::try_new(GeneratorConfig::new(100.0, -10.0), catalog).unwrap();
    let layout = StartupLayout::new().with_platform(0).with_platform(0);
    assert!(g.show_startup_objects(&layout).unwrap());
    assert!(!g.show_startup_objects(&StartupLayout::new()).unwrap());
    assert!(g
        .show_startup_objects(&StartupLayout::new().with_platform(9))
        .is_err());

    let intro: Vec<ObjectId> = g.history().chain(Lane::Center, false).collect();
    assert!(intro.iter().all(|id| g.pool().get(*id).unwrap().is_one_shot()));

    g.start_game();
    assert!(g.pending_turn().is_some());
    assert_eq!(g.history().live_count(Lane::Center, false), 3);

    // One-shot pieces are discarded, not pooled, once they fall behind.
    let mut player = PlayerPose::default();
    g.move_objects(21.0, &mut player, &mut ());
    assert!(g.pool().get(intro[0]).is_none());
}

#[test]
fn platforms_cross_sections_through_a_bridge_piece() {
    let mut g = TrackGenerator::try_new(two_sections(), themed_platforms(true)).unwrap();
    assert_eq!(g.spawn_run(true), 5);
    assert_eq!(chain_prototypes(&g, Lane::Center, false), vec![0, 0, 2, 1, 1]);
    assert_eq!(g.history().previous_section(Lane::Center, false), Some(1));
}

#[test]
fn scenes_wait_for_their_own_bridge_piece() {
    let scene = || Prototype::scene("hill", Vec3::new(8.0, 3.0, 20.0));

    // Only the platforms can bridge: scenery stops where its section changes.
    let catalog = themed_platforms(true)
        .with(ObjectCategory::Scene, scene().with_sections(vec![0]))
        .with(ObjectCategory::Scene, scene().with_sections(vec![1]));
    let mut g = TrackGenerator::try_new(two_sections(), catalog).unwrap();
    g.spawn_run(true);
    assert_eq!(g.history().live_count(Lane::Center, false), 5);
    assert_eq!(chain_prototypes(&g, Lane::Center, true), vec![0, 0]);
    assert_eq!(g.history().total_distance(Lane::Center, true), 40.0);

    let catalog = themed_platforms(true)
        .with(ObjectCategory::Scene, scene().with_sections(vec![0]))
        .with(ObjectCategory::Scene, scene().with_sections(vec![1]))
        .with(ObjectCategory::Scene, scene().with_transition(0, 1));
    let mut g = TrackGenerator::try_new(two_sections(), catalog).unwrap();
    g.spawn_run(true);
    assert_eq!(chain_prototypes(&g, Lane::Center, true), vec![0, 0, 2, 1, 1]);
}

#[test]
fn missing_bridge_stalls_the_lane() {
    let mut g = TrackGenerator::try_new(two_sections(), themed_platforms(false)).unwrap();
    let mut sink = VecSink::new();
    assert_eq!(g.spawn_run_with_events(true, &mut sink), 2);
    assert!(sink.as_slice().contains(&TrackEvent::SpawnStalled {
        lane: Lane::Center,
        distance: 40.0,
        section: 1,
        transition_from: Some(0),
    }));
    assert_eq!(g.spawn_run(true), 0);
}

#[test]
fn curved_platforms_are_followed_with_a_cursor() {
    let curve = PlatformCurve::try_new(vec![
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::new(0.0, 0.0, 10.0),
    ])
    .unwrap();
    let mut cursor = CurveCursor::default();
    for step in 0..=10 {
        let d = step as f32;
        let p = curve.point_at(d, &mut cursor);
        assert!((p - Vec3::new(0.0, 0.0, d)).length() < 1e-3);
    }
}
