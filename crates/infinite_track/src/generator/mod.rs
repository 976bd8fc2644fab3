//! The track generator: streams pieces in ahead of the player and retires them behind it.
//!
//! The player stays near the origin while the world moves towards it. Each call to
//! [`TrackGenerator::move_objects`] shifts every lane chain back along the move direction,
//! retires at most one piece per chain once it crosses the removal horizon, and then runs
//! [`TrackGenerator::spawn_run`] to refill the track up to the spawn horizon.
//!
//! A turn platform stops straight generation. Side lanes are generated from its junction
//! until [`TrackGenerator::choose_turn`] folds the chosen branch back into the center lane.
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::catalog::{ObjectCategory, PrototypeCatalog, PrototypeId, SupportsOnceOffAnimation};
use crate::error::Result;
use crate::history::{Lane, SpawnHistory, SpawnRecord};
use crate::pool::selection::select_prototype;
use crate::pool::{ObjectId, ObjectPool, SpawnContext};
use crate::random::{pick_index, roll};
use crate::section::{SectionQuery, SectionSelector};
use crate::timer::TimerQueue;
use crate::transform::{look_rotation, yaw_degrees, Transform};

pub mod collaborators;
pub mod config;
pub mod events;

pub use collaborators::{HeightOffset, HeightTransition, PlayerPose, PlayerView};
pub use config::GeneratorConfig;
pub use events::{EventSink, FnSink, TrackEvent, VecSink};

/// Upper bound on pieces placed per lane in one spawn run.
const MAX_SPAWNS_PER_LANE: usize = 1024;

/// Coarse lifecycle of the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorState {
    /// Nothing has been laid out since construction or the last reset.
    Idle,
    /// The last spawn run extended the center lane.
    SpawningStraight,
    /// A turn is pending; side lanes are being generated.
    SpawningBranch,
    /// The track already reaches the spawn horizon.
    Steady,
}

/// Pre-placed pieces shown before regular generation, e.g. a tutorial stretch.
///
/// Pieces are laid out in order along the center lane from the origin and are discarded
/// rather than pooled once retired. A turn platform ends the platform list and becomes the
/// pending turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartupLayout {
    pub platforms: Vec<usize>,
    pub scenes: Vec<usize>,
}

impl StartupLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, index: usize) -> Self {
        self.platforms.push(index);
        self
    }

    pub fn with_scene(mut self, index: usize) -> Self {
        self.scenes.push(index);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty() && self.scenes.is_empty()
    }
}

pub struct TrackGenerator {
    config: GeneratorConfig,
    pool: ObjectPool,
    history: SpawnHistory,
    sections: SectionSelector,
    timers: TimerQueue<ObjectId>,
    rng: StdRng,
    state: GeneratorState,
    move_direction: Vec3,
    spawn_direction: Vec3,
    /// Pending turn platform per lane. The center entry blocks straight generation.
    turn_heads: [Option<ObjectId>; 3],
    stop_spawns: bool,
    started: bool,
    score: f32,
    largest_scene: f32,
}

impl TrackGenerator {
    pub fn try_new(config: GeneratorConfig, catalog: PrototypeCatalog) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self::new_unchecked(config, catalog))
    }

    pub fn new(config: GeneratorConfig, catalog: PrototypeCatalog) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid generator config");
        debug_assert!(catalog.validate().is_ok(), "invalid prototype catalog");
        Self::new_unchecked(config, catalog)
    }

    fn new_unchecked(config: GeneratorConfig, catalog: PrototypeCatalog) -> Self {
        let largest_scene = catalog.largest_scene_length();
        let sections = SectionSelector::new(config.sections.clone());
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            pool: ObjectPool::new(catalog),
            history: SpawnHistory::new(),
            sections,
            timers: TimerQueue::new(),
            rng,
            state: GeneratorState::Idle,
            move_direction: Vec3::Z,
            spawn_direction: Vec3::Z,
            turn_heads: [None; 3],
            stop_spawns: false,
            started: false,
            score: 0.0,
            largest_scene,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub fn history(&self) -> &SpawnHistory {
        &self.history
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Run score, rounded to whole points.
    pub fn score(&self) -> u64 {
        self.score.max(0.0).round() as u64
    }

    pub fn move_direction(&self) -> Vec3 {
        self.move_direction
    }

    pub fn spawn_direction(&self) -> Vec3 {
        self.spawn_direction
    }

    /// Turn platform the center lane is waiting on, if any.
    pub fn pending_turn(&self) -> Option<ObjectId> {
        self.turn_heads[Lane::Center.index()]
    }

    pub fn spawns_stopped(&self) -> bool {
        self.stop_spawns
    }

    /// Steers the world movement, e.g. along a curved platform.
    pub fn set_move_direction(&mut self, direction: Vec3) {
        self.move_direction = direction.normalize_or(Vec3::Z);
    }

    /// World-space point `distance` along a curved platform, if `id` is one.
    pub fn platform_curve_point(&self, id: ObjectId, distance: f32) -> Option<Vec3> {
        let entry = self.pool.get(id)?;
        let curve = self
            .pool
            .prototype(entry.prototype)?
            .platform_traits()?
            .curve
            .as_ref()?;
        Some(entry.transform.transform_point(curve.point_at_distance(distance)))
    }

    pub fn start_game(&mut self) {
        self.start_game_with_events(&mut ());
    }

    /// Marks the game as running and fills the track up to the spawn horizon, continuing after
    /// any startup pieces.
    pub fn start_game_with_events(&mut self, sink: &mut dyn EventSink) {
        self.started = true;
        self.spawn_run_with_events(true, sink);
        info!(live = self.pool.in_use(), "Track generator started");
        sink.send(TrackEvent::Started);
    }

    pub fn spawn_run(&mut self, activate: bool) -> usize {
        self.spawn_run_with_events(activate, &mut ())
    }

    /// Fills every active lane up to the spawn horizon and returns the number of platforms placed.
    ///
    /// Pieces are staged rather than shown when `activate` is false.
    pub fn spawn_run_with_events(&mut self, activate: bool, sink: &mut dyn EventSink) -> usize {
        if self.stop_spawns {
            return 0;
        }

        let mut spawned = 0;
        if self.pending_turn().is_none() {
            spawned += self.spawn_lane(Lane::Center, Vec3::ZERO, activate, sink);
        }
        if let Some(head) = self.pending_turn() {
            spawned += self.spawn_branches(head, activate, sink);
        }

        self.state = if self.pending_turn().is_some() {
            GeneratorState::SpawningBranch
        } else if spawned > 0 {
            GeneratorState::SpawningStraight
        } else {
            GeneratorState::Steady
        };
        spawned
    }

    fn spawn_branches(&mut self, head: ObjectId, activate: bool, sink: &mut dyn EventSink) -> usize {
        let Some(traits) = self
            .pool
            .prototype_of(head)
            .and_then(|p| p.platform_traits())
        else {
            return 0;
        };
        let (left, right) = (traits.left_turn, traits.right_turn);

        let mut spawned = 0;
        for (lane, permitted) in [(Lane::Right, right), (Lane::Left, left)] {
            if !permitted || self.turn_heads[lane.index()].is_some() {
                continue;
            }
            if self.history.live_count(lane, false) == 0 {
                self.history.begin_branch(lane);
            }
            let Some(origin) = self.junction(lane) else {
                continue;
            };
            spawned += self.spawn_lane(lane, origin, activate, sink);
        }
        spawned
    }

    /// Direction pieces in `lane` extend along.
    fn lane_direction(&self, lane: Lane) -> Vec3 {
        let right = self
            .pending_turn()
            .and_then(|head| self.pool.get(head))
            .map(|e| e.transform.right())
            .unwrap_or(Vec3::X);
        match lane {
            Lane::Center => self.spawn_direction,
            Lane::Right => right,
            Lane::Left => -right,
        }
    }

    /// Start point of the first piece in a side lane.
    fn junction(&self, lane: Lane) -> Option<Vec3> {
        let head = self.pending_turn()?;
        let entry = self.pool.get(head)?;
        let traits = self.pool.prototype(entry.prototype)?.platform_traits()?;
        let center = self.piece_center(head)?;
        let offset = traits.turn_center_offset;
        Some(center + self.lane_direction(lane) * offset.x + entry.transform.forward() * offset.z)
    }

    /// Center of a placed piece, with the prototype anchor removed.
    fn piece_center(&self, id: ObjectId) -> Option<Vec3> {
        let entry = self.pool.get(id)?;
        let proto = self.pool.prototype(entry.prototype)?;
        Some(entry.transform.position - entry.transform.rotation * proto.anchor)
    }

    /// Point where the piece following `top` starts. `use_width` measures `top` across instead
    /// of along, for the first scene after a junction.
    fn next_base(&self, top: ObjectId, direction: Vec3, use_width: bool) -> Option<Vec3> {
        let proto = self.pool.prototype_of(top)?;
        let half = if use_width {
            proto.extents.x
        } else {
            proto.extents.z
        } * 0.5;
        Some(self.piece_center(top)? + direction * half + Vec3::Y * proto.rise())
    }

    /// Places `id` so that it starts at `base` and extends along `direction`.
    fn place(&mut self, id: ObjectId, base: Vec3, direction: Vec3) -> Vec3 {
        let Some((length, anchor)) = self.pool.prototype_of(id).map(|p| (p.extents.z, p.anchor))
        else {
            return base;
        };
        let rotation = look_rotation(direction);
        let position = base + direction * (length * 0.5) + rotation * anchor;
        if let Some(entry) = self.pool.get_mut(id) {
            entry.transform = Transform::new(position, rotation);
        }
        position
    }

    fn select(&mut self, category: ObjectCategory, ctx: &SpawnContext) -> Option<usize> {
        let history = &self.history;
        let last_spawn = |id: PrototypeId| history.last_spawn_distance(id);
        select_prototype(
            self.pool.catalog_mut(),
            category,
            ctx,
            &last_spawn,
            &mut self.rng,
        )
    }

    fn acquire(&mut self, prototype: PrototypeId, sink: &mut dyn EventSink) -> Option<ObjectId> {
        match self.pool.acquire(prototype) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(%err, "Failed to acquire pooled object");
                sink.send(TrackEvent::Warning {
                    context: format!("{prototype:?}"),
                    message: err.to_string(),
                });
                None
            }
        }
    }

    fn spawn_lane(
        &mut self,
        lane: Lane,
        origin: Vec3,
        activate: bool,
        sink: &mut dyn EventSink,
    ) -> usize {
        let direction = self.lane_direction(lane);
        let horizon_sq = self.config.spawn_horizon_sq();
        let mut spawned = 0;

        while self.turn_heads[lane.index()].is_none() {
            let base = match self.history.top(lane, false) {
                Some(top) => match self.next_base(top, direction, false) {
                    Some(base) => base,
                    None => break,
                },
                None => origin,
            };
            let ahead = base.dot(direction).max(0.0);
            if ahead * ahead >= horizon_sq {
                break;
            }
            if spawned >= MAX_SPAWNS_PER_LANE {
                warn!(?lane, "Spawn run hit the per-lane limit");
                break;
            }
            if self.spawn_platform(lane, base, direction, activate, sink).is_none() {
                break;
            }
            spawned += 1;
        }
        spawned
    }

    fn spawn_platform(
        &mut self,
        lane: Lane,
        base: Vec3,
        direction: Vec3,
        activate: bool,
        sink: &mut dyn EventSink,
    ) -> Option<ObjectId> {
        let distance = self.history.total_distance(lane, false);
        let section = self
            .sections
            .section(distance, SectionQuery::Platform, &mut self.rng);
        let previous = self.history.previous_section(lane, false).unwrap_or(section);
        let ctx = SpawnContext::new(distance, section)
            .with_transition(previous, self.sections.use_section_transitions());

        let Some(index) = self.select(ObjectCategory::Platform, &ctx) else {
            let transition_from = ctx.needs_transition().then_some(previous);
            warn!(
                ?lane,
                distance,
                section,
                ?transition_from,
                "Unable to spawn platform: no prototype is eligible"
            );
            sink.send(TrackEvent::SpawnStalled {
                lane,
                distance,
                section,
                transition_from,
            });
            return None;
        };

        let prototype = PrototypeId::platform(index);
        let id = self.acquire(prototype, sink)?;
        let position = self.place(id, base, direction);
        if activate {
            self.pool.activate(id);
        }

        let (length, is_turn, left, right) = match self.pool.prototype(prototype) {
            Some(p) => {
                let traits = p.platform_traits();
                (
                    p.extents.z,
                    p.is_turn(),
                    traits.is_some_and(|t| t.left_turn),
                    traits.is_some_and(|t| t.right_turn),
                )
            }
            None => (0.0, false, false, false),
        };

        let previous_top = self.history.record_spawn(SpawnRecord {
            prototype,
            lane,
            offset: 0.0,
            length,
            yaw: yaw_degrees(direction),
            section,
            instance: id,
        });
        if let Some(prev) = previous_top {
            self.pool.set_parent(prev, Some(id));
        }
        sink.send(TrackEvent::Spawned {
            id,
            prototype,
            lane,
            position,
            distance,
        });

        self.fill_scenes(lane, direction, is_turn, activate, sink);
        self.attach_collidables(id, lane, base, direction, section, activate, sink);

        if is_turn {
            self.turn_heads[lane.index()] = Some(id);
            debug!(?lane, distance, left, right, "Turn platform placed");
            sink.send(TrackEvent::TurnPending {
                head: id,
                left,
                right,
            });
        }
        Some(id)
    }

    #[allow(clippy::too_many_arguments)]
    fn attach_collidables(
        &mut self,
        platform: ObjectId,
        lane: Lane,
        base: Vec3,
        direction: Vec3,
        section: i32,
        activate: bool,
        sink: &mut dyn EventSink,
    ) {
        let Some(proto) = self.pool.prototype_of(platform) else {
            return;
        };
        let Some(traits) = proto.platform_traits() else {
            return;
        };
        let positions = traits.collidable_positions;
        if positions == 0 {
            return;
        }
        let slots = traits.slots;
        let force_distinct = traits.force_distinct;
        let length = proto.extents.z;
        let rise = proto.rise();

        let distance = self.history.last_platform_start(lane);
        let skip = self.config.no_collidable_probability.value(distance);
        if roll(&mut self.rng, skip) {
            return;
        }

        let rotation = look_rotation(direction);
        let right = rotation * Vec3::X;
        let first = length * 0.1;
        let step = length * 0.8 / (positions as f32 + 1.0);

        for category in ObjectCategory::COLLIDABLES {
            for i in 0..positions {
                let taken = self
                    .pool
                    .get(platform)
                    .is_some_and(|e| e.used_positions & (1 << i) != 0);
                if taken {
                    continue;
                }

                let offset = first + (i as f32 + 1.0) * step;
                let ctx = SpawnContext::new(distance + offset, section).with_slots(slots);
                let Some(index) = self.select(category, &ctx) else {
                    continue;
                };
                let prototype = PrototypeId::new(category, index);
                let Some((usable, anchor)) = self.pool.prototype(prototype).and_then(|p| {
                    p.collidable_traits()
                        .map(|c| (c.slots & slots, p.anchor))
                }) else {
                    continue;
                };
                let signs: Vec<f32> = usable.lateral_signs().map(|(_, s)| s).collect();
                if signs.is_empty() {
                    continue;
                }
                let sign = signs[pick_index(&mut self.rng, signs.len())];

                let Some(id) = self.acquire(prototype, sink) else {
                    continue;
                };
                let position = base
                    + direction * offset
                    + Vec3::Y * (rise * offset / length)
                    + right * (sign * self.config.slot_distance)
                    + rotation * anchor;
                if let Some(entry) = self.pool.get_mut(id) {
                    entry.transform = Transform::new(position, rotation);
                }
                self.pool.set_parent(id, Some(platform));
                if let Some(host) = self.pool.get_mut(platform) {
                    host.claim_position(i);
                }
                if activate {
                    self.pool.activate(id);
                }

                self.history.record_spawn(SpawnRecord {
                    prototype,
                    lane,
                    offset,
                    length: 0.0,
                    yaw: yaw_degrees(direction),
                    section,
                    instance: id,
                });
                sink.send(TrackEvent::Spawned {
                    id,
                    prototype,
                    lane,
                    position,
                    distance: distance + offset,
                });

                if force_distinct {
                    break;
                }
            }
        }
    }

    /// Spawns scenery in `lane` until it has caught up with the platforms.
    fn fill_scenes(
        &mut self,
        lane: Lane,
        direction: Vec3,
        at_turn: bool,
        activate: bool,
        sink: &mut dyn EventSink,
    ) {
        let margin = if at_turn || self.config.spawn_full_length {
            0.0
        } else {
            self.largest_scene
        };

        for _ in 0..MAX_SPAWNS_PER_LANE {
            let distance = self.history.total_distance(lane, true);
            let room = self.history.total_distance(lane, false) - distance;
            let query = SectionQuery::Scene {
                first_platform_section: self.history.platform_section_at(lane, distance),
            };
            let section = self.sections.section(distance, query, &mut self.rng);
            let previous = self.history.previous_section(lane, true).unwrap_or(section);
            let ctx = SpawnContext::new(distance, section)
                .with_transition(previous, self.sections.use_section_transitions())
                .with_scene_room(room, margin);

            let Some(index) = self.select(ObjectCategory::Scene, &ctx) else {
                return;
            };

            let base = match self.history.top(lane, true) {
                Some(top) => self.next_base(top, direction, false),
                None if lane != Lane::Center => self
                    .history
                    .top(Lane::Center, true)
                    .and_then(|top| self.next_base(top, direction, true))
                    .or_else(|| self.junction(lane)),
                None => Some(self.lane_start(lane)),
            };
            let Some(base) = base else {
                return;
            };

            let prototype = PrototypeId::scene(index);
            let Some(id) = self.acquire(prototype, sink) else {
                return;
            };
            let position = self.place(id, base, direction);
            if activate {
                self.pool.activate(id);
            }
            let length = self.pool.prototype(prototype).map_or(0.0, |p| p.extents.z);
            let previous_top = self.history.record_spawn(SpawnRecord {
                prototype,
                lane,
                offset: 0.0,
                length,
                yaw: yaw_degrees(direction),
                section,
                instance: id,
            });
            if let Some(prev) = previous_top {
                self.pool.set_parent(prev, Some(id));
            }
            sink.send(TrackEvent::Spawned {
                id,
                prototype,
                lane,
                position,
                distance,
            });
        }
        warn!(?lane, "Scene fill hit the per-lane limit");
    }

    /// Start of the oldest live platform in `lane`, or the origin on an empty track.
    fn lane_start(&self, lane: Lane) -> Vec3 {
        self.history
            .bottom(lane, false)
            .and_then(|bottom| {
                let length = self.pool.prototype_of(bottom)?.extents.z;
                let forward = self.pool.get(bottom)?.transform.forward();
                Some(self.piece_center(bottom)? - forward * (length * 0.5))
            })
            .unwrap_or(Vec3::ZERO)
    }

    pub fn move_objects(
        &mut self,
        distance: f32,
        player: &mut dyn PlayerView,
        chase: &mut dyn HeightTransition,
    ) {
        self.move_objects_with_events(distance, player, chase, &mut ());
    }

    /// Moves the world `distance` units towards the player, retires pieces behind it and
    /// refills the track. Non-positive distances are ignored.
    pub fn move_objects_with_events(
        &mut self,
        distance: f32,
        player: &mut dyn PlayerView,
        chase: &mut dyn HeightTransition,
        sink: &mut dyn EventSink,
    ) {
        if distance.is_nan() || distance <= 0.0 {
            return;
        }

        let delta = self.move_direction * distance;
        let player_transform = player.transform();

        for is_scene in [true, false] {
            for lane in Lane::ALL {
                let Some(top) = self.history.top(lane, is_scene) else {
                    continue;
                };
                self.pool.translate_subtree(top, -delta);

                let Some(bottom) = self.history.bottom(lane, is_scene) else {
                    continue;
                };
                let Some(position) = self.pool.get(bottom).map(|e| e.transform.position) else {
                    continue;
                };
                if player_transform.inverse_transform_point(position).z >= self.config.remove_horizon {
                    continue;
                }

                if !is_scene && self.config.height_reposition {
                    let rise = self.pool.prototype_of(bottom).map_or(0.0, |p| p.rise());
                    if rise != 0.0 {
                        self.transition_height(rise, player, chase, sink);
                    }
                }
                self.retire(lane, is_scene, sink);
            }
        }

        if !self.stop_spawns {
            self.score += distance * self.config.score_multiplier;
            self.spawn_run_with_events(true, sink);
        }
    }

    /// Shifts everything down by `amount` so heights stay near zero.
    fn transition_height(
        &mut self,
        amount: f32,
        player: &mut dyn PlayerView,
        chase: &mut dyn HeightTransition,
        sink: &mut dyn EventSink,
    ) {
        for is_scene in [true, false] {
            for lane in Lane::ALL {
                if let Some(top) = self.history.top(lane, is_scene) {
                    self.pool.translate_subtree(top, Vec3::NEG_Y * amount);
                }
            }
        }
        player.transition_height(amount);
        chase.transition_height(amount);
        debug!(amount, "Height transition");
        sink.send(TrackEvent::HeightTransition { amount });
    }

    fn retire(&mut self, lane: Lane, is_scene: bool, sink: &mut dyn EventSink) {
        let Some(id) = self.history.record_removal(lane, is_scene) else {
            debug_assert!(false, "removal from an empty {lane:?} chain");
            warn!(?lane, is_scene, "Removal requested from an empty chain");
            return;
        };
        let prototype = self.pool.get(id).map(|e| e.prototype);
        for head in self.turn_heads.iter_mut() {
            if *head == Some(id) {
                *head = None;
            }
        }
        self.pool.release(id);
        if let Some(prototype) = prototype {
            sink.send(TrackEvent::Retired {
                id,
                prototype,
                lane,
            });
        }
    }

    pub fn tick(
        &mut self,
        dt: f32,
        distance: f32,
        player: &mut dyn PlayerView,
        chase: &mut dyn HeightTransition,
    ) {
        self.tick_with_events(dt, distance, player, chase, &mut ());
    }

    /// One simulation step: fires due timers, then moves the world by `distance`.
    pub fn tick_with_events(
        &mut self,
        dt: f32,
        distance: f32,
        player: &mut dyn PlayerView,
        chase: &mut dyn HeightTransition,
        sink: &mut dyn EventSink,
    ) {
        for id in self.timers.advance(dt) {
            let Some(entry) = self.pool.get(id) else {
                continue;
            };
            if !entry.state.in_use() || entry.collision_enabled {
                continue;
            }
            if let Some(animation) = self
                .pool
                .prototype(entry.prototype)
                .and_then(|p| p.once_off_animation())
            {
                debug!(?id, animation = %animation.name, "Once-off animation due");
                sink.send(TrackEvent::OnceOffAnimation {
                    id,
                    name: animation.name.clone(),
                });
            }
        }
        self.move_objects_with_events(distance, player, chase, sink);
    }

    pub fn choose_turn(&mut self, lane: Lane, committed: bool) -> Vec3 {
        self.choose_turn_with_events(lane, committed, &mut ())
    }

    /// Commits to the branch in `lane` and returns the offset that keeps the player aligned
    /// with the new center lane.
    ///
    /// `committed` is false when the player turned away from a turn platform; all spawning then
    /// stops until [`TrackGenerator::reset`].
    pub fn choose_turn_with_events(
        &mut self,
        lane: Lane,
        committed: bool,
        sink: &mut dyn EventSink,
    ) -> Vec3 {
        if !committed {
            if !self.stop_spawns {
                self.stop_spawns = true;
                info!("Turn taken off a turn platform; spawning stopped");
                sink.send(TrackEvent::SpawnsStopped);
            }
            return Vec3::ZERO;
        }

        let Some(head) = self.pending_turn() else {
            warn!(?lane, "Turn requested without a pending turn platform");
            return Vec3::ZERO;
        };
        let Some(traits) = self.pool.prototype_of(head).and_then(|p| p.platform_traits()) else {
            return Vec3::ZERO;
        };
        let permitted = match lane {
            Lane::Left => traits.left_turn,
            Lane::Right => traits.right_turn,
            Lane::Center => false,
        };
        let curved = traits.curve.is_some();
        if !permitted || self.history.live_count(lane, false) == 0 {
            warn!(?lane, "Turn requested into a lane without a branch");
            sink.send(TrackEvent::Warning {
                context: format!("{lane:?}"),
                message: "no branch to turn into".into(),
            });
            return Vec3::ZERO;
        }

        let yaw = self.history.lane_yaw(lane).to_radians();
        let direction = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        self.spawn_direction = direction;
        if !curved {
            self.move_direction = direction;
        }

        for (child, parent) in self.history.turn(lane) {
            self.pool.set_parent(child, Some(parent));
        }
        self.turn_heads[Lane::Center.index()] = self.turn_heads[lane.index()];
        self.turn_heads[Lane::Left.index()] = None;
        self.turn_heads[Lane::Right.index()] = None;

        let offset = self.turn_offset();
        info!(?lane, ?direction, "Turn taken");
        sink.send(TrackEvent::Turned { lane, offset });
        offset
    }

    /// Lateral offset from the origin to the centerline of the center lane's newest platform.
    pub fn turn_offset(&self) -> Vec3 {
        let Some(center) = self
            .history
            .top(Lane::Center, false)
            .and_then(|top| self.piece_center(top))
        else {
            return Vec3::ZERO;
        };
        let right = look_rotation(self.spawn_direction) * Vec3::X;
        right * right.dot(center)
    }

    /// Pauses deferred timers.
    pub fn pause(&mut self) {
        self.timers.pause();
    }

    pub fn resume(&mut self) {
        self.timers.resume();
    }

    pub fn collect_collidable(&mut self, id: ObjectId) -> bool {
        self.collect_collidable_with_events(id, &mut ())
    }

    /// Removes a coin or power-up ahead of its platform. Returns false for anything else.
    pub fn collect_collidable_with_events(
        &mut self,
        id: ObjectId,
        sink: &mut dyn EventSink,
    ) -> bool {
        let collectable = self.pool.get(id).is_some_and(|e| {
            e.state.in_use()
                && matches!(
                    e.prototype.category,
                    ObjectCategory::Coin | ObjectCategory::PowerUp
                )
        });
        if !collectable {
            return false;
        }
        self.pool.release(id);
        sink.send(TrackEvent::Collected { id });
        true
    }

    /// Disables a destructible obstacle and schedules its destruction animation.
    ///
    /// Returns false if `id` is not a live, still-colliding obstacle with a destruction animation.
    pub fn attack_obstacle(&mut self, id: ObjectId) -> bool {
        let Some(entry) = self.pool.get(id) else {
            return false;
        };
        if !entry.state.in_use()
            || !entry.collision_enabled
            || entry.prototype.category != ObjectCategory::Obstacle
        {
            return false;
        }
        let Some(delay) = self
            .pool
            .prototype(entry.prototype)
            .and_then(|p| p.once_off_animation())
            .map(|a| a.delay)
        else {
            return false;
        };

        if let Some(entry) = self.pool.get_mut(id) {
            entry.collision_enabled = false;
        }
        self.timers.schedule(id, delay);
        true
    }

    pub fn show_startup_objects(&mut self, layout: &StartupLayout) -> Result<bool> {
        self.show_startup_objects_with_events(layout, &mut ())
    }

    /// Lays out `layout` as one-shot pieces at the start of the center lane.
    ///
    /// Returns `Ok(false)` for an empty layout and an error if it names an unknown prototype.
    pub fn show_startup_objects_with_events(
        &mut self,
        layout: &StartupLayout,
        sink: &mut dyn EventSink,
    ) -> Result<bool> {
        if layout.is_empty() {
            return Ok(false);
        }
        for &index in &layout.platforms {
            self.pool.catalog().try_get(PrototypeId::platform(index))?;
        }
        for &index in &layout.scenes {
            self.pool.catalog().try_get(PrototypeId::scene(index))?;
        }

        let direction = self.spawn_direction;
        let section = self.sections.active_section(false);
        for &index in &layout.platforms {
            if self.pending_turn().is_some() {
                break;
            }
            let prototype = PrototypeId::platform(index);
            let base = match self.history.top(Lane::Center, false) {
                Some(top) => self.next_base(top, direction, false).unwrap_or(Vec3::ZERO),
                None => Vec3::ZERO,
            };
            let id = self.pool.acquire_one_shot(prototype)?;
            self.place_startup(id, prototype, base, direction, section, sink);
            if self.pool.prototype(prototype).is_some_and(|p| p.is_turn()) {
                self.turn_heads[Lane::Center.index()] = Some(id);
            }
        }
        for &index in &layout.scenes {
            let prototype = PrototypeId::scene(index);
            let base = match self.history.top(Lane::Center, true) {
                Some(top) => self.next_base(top, direction, false).unwrap_or(Vec3::ZERO),
                None => Vec3::ZERO,
            };
            let id = self.pool.acquire_one_shot(prototype)?;
            self.place_startup(id, prototype, base, direction, section, sink);
        }

        info!(
            platforms = layout.platforms.len(),
            scenes = layout.scenes.len(),
            "Startup objects placed"
        );
        Ok(true)
    }

    fn place_startup(
        &mut self,
        id: ObjectId,
        prototype: PrototypeId,
        base: Vec3,
        direction: Vec3,
        section: i32,
        sink: &mut dyn EventSink,
    ) {
        let distance = self
            .history
            .total_distance(Lane::Center, prototype.category == ObjectCategory::Scene);
        let position = self.place(id, base, direction);
        self.pool.activate(id);
        let length = self.pool.prototype(prototype).map_or(0.0, |p| p.extents.z);
        let previous_top = self.history.record_spawn(SpawnRecord {
            prototype,
            lane: Lane::Center,
            offset: 0.0,
            length,
            yaw: yaw_degrees(direction),
            section,
            instance: id,
        });
        if let Some(prev) = previous_top {
            self.pool.set_parent(prev, Some(id));
        }
        sink.send(TrackEvent::Spawned {
            id,
            prototype,
            lane: Lane::Center,
            position,
            distance,
        });
    }

    pub fn reset(&mut self) {
        self.reset_with_events(&mut ());
    }

    /// Archives the current run and lays out the next one behind it, staged.
    ///
    /// Call [`TrackGenerator::ready_from_reset`] to drop the archived pieces and show the new run.
    pub fn reset_with_events(&mut self, sink: &mut dyn EventSink) {
        self.move_direction = Vec3::Z;
        self.spawn_direction = Vec3::Z;
        self.turn_heads = [None; 3];
        self.stop_spawns = false;
        self.score = 0.0;
        self.state = GeneratorState::Idle;

        self.history.save_objects_reset();
        self.sections.reset();
        self.timers.cancel_all();

        self.config.no_collidable_probability.reset();
        let catalog = self.pool.catalog_mut();
        for category in ObjectCategory::ALL {
            for prototype in catalog.prototypes_mut(category) {
                prototype.appearance.reset();
            }
            if let Some(curve) = catalog.suppress_mut(category) {
                curve.reset();
            }
        }

        info!(archived = self.history.saved().len(), "Track generator reset");
        sink.send(TrackEvent::Reset);
        self.spawn_run_with_events(false, sink);
    }

    pub fn ready_from_reset(&mut self) {
        self.ready_from_reset_with_events(&mut ());
    }

    /// Releases the pieces archived by the last reset and shows the staged run.
    pub fn ready_from_reset_with_events(&mut self, sink: &mut dyn EventSink) {
        let saved = self.history.take_saved();
        let released = saved.len();
        for id in saved {
            self.pool.release(id);
        }
        let live: Vec<ObjectId> = self.history.live_objects().collect();
        for id in live {
            self.pool.activate(id);
        }
        info!(released, "Ready from reset");
        sink.send(TrackEvent::ReadyFromReset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OnceOffAnimation, PlatformSlope, Prototype, SlotMask};
    use crate::pool::ObjectState;

    fn straight() -> Prototype {
        Prototype::platform("straight", Vec3::new(4.0, 0.0, 20.0))
    }

    fn generator(catalog: PrototypeCatalog) -> TrackGenerator {
        TrackGenerator::try_new(GeneratorConfig::new(100.0, -10.0), catalog).unwrap()
    }

    fn center_positions(g: &TrackGenerator) -> Vec<Vec3> {
        g.history()
            .chain(Lane::Center, false)
            .map(|id| g.pool().get(id).unwrap().transform.position)
            .collect()
    }

    #[test]
    fn pieces_chain_end_to_end() {
        let mut g = generator(PrototypeCatalog::new().with(ObjectCategory::Platform, straight()));
        g.spawn_run(true);
        let z: Vec<f32> = center_positions(&g).iter().map(|p| p.z).collect();
        assert_eq!(z, vec![10.0, 30.0, 50.0, 70.0, 90.0]);
        assert_eq!(g.state(), GeneratorState::SpawningStraight);
        assert_eq!(g.spawn_run(true), 0);
        assert_eq!(g.state(), GeneratorState::Steady);
    }

    #[test]
    fn anchors_offset_the_instance() {
        let anchored = straight().with_anchor(Vec3::new(0.0, 1.0, 0.0));
        let mut g = generator(PrototypeCatalog::new().with(ObjectCategory::Platform, anchored));
        g.spawn_run(true);
        let positions = center_positions(&g);
        assert_eq!(positions[0], Vec3::new(0.0, 1.0, 10.0));
        assert_eq!(positions[1], Vec3::new(0.0, 1.0, 30.0));
    }

    #[test]
    fn chain_parents_point_to_newer_pieces() {
        let mut g = generator(PrototypeCatalog::new().with(ObjectCategory::Platform, straight()));
        g.spawn_run(true);
        let chain: Vec<ObjectId> = g.history().chain(Lane::Center, false).collect();
        let mut hops = 0;
        let mut cursor = g.history().bottom(Lane::Center, false).unwrap();
        while let Some(parent) = g.pool().get(cursor).unwrap().parent() {
            cursor = parent;
            hops += 1;
        }
        assert_eq!(Some(cursor), g.history().top(Lane::Center, false));
        assert_eq!(hops, chain.len() - 1);
    }

    #[test]
    fn stalls_without_eligible_platform() {
        let catalog = PrototypeCatalog::new()
            .with(ObjectCategory::Platform, straight().with_sections(vec![5]));
        let mut g = generator(catalog);
        let mut sink = VecSink::new();
        assert_eq!(g.spawn_run_with_events(true, &mut sink), 0);
        assert_eq!(
            sink.count(|e| matches!(e, TrackEvent::SpawnStalled { section: 0, .. })),
            1
        );
    }

    #[test]
    fn collidables_attach_at_longitudinal_positions() {
        let platform = straight().with_platform(|p| {
            p.collidable_positions = 3;
            p.force_distinct = true;
        });
        let catalog = PrototypeCatalog::new()
            .with(ObjectCategory::Platform, platform)
            .with(
                ObjectCategory::Coin,
                Prototype::collidable("coin", Vec3::splat(0.5), SlotMask::CENTER),
            );
        let mut g = generator(catalog);
        g.spawn_run(true);

        let first = g.history().bottom(Lane::Center, false).unwrap();
        let children = g.pool().get(first).unwrap().children().to_vec();
        let coins: Vec<Vec3> = children
            .iter()
            .filter_map(|c| g.pool().get(*c))
            .filter(|e| e.prototype.category == ObjectCategory::Coin)
            .map(|e| e.transform.position)
            .collect();
        // force_distinct: one coin, at the first position (0.1 * 20 + 0.8 * 20 / 4).
        assert_eq!(coins, vec![Vec3::new(0.0, 0.0, 6.0)]);
    }

    #[test]
    fn scenes_are_filled_before_collidables_attach() {
        let platform = straight().with_platform(|p| p.collidable_positions = 1);
        let catalog = PrototypeCatalog::new()
            .with(ObjectCategory::Platform, platform)
            .with(ObjectCategory::Scene, Prototype::scene("hill", Vec3::new(8.0, 3.0, 20.0)))
            .with(
                ObjectCategory::Coin,
                Prototype::collidable("coin", Vec3::splat(0.5), SlotMask::CENTER),
            );
        let config = GeneratorConfig::new(30.0, -10.0).with_spawn_full_length(true);
        let mut g = TrackGenerator::try_new(config, catalog).unwrap();
        let mut sink = VecSink::new();
        g.spawn_run_with_events(true, &mut sink);

        let order: Vec<ObjectCategory> = sink
            .as_slice()
            .iter()
            .filter_map(|e| match e {
                TrackEvent::Spawned { prototype, .. } => Some(prototype.category),
                _ => None,
            })
            .take(3)
            .collect();
        assert_eq!(
            order,
            vec![ObjectCategory::Platform, ObjectCategory::Scene, ObjectCategory::Coin]
        );
    }

    #[test]
    fn no_collidable_roll_leaves_platform_bare() {
        let platform = straight().with_platform(|p| p.collidable_positions = 2);
        let catalog = PrototypeCatalog::new()
            .with(ObjectCategory::Platform, platform)
            .with(
                ObjectCategory::Obstacle,
                Prototype::collidable("wall", Vec3::ONE, SlotMask::all()),
            );
        let config = GeneratorConfig::new(100.0, -10.0)
            .with_no_collidable_probability(crate::curve::DistanceCurve::constant(1.0));
        let mut g = TrackGenerator::try_new(config, catalog).unwrap();
        g.spawn_run(true);
        assert_eq!(g.pool().instance_count(ObjectCategory::Obstacle), 0);
    }

    #[test]
    fn scenes_trail_platforms_by_largest_piece() {
        let catalog = PrototypeCatalog::new()
            .with(ObjectCategory::Platform, straight())
            .with(ObjectCategory::Scene, Prototype::scene("hill", Vec3::new(10.0, 5.0, 10.0)));
        let mut g = generator(catalog);
        g.spawn_run(true);
        let platforms = g.history().total_distance(Lane::Center, false);
        let scenes = g.history().total_distance(Lane::Center, true);
        assert_eq!(platforms, 100.0);
        assert_eq!(scenes, 90.0);
    }

    #[test]
    fn sloped_platform_retirement_shifts_world_down() {
        let mut ramp = straight().with_platform(|p| p.slope = PlatformSlope::Up);
        ramp.extents.y = 2.0;
        let mut g = generator(PrototypeCatalog::new().with(ObjectCategory::Platform, ramp));
        g.spawn_run(true);
        let mut player = PlayerPose::default();
        let mut chase = HeightOffset::default();
        let mut sink = VecSink::new();
        g.move_objects_with_events(21.0, &mut player, &mut chase, &mut sink);

        assert_eq!(
            sink.count(|e| matches!(e, TrackEvent::HeightTransition { amount } if *amount == 2.0)),
            1
        );
        assert_eq!(player.position.y, -2.0);
        assert_eq!(chase.0, -2.0);
        // The second platform started 2 units up and is now back at ground level.
        let bottom = g.history().bottom(Lane::Center, false).unwrap();
        assert_eq!(g.pool().get(bottom).unwrap().transform.position.y, 0.0);
    }

    #[test]
    fn attacked_obstacle_plays_destruction_after_delay() {
        let platform = straight().with_platform(|p| p.collidable_positions = 1);
        let rock = Prototype::collidable("rock", Vec3::ONE, SlotMask::CENTER).with_collidable(|c| {
            c.destruction = Some(OnceOffAnimation {
                name: "Destruction".into(),
                delay: 0.5,
            })
        });
        let catalog = PrototypeCatalog::new()
            .with(ObjectCategory::Platform, platform)
            .with(ObjectCategory::Obstacle, rock);
        let mut g = generator(catalog);
        g.spawn_run(true);

        let rock_id = g
            .pool()
            .iter_in_use()
            .find(|(_, e)| e.prototype.category == ObjectCategory::Obstacle)
            .map(|(id, _)| id)
            .unwrap();
        assert!(g.attack_obstacle(rock_id));
        assert!(!g.attack_obstacle(rock_id));
        assert!(!g.pool().get(rock_id).unwrap().collision_enabled);

        let mut player = PlayerPose::default();
        let mut sink = VecSink::new();
        g.tick_with_events(0.25, 0.0, &mut player, &mut (), &mut sink);
        assert!(sink.is_empty());
        g.tick_with_events(0.25, 0.0, &mut player, &mut (), &mut sink);
        assert_eq!(
            sink.as_slice(),
            &[TrackEvent::OnceOffAnimation {
                id: rock_id,
                name: "Destruction".into()
            }]
        );
    }

    #[test]
    fn collected_coin_leaves_its_platform() {
        let platform = straight().with_platform(|p| p.collidable_positions = 1);
        let catalog = PrototypeCatalog::new()
            .with(ObjectCategory::Platform, platform)
            .with(
                ObjectCategory::Coin,
                Prototype::collidable("coin", Vec3::ONE, SlotMask::all()),
            );
        let mut g = generator(catalog);
        g.spawn_run(true);
        let (coin, host) = g
            .pool()
            .iter_in_use()
            .find(|(_, e)| e.prototype.category == ObjectCategory::Coin)
            .map(|(id, e)| (id, e.parent().unwrap()))
            .unwrap();

        assert!(g.collect_collidable(coin));
        assert_eq!(g.pool().get(coin).unwrap().state, ObjectState::Pooled);
        assert!(!g.pool().get(host).unwrap().children().contains(&coin));
        assert!(!g.collect_collidable(host));
    }

    #[test]
    fn curved_platform_points_follow_instance_transform() {
        let curve = crate::curve::PlatformCurve::try_new(vec![
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 10.0),
        ])
        .unwrap();
        let bend = straight().with_platform(|p| p.curve = Some(curve));
        let mut g = generator(PrototypeCatalog::new().with(ObjectCategory::Platform, bend));
        g.spawn_run(true);
        let first = g.history().bottom(Lane::Center, false).unwrap();
        let p = g.platform_curve_point(first, 10.0).unwrap();
        assert!((p - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-3);
    }
}
