//! Spawn history: what is live in each lane and in what order.
//!
//! Every lane keeps two chains, one for platforms and one for scenery. A chain is ordered from
//! bottom (oldest, nearest to removal) to top (newest). The history only records ids; the
//! matching parent links live in the [`crate::pool::ObjectPool`] and are applied by the
//! generator from the values returned here.
use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::catalog::{ObjectCategory, PrototypeId};
use crate::pool::ObjectId;

/// One of the parallel spawn tracks. Side lanes exist only while a turn is pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    Center,
    Left,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Center, Lane::Left, Lane::Right];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The other side lane. `Center` maps to itself.
    pub const fn opposite(self) -> Lane {
        match self {
            Lane::Center => Lane::Center,
            Lane::Left => Lane::Right,
            Lane::Right => Lane::Left,
        }
    }
}

/// A spawn to be recorded.
#[derive(Clone, Copy, Debug)]
pub struct SpawnRecord {
    pub prototype: PrototypeId,
    pub lane: Lane,
    /// Collidables: offset from the host platform's start along the lane.
    pub offset: f32,
    /// Top-level pieces: length added to the lane distance.
    pub length: f32,
    /// Facing of the piece, in degrees.
    pub yaw: f32,
    pub section: i32,
    pub instance: ObjectId,
}

#[derive(Clone, Debug, Default)]
struct LaneLedger {
    objects: VecDeque<ObjectId>,
    /// `(end distance, section)` of each live object, parallel to `objects`.
    spans: VecDeque<(f32, i32)>,
    /// Spans copied from the center lane when a branch starts.
    inherited: Vec<(f32, i32)>,
    total_distance: f32,
    last_start: f32,
    previous_section: Option<i32>,
    last_prototype: Option<PrototypeId>,
    yaw: f32,
}

impl LaneLedger {
    fn clear(&mut self) {
        *self = LaneLedger::default();
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpawnHistory {
    platforms: [LaneLedger; 3],
    scenes: [LaneLedger; 3],
    last_spawn: HashMap<PrototypeId, f32>,
    saved: Vec<ObjectId>,
}

impl SpawnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, lane: Lane, is_scene: bool) -> &LaneLedger {
        if is_scene {
            &self.scenes[lane.index()]
        } else {
            &self.platforms[lane.index()]
        }
    }

    fn ledger_mut(&mut self, lane: Lane, is_scene: bool) -> &mut LaneLedger {
        if is_scene {
            &mut self.scenes[lane.index()]
        } else {
            &mut self.platforms[lane.index()]
        }
    }

    /// Newest live object of a lane chain.
    pub fn top(&self, lane: Lane, is_scene: bool) -> Option<ObjectId> {
        self.ledger(lane, is_scene).objects.back().copied()
    }

    /// Oldest live object of a lane chain.
    pub fn bottom(&self, lane: Lane, is_scene: bool) -> Option<ObjectId> {
        self.ledger(lane, is_scene).objects.front().copied()
    }

    pub fn live_count(&self, lane: Lane, is_scene: bool) -> usize {
        self.ledger(lane, is_scene).objects.len()
    }

    /// Chain members from bottom to top.
    pub fn chain(&self, lane: Lane, is_scene: bool) -> impl Iterator<Item = ObjectId> + '_ {
        self.ledger(lane, is_scene).objects.iter().copied()
    }

    /// Every live top-level object across lanes and chains.
    pub fn live_objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.platforms
            .iter()
            .chain(self.scenes.iter())
            .flat_map(|l| l.objects.iter().copied())
    }

    /// Distance covered by everything ever spawned in the chain since the last reset.
    pub fn total_distance(&self, lane: Lane, is_scene: bool) -> f32 {
        self.ledger(lane, is_scene).total_distance
    }

    /// Section of the most recently spawned piece, if any.
    pub fn previous_section(&self, lane: Lane, is_scene: bool) -> Option<i32> {
        self.ledger(lane, is_scene).previous_section
    }

    pub fn last_prototype(&self, lane: Lane, is_scene: bool) -> Option<PrototypeId> {
        self.ledger(lane, is_scene).last_prototype
    }

    /// Lane distance at which the newest platform starts.
    pub fn last_platform_start(&self, lane: Lane) -> f32 {
        self.platforms[lane.index()].last_start
    }

    /// Facing of the newest platform in `lane`, in degrees.
    pub fn lane_yaw(&self, lane: Lane) -> f32 {
        self.platforms[lane.index()].yaw
    }

    /// Lane distance at which `prototype` was last spawned.
    pub fn last_spawn_distance(&self, prototype: PrototypeId) -> Option<f32> {
        self.last_spawn.get(&prototype).copied()
    }

    /// True while side lanes hold a pending branch.
    pub fn is_branching(&self) -> bool {
        [Lane::Left, Lane::Right]
            .iter()
            .any(|l| !self.platforms[l.index()].objects.is_empty())
    }

    /// Section of the platform covering `distance` in `lane`, used to keep scenery in step
    /// with the platforms below it.
    pub fn platform_section_at(&self, lane: Lane, distance: f32) -> i32 {
        let ledger = &self.platforms[lane.index()];
        ledger
            .inherited
            .iter()
            .chain(ledger.spans.iter())
            .find(|(end, _)| distance < *end)
            .or_else(|| ledger.spans.back())
            .or_else(|| ledger.inherited.last())
            .map_or(0, |(_, section)| *section)
    }

    /// Records a spawn and returns the previous top of the chain, which the caller parents to
    /// the new piece. Collidables only update spacing bookkeeping and return `None`.
    pub fn record_spawn(&mut self, record: SpawnRecord) -> Option<ObjectId> {
        let category = record.prototype.category;
        if !category.is_top_level() {
            let at = self.last_platform_start(record.lane) + record.offset;
            self.last_spawn.insert(record.prototype, at);
            return None;
        }

        let ledger = self.ledger_mut(record.lane, category == ObjectCategory::Scene);
        let previous_top = ledger.objects.back().copied();
        let start = ledger.total_distance;

        ledger.objects.push_back(record.instance);
        ledger.total_distance += record.length;
        ledger.spans.push_back((ledger.total_distance, record.section));
        ledger.last_start = start;
        ledger.previous_section = Some(record.section);
        ledger.last_prototype = Some(record.prototype);
        ledger.yaw = record.yaw;

        self.last_spawn.insert(record.prototype, start);
        previous_top
    }

    /// Pops the bottom of a chain. `None` means the chain was empty, which callers treat as a
    /// broken invariant.
    pub fn record_removal(&mut self, lane: Lane, is_scene: bool) -> Option<ObjectId> {
        let ledger = self.ledger_mut(lane, is_scene);
        let removed = ledger.objects.pop_front()?;
        ledger.spans.pop_front();
        Some(removed)
    }

    /// Starts a branch in `lane`, continuing the center lane's distances and sections.
    pub fn begin_branch(&mut self, lane: Lane) {
        debug_assert!(lane != Lane::Center, "branches start in a side lane");
        for is_scene in [false, true] {
            let center = self.ledger(Lane::Center, is_scene);
            let total = center.total_distance;
            let previous_section = center.previous_section;
            let yaw = center.yaw;
            let inherited: Vec<(f32, i32)> = center
                .inherited
                .iter()
                .chain(center.spans.iter())
                .copied()
                .collect();

            let side = self.ledger_mut(lane, is_scene);
            side.total_distance = total;
            side.last_start = total;
            side.previous_section = previous_section;
            side.yaw = yaw;
            if !is_scene {
                side.inherited = inherited;
            }
        }
    }

    /// Re-roots the history after the player commits to `lane`.
    ///
    /// The new center chain is the opposite branch, then the old center chain, then the chosen
    /// branch, bottom to top. Returns the `(child, parent)` links that join those pieces.
    pub fn turn(&mut self, lane: Lane) -> Vec<(ObjectId, ObjectId)> {
        debug_assert!(lane != Lane::Center, "turns pick a side lane");
        let mut links = Vec::new();

        for is_scene in [false, true] {
            let chosen = std::mem::take(self.ledger_mut(lane, is_scene));
            let opposite = std::mem::take(self.ledger_mut(lane.opposite(), is_scene));
            let center = std::mem::take(self.ledger_mut(Lane::Center, is_scene));

            let mut merged = chosen.clone();
            merged.objects.clear();
            merged.spans.clear();
            merged.inherited.clear();

            let mut previous_top: Option<ObjectId> = None;
            for part in [&opposite, &center, &chosen] {
                if let (Some(top), Some(bottom)) = (previous_top, part.objects.front()) {
                    links.push((top, *bottom));
                }
                if let Some(top) = part.objects.back() {
                    previous_top = Some(*top);
                }
                merged.objects.extend(part.objects.iter().copied());
                merged.spans.extend(part.spans.iter().copied());
            }
            // Monotonic: the chosen branch continued from the center total.
            merged.total_distance = chosen.total_distance.max(center.total_distance);

            *self.ledger_mut(Lane::Center, is_scene) = merged;
        }

        debug!(?lane, links = links.len(), "history re-rooted on turn");
        links
    }

    /// Moves every live object into the saved set and clears all chains and distances.
    pub fn save_objects_reset(&mut self) {
        let live: Vec<ObjectId> = self.live_objects().collect();
        self.saved.extend(live);
        for ledger in self.platforms.iter_mut().chain(self.scenes.iter_mut()) {
            ledger.clear();
        }
        self.last_spawn.clear();
    }

    /// Objects archived by the last reset.
    pub fn take_saved(&mut self) -> Vec<ObjectId> {
        std::mem::take(&mut self.saved)
    }

    pub fn saved(&self) -> &[ObjectId] {
        &self.saved
    }
}
