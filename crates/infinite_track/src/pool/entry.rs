use crate::catalog::{PrototypeId, MAX_COLLIDABLE_POSITIONS};
use crate::transform::Transform;

/// Handle to a pooled instance. Stable for the lifetime of the instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lifecycle of a pooled instance.
///
/// `Pooled -> Staged -> Active -> Pooled`. Staged instances are placed but not yet
/// visible, which is how the next run is laid out behind a reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectState {
    Pooled,
    Staged,
    Active,
}

impl ObjectState {
    #[inline]
    pub fn in_use(self) -> bool {
        !matches!(self, ObjectState::Pooled)
    }
}

#[derive(Clone, Debug)]
pub struct PoolEntry {
    pub prototype: PrototypeId,
    pub state: ObjectState,
    pub transform: Transform,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    /// Startup objects are dropped instead of pooled on release.
    pub(crate) one_shot: bool,
    /// Platforms: bitmask of longitudinal collidable positions already taken.
    pub used_positions: u32,
    /// Obstacles: whether the collider still reacts. Cleared once attacked.
    pub collision_enabled: bool,
}

impl PoolEntry {
    pub(crate) fn new(prototype: PrototypeId, one_shot: bool) -> Self {
        Self {
            prototype,
            state: ObjectState::Staged,
            transform: Transform::IDENTITY,
            parent: None,
            children: Vec::new(),
            one_shot,
            used_positions: 0,
            collision_enabled: true,
        }
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    /// Marks longitudinal position `i` as occupied; returns false if it already was.
    pub fn claim_position(&mut self, i: u8) -> bool {
        debug_assert!(i < MAX_COLLIDABLE_POSITIONS);
        let bit = 1u32 << i;
        let free = self.used_positions & bit == 0;
        self.used_positions |= bit;
        free
    }

    pub(crate) fn recycle(&mut self) {
        self.state = ObjectState::Pooled;
        self.parent = None;
        self.children.clear();
        self.used_positions = 0;
        self.collision_enabled = true;
    }
}
