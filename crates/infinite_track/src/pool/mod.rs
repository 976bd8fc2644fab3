//! Recycling pool for every spawnable instance.
//!
//! Instances live in an arena addressed by [`ObjectId`]. Each prototype keeps its own
//! instance list with a round-robin cursor: [`ObjectPool::acquire`] resumes the search for a
//! pooled instance where the previous call stopped and only instantiates when every instance
//! of that prototype is in use. Each prototype's instance list therefore grows to that
//! prototype's high-water mark of concurrent use and then stabilizes.
//!
//! Parent links form an explicit ownership tree. Collidables are children of the platform they
//! were attached to, and consecutive pieces of a lane chain point at the next newer piece.
//! [`ObjectPool::translate_subtree`] moves a node together with everything it owns.
use glam::Vec3;
use tracing::trace;

use crate::catalog::{ObjectCategory, Prototype, PrototypeCatalog, PrototypeId};
use crate::error::Result;

mod entry;
pub mod selection;

pub use entry::{ObjectId, ObjectState, PoolEntry};
pub use selection::{pick_weighted_random, Candidate, SpawnContext};

#[derive(Clone, Debug, Default)]
struct InstanceList {
    ids: Vec<ObjectId>,
    cursor: usize,
    in_use: usize,
    high_water: usize,
}

#[derive(Debug)]
pub struct ObjectPool {
    catalog: PrototypeCatalog,
    entries: Vec<Option<PoolEntry>>,
    free_slots: Vec<u32>,
    instances: [Vec<InstanceList>; ObjectCategory::COUNT],
    in_use: usize,
    high_water: usize,
}

impl ObjectPool {
    pub fn new(catalog: PrototypeCatalog) -> Self {
        let instances = ObjectCategory::ALL
            .map(|category| vec![InstanceList::default(); catalog.len(category)]);
        Self {
            catalog,
            entries: Vec::new(),
            free_slots: Vec::new(),
            instances,
            in_use: 0,
            high_water: 0,
        }
    }

    pub fn catalog(&self) -> &PrototypeCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PrototypeCatalog {
        &mut self.catalog
    }

    pub fn prototype(&self, id: PrototypeId) -> Option<&Prototype> {
        self.catalog.get(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&PoolEntry> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PoolEntry> {
        self.entries.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Prototype of a live instance, if both exist.
    pub fn prototype_of(&self, id: ObjectId) -> Option<&Prototype> {
        self.get(id).and_then(|e| self.catalog.get(e.prototype))
    }

    /// Hands out a pooled instance of `prototype` in the `Staged` state, instantiating one if
    /// every existing instance is in use.
    pub fn acquire(&mut self, prototype: PrototypeId) -> Result<ObjectId> {
        self.catalog.try_get(prototype)?;
        let list = &self.instances[prototype.category.index()][prototype.index];
        let n = list.ids.len();
        let start = list.cursor;

        let found = (0..n).map(|k| (start + k) % n).find(|&i| {
            let id = list.ids[i];
            self.entries[id.index()]
                .as_ref()
                .is_some_and(|e| !e.state.in_use())
        });

        let id = match found {
            Some(i) => {
                let id = list.ids[i];
                self.instances[prototype.category.index()][prototype.index].cursor = (i + 1) % n;
                if let Some(entry) = self.entries[id.index()].as_mut() {
                    entry.state = ObjectState::Staged;
                }
                id
            }
            None => {
                let id = self.instantiate(PoolEntry::new(prototype, false));
                let list = &mut self.instances[prototype.category.index()][prototype.index];
                let at = list.cursor.min(list.ids.len());
                list.ids.insert(at, id);
                list.cursor = (at + 1) % list.ids.len();
                trace!(?prototype, instances = list.ids.len(), "instantiated pooled object");
                id
            }
        };

        let list = &mut self.instances[prototype.category.index()][prototype.index];
        list.in_use += 1;
        list.high_water = list.high_water.max(list.in_use);
        self.mark_in_use();
        Ok(id)
    }

    /// Instantiates a startup instance that is dropped, not pooled, on release.
    pub fn acquire_one_shot(&mut self, prototype: PrototypeId) -> Result<ObjectId> {
        self.catalog.try_get(prototype)?;
        let id = self.instantiate(PoolEntry::new(prototype, true));
        self.mark_in_use();
        Ok(id)
    }

    fn instantiate(&mut self, entry: PoolEntry) -> ObjectId {
        match self.free_slots.pop() {
            Some(slot) => {
                self.entries[slot as usize] = Some(entry);
                ObjectId(slot)
            }
            None => {
                self.entries.push(Some(entry));
                ObjectId((self.entries.len() - 1) as u32)
            }
        }
    }

    fn mark_in_use(&mut self) {
        self.in_use += 1;
        self.high_water = self.high_water.max(self.in_use);
    }

    /// Makes a staged instance and its collidable children visible.
    pub fn activate(&mut self, id: ObjectId) {
        let children = match self.get_mut(id) {
            Some(entry) if entry.state.in_use() => {
                entry.state = ObjectState::Active;
                entry.children.clone()
            }
            _ => return,
        };
        for child in children {
            if self.is_collidable(child) {
                self.activate(child);
            }
        }
    }

    /// Returns an instance to the pool together with its attached collidables.
    ///
    /// Lane-chain children (older pieces pointing at this one) are detached, not released.
    /// Returns false if `id` was not in use.
    pub fn release(&mut self, id: ObjectId) -> bool {
        let (prototype, parent, children, one_shot) = match self.get_mut(id) {
            Some(entry) if entry.state.in_use() => (
                entry.prototype,
                entry.parent.take(),
                std::mem::take(&mut entry.children),
                entry.one_shot,
            ),
            _ => return false,
        };

        if let Some(parent) = parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        for child in children {
            if self.is_collidable(child) {
                if let Some(c) = self.get_mut(child) {
                    c.parent = None;
                }
                self.release(child);
            } else if let Some(c) = self.get_mut(child) {
                c.parent = None;
            }
        }

        if one_shot {
            self.entries[id.index()] = None;
            self.free_slots.push(id.0);
        } else {
            if let Some(entry) = self.get_mut(id) {
                entry.recycle();
            }
            self.instances[prototype.category.index()][prototype.index].in_use -= 1;
        }
        self.in_use -= 1;
        true
    }

    fn is_collidable(&self, id: ObjectId) -> bool {
        self.get(id)
            .is_some_and(|e| e.prototype.category.is_collidable())
    }

    /// Re-parents `child`. Passing `None` detaches it.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) {
        let old = match self.get_mut(child) {
            Some(entry) => std::mem::replace(&mut entry.parent, parent),
            None => return,
        };
        if let Some(old) = old {
            if let Some(p) = self.get_mut(old) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Some(parent) = parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.push(child);
            }
        }
    }

    /// Translates `root` and every node it owns by `delta`.
    pub fn translate_subtree(&mut self, root: ObjectId, delta: Vec3) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(entry) = self.get_mut(id) {
                entry.transform.position += delta;
                stack.extend_from_slice(&entry.children);
            }
        }
    }

    /// Number of instances currently handed out (staged or active).
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Largest number of instances ever handed out at once, across all prototypes.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Recyclable instances created for `prototype`.
    pub fn instances_of(&self, prototype: PrototypeId) -> usize {
        self.list(prototype).map_or(0, |l| l.ids.len())
    }

    /// Largest number of recyclable instances of `prototype` handed out at once.
    pub fn high_water_of(&self, prototype: PrototypeId) -> usize {
        self.list(prototype).map_or(0, |l| l.high_water)
    }

    fn list(&self, prototype: PrototypeId) -> Option<&InstanceList> {
        self.instances[prototype.category.index()].get(prototype.index)
    }

    /// Number of recyclable instances ever created for `category`.
    pub fn instance_count(&self, category: ObjectCategory) -> usize {
        self.instances[category.index()]
            .iter()
            .map(|l| l.ids.len())
            .sum()
    }

    /// Number of recyclable instances across every category.
    pub fn total_instances(&self) -> usize {
        ObjectCategory::ALL
            .iter()
            .map(|c| self.instance_count(*c))
            .sum()
    }

    pub fn iter_in_use(&self) -> impl Iterator<Item = (ObjectId, &PoolEntry)> {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            e.as_ref()
                .filter(|e| e.state.in_use())
                .map(|e| (ObjectId(i as u32), e))
        })
    }
}
