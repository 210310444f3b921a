//! Object registry - identity to entity index
//!
//! The registry owns no entity. Each entry holds a generation-tagged
//! reference into the arena of the aggregate that really owns the entity;
//! once the owner drops it, the reference decays and the entry is evicted
//! on the next lookup or sweep.

pub mod arena;
pub mod id;

pub use arena::{Arena, SlotKey};
pub use id::{IdError, ObjectId, TypeTag};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Non-owning reference to an entity slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    pub tag: TypeTag,
    pub key: SlotKey,
}

impl EntityRef {
    pub fn new(tag: TypeTag, key: SlotKey) -> Self {
        Self { tag, key }
    }
}

/// Answers whether a referenced slot still holds its entity
pub trait EntityStore {
    fn is_live(&self, entity: EntityRef) -> bool;
}

/// Observer of registry membership changes
pub trait RegistryListener: Send + Sync {
    fn on_register(&self, id: &ObjectId, entity: EntityRef);
    fn on_deregister(&self, id: &ObjectId, reason: &str);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(String),
    #[error("identity {id} does not name a {expected:?}")]
    TagMismatch { id: ObjectId, expected: TypeTag },
    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] IdError),
}

/// Live entity counts per tag, mirrored from registry notifications
#[derive(Debug, Clone, Default)]
pub struct TagCounts {
    counts: Arc<Mutex<BTreeMap<TypeTag, usize>>>,
}

impl TagCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: TypeTag) -> usize {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.get(&tag).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<TypeTag, usize> {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RegistryListener for TagCounts {
    fn on_register(&self, _id: &ObjectId, entity: EntityRef) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts.entry(entity.tag).or_insert(0) += 1;
    }

    fn on_deregister(&self, id: &ObjectId, _reason: &str) {
        let Some(tag) = id.tag() else { return };
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = counts.get_mut(&tag) {
            *count = count.saturating_sub(1);
        }
    }
}

pub struct Registry {
    entries: BTreeMap<ObjectId, EntityRef>,
    /// Identities evicted or deregistered; never accepted again
    retired: BTreeSet<ObjectId>,
    next_id: u64,
    removals_since_sweep: u32,
    sweep_threshold: u32,
    listeners: Vec<Box<dyn RegistryListener>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.len())
            .field("retired", &self.retired.len())
            .field("next_id", &self.next_id)
            .field("removals_since_sweep", &self.removals_since_sweep)
            .field("sweep_threshold", &self.sweep_threshold)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Registry {
    pub fn new(sweep_threshold: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            retired: BTreeSet::new(),
            next_id: 1,
            removals_since_sweep: 0,
            sweep_threshold,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn RegistryListener>) {
        self.listeners.push(listener);
    }

    /// Allocate a fresh identity; numbers are never handed out twice
    pub fn next_id(&mut self, tag: TypeTag) -> ObjectId {
        let id = ObjectId::new(tag, self.next_id);
        self.next_id += 1;
        id
    }

    /// Counter value the next allocation will use (persisted with the game)
    pub fn next_id_value(&self) -> u64 {
        self.next_id
    }

    /// Restore the counter after loading; never moves it backwards
    pub fn advance_next_id(&mut self, value: u64) {
        self.next_id = self.next_id.max(value);
    }

    /// Map `id` to `entity`
    ///
    /// Fails if `id` names a live entity or has ever been evicted or
    /// deregistered. A decayed entry is evicted and its identity retired.
    pub fn register<S: EntityStore>(
        &mut self,
        id: ObjectId,
        entity: EntityRef,
        store: &S,
    ) -> Result<(), RegistryError> {
        if id.tag() != Some(entity.tag) {
            return Err(RegistryError::TagMismatch {
                id,
                expected: entity.tag,
            });
        }
        if let Some(existing) = self.entries.get(&id).copied() {
            if store.is_live(existing) {
                return Err(RegistryError::DuplicateIdentity(id.to_string()));
            }
            self.evict(&id, "decayed");
        }
        if self.retired.contains(&id) {
            tracing::warn!("refusing to reassign retired identity {}", id);
            return Err(RegistryError::DuplicateIdentity(id.to_string()));
        }
        if let Some(n) = id.number() {
            self.advance_next_id(n + 1);
        }
        self.notify_register(&id, entity);
        self.entries.insert(id, entity);
        Ok(())
    }

    /// Resolve `id`, evicting the entry if its reference has decayed
    pub fn resolve<S: EntityStore>(&mut self, id: &ObjectId, store: &S) -> Option<EntityRef> {
        let entity = *self.entries.get(id)?;
        if store.is_live(entity) {
            return Some(entity);
        }
        tracing::debug!("evicting decayed registry entry {}", id);
        self.evict(id, "decayed");
        None
    }

    /// Pure lookup: decayed entries read as absent but stay in place
    pub fn peek<S: EntityStore>(&self, id: &ObjectId, store: &S) -> Option<EntityRef> {
        let entity = *self.entries.get(id)?;
        store.is_live(entity).then_some(entity)
    }

    /// Remove the mapping for `id`
    ///
    /// Every removal counts toward the sweep threshold; crossing it runs a
    /// full sweep of decayed entries.
    pub fn deregister<S: EntityStore>(
        &mut self,
        id: &ObjectId,
        reason: &str,
        store: &S,
    ) -> Option<EntityRef> {
        let removed = self.evict(id, reason);
        if removed.is_some() {
            tracing::debug!("deregistered {} ({})", id, reason);
        }
        self.removals_since_sweep += 1;
        if self.removals_since_sweep > self.sweep_threshold {
            self.sweep(store);
        }
        removed
    }

    /// Live entries in identity order; never mutates the registry
    pub fn scan<'a, S: EntityStore>(
        &'a self,
        store: &'a S,
    ) -> impl Iterator<Item = (&'a ObjectId, EntityRef)> + 'a {
        self.entries
            .iter()
            .filter(move |(_, entity)| store.is_live(**entity))
            .map(|(id, entity)| (id, *entity))
    }

    /// Evict every decayed entry; returns how many were evicted
    pub fn sweep<S: EntityStore>(&mut self, store: &S) -> usize {
        let decayed: Vec<ObjectId> = self
            .entries
            .iter()
            .filter(|(_, entity)| !store.is_live(**entity))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &decayed {
            self.evict(id, "decayed");
        }
        self.removals_since_sweep = 0;
        if !decayed.is_empty() {
            tracing::debug!("registry sweep evicted {} decayed entries", decayed.len());
        }
        decayed.len()
    }

    /// Convenience listing that performs a `sweep` first
    pub fn live_entities<S: EntityStore>(&mut self, store: &S) -> Vec<(ObjectId, EntityRef)> {
        self.sweep(store);
        self.entries.iter().map(|(id, e)| (id.clone(), *e)).collect()
    }

    /// Entries whose reference has decayed but which have not been swept
    pub fn decayed_ids<S: EntityStore>(&self, store: &S) -> Vec<ObjectId> {
        self.entries
            .iter()
            .filter(|(_, entity)| !store.is_live(**entity))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Stored entries, live or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn removals_since_sweep(&self) -> u32 {
        self.removals_since_sweep
    }

    pub fn is_retired(&self, id: &ObjectId) -> bool {
        self.retired.contains(id)
    }

    fn evict(&mut self, id: &ObjectId, reason: &str) -> Option<EntityRef> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            self.retired.insert(id.clone());
            self.notify_deregister(id, reason);
        }
        removed
    }

    fn notify_register(&self, id: &ObjectId, entity: EntityRef) {
        for listener in &self.listeners {
            listener.on_register(id, entity);
        }
    }

    fn notify_deregister(&self, id: &ObjectId, reason: &str) {
        for listener in &self.listeners {
            listener.on_deregister(id, reason);
        }
    }
}
