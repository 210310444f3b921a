//! Guarded identity list shared with concurrent readers

use std::sync::{PoisonError, RwLock};

use crate::registry::ObjectId;

/// Identities owned by a player, readable while the simulation mutates them
#[derive(Debug, Default)]
pub struct OwnedList {
    inner: RwLock<Vec<ObjectId>>,
}

impl OwnedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(ids: Vec<ObjectId>) -> Self {
        Self {
            inner: RwLock::new(ids),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<ObjectId> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, id: ObjectId) {
        let mut list = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !list.contains(&id) {
            list.push(id);
        }
    }

    pub fn remove(&self, id: &ObjectId) -> bool {
        let mut list = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = list.len();
        list.retain(|x| x != id);
        list.len() != before
    }

    /// Keep only identities for which `keep` holds; returns how many were dropped
    pub fn retain(&self, mut keep: impl FnMut(&ObjectId) -> bool) -> usize {
        let mut list = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = list.len();
        list.retain(|id| keep(id));
        before - list.len()
    }
}

impl Clone for OwnedList {
    fn clone(&self) -> Self {
        Self::from_vec(self.snapshot())
    }
}
