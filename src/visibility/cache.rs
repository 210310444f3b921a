//! Per-player sight cache
//!
//! The grid, its validity flag and an invalidation epoch share one lock.
//! A second lock serializes recomputation so only one thread rebuilds a
//! player's grid at a time. A rebuild that started before an invalidation
//! is discarded and retried, so readers never see a grid older than the
//! last invalidation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct SightState {
    grid: Arc<Vec<bool>>,
    valid: bool,
    epoch: u64,
}

#[derive(Debug, Default)]
pub struct SightCache {
    state: Mutex<SightState>,
    rebuild: Mutex<()>,
    recomputations: AtomicU64,
}

impl SightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached grid; the next query recomputes
    pub fn invalidate(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.valid = false;
        state.epoch = state.epoch.wrapping_add(1);
    }

    pub fn is_valid(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .valid
    }

    /// Number of grids built so far
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }

    fn cached(&self) -> Result<Arc<Vec<bool>>, u64> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.valid {
            Ok(Arc::clone(&state.grid))
        } else {
            Err(state.epoch)
        }
    }

    /// Return the valid grid, building it with `compute` when needed
    pub fn get_or_compute(&self, compute: impl Fn() -> Vec<bool>) -> Arc<Vec<bool>> {
        loop {
            if let Ok(grid) = self.cached() {
                return grid;
            }
            let _rebuilding = self.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
            let epoch = match self.cached() {
                Ok(grid) => return grid,
                Err(epoch) => epoch,
            };
            let grid = Arc::new(compute());
            self.recomputations.fetch_add(1, Ordering::Relaxed);
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.epoch == epoch {
                state.grid = Arc::clone(&grid);
                state.valid = true;
                return grid;
            }
            tracing::debug!("sight grid invalidated during rebuild, retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_second_query_uses_cache() {
        let cache = SightCache::new();
        let a = cache.get_or_compute(|| vec![true, false]);
        let b = cache.get_or_compute(|| vec![false, false]);
        assert_eq!(a, b);
        assert_eq!(cache.recomputations(), 1);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let cache = SightCache::new();
        cache.get_or_compute(|| vec![true]);
        cache.invalidate();
        assert!(!cache.is_valid());
        let grid = cache.get_or_compute(|| vec![false]);
        assert_eq!(*grid, vec![false]);
        assert_eq!(cache.recomputations(), 2);
    }

    #[test]
    fn test_invalidation_during_rebuild_retries() {
        let cache = SightCache::new();
        let calls = AtomicUsize::new(0);
        let grid = cache.get_or_compute(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                cache.invalidate();
            }
            vec![n == 1]
        });
        assert_eq!(*grid, vec![true]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_queries_share_one_rebuild() {
        let cache = Arc::new(SightCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_compute(|| vec![true; 16]).len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().expect("thread"), 16);
        }
        assert_eq!(cache.recomputations(), 1);
    }
}
