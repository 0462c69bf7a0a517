//! Process-wide cap on concurrently active heavy transforms.
//!
//! Every intermediate buffer of a run is fully materialized in memory and
//! input pixel counts are unbounded, so peak memory scales with the number of
//! runs in flight. A [`TransformGate`] is a counting gate shared by cloning;
//! [`GatePermit`] releases its slot on drop, including on early `?` returns
//! and panics.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

#[derive(Debug)]
struct GateState {
    limit: usize,
    active: Mutex<usize>,
    released: Condvar,
}

/// Cloneable handle to a shared counting gate.
#[derive(Debug, Clone)]
pub struct TransformGate {
    state: Arc<GateState>,
}

impl TransformGate {
    /// A gate admitting at most `limit` runs at once. Zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            state: Arc::new(GateState {
                limit: limit.max(1),
                active: Mutex::new(0),
                released: Condvar::new(),
            }),
        }
    }

    /// Block until a slot is free and claim it.
    pub fn acquire(&self) -> GatePermit {
        let mut active = self
            .state
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *active >= self.state.limit {
            active = self
                .state
                .released
                .wait(active)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *active += 1;
        GatePermit {
            state: Arc::clone(&self.state),
        }
    }

    /// Claim a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        let mut active = self
            .state
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *active >= self.state.limit {
            return None;
        }
        *active += 1;
        Some(GatePermit {
            state: Arc::clone(&self.state),
        })
    }

    pub fn limit(&self) -> usize {
        self.state.limit
    }

    /// Runs currently holding a permit.
    pub fn active(&self) -> usize {
        *self
            .state
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TransformGate {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Proof of a claimed slot. Dropping it frees the slot.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct GatePermit {
    state: Arc<GateState>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        let mut active = self
            .state
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        self.state.released.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn zero_limit_means_one() {
        assert_eq!(TransformGate::new(0).limit(), 1);
        assert_eq!(TransformGate::default().limit(), 1);
    }

    #[test]
    fn permit_releases_on_drop() {
        let gate = TransformGate::new(1);
        let permit = gate.acquire();
        assert_eq!(gate.active(), 1);
        assert!(gate.try_acquire().is_none());
        drop(permit);
        assert_eq!(gate.active(), 0);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_same_slots() {
        let gate = TransformGate::new(2);
        let other = gate.clone();
        let _a = gate.acquire();
        let _b = other.acquire();
        assert!(gate.try_acquire().is_none());
        assert_eq!(other.active(), 2);
    }

    #[test]
    fn never_exceeds_limit_under_contention() {
        let gate = TransformGate::new(2);
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let inside = Arc::clone(&inside);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    let _permit = gate.acquire();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(gate.active(), 0);
    }

    #[test]
    fn panicking_holder_still_releases() {
        let gate = TransformGate::new(1);
        let inner = gate.clone();
        let result = thread::spawn(move || {
            let _permit = inner.acquire();
            panic!("stage blew up");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(gate.active(), 0);
    }
}
