//! Admission gate shared by all jobs of a batch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting gate. Jobs hold a [`GateGuard`] for the whole connect + execute +
/// close section; waiters are admitted in FIFO order.
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionGate {
    /// Create a gate with the given capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Highest number of slots held at once since the gate was created.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Wait for a free slot. The slot is released when the guard drops, on
    /// every exit path of the holder.
    pub async fn admit(self: &Arc<Self>) -> Result<GateGuard, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        let now = self.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        Ok(GateGuard {
            gate: Arc::clone(self),
            _permit: permit,
        })
    }
}

/// Releases its gate slot when dropped.
#[derive(Debug)]
pub struct GateGuard {
    gate: Arc<AdmissionGate>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.gate.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn admit_and_release() {
        let gate = Arc::new(AdmissionGate::new(2));
        let a = gate.admit().await.unwrap();
        let b = gate.admit().await.unwrap();
        assert_eq!(gate.in_use(), 2);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), gate.admit())
                .await
                .is_err(),
            "third admit must wait"
        );
        drop(a);
        assert_eq!(gate.in_use(), 1);
        let c = gate.admit().await.unwrap();
        assert_eq!(gate.in_use(), 2);
        drop(b);
        drop(c);
        assert_eq!(gate.in_use(), 0);
        assert_eq!(gate.peak(), 2);
    }

    #[test]
    fn zero_capacity_clamped_to_one() {
        assert_eq!(AdmissionGate::new(0).capacity(), 1);
    }
}
