//! Bounded admission of concurrent update handling.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting gate that caps how many updates are processed at once.
#[derive(Clone, Debug)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// One occupied slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits until a slot is free. Fails only after [`AdmissionGate::close`].
    pub async fn acquire(&self) -> Result<GatePermit, AcquireError> {
        let permit = self.slots.clone().acquire_owned().await?;
        Ok(GatePermit { _permit: permit })
    }

    /// Takes a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        self.slots
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| GatePermit { _permit: permit })
    }

    pub fn release(&self, permit: GatePermit) {
        drop(permit);
    }

    /// Wakes pending `acquire` calls with an error; no new slots are handed out.
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}
