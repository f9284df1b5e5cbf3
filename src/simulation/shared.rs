use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::Result;
use crate::persistence::SlotStore;

use super::{IntentSender, WorldCore, WorldSnapshot};

/// Single-writer, many-reader handle for hosts that read input on another thread.
///
/// Input threads queue commands through [`SharedWorld::intent_sender`]; the
/// simulation thread steps under the write lock; renderers snapshot under
/// the read lock between steps.
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<RwLock<WorldCore>>,
}

impl SharedWorld {
    pub fn new(world: WorldCore) -> Self {
        Self { inner: Arc::new(RwLock::new(world)) }
    }

    // A panic mid-step leaves entities in a consistent (if odd) state; keep serving.
    pub fn read(&self) -> RwLockReadGuard<'_, WorldCore> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, WorldCore> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn intent_sender(&self) -> IntentSender {
        self.read().intent_sender()
    }

    pub fn step(&self) -> bool {
        self.write().step()
    }

    pub fn advance(&self, elapsed: f64) -> u32 {
        self.write().advance(elapsed)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.read().snapshot()
    }

    pub fn save<S: SlotStore + ?Sized>(&self, name: &str, store: &mut S) -> Result<()> {
        self.write().save(name, store)
    }

    pub fn load<S: SlotStore + ?Sized>(&self, name: &str, store: &S) -> Result<()> {
        self.write().load(name, store)
    }
}
