use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::core::Vec2;
use crate::systems::{BodyParams, DropletParams};

/// A user intent, applied by the world at the start of the next step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    SpawnBody(BodyParams),
    DeleteBodyAt { position: Vec2 },
    EmitDroplet { position: Vec2, droplet: DropletParams },
    StartEmitting { position: Vec2, droplet: DropletParams },
    MoveEmitter { position: Vec2 },
    StopEmitting,
    ClearFluid,
    ClearAll,
    GrabBody { position: Vec2 },
    DragGrabbed { position: Vec2 },
    ReleaseBody,
}

type Pending = Arc<Mutex<Vec<Command>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, Vec<Command>> {
    // A panicked producer cannot leave a half-pushed Vec behind.
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable, `Send` handle for queueing commands from any thread.
#[derive(Clone, Debug, Default)]
pub struct IntentSender {
    pending: Pending,
}

impl IntentSender {
    pub fn send(&self, command: Command) {
        lock(&self.pending).push(command);
    }
}

/// Receiving side owned by the world.
#[derive(Debug, Default)]
pub(crate) struct IntentQueue {
    pending: Pending,
}

impl IntentQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sender(&self) -> IntentSender {
        IntentSender { pending: Arc::clone(&self.pending) }
    }

    /// Everything queued so far, in send order. Later sends land in the next drain.
    pub(crate) fn drain(&self) -> Vec<Command> {
        std::mem::take(&mut *lock(&self.pending))
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub(crate) fn clear(&self) {
        lock(&self.pending).clear();
    }
}
