use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

type Slots = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Per-room mutual exclusion. Rooms never block each other.
#[derive(Clone, Default)]
pub struct RoomLocks {
    slots: Slots,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `room_id` is free and holds it until the guard drops.
    ///
    /// Dropping the returned future before it resolves also gives the slot
    /// back, so cancelled requests leave nothing behind in the map.
    pub async fn acquire(&self, room_id: &str) -> RoomGuard {
        let sweep = Sweep {
            room_id: room_id.to_string(),
            slots: Arc::clone(&self.slots),
        };
        let slot = lock(&self.slots)
            .entry(room_id.to_string())
            .or_default()
            .clone();
        // The pending lock future owns `slot` and drops before `sweep` does.
        let guard = slot.lock_owned().await;
        trace!(room_id, "Room lock acquired");

        RoomGuard {
            _guard: guard,
            _sweep: sweep,
        }
    }

    /// Rooms with a holder or a waiter.
    pub fn tracked(&self) -> usize {
        lock(&self.slots).len()
    }
}

/// Holds a room until dropped. Fields drop in order, so the slot is
/// released before the sweep looks at it.
pub struct RoomGuard {
    _guard: OwnedMutexGuard<()>,
    _sweep: Sweep,
}

/// Removes the room's slot once no holder or waiter references it.
struct Sweep {
    room_id: String,
    slots: Slots,
}

impl Drop for Sweep {
    fn drop(&mut self) {
        let mut slots = lock(&self.slots);
        if slots
            .get(&self.room_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.room_id);
        }
        trace!(room_id = %self.room_id, "Room lock released");
    }
}

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}
