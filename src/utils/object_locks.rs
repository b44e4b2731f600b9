//! Keyed mutual exclusion for read-diff-write sequences on one
//! `(object_id, tag_group_id)` pair.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Key = (String, i64);

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Tasks holding or queued on `mutex`
    users: usize,
}

type Slots = Arc<Mutex<HashMap<Key, Slot>>>;

#[derive(Clone, Default)]
pub struct ObjectLocks {
    slots: Slots,
}

/// One task's claim on a slot, from the moment it queues. Dropping it,
/// whether after holding the lock or while still waiting, gives the claim
/// back and forgets the key once no claims are left.
struct Registration {
    key: Key,
    slots: Slots,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Held for the duration of one object's update.
pub struct ObjectGuard {
    // Fields drop in order: the lock is released before the claim.
    _held: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl ObjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel safe: a caller dropped while queued leaves no entry behind.
    pub async fn acquire(&self, object_id: &str, tag_group_id: i64) -> ObjectGuard {
        let key = (object_id.to_string(), tag_group_id);
        let (mutex, registration) = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            (
                slot.mutex.clone(),
                Registration {
                    key,
                    slots: self.slots.clone(),
                },
            )
        };

        let held = mutex.lock_owned().await;

        ObjectGuard {
            _held: held,
            _registration: registration,
        }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
