use super::optimistic::Mirror;
use crate::domain::{Guide, Profile, Thread};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// In-memory copy of everything fetched from the remote store.
///
/// An opened thread or guide is looked up by id from these mirrors, so there
/// is no second copy that a rollback could miss.
#[derive(Debug, Default)]
pub struct ClientState {
    pub guides: Mirror<Guide>,
    pub threads: Mirror<Thread>,
    pub profiles: HashMap<Uuid, Profile>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<Mutex<ClientState>>);

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state. Guards must be dropped before any `.await`.
    pub fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
