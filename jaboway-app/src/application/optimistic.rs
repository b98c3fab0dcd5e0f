//! Versioned client mirror and the apply-then-confirm write discipline.
//!
//! Every entity in a [`Mirror`] carries a version stamp that changes on each
//! local mutation. A staged mutation remembers the value and version it
//! replaced; when its remote write fails, the old value is put back only if
//! the entity still carries the staged version. Anything newer is left alone.

use super::state::{ClientState, SharedState};
use crate::domain::{Guide, Thread};
use crate::infrastructure::remote::RemoteError;
use jaboway_errors::AppError;
use std::future::Future;
use uuid::Uuid;

pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Thread {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Guide {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Entities that live in a mirror of the shared client state.
pub trait Mirrored: Keyed + Clone + Sized {
    const KIND: &'static str;

    fn mirror(state: &mut ClientState) -> &mut Mirror<Self>;
}

impl Mirrored for Thread {
    const KIND: &'static str = "thread";

    fn mirror(state: &mut ClientState) -> &mut Mirror<Self> {
        &mut state.threads
    }
}

impl Mirrored for Guide {
    const KIND: &'static str = "guide";

    fn mirror(state: &mut ClientState) -> &mut Mirror<Self> {
        &mut state.guides
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    version: u64,
}

/// Ordered, versioned copy of one remote collection.
#[derive(Debug, Clone)]
pub struct Mirror<T> {
    entries: Vec<Entry<T>>,
    next_version: u64,
}

impl<T> Default for Mirror<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_version: 1,
        }
    }
}

/// What a failed optimistic write needs to undo itself.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    key: Uuid,
    previous: T,
    version: u64,
    previous_version: u64,
}

impl<T> Snapshot<T> {
    pub fn key(&self) -> Uuid {
        self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revert {
    Restored,
    /// A newer local change or a reload replaced the staged state.
    Superseded,
    /// The entity is gone from the mirror.
    Vanished,
}

impl<T: Keyed + Clone> Mirror<T> {
    fn bump(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }

    fn position(&self, key: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.value.key() == key)
    }

    /// Replaces the whole collection, as after a fresh fetch.
    pub fn replace_all(&mut self, items: Vec<T>) {
        let entries = items
            .into_iter()
            .map(|value| Entry {
                value,
                version: self.bump(),
            })
            .collect();
        self.entries = entries;
    }

    pub fn get(&self, key: Uuid) -> Option<&T> {
        self.entries
            .iter()
            .find(|e| e.value.key() == key)
            .map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn prepend(&mut self, value: T) {
        let version = self.bump();
        self.entries.insert(0, Entry { value, version });
    }

    /// Applies a confirmed change.
    pub fn update<R>(&mut self, key: Uuid, apply: impl FnOnce(&mut T) -> R) -> Option<R> {
        let version = self.bump();
        let entry = self.entries.iter_mut().find(|e| e.value.key() == key)?;
        entry.version = version;
        Some(apply(&mut entry.value))
    }

    pub fn remove(&mut self, key: Uuid) -> Option<T> {
        let index = self.position(key)?;
        Some(self.entries.remove(index).value)
    }

    /// Applies an unconfirmed change and returns how to undo it.
    pub fn stage<R>(
        &mut self,
        key: Uuid,
        apply: impl FnOnce(&mut T) -> R,
    ) -> Option<(Snapshot<T>, R)> {
        let index = self.position(key)?;
        let version = self.bump();
        let entry = &mut self.entries[index];
        let snapshot = Snapshot {
            key,
            previous: entry.value.clone(),
            version,
            previous_version: entry.version,
        };
        entry.version = version;
        let result = apply(&mut entry.value);
        Some((snapshot, result))
    }

    pub fn revert(&mut self, snapshot: Snapshot<T>) -> Revert {
        let Some(index) = self.position(snapshot.key) else {
            return Revert::Vanished;
        };
        let entry = &mut self.entries[index];
        if entry.version != snapshot.version {
            return Revert::Superseded;
        }
        entry.value = snapshot.previous;
        entry.version = snapshot.previous_version;
        Revert::Restored
    }
}

/// Awaits the remote write for a staged mutation and undoes the mutation
/// if the write fails. The state lock is never held across the await.
pub async fn confirm<T, Fut, V>(
    state: &SharedState,
    snapshot: Snapshot<T>,
    write: Fut,
) -> Result<V, AppError>
where
    T: Mirrored,
    Fut: Future<Output = Result<V, RemoteError>>,
{
    match write.await {
        Ok(value) => Ok(value),
        Err(err) => {
            let key = snapshot.key();
            let outcome = {
                let mut guard = state.lock();
                T::mirror(&mut guard).revert(snapshot)
            };
            match outcome {
                Revert::Restored => {
                    tracing::warn!(kind = T::KIND, %key, error = %err, "remote write failed, local change reverted");
                }
                Revert::Superseded => {
                    tracing::warn!(kind = T::KIND, %key, error = %err, "remote write failed, newer local state kept");
                }
                Revert::Vanished => {
                    tracing::warn!(kind = T::KIND, %key, error = %err, "remote write failed for an entity no longer mirrored");
                }
            }
            Err(err.into())
        }
    }
}
