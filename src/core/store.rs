//! In-memory inbox cache for the signed-in user.
//!
//! [`NotificationStore`] is the plain container and is the only code that
//! touches the record collection. [`StoreHandle`] shares one store across the
//! push channel, the reconciliation layer and read-only subscribers.
//! [`ScopedStore`] binds mutations to a session owner so that responses
//! arriving after logout or an identity switch are dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::common::{NotificationId, UserId};
use crate::models::{NotificationPatch, NotificationRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Merged,
    Unchanged,
    /// Unseen id without the fields needed to create a record.
    Incomplete,
}

impl UpsertOutcome {
    pub fn changed(self) -> bool {
        matches!(self, UpsertOutcome::Inserted | UpsertOutcome::Merged)
    }
}

/// Records ordered newest first, at most one per id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NotificationStore {
    records: VecDeque<NotificationRecord>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: NotificationId) -> Option<&NotificationRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_unread()).count()
    }

    fn position(&self, id: NotificationId) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    /// Replaces the collection. For duplicate ids the last supplied record wins.
    pub fn set_all(&mut self, records: Vec<NotificationRecord>) -> bool {
        let mut index: HashMap<NotificationId, usize> = HashMap::with_capacity(records.len());
        let mut deduped: Vec<NotificationRecord> = Vec::with_capacity(records.len());

        for record in records {
            match index.get(&record.id) {
                Some(&slot) => deduped[slot] = record,
                None => {
                    index.insert(record.id, deduped.len());
                    deduped.push(record);
                }
            }
        }
        deduped.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let next: VecDeque<NotificationRecord> = deduped.into();
        if next == self.records {
            return false;
        }
        self.records = next;
        true
    }

    pub fn upsert(&mut self, patch: NotificationPatch) -> UpsertOutcome {
        if let Some(slot) = self.position(patch.id) {
            return if patch.apply_to(&mut self.records[slot]) {
                UpsertOutcome::Merged
            } else {
                UpsertOutcome::Unchanged
            };
        }

        match patch.to_record() {
            Some(record) => {
                self.records.push_front(record);
                UpsertOutcome::Inserted
            }
            None => UpsertOutcome::Incomplete,
        }
    }

    /// Applies a pushed `created` event. A redelivery for a known id refreshes
    /// the record but keeps the local read status.
    pub fn upsert_created(&mut self, record: NotificationRecord) -> UpsertOutcome {
        let mut patch = NotificationPatch::from(record);
        if self.contains(patch.id) {
            patch.is_read = None;
        }
        self.upsert(patch)
    }

    pub fn mark_read_local(&mut self, id: NotificationId) -> bool {
        match self.position(id) {
            Some(slot) if self.records[slot].is_unread() => {
                self.records[slot].is_read = true;
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read_local(&mut self) -> bool {
        let mut changed = false;
        for record in self.records.iter_mut().filter(|record| record.is_unread()) {
            record.is_read = true;
            changed = true;
        }
        changed
    }

    pub fn delete_local(&mut self, id: NotificationId) -> bool {
        match self.position(id) {
            Some(slot) => self.records.remove(slot).is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) -> bool {
        if self.records.is_empty() {
            return false;
        }
        self.records.clear();
        true
    }
}

/// What subscribers see after every state change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreView {
    pub revision: u64,
    pub owner: Option<UserId>,
    pub len: usize,
    pub unread_count: usize,
}

#[derive(Debug, Default)]
struct State {
    owner: Option<UserId>,
    store: NotificationStore,
    revision: u64,
}

impl State {
    fn view(&self) -> StoreView {
        StoreView {
            revision: self.revision,
            owner: self.owner,
            len: self.store.len(),
            unread_count: self.store.unread_count(),
        }
    }
}

struct Shared {
    state: RwLock<State>,
    changes: watch::Sender<StoreView>,
}

#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Shared>,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHandle {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(StoreView::default());
        Self {
            inner: Arc::new(Shared {
                state: RwLock::new(State::default()),
                changes,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one mutation as a single critical section and publishes the new
    /// view when it changed something. `owner` guards against stale sessions.
    ///
    /// The view is published after the state lock is released, so a
    /// subscriber may read the store while holding `borrow()`.
    fn mutate<R>(
        &self,
        owner: Option<UserId>,
        apply: impl FnOnce(&mut State) -> (R, bool),
    ) -> Option<R> {
        let (result, view) = {
            let mut state = self.write();
            if let Some(expected) = owner {
                if state.owner != Some(expected) {
                    tracing::debug!(
                        "dropping store mutation for stale session {expected} (current {:?})",
                        state.owner
                    );
                    return None;
                }
            }

            let (result, changed) = apply(&mut state);
            if changed {
                state.revision += 1;
            }
            (result, changed.then(|| state.view()))
        };

        if let Some(view) = view {
            self.publish(view);
        }
        Some(result)
    }

    /// Concurrent writers may publish out of order; the newest revision wins.
    fn publish(&self, view: StoreView) {
        self.inner.changes.send_if_modified(|current| {
            if view.revision > current.revision {
                *current = view;
                true
            } else {
                false
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreView> {
        self.inner.changes.subscribe()
    }

    pub fn view(&self) -> StoreView {
        self.read().view()
    }

    pub fn owner(&self) -> Option<UserId> {
        self.read().owner
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.read().store.records().cloned().collect()
    }

    pub fn get(&self, id: NotificationId) -> Option<NotificationRecord> {
        self.read().store.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().store.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.read().store.unread_count()
    }

    /// Starts a fresh, empty inbox owned by `user`.
    pub fn begin_session(&self, user: UserId) {
        self.mutate(None, |state| {
            let changed = state.owner != Some(user) || !state.store.is_empty();
            state.owner = Some(user);
            state.store.clear();
            ((), changed)
        });
    }

    /// Drops every record and the session owner. Used on logout.
    pub fn clear(&self) {
        self.mutate(None, |state| {
            let changed = state.owner.is_some() || !state.store.is_empty();
            state.owner = None;
            state.store.clear();
            ((), changed)
        });
    }

    pub fn scoped(&self, owner: UserId) -> ScopedStore {
        ScopedStore {
            handle: self.clone(),
            owner,
        }
    }

    pub fn set_all(&self, records: Vec<NotificationRecord>) -> bool {
        self.mutate(None, |state| flag(state.store.set_all(records)))
            .unwrap_or(false)
    }

    pub fn upsert(&self, patch: NotificationPatch) -> UpsertOutcome {
        self.mutate(None, |state| upsert(state, patch))
            .unwrap_or(UpsertOutcome::Unchanged)
    }

    pub fn mark_read_local(&self, id: NotificationId) -> bool {
        self.mutate(None, |state| flag(state.store.mark_read_local(id)))
            .unwrap_or(false)
    }

    pub fn mark_all_read_local(&self) -> bool {
        self.mutate(None, |state| flag(state.store.mark_all_read_local()))
            .unwrap_or(false)
    }

    pub fn delete_local(&self, id: NotificationId) -> bool {
        self.mutate(None, |state| flag(state.store.delete_local(id)))
            .unwrap_or(false)
    }
}

fn flag(changed: bool) -> (bool, bool) {
    (changed, changed)
}

fn upsert_created(state: &mut State, record: NotificationRecord) -> (UpsertOutcome, bool) {
    let outcome = state.store.upsert_created(record);
    (outcome, outcome.changed())
}

fn upsert(state: &mut State, patch: NotificationPatch) -> (UpsertOutcome, bool) {
    let id = patch.id;
    let outcome = state.store.upsert(patch);
    if outcome == UpsertOutcome::Incomplete {
        tracing::warn!("dropping update for unknown notification {id}: missing message or createdAt");
    }
    (outcome, outcome.changed())
}

/// Mutation surface bound to one session owner. Every call is a no-op once
/// the store belongs to someone else or nobody.
#[derive(Clone)]
pub struct ScopedStore {
    handle: StoreHandle,
    owner: UserId,
}

impl ScopedStore {
    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn is_current(&self) -> bool {
        self.handle.owner() == Some(self.owner)
    }

    pub fn set_all(&self, records: Vec<NotificationRecord>) -> Option<bool> {
        self.handle
            .mutate(Some(self.owner), |state| flag(state.store.set_all(records)))
    }

    pub fn upsert(&self, patch: NotificationPatch) -> Option<UpsertOutcome> {
        self.handle.mutate(Some(self.owner), |state| upsert(state, patch))
    }

    pub fn upsert_created(&self, record: NotificationRecord) -> Option<UpsertOutcome> {
        self.handle
            .mutate(Some(self.owner), |state| upsert_created(state, record))
    }

    pub fn mark_read_local(&self, id: NotificationId) -> Option<bool> {
        self.handle
            .mutate(Some(self.owner), |state| flag(state.store.mark_read_local(id)))
    }

    pub fn mark_all_read_local(&self) -> Option<bool> {
        self.handle
            .mutate(Some(self.owner), |state| flag(state.store.mark_all_read_local()))
    }

    pub fn delete_local(&self, id: NotificationId) -> Option<bool> {
        self.handle
            .mutate(Some(self.owner), |state| flag(state.store.delete_local(id)))
    }

    /// Empties the inbox but keeps the session open.
    pub fn clear(&self) -> Option<bool> {
        self.handle
            .mutate(Some(self.owner), |state| flag(state.store.clear()))
    }
}
