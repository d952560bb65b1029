// Record storage for the client-side stores
// Ordered, in-memory collections with shallow-merge updates

//! # Record Storage
//!
//! [`RecordStore`] is the building block behind [`AgentStore`] and
//! [`WorkflowStore`]. It keeps records in insertion order and exposes the
//! small contract every store shares:
//!
//! - `add` appends without checking ids (callers generate collision-resistant ids)
//! - `update` shallow-merges a [`Patch`] into every record with the id, and
//!   is a no-op when the id is absent
//! - `delete` removes every record with the id, and is a no-op when absent
//!
//! All operations are total: nothing here can fail.
//!
//! ## Revisions
//!
//! Every state change bumps a monotonic revision counter. A caller that
//! fetches a fresh list from the backend records the revision first and
//! hands it back to [`RecordStore::apply_fetched`]; if the store changed in
//! the meantime the stale list is dropped instead of overwriting newer local
//! state.
//!
//! ## Rust Learning Notes:
//!
//! ### Generic Structs with Trait Bounds
//! `RecordStore<T: Record>` works for any record type that can report its id.
//! The [`Patch`] trait is generic over the record it applies to, so
//! `AgentPatch` can only ever be applied to an `Agent`.
//!
//! [`AgentStore`]: super::AgentStore
//! [`WorkflowStore`]: super::WorkflowStore

use chrono::{DateTime, Utc};

use crate::models::{Agent, AgentPatch, Workflow, WorkflowPatch};

/// A record addressable by an opaque string id
pub trait Record: Clone {
    fn id(&self) -> &str;
}

/// A partial update for records of type `T`
///
/// Implementations replace only the fields they carry and must stamp the
/// record's update time with `now`.
pub trait Patch<T> {
    fn apply_to(self, target: &mut T, now: DateTime<Utc>);
}

impl Record for Agent {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Workflow {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Patch<Agent> for AgentPatch {
    fn apply_to(self, target: &mut Agent, now: DateTime<Utc>) {
        self.apply(target, now);
    }
}

impl Patch<Workflow> for WorkflowPatch {
    fn apply_to(self, target: &mut Workflow, now: DateTime<Utc>) {
        self.apply(target, now);
    }
}

/// Ordered in-memory record collection
#[derive(Debug, Clone)]
pub struct RecordStore<T> {
    records: Vec<T>,
    revision: u64,
}

impl<T> Default for RecordStore<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            revision: 0,
        }
    }
}

impl<T: Record> RecordStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order
    pub fn list(&self) -> &[T] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record with the given id
    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Monotonic counter of state changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a record
    pub fn add(&mut self, record: T) {
        self.records.push(record);
        self.bump();
    }

    /// Shallow-merge `patch` into the record(s) with `id`
    ///
    /// Returns whether anything was updated.
    pub fn update<P>(&mut self, id: &str, patch: P) -> bool
    where
        P: Patch<T> + Clone,
    {
        self.update_at(id, patch, Utc::now())
    }

    pub(crate) fn update_at<P>(&mut self, id: &str, patch: P, now: DateTime<Utc>) -> bool
    where
        P: Patch<T> + Clone,
    {
        let mut updated = false;
        for record in self.records.iter_mut().filter(|record| record.id() == id) {
            patch.clone().apply_to(record, now);
            updated = true;
        }
        if updated {
            self.bump();
        }
        updated
    }

    /// Run `change` on the record(s) with `id`; returns whether any matched
    pub(crate) fn modify<F>(&mut self, id: &str, mut change: F) -> bool
    where
        F: FnMut(&mut T),
    {
        let mut matched = false;
        for record in self.records.iter_mut().filter(|record| record.id() == id) {
            change(record);
            matched = true;
        }
        if matched {
            self.bump();
        }
        matched
    }

    /// Remove the record(s) with `id`; returns whether anything was removed
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id() != id);
        let removed = self.records.len() != before;
        if removed {
            self.bump();
        }
        removed
    }

    /// Replace the whole collection
    pub fn replace_all(&mut self, records: Vec<T>) {
        self.records = records;
        self.bump();
    }

    /// Replace the collection with a fetched list unless the store changed
    /// after `revision_at_request` was read
    pub fn apply_fetched(&mut self, revision_at_request: u64, records: Vec<T>) -> bool {
        if self.revision != revision_at_request {
            tracing::debug!(
                requested_at = revision_at_request,
                current = self.revision,
                "dropping stale fetched records"
            );
            return false;
        }
        self.replace_all(records);
        true
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
