use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{CommitId, Contract, EventEnvelope, Result, UowError};
use crate::store::{EventStore, EventStream};

/// One committed batch, as seen by the store.
#[derive(Clone, Debug)]
pub struct CommitRecord<I> {
    pub commit_id: CommitId,
    pub aggregate_type: Contract,
    pub aggregate_id: I,
    /// The stream version the batch expected to land on.
    pub expected_version: i64,
    pub events: usize,
    /// Whether the batch arrived through a freshly created stream.
    pub created: bool,
}

struct State<I, E, M> {
    streams: HashMap<(String, I), Vec<EventEnvelope<E, M>>>,
    journal: Vec<CommitRecord<I>>,
}

/// An in-memory event store for tests and demos.
///
/// Clones share the same storage, so one instance can back several sessions.
/// Optimistic concurrency is enforced at commit time: the batch's expected
/// base version (first envelope version minus one) must equal the stream's
/// last persisted version.
pub struct MemoryEventStore<I, E, M> {
    state: Arc<RwLock<State<I, E, M>>>,
}

impl<I, E, M> MemoryEventStore<I, E, M>
where
    I: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                streams: HashMap::new(),
                journal: Vec::new(),
            })),
        }
    }

    /// Every commit accepted so far, in arrival order.
    pub async fn journal(&self) -> Vec<CommitRecord<I>> {
        self.state.read().await.journal.clone()
    }

    /// The persisted history for one identity, empty if no stream exists.
    pub async fn history(
        &self,
        aggregate_type: &Contract,
        aggregate_id: &I,
    ) -> Vec<EventEnvelope<E, M>>
    where
        E: Clone,
        M: Clone,
    {
        let key = (aggregate_type.name().to_string(), aggregate_id.clone());
        self.state
            .read()
            .await
            .streams
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }
}

impl<I, E, M> Default for MemoryEventStore<I, E, M>
where
    I: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, E, M> Clone for MemoryEventStore<I, E, M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl<I, E, M> EventStore for MemoryEventStore<I, E, M>
where
    I: Clone + Eq + Hash + std::fmt::Debug + Send + Sync,
    E: Clone + Send + Sync,
    M: Clone + Send + Sync,
{
    type Id = I;
    type Event = E;
    type Metadata = M;
    type Stream = MemoryStream<I, E, M>;

    async fn create_stream(&self, aggregate_type: &Contract, aggregate_id: &I) -> Result<Self::Stream> {
        let key = (aggregate_type.name().to_string(), aggregate_id.clone());
        let state = self.state.read().await;

        if let Some(existing) = state.streams.get(&key) {
            let actual = existing.last().map(|e| e.version).unwrap_or(-1);
            return Err(UowError::Concurrency {
                aggregate_type: aggregate_type.name().to_string(),
                aggregate_id: format!("{aggregate_id:?}"),
                expected: -1,
                actual,
            });
        }

        Ok(MemoryStream {
            state: Arc::clone(&self.state),
            aggregate_type: aggregate_type.clone(),
            aggregate_id: aggregate_id.clone(),
            buffered: Vec::new(),
            creates: true,
        })
    }

    async fn open_stream(&self, aggregate_type: &Contract, aggregate_id: &I) -> Result<Self::Stream> {
        let key = (aggregate_type.name().to_string(), aggregate_id.clone());
        let state = self.state.read().await;

        if !state.streams.contains_key(&key) {
            return Err(UowError::StreamNotFound {
                aggregate_type: aggregate_type.name().to_string(),
                aggregate_id: format!("{aggregate_id:?}"),
            });
        }

        Ok(MemoryStream {
            state: Arc::clone(&self.state),
            aggregate_type: aggregate_type.clone(),
            aggregate_id: aggregate_id.clone(),
            buffered: Vec::new(),
            creates: false,
        })
    }
}

/// A stream handle over [`MemoryEventStore`] storage.
pub struct MemoryStream<I, E, M> {
    state: Arc<RwLock<State<I, E, M>>>,
    aggregate_type: Contract,
    aggregate_id: I,
    buffered: Vec<EventEnvelope<E, M>>,
    creates: bool,
}

#[async_trait]
impl<I, E, M> EventStream for MemoryStream<I, E, M>
where
    I: Clone + Eq + Hash + std::fmt::Debug + Send + Sync,
    E: Clone + Send + Sync,
    M: Clone + Send + Sync,
{
    type Event = E;
    type Metadata = M;

    fn append_all(&mut self, envelopes: Vec<EventEnvelope<E, M>>) {
        self.buffered.extend(envelopes);
    }

    async fn commit(&mut self, commit_id: CommitId) -> Result<()> {
        if self.buffered.is_empty() {
            return Ok(());
        }

        let expected_version = self.buffered[0].version - 1;
        let key = (
            self.aggregate_type.name().to_string(),
            self.aggregate_id.clone(),
        );

        let mut state = self.state.write().await;
        let actual = state
            .streams
            .get(&key)
            .and_then(|stream| stream.last())
            .map(|e| e.version)
            .unwrap_or(-1);

        if actual != expected_version {
            return Err(UowError::Concurrency {
                aggregate_type: self.aggregate_type.name().to_string(),
                aggregate_id: format!("{:?}", self.aggregate_id),
                expected: expected_version,
                actual,
            });
        }

        let events = self.buffered.len();
        let stream = state.streams.entry(key).or_default();
        stream.append(&mut self.buffered);
        state.journal.push(CommitRecord {
            commit_id,
            aggregate_type: self.aggregate_type.clone(),
            aggregate_id: self.aggregate_id.clone(),
            expected_version,
            events,
            created: self.creates,
        });

        Ok(())
    }

    async fn all(&self) -> Result<Vec<EventEnvelope<E, M>>> {
        let key = (
            self.aggregate_type.name().to_string(),
            self.aggregate_id.clone(),
        );
        let state = self.state.read().await;

        Ok(state.streams.get(&key).cloned().unwrap_or_default())
    }
}
