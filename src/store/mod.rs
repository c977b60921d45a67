use async_trait::async_trait;

use crate::{CommitId, Contract, EventEnvelope, Result};

pub mod memory;

pub use memory::{CommitRecord, MemoryEventStore, MemoryStream};

/// The append-only persistence backend consumed by the unit of work.
///
/// The store owns physical storage, serialization and the optimistic
/// concurrency check; this crate only decides between creating and opening a
/// stream and passes the envelopes through.
#[async_trait]
pub trait EventStore: Send + Sync {
    type Id: Send + Sync;
    type Event: Send;
    type Metadata: Send;
    type Stream: EventStream<Event = Self::Event, Metadata = Self::Metadata> + Send;

    /// Starts a new stream for an identity. Fails if one already exists.
    async fn create_stream(
        &self,
        aggregate_type: &Contract,
        aggregate_id: &Self::Id,
    ) -> Result<Self::Stream>;

    /// Opens the existing stream for an identity. Fails with
    /// [`crate::UowError::StreamNotFound`] if none exists.
    async fn open_stream(
        &self,
        aggregate_type: &Contract,
        aggregate_id: &Self::Id,
    ) -> Result<Self::Stream>;
}

/// One aggregate's ordered, append-only event stream.
#[async_trait]
pub trait EventStream: Send {
    type Event: Send;
    type Metadata: Send;

    /// Buffers envelopes for the pending commit, preserving their order.
    fn append_all(&mut self, envelopes: Vec<EventEnvelope<Self::Event, Self::Metadata>>);

    /// Durably persists the buffered envelopes as one batch.
    ///
    /// The stream's persisted version immediately before the batch must match
    /// the batch's expected base version; a mismatch fails with
    /// [`crate::UowError::Concurrency`] and persists nothing.
    async fn commit(&mut self, commit_id: CommitId) -> Result<()>;

    /// The full persisted history, in version order.
    async fn all(&self) -> Result<Vec<EventEnvelope<Self::Event, Self::Metadata>>>;
}
