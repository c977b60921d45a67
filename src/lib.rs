//! # uow-es
//!
//! A minimal unit-of-work layer for event-sourced aggregates.
//!
//! The crate coordinates the write side of an event-sourced system: it tracks
//! aggregate instances touched during a session, extracts their pending
//! changes, assigns stream positions and commits them as ordered batches to
//! an append-only event store, relying on the store's optimistic-concurrency
//! check for conflict detection.
//!
//! The moving parts:
//!
//! - [`UnitOfWork`] - the session coordinator: `track`, `get`, `commit`.
//! - [`AggregateMapper`] / [`ChangeMapper`] - the two seams that keep the
//!   coordinator agnostic of concrete aggregate and change types. Implement
//!   them directly, or implement the capability traits
//!   [`EventSourcedAggregate`] and [`RecordedChange`] and use the provided
//!   [`EventSourcedAggregateMapper`] and [`RecordedChangeMapper`].
//! - [`EventStore`] / [`EventStream`] - the consumed persistence boundary.
//!   [`MemoryEventStore`] is an in-memory implementation for tests and demos.
//! - [`Contract`] and [`ContractResolver`] - stable logical type names for
//!   stored payloads.
//! - [`EventId`] / [`CommitId`] generation behind [`EventIdGenerator`] and
//!   [`CommitIdGenerator`].
//!
//! Versions are gap-free per aggregate: a batch of N changes on an aggregate
//! at version V lands at versions V-N+1 ..= V, and an aggregate that was
//! never persisted (initial version -1) gets a freshly created stream
//! starting at version 0.

pub mod aggregate;
pub mod change;
pub mod contract;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod registry;
pub mod store;
pub mod unit_of_work;

pub use aggregate::{AggregateMapper, EventSourcedAggregate, EventSourcedAggregateMapper};
pub use change::{ChangeMapper, RecordedChange, RecordedChangeMapper, unsupported_change};
pub use contract::{Contract, ContractResolver, TypeNameResolver};
pub use envelope::EventEnvelope;
pub use error::{Result, UowError};
pub use identity::{CommitId, CommitIdGenerator, EventId, EventIdGenerator, UuidGenerator};
pub use registry::{Tracked, TrackedAggregates};
pub use store::{CommitRecord, EventStore, EventStream, MemoryEventStore, MemoryStream};
pub use unit_of_work::UnitOfWork;
