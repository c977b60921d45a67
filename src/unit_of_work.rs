use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    AggregateMapper, ChangeMapper, CommitIdGenerator, Contract, ContractResolver, EventEnvelope,
    EventIdGenerator, EventStore, EventStream, Result, Tracked, TrackedAggregates, UowError,
    UuidGenerator,
};

/// The session-scoped coordinator for event-sourced writes.
///
/// A unit of work tracks aggregate instances touched during one logical unit
/// of business work and, on [`commit`](UnitOfWork::commit), turns their
/// pending changes into ordered envelope batches for the event store. It is
/// built for sequential use by one caller and holds no internal locking
/// beyond the per-aggregate handles.
///
/// Collaborators are injected: the store, the two mappers, the contract
/// resolvers consulted when tagging envelopes, and the id generators (v4
/// uuids unless overridden).
pub struct UnitOfWork<ES, AM, CM>
where
    AM: AggregateMapper,
    CM: ChangeMapper<Change = AM::Change>,
    ES: EventStore<Id = AM::Id, Event = CM::Event, Metadata = CM::Metadata>,
{
    event_store: ES,
    aggregate_mapper: AM,
    change_mapper: CM,
    event_contracts: Box<dyn ContractResolver<CM::Event>>,
    metadata_contracts: Box<dyn ContractResolver<CM::Metadata>>,
    event_ids: Box<dyn EventIdGenerator>,
    commit_ids: Box<dyn CommitIdGenerator>,
    tracked: TrackedAggregates<AM::Id, AM::Aggregate>,
}

impl<ES, AM, CM> UnitOfWork<ES, AM, CM>
where
    AM: AggregateMapper,
    AM::Aggregate: Send,
    CM: ChangeMapper<Change = AM::Change>,
    ES: EventStore<Id = AM::Id, Event = CM::Event, Metadata = CM::Metadata>,
{
    pub fn new(
        event_store: ES,
        aggregate_mapper: AM,
        change_mapper: CM,
        event_contracts: Box<dyn ContractResolver<CM::Event>>,
        metadata_contracts: Box<dyn ContractResolver<CM::Metadata>>,
    ) -> Self {
        Self {
            event_store,
            aggregate_mapper,
            change_mapper,
            event_contracts,
            metadata_contracts,
            event_ids: Box::new(UuidGenerator),
            commit_ids: Box::new(UuidGenerator),
            tracked: TrackedAggregates::new(),
        }
    }

    pub fn with_event_id_generator(mut self, generator: Box<dyn EventIdGenerator>) -> Self {
        self.event_ids = generator;
        self
    }

    pub fn with_commit_id_generator(mut self, generator: Box<dyn CommitIdGenerator>) -> Self {
        self.commit_ids = generator;
        self
    }

    /// Registers an aggregate for this session.
    ///
    /// Fails with [`UowError::AlreadyTracked`] if an instance with the same
    /// (type, id) is already registered.
    pub fn track(
        &mut self,
        aggregate_type: &Contract,
        aggregate_id: AM::Id,
        aggregate: Tracked<AM::Aggregate>,
    ) -> Result<()> {
        self.tracked.track(aggregate_type, aggregate_id, aggregate)
    }

    /// Returns the aggregate for (type, id).
    ///
    /// An identity tracked earlier in the session comes back as the same
    /// in-memory instance, without touching the store. Otherwise the stream
    /// is opened, its history translated back into changes and replayed onto
    /// a blank instance, which is then tracked. A missing or empty stream
    /// yields `Ok(None)`.
    pub async fn get(
        &mut self,
        aggregate_type: &Contract,
        aggregate_id: &AM::Id,
    ) -> Result<Option<Tracked<AM::Aggregate>>> {
        if let Some(tracked) = self.tracked.find(aggregate_type, aggregate_id) {
            return Ok(Some(tracked));
        }

        let stream = match self
            .event_store
            .open_stream(aggregate_type, aggregate_id)
            .await
        {
            Ok(stream) => stream,
            Err(UowError::StreamNotFound { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };

        let envelopes = stream.all().await?;
        if envelopes.is_empty() {
            return Ok(None);
        }

        let mut changes = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            changes.push(self.change_mapper.write_change(
                envelope.event_id,
                envelope.event,
                envelope.when,
                envelope.metadata,
                envelope.version,
            )?);
        }

        let mut aggregate = self
            .aggregate_mapper
            .instantiate_for_reconstitution(aggregate_type)?;
        self.aggregate_mapper.reconstitute(&mut aggregate, changes);

        let tracked = Arc::new(Mutex::new(aggregate));
        self.tracked
            .track(aggregate_type, aggregate_id.clone(), Arc::clone(&tracked))?;

        Ok(Some(tracked))
    }

    /// Persists the pending changes of every tracked aggregate.
    ///
    /// Aggregates are visited group by group in tracking order; each one's
    /// changes become a single ordered batch under a fresh commit id, and are
    /// cleared only once the store accepts the batch. The stream identity
    /// comes from the mapper's `identify`, not from the key the aggregate was
    /// tracked under. The first persist failure aborts the call: earlier
    /// aggregates stay committed, the failing one keeps its changes for a
    /// retry, later ones are not visited.
    pub async fn commit(&self) -> Result<()> {
        for (aggregate_type, entries) in self.tracked.all_groups() {
            for (_, aggregate) in entries {
                self.persist(aggregate_type, aggregate).await?;
            }
        }

        Ok(())
    }

    async fn persist(
        &self,
        aggregate_type: &Contract,
        aggregate: &Tracked<AM::Aggregate>,
    ) -> Result<()> {
        let (aggregate_id, changes, current_version) = {
            let guard = aggregate.lock().await;
            (
                self.aggregate_mapper.identify(&guard),
                self.aggregate_mapper.extract_changes(&guard),
                self.aggregate_mapper.read_version(&guard),
            )
        };

        if changes.is_empty() {
            return Ok(());
        }

        // A never-persisted aggregate lands exactly on the -1 sentinel.
        let initial_version = current_version - changes.len() as i64;

        let mut envelopes = Vec::with_capacity(changes.len());
        let mut derived_version = initial_version;
        for change in &changes {
            derived_version += 1;

            let event_id = self
                .change_mapper
                .event_id(change)
                .unwrap_or_else(|| self.event_ids.generate_event_id());
            let event = self.change_mapper.read_event(change)?;
            let metadata = self.change_mapper.read_metadata(change)?;
            let version = self
                .change_mapper
                .event_version(change)
                .unwrap_or(derived_version);
            let when = self.change_mapper.read_when(change);

            let event_type = self.event_contracts.resolve_from_object(&event);
            let metadata_type = metadata
                .as_ref()
                .map(|m| self.metadata_contracts.resolve_from_object(m));

            envelopes.push(EventEnvelope {
                event_type,
                event_id,
                event,
                version,
                when,
                metadata_type,
                metadata,
            });
        }

        let mut stream = if initial_version == -1 {
            self.event_store
                .create_stream(aggregate_type, &aggregate_id)
                .await?
        } else {
            self.event_store
                .open_stream(aggregate_type, &aggregate_id)
                .await?
        };

        stream.append_all(envelopes);
        stream.commit(self.commit_ids.generate_commit_id()).await?;

        self.aggregate_mapper
            .clear_changes(&mut *aggregate.lock().await);

        Ok(())
    }
}
