use std::fmt::Debug;
use std::marker::PhantomData;

use crate::{Contract, Result, UowError};

/// The capability set the unit of work needs from an aggregate
/// implementation.
///
/// The unit of work depends only on this trait; how the operations are
/// realized (an explicit interface on the aggregate, a hand-written adapter
/// around a foreign type, a test double) is the implementer's choice. The
/// crate ships [`EventSourcedAggregateMapper`] for aggregates that implement
/// [`EventSourcedAggregate`] themselves.
pub trait AggregateMapper: Send + Sync {
    type Aggregate;
    type Change;
    type Id: Clone + PartialEq + Debug + Send + Sync;

    /// The aggregate's stable identity.
    fn identify(&self, aggregate: &Self::Aggregate) -> Self::Id;

    /// The current version, counting all changes already applied in memory.
    /// A never-persisted aggregate with no changes sits at -1.
    fn read_version(&self, aggregate: &Self::Aggregate) -> i64;

    /// All changes accumulated since the last clear, in application order.
    /// Does not mutate the aggregate.
    fn extract_changes(&self, aggregate: &Self::Aggregate) -> Vec<Self::Change>;

    /// Drops the pending-change queue after a successful commit. Idempotent
    /// on an empty queue.
    fn clear_changes(&self, aggregate: &mut Self::Aggregate);

    /// Produces a blank instance ready to receive replayed history,
    /// bypassing normal construction invariants.
    fn instantiate_for_reconstitution(&self, aggregate_type: &Contract)
    -> Result<Self::Aggregate>;

    /// Replays stored changes onto a blank instance. Afterwards the aggregate
    /// holds the replayed state, its version equals the last replayed
    /// change's version, and its pending-change queue is empty.
    fn reconstitute(&self, aggregate: &mut Self::Aggregate, changes: Vec<Self::Change>);
}

/// The explicit interface an aggregate implements to be mapped by
/// [`EventSourcedAggregateMapper`].
pub trait EventSourcedAggregate {
    type Id: Clone + PartialEq + Debug + Send + Sync;
    type Change: Clone;

    fn aggregate_id(&self) -> Self::Id;

    /// Current version including in-memory changes; -1 before the first
    /// change.
    fn aggregate_version(&self) -> i64;

    fn pending_changes(&self) -> &[Self::Change];

    fn clear_pending_changes(&mut self);

    /// A blank instance for replay, free of business-rule validation.
    fn for_reconstitution() -> Self;

    fn reconstitute(&mut self, changes: Vec<Self::Change>);
}

/// Maps any [`EventSourcedAggregate`] onto the [`AggregateMapper`] contract.
///
/// Carries the contract it supports and refuses to instantiate for any other,
/// so a miswired unit of work fails loudly instead of reconstituting the
/// wrong type.
pub struct EventSourcedAggregateMapper<A> {
    supported: Contract,
    _marker: PhantomData<fn() -> A>,
}

impl<A> EventSourcedAggregateMapper<A> {
    pub fn new(supported: Contract) -> Self {
        Self {
            supported,
            _marker: PhantomData,
        }
    }

    pub fn supported_contract(&self) -> &Contract {
        &self.supported
    }
}

impl<A> AggregateMapper for EventSourcedAggregateMapper<A>
where
    A: EventSourcedAggregate + Send + Sync,
{
    type Aggregate = A;
    type Change = A::Change;
    type Id = A::Id;

    fn identify(&self, aggregate: &A) -> A::Id {
        aggregate.aggregate_id()
    }

    fn read_version(&self, aggregate: &A) -> i64 {
        aggregate.aggregate_version()
    }

    fn extract_changes(&self, aggregate: &A) -> Vec<A::Change> {
        aggregate.pending_changes().to_vec()
    }

    fn clear_changes(&self, aggregate: &mut A) {
        aggregate.clear_pending_changes();
    }

    fn instantiate_for_reconstitution(&self, aggregate_type: &Contract) -> Result<A> {
        if *aggregate_type != self.supported {
            return Err(UowError::UnsupportedAggregateType {
                expected: self.supported.name().to_string(),
                actual: aggregate_type.name().to_string(),
            });
        }

        Ok(A::for_reconstitution())
    }

    fn reconstitute(&self, aggregate: &mut A, changes: Vec<A::Change>) {
        aggregate.reconstitute(changes);
    }
}
