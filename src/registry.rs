use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{Contract, Result, UowError};

/// A non-owning handle to a tracked aggregate.
///
/// The caller keeps its own handle to the same instance; the unit of work
/// never clones the aggregate itself, so in-memory changes stay visible to
/// both sides of the session.
pub type Tracked<A> = Arc<Mutex<A>>;

struct TrackedGroup<I, A> {
    aggregate_type: Contract,
    entries: Vec<(I, Tracked<A>)>,
}

/// The session-scoped registry of tracked aggregates.
///
/// Groups entries by aggregate contract and preserves insertion order within
/// each group, so commit iteration is deterministic. At most one instance may
/// be tracked per (type, id); groups are created lazily and never removed for
/// the life of the session.
pub struct TrackedAggregates<I, A> {
    groups: Vec<TrackedGroup<I, A>>,
}

impl<I, A> TrackedAggregates<I, A>
where
    I: Clone + PartialEq + Debug,
{
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Registers an aggregate under (type, id).
    ///
    /// Fails with [`UowError::AlreadyTracked`] if the identity is already
    /// registered for that type.
    pub fn track(
        &mut self,
        aggregate_type: &Contract,
        aggregate_id: I,
        aggregate: Tracked<A>,
    ) -> Result<()> {
        if self.find(aggregate_type, &aggregate_id).is_some() {
            return Err(UowError::AlreadyTracked {
                aggregate_type: aggregate_type.name().to_string(),
                aggregate_id: format!("{aggregate_id:?}"),
            });
        }

        let group = self.prepare_group(aggregate_type);
        group.entries.push((aggregate_id, aggregate));

        Ok(())
    }

    /// Looks up the tracked instance for (type, id), if any.
    pub fn find(&self, aggregate_type: &Contract, aggregate_id: &I) -> Option<Tracked<A>> {
        self.groups
            .iter()
            .find(|group| group.aggregate_type == *aggregate_type)?
            .entries
            .iter()
            .find(|(id, _)| id == aggregate_id)
            .map(|(_, aggregate)| Arc::clone(aggregate))
    }

    /// All groups in first-tracked order, for commit iteration.
    pub fn all_groups(&self) -> impl Iterator<Item = (&Contract, &[(I, Tracked<A>)])> {
        self.groups
            .iter()
            .map(|group| (&group.aggregate_type, group.entries.as_slice()))
    }

    fn prepare_group(&mut self, aggregate_type: &Contract) -> &mut TrackedGroup<I, A> {
        if let Some(position) = self
            .groups
            .iter()
            .position(|group| group.aggregate_type == *aggregate_type)
        {
            return &mut self.groups[position];
        }

        self.groups.push(TrackedGroup {
            aggregate_type: aggregate_type.clone(),
            entries: Vec::new(),
        });

        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }
}

impl<I, A> Default for TrackedAggregates<I, A>
where
    I: Clone + PartialEq + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
