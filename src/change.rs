use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use crate::{EventId, Result, UowError};

/// Translates between an aggregate's raw pending changes and the fields of a
/// stored envelope.
///
/// The forward direction (`read_*`) runs at commit time; `write_change` runs
/// during reconstitution to turn a stored envelope back into whatever shape
/// the aggregate replays. The two directions need not be literal inverses:
/// `write_change` may build a richer representation than the original change,
/// as long as it carries the same information forward.
///
/// A mapper handed a change it does not recognize must fail with
/// [`UowError::UnsupportedChangeType`], never swallow it.
pub trait ChangeMapper: Send + Sync {
    type Change;
    type Event;
    type Metadata;

    /// Extracts the domain event. Succeeds for any change produced by a
    /// conforming aggregate.
    fn read_event(&self, change: &Self::Change) -> Result<Self::Event>;

    /// Extracts optional metadata. `None` is a valid outcome, distinct from
    /// empty metadata.
    fn read_metadata(&self, change: &Self::Change) -> Result<Option<Self::Metadata>>;

    /// The change's caller-supplied event id, if it carries one.
    fn event_id(&self, change: &Self::Change) -> Option<EventId>;

    /// The change's caller-supplied version, if it carries one.
    fn event_version(&self, change: &Self::Change) -> Option<i64>;

    /// When the change occurred. Always present.
    fn read_when(&self, change: &Self::Change) -> DateTime<Utc>;

    /// Builds a change from stored envelope fields for replay.
    fn write_change(
        &self,
        event_id: EventId,
        event: Self::Event,
        when: DateTime<Utc>,
        metadata: Option<Self::Metadata>,
        version: i64,
    ) -> Result<Self::Change>;
}

/// The capability a change type exposes so [`RecordedChangeMapper`] can map
/// it without any bespoke mapper code.
///
/// `event_id` and `version` default to absent; a change overrides them when
/// the aggregate wants to pin identity or position explicitly instead of
/// letting the unit of work derive them.
pub trait RecordedChange: Sized {
    type Event: Clone;
    type Metadata: Clone;

    fn event(&self) -> &Self::Event;

    fn metadata(&self) -> Option<&Self::Metadata> {
        None
    }

    fn event_id(&self) -> Option<EventId> {
        None
    }

    fn version(&self) -> Option<i64> {
        None
    }

    fn when(&self) -> DateTime<Utc>;

    /// Named constructor used when replaying stored history.
    fn from_stored(
        event_id: EventId,
        event: Self::Event,
        when: DateTime<Utc>,
        metadata: Option<Self::Metadata>,
        version: i64,
    ) -> Self;
}

/// A [`ChangeMapper`] for any change type implementing [`RecordedChange`].
pub struct RecordedChangeMapper<C> {
    _marker: PhantomData<fn() -> C>,
}

impl<C> RecordedChangeMapper<C> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<C> Default for RecordedChangeMapper<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ChangeMapper for RecordedChangeMapper<C>
where
    C: RecordedChange + Send + Sync,
{
    type Change = C;
    type Event = C::Event;
    type Metadata = C::Metadata;

    fn read_event(&self, change: &C) -> Result<C::Event> {
        Ok(change.event().clone())
    }

    fn read_metadata(&self, change: &C) -> Result<Option<C::Metadata>> {
        Ok(change.metadata().cloned())
    }

    fn event_id(&self, change: &C) -> Option<EventId> {
        change.event_id()
    }

    fn event_version(&self, change: &C) -> Option<i64> {
        change.version()
    }

    fn read_when(&self, change: &C) -> DateTime<Utc> {
        change.when()
    }

    fn write_change(
        &self,
        event_id: EventId,
        event: C::Event,
        when: DateTime<Utc>,
        metadata: Option<C::Metadata>,
        version: i64,
    ) -> Result<C> {
        Ok(C::from_stored(event_id, event, when, metadata, version))
    }
}

/// Helper for mappers that recognize only part of a change type's surface.
pub fn unsupported_change(change: impl std::fmt::Debug) -> UowError {
    UowError::UnsupportedChangeType {
        change: format!("{change:?}"),
    }
}
