use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Contract, EventId};

/// The unit of storage: one event payload together with everything the store
/// needs to file it.
///
/// Envelopes are built by the unit of work at commit time, one per pending
/// change, and are never mutated after construction. `version` is the event's
/// position in its aggregate's stream; versions within one committed batch
/// are strictly increasing and gap-free.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E, M> {
    /// The logical type of the event payload.
    pub event_type: Contract,

    /// The identity of this event.
    pub event_id: EventId,

    /// The domain event itself.
    pub event: E,

    /// The event's position in the aggregate's stream, starting at 0.
    pub version: i64,

    /// When the change occurred in the domain.
    pub when: DateTime<Utc>,

    /// The logical type of the metadata payload, if any.
    pub metadata_type: Option<Contract>,

    /// Optional metadata recorded alongside the event.
    pub metadata: Option<M>,
}
