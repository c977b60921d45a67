use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity of a single stored event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity of one committed batch of events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(Uuid);

impl CommitId {
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supplies event ids for changes that do not carry their own.
///
/// Every call must return a fresh, globally unique value.
pub trait EventIdGenerator: Send + Sync {
    fn generate_event_id(&self) -> EventId;
}

/// Supplies one commit id per committed batch.
pub trait CommitIdGenerator: Send + Sync {
    fn generate_commit_id(&self) -> CommitId;
}

/// Random v4 uuid generation, the default for both id kinds.
pub struct UuidGenerator;

impl EventIdGenerator for UuidGenerator {
    fn generate_event_id(&self) -> EventId {
        EventId(Uuid::new_v4())
    }
}

impl CommitIdGenerator for UuidGenerator {
    fn generate_commit_id(&self) -> CommitId {
        CommitId(Uuid::new_v4())
    }
}
