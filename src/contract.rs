use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A stable logical type name.
///
/// Contracts tag aggregates, events and metadata in storage so that persisted
/// data stays readable after code moves around. A contract is immutable once
/// constructed and compares by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contract {
    name: String,
}

impl Contract {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Contract {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resolves a runtime value to the logical type name it is stored under.
///
/// The unit of work consults a resolver when building envelopes, once for the
/// event payload and once for the optional metadata payload.
pub trait ContractResolver<T>: Send + Sync {
    fn resolve_from_object(&self, value: &T) -> Contract;
}

/// A resolver that uses the Rust type path as the contract name, the closest
/// analog to storing a fully-qualified class name.
///
/// Note that for enum payloads this resolves the enum type, not the variant;
/// implement [`ContractResolver`] directly when per-variant names are wanted.
pub struct TypeNameResolver;

impl<T> ContractResolver<T> for TypeNameResolver {
    fn resolve_from_object(&self, _value: &T) -> Contract {
        Contract::new(std::any::type_name::<T>())
    }
}
