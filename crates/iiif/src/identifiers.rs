//! Correlation identifiers.
//!
//! Request parameters in this crate are deliberately plain strings: the adapter
//! trusts whatever the caller supplies. The only identity the adapter creates
//! itself is the [`CallId`] that ties together every tracing event emitted
//! during one outbound call.

use uuid::Uuid;

/// Identifies a single adapter call (one outbound HTTP request).
///
/// Generated fresh for every [`crate::IiifAdapter::call`] and recorded on the
/// `iiif_call` span so all activity from a single call can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    /// Generates a new random call identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`CallId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
