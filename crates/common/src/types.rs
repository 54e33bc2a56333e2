//! Common identifier types for group call components.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of entity a peer identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerNamespace {
    /// A single user account.
    User,
    /// A basic group chat.
    Group,
    /// A channel or supergroup.
    Channel,
}

impl PeerNamespace {
    /// Returns the namespace as a string for log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PeerNamespace::User => "user",
            PeerNamespace::Group => "group",
            PeerNamespace::Channel => "channel",
        }
    }
}

/// Identifier for a call member (user, group or channel acting as speaker).
///
/// The numeric id is only unique within its namespace, so ordering and
/// equality take both into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId {
    /// Namespace the numeric id belongs to.
    pub namespace: PeerNamespace,
    /// Numeric id within the namespace.
    pub id: i64,
}

impl PeerId {
    /// Create a user peer id.
    #[must_use]
    pub const fn user(id: i64) -> Self {
        Self {
            namespace: PeerNamespace::User,
            id,
        }
    }

    /// Create a group peer id.
    #[must_use]
    pub const fn group(id: i64) -> Self {
        Self {
            namespace: PeerNamespace::Group,
            id,
        }
    }

    /// Create a channel peer id.
    #[must_use]
    pub const fn channel(id: i64) -> Self {
        Self {
            namespace: PeerNamespace::Channel,
            id,
        }
    }

    /// Numeric id as handed to the media engine.
    #[must_use]
    pub const fn numeric_id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_str(), self.id)
    }
}

/// Unique identifier for one local call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_display() {
        assert_eq!(PeerId::user(7).to_string(), "user:7");
        assert_eq!(PeerId::channel(-100).to_string(), "channel:-100");
    }

    #[test]
    fn test_peer_id_namespaces_are_distinct() {
        assert_ne!(PeerId::user(5), PeerId::group(5));
        assert_eq!(PeerId::user(5).numeric_id(), PeerId::group(5).numeric_id());
    }

    #[test]
    fn test_peer_id_ordering_groups_by_namespace() {
        let mut ids = vec![PeerId::channel(1), PeerId::user(9), PeerId::user(2)];
        ids.sort();
        assert_eq!(ids, vec![PeerId::user(2), PeerId::user(9), PeerId::channel(1)]);
    }

    #[test]
    fn test_peer_id_serde_shape() {
        let json = serde_json::to_string(&PeerId::user(42)).unwrap();
        assert_eq!(json, r#"{"namespace":"user","id":42}"#);
        let back: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PeerId::user(42));
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
