//! Typed identifiers and roles.
//!
//! Every persistent entity gets a newtype wrapper around [`uuid::Uuid`]
//! (v4) so identifiers cannot be confused across entities. Live socket
//! connections use a process-local counter-based [`ConnectionId`] instead:
//! connections are ephemeral and never persisted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identity of an authenticated principal (user or admin). Issued by
    /// the external account system and carried in token claims.
    IdentityId
);

uuid_id!(
    /// Unique identifier for a support chat session.
    ChatId
);

uuid_id!(
    /// Unique identifier for a lightweight conversation channel.
    ConversationId
);

uuid_id!(
    /// Unique identifier for a persisted message.
    MessageId
);

uuid_id!(
    /// Unique identifier for a persisted notification.
    NotificationId
);

/// Role of an authenticated principal.
///
/// Registry entries, token claims, and message records all carry the role;
/// the two roles form separate connection namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End user of the promotions platform.
    User,
    /// Support/operations admin.
    Admin,
}

impl Role {
    /// Returns `true` for the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Process-local identifier for a live socket connection.
///
/// Generated from an atomic counter; unique within the process lifetime
/// only, which matches the registry's lifetime: a restart drops every live
/// connection anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generates the next unique connection ID.
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the inner counter value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(ChatId::new(), ChatId::new());
        assert_ne!(IdentityId::new(), IdentityId::new());
    }

    #[test]
    fn uuid_round_trip() {
        let uuid = uuid::Uuid::new_v4();
        let id = ChatId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
        assert_eq!(uuid::Uuid::from(id), uuid);
    }

    #[test]
    fn serde_is_transparent() {
        let id = ConversationId::new();
        let json = serde_json::to_string(&id).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn connection_ids_increase() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn role_serde_is_lowercase() {
        let json = serde_json::to_string(&Role::Admin).ok();
        assert_eq!(json.as_deref(), Some("\"admin\""));
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }
}
