//! Live connection registry.
//!
//! Tracks one active connection per identity per role-namespace. A later
//! registration for the same identity replaces the earlier one (no
//! multi-device fan-out); the displaced handle is returned to the caller
//! so it can be detached from its rooms.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use crate::domain::{ConnectionId, IdentityId, Role};
use crate::ws::messages::ServerEvent;

/// A live, authenticated socket connection.
///
/// Holds the outbound channel into the connection's write loop. Delivery
/// is best-effort: a full or closed buffer drops the frame for this
/// connection only.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Process-local connection identifier.
    pub id: ConnectionId,
    /// Authenticated identity.
    pub identity: IdentityId,
    /// Role namespace this connection registered under.
    pub role: Role,
    sender: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    /// Creates a handle around the connection's outbound sender.
    #[must_use]
    pub fn new(identity: IdentityId, role: Role, sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: ConnectionId::next(),
            identity,
            role,
            sender,
        }
    }

    /// Queues an event for delivery, best-effort.
    pub fn send(&self, event: ServerEvent) {
        if let Err(err) = self.sender.try_send(event) {
            tracing::debug!(connection = %self.id, %err, "dropping event for slow or gone client");
        }
    }
}

/// Registry of all live connections, keyed by identity and role.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    by_identity: HashMap<(IdentityId, Role), Arc<ConnectionHandle>>,
    by_connection: HashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection, replacing any earlier connection for the
    /// same identity and role. Returns the displaced handle, if any.
    pub async fn register(&self, handle: Arc<ConnectionHandle>) -> Option<Arc<ConnectionHandle>> {
        let mut inner = self.inner.write().await;
        let displaced = inner
            .by_identity
            .insert((handle.identity, handle.role), Arc::clone(&handle));
        if let Some(old) = &displaced {
            inner.by_connection.remove(&old.id);
        }
        inner.by_connection.insert(handle.id, Arc::clone(&handle));
        tracing::debug!(
            connection = %handle.id,
            identity = %handle.identity,
            role = %handle.role,
            connections = inner.by_connection.len(),
            replaced = displaced.is_some(),
            "connection registered"
        );
        displaced
    }

    /// Removes a connection. Idempotent; a connection that was already
    /// replaced only removes itself, not its successor.
    pub async fn unregister(&self, id: ConnectionId) {
        let mut inner = self.inner.write().await;
        if let Some(handle) = inner.by_connection.remove(&id) {
            let key = (handle.identity, handle.role);
            if inner.by_identity.get(&key).is_some_and(|h| h.id == id) {
                inner.by_identity.remove(&key);
            }
            tracing::debug!(
                connection = %id,
                connections = inner.by_connection.len(),
                "connection unregistered"
            );
        }
    }

    /// Returns the live connection for `identity` under `role`, if any.
    pub async fn lookup(&self, identity: IdentityId, role: Role) -> Option<Arc<ConnectionHandle>> {
        self.inner
            .read()
            .await
            .by_identity
            .get(&(identity, role))
            .cloned()
    }

    /// Returns the handle for a connection id, if still registered.
    pub async fn get(&self, id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.inner.read().await.by_connection.get(&id).cloned()
    }

    /// Returns every live connection registered under `role`.
    pub async fn with_role(&self, role: Role) -> Vec<Arc<ConnectionHandle>> {
        self.inner
            .read()
            .await
            .by_connection
            .values()
            .filter(|h| h.role == role)
            .cloned()
            .collect()
    }

    /// Returns every live connection.
    pub async fn all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.inner
            .read()
            .await
            .by_connection
            .values()
            .cloned()
            .collect()
    }

    /// Number of live connections (observable gauge).
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_connection.len()
    }

    /// Returns `true` if no connections are registered.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_connection.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn handle(role: Role) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (
            Arc::new(ConnectionHandle::new(IdentityId::new(), role, tx)),
            rx,
        )
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = handle(Role::User);

        let displaced = registry.register(Arc::clone(&conn)).await;
        assert!(displaced.is_none());

        let found = registry.lookup(conn.identity, Role::User).await;
        assert_eq!(found.map(|h| h.id), Some(conn.id));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn same_identity_different_roles_coexist() {
        let registry = ConnectionRegistry::new();
        let identity = IdentityId::new();
        let (tx_a, _rx_a) = mpsc::channel(8);
        let (tx_b, _rx_b) = mpsc::channel(8);
        let user = Arc::new(ConnectionHandle::new(identity, Role::User, tx_a));
        let admin = Arc::new(ConnectionHandle::new(identity, Role::Admin, tx_b));

        assert!(registry.register(user).await.is_none());
        assert!(registry.register(admin).await.is_none());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn later_registration_replaces_earlier() {
        let registry = ConnectionRegistry::new();
        let identity = IdentityId::new();
        let (tx_a, _rx_a) = mpsc::channel(8);
        let (tx_b, _rx_b) = mpsc::channel(8);
        let first = Arc::new(ConnectionHandle::new(identity, Role::User, tx_a));
        let second = Arc::new(ConnectionHandle::new(identity, Role::User, tx_b));

        let _ = registry.register(Arc::clone(&first)).await;
        let displaced = registry.register(Arc::clone(&second)).await;
        assert_eq!(displaced.map(|h| h.id), Some(first.id));

        assert_eq!(registry.len().await, 1);
        let found = registry.lookup(identity, Role::User).await;
        assert_eq!(found.map(|h| h.id), Some(second.id));
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = handle(Role::User);

        let _ = registry.register(Arc::clone(&conn)).await;
        registry.unregister(conn.id).await;
        registry.unregister(conn.id).await;

        assert!(registry.is_empty().await);
        assert!(registry.lookup(conn.identity, Role::User).await.is_none());
    }

    #[tokio::test]
    async fn stale_unregister_keeps_successor() {
        let registry = ConnectionRegistry::new();
        let identity = IdentityId::new();
        let (tx_a, _rx_a) = mpsc::channel(8);
        let (tx_b, _rx_b) = mpsc::channel(8);
        let first = Arc::new(ConnectionHandle::new(identity, Role::User, tx_a));
        let second = Arc::new(ConnectionHandle::new(identity, Role::User, tx_b));

        let _ = registry.register(Arc::clone(&first)).await;
        let _ = registry.register(Arc::clone(&second)).await;

        // The displaced connection disconnects after being replaced.
        registry.unregister(first.id).await;

        let found = registry.lookup(identity, Role::User).await;
        assert_eq!(found.map(|h| h.id), Some(second.id));
    }

    #[tokio::test]
    async fn with_role_filters() {
        let registry = ConnectionRegistry::new();
        let (user, _rx_a) = handle(Role::User);
        let (admin, _rx_b) = handle(Role::Admin);
        let _ = registry.register(user).await;
        let _ = registry.register(Arc::clone(&admin)).await;

        let admins = registry.with_role(Role::Admin).await;
        assert_eq!(admins.len(), 1);
        assert_eq!(admins.first().map(|h| h.id), Some(admin.id));
    }

    #[tokio::test]
    async fn send_after_receiver_drop_is_silent() {
        let (conn, rx) = handle(Role::User);
        drop(rx);
        conn.send(ServerEvent::Error {
            code: 3000,
            message: "x".to_string(),
        });
    }
}
