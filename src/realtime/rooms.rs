//! Room membership manager.
//!
//! Maps room keys to the set of subscribed connections. Join and leave are
//! idempotent set operations; a connection may belong to any number of
//! rooms concurrently. Per-connection causal ordering is the caller's
//! concern: the socket loop applies membership changes inline, before the
//! next frame from the same connection is read.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::domain::{ConnectionId, RoomId};

/// Process-wide room membership state.
#[derive(Debug, Default)]
pub struct RoomManager {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    members: HashMap<RoomId, HashSet<ConnectionId>>,
    joined: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomManager {
    /// Creates an empty room manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `connection` to `room`. Idempotent.
    pub async fn join(&self, connection: ConnectionId, room: RoomId) {
        let mut inner = self.inner.write().await;
        inner.members.entry(room).or_default().insert(connection);
        inner.joined.entry(connection).or_default().insert(room);
    }

    /// Removes `connection` from `room`. Idempotent.
    pub async fn leave(&self, connection: ConnectionId, room: RoomId) {
        let mut inner = self.inner.write().await;
        if let Some(set) = inner.members.get_mut(&room) {
            set.remove(&connection);
            if set.is_empty() {
                inner.members.remove(&room);
            }
        }
        if let Some(set) = inner.joined.get_mut(&connection) {
            set.remove(&room);
            if set.is_empty() {
                inner.joined.remove(&connection);
            }
        }
    }

    /// Removes `connection` from every room it joined (disconnect path).
    pub async fn leave_all(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().await;
        if let Some(rooms) = inner.joined.remove(&connection) {
            for room in rooms {
                if let Some(set) = inner.members.get_mut(&room) {
                    set.remove(&connection);
                    if set.is_empty() {
                        inner.members.remove(&room);
                    }
                }
            }
        }
    }

    /// Returns the current member set of `room` for fan-out.
    pub async fn members_of(&self, room: RoomId) -> Vec<ConnectionId> {
        self.inner
            .read()
            .await
            .members
            .get(&room)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the rooms `connection` currently belongs to.
    pub async fn rooms_of(&self, connection: ConnectionId) -> Vec<RoomId> {
        self.inner
            .read()
            .await
            .joined
            .get(&connection)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `connection` is a member of `room`.
    pub async fn is_member(&self, connection: ConnectionId, room: RoomId) -> bool {
        self.inner
            .read()
            .await
            .members
            .get(&room)
            .is_some_and(|set| set.contains(&connection))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ChatId;

    #[tokio::test]
    async fn join_is_idempotent() {
        let rooms = RoomManager::new();
        let conn = ConnectionId::next();
        let room = RoomId::Chat(ChatId::new());

        rooms.join(conn, room).await;
        rooms.join(conn, room).await;
        rooms.join(conn, room).await;

        assert_eq!(rooms.members_of(room).await.len(), 1);
    }

    #[tokio::test]
    async fn leave_is_idempotent() {
        let rooms = RoomManager::new();
        let conn = ConnectionId::next();
        let room = RoomId::Chat(ChatId::new());

        rooms.join(conn, room).await;
        rooms.leave(conn, room).await;
        rooms.leave(conn, room).await;

        assert!(rooms.members_of(room).await.is_empty());
        assert!(!rooms.is_member(conn, room).await);
    }

    #[tokio::test]
    async fn connection_joins_multiple_rooms() {
        let rooms = RoomManager::new();
        let conn = ConnectionId::next();
        let chat_room = RoomId::Chat(ChatId::new());

        rooms.join(conn, chat_room).await;
        rooms.join(conn, RoomId::Admins).await;

        let joined = rooms.rooms_of(conn).await;
        assert_eq!(joined.len(), 2);
        assert!(rooms.is_member(conn, chat_room).await);
        assert!(rooms.is_member(conn, RoomId::Admins).await);
    }

    #[tokio::test]
    async fn leave_all_clears_membership() {
        let rooms = RoomManager::new();
        let conn = ConnectionId::next();
        let other = ConnectionId::next();
        let room = RoomId::Chat(ChatId::new());

        rooms.join(conn, room).await;
        rooms.join(conn, RoomId::Admins).await;
        rooms.join(other, room).await;

        rooms.leave_all(conn).await;

        assert!(rooms.rooms_of(conn).await.is_empty());
        assert_eq!(rooms.members_of(room).await, vec![other]);
    }
}
