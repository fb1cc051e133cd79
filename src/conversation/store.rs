//! Shared per-chat session storage.
//!
//! Every chat owns one slot behind its own async mutex. The map of slots is guarded
//! by a second mutex that is only held for the lookup, so different chats never wait
//! on each other, while everything done for one chat is serialised through
//! [`SessionStore::lock`].

use super::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Exclusive access to one chat's session. Released on drop.
pub type SessionGuard = OwnedMutexGuard<Session>;

#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<i64, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, chat_id: i64) -> Arc<Mutex<Session>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::idle(chat_id))))
            .clone()
    }

    /// Locks the chat's session for a read-modify-write, creating an idle one if needed.
    pub async fn lock(&self, chat_id: i64) -> SessionGuard {
        self.slot(chat_id).await.lock_owned().await
    }

    /// Unlocks the session. An idle chat whose slot nobody else holds is forgotten,
    /// since a fresh slot is indistinguishable from it.
    pub async fn release(&self, guard: SessionGuard) {
        let chat_id = guard.chat_id;
        drop(guard);

        // Slots are only cloned under this lock, so a count of one cannot grow while we hold it
        let mut slots = self.slots.lock().await;
        let evictable = slots.get(&chat_id).is_some_and(|slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|session| session.is_idle())
        });
        if evictable {
            slots.remove(&chat_id);
        }
    }

    /// Snapshot of the chat's session (idle if it never talked to the bot).
    pub async fn get(&self, chat_id: i64) -> Session {
        let guard = self.lock(chat_id).await;
        let session = guard.clone();
        self.release(guard).await;
        session
    }

    pub async fn set(&self, chat_id: i64, session: Session) {
        debug_assert_eq!(session.chat_id, chat_id);
        let mut guard = self.lock(chat_id).await;
        *guard = session;
        self.release(guard).await;
    }

    /// Resets the chat to idle and drops its draft.
    pub async fn clear(&self, chat_id: i64) {
        self.set(chat_id, Session::idle(chat_id)).await;
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::session::{Draft, State};
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_returns_fresh_idle_session() {
        let store = SessionStore::new();
        let session = store.get(42).await;
        assert_eq!(session, Session::idle(42));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_release_keeps_only_active_sessions() {
        let store = SessionStore::new();

        let guard = store.lock(1).await;
        store.release(guard).await;
        assert_eq!(store.len().await, 0);

        let mut guard = store.lock(2).await;
        *guard = guard.clone().selling(State::AwaitingFio, Draft::default());
        store.release(guard).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(2).await.state, State::AwaitingFio);

        store.clear(2).await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_release_keeps_slot_with_waiter() {
        let store = Arc::new(SessionStore::new());
        let guard = store.lock(3).await;

        let other = store.clone();
        let waiter = tokio::spawn(async move {
            let mut guard = other.lock(3).await;
            *guard = guard.clone().enter(State::AwaitingSearchTerm);
            other.release(guard).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        store.release(guard).await;
        waiter.await.unwrap();
        assert_eq!(store.get(3).await.state, State::AwaitingSearchTerm);
    }

    #[tokio::test]
    async fn test_set_and_clear() {
        let store = SessionStore::new();
        let selling = Session::idle(1).selling(State::AwaitingPrice, Draft::default());
        store.set(1, selling.clone()).await;
        assert_eq!(store.get(1).await, selling);

        store.clear(1).await;
        assert!(store.get(1).await.is_idle());
    }

    #[tokio::test]
    async fn test_same_chat_is_serialised() {
        let store = Arc::new(SessionStore::new());
        let mut guard = store.lock(5).await;

        let other = store.clone();
        let waiter = tokio::spawn(async move { other.get(5).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        *guard = guard.clone().enter(State::AwaitingSearchTerm);
        drop(guard);

        let seen = waiter.await.unwrap();
        assert_eq!(seen.state, State::AwaitingSearchTerm);
    }

    #[tokio::test]
    async fn test_other_chats_not_blocked() {
        let store = SessionStore::new();
        let _held = store.lock(1).await;
        let other = tokio::time::timeout(Duration::from_millis(200), store.get(2)).await;
        assert!(other.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_chats_do_not_interfere() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();

        for chat_id in 0..32i64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for round in 0..50u32 {
                    let mut guard = store.lock(chat_id).await;
                    let mut draft = guard.draft.clone().unwrap_or_default();
                    draft.price = Some(draft.price.unwrap_or(0) + 1);
                    draft.full_name = Some(format!("chat-{chat_id}"));
                    *guard = guard.clone().selling(State::AwaitingPrice, draft);
                    if round % 7 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for chat_id in 0..32i64 {
            let session = store.get(chat_id).await;
            let draft = session.draft.unwrap();
            assert_eq!(draft.price, Some(50));
            assert_eq!(draft.full_name, Some(format!("chat-{chat_id}")));
        }
    }
}
