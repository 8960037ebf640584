use async_trait::async_trait;
use crate::auth::is_live;
use axum_login::tower_sessions::{
    ExpiredDeletion, SessionStore,
    session::{Id, Record},
    session_store::Error as SSError,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

/// Sessions kept in process memory, used alongside the in-memory student store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<Id, Record>>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session_record: &mut Record) -> Result<(), SSError> {
        let mut sessions = self.sessions.lock().await;
        while sessions.contains_key(&session_record.id) {
            session_record.id = Id::default();
        }
        sessions.insert(session_record.id, session_record.clone());
        Ok(())
    }

    async fn save(&self, session_record: &Record) -> Result<(), SSError> {
        self.sessions
            .lock()
            .await
            .insert(session_record.id, session_record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> Result<Option<Record>, SSError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(record) if is_live(record.expiry_date) => {
                Ok(Some(record.clone()))
            }
            Some(_) => {
                sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> Result<(), SSError> {
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for MemorySessionStore {
    async fn delete_expired(&self) -> Result<(), SSError> {
        self.sessions
            .lock()
            .await
            .retain(|_, record| is_live(record.expiry_date));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_login::tower_sessions::cookie::time::{Duration, OffsetDateTime};

    fn record(expires_in: Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn live_sessions_load_and_expired_ones_vanish() {
        let store = MemorySessionStore::default();

        let mut live = record(Duration::hours(1));
        store.create(&mut live).await.unwrap();
        assert_eq!(store.load(&live.id).await.unwrap().map(|r| r.id), Some(live.id));

        let mut stale = record(Duration::hours(-1));
        store.create(&mut stale).await.unwrap();
        assert!(store.load(&stale.id).await.unwrap().is_none());

        store.delete(&live.id).await.unwrap();
        assert!(store.load(&live.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweeping_drops_only_expired_sessions() {
        let store = MemorySessionStore::default();

        let mut live = record(Duration::hours(1));
        store.create(&mut live).await.unwrap();
        let mut stale = record(Duration::hours(-1));
        store.create(&mut stale).await.unwrap();
        assert_eq!(store.sessions.lock().await.len(), 2);

        store.delete_expired().await.unwrap();

        let sessions = store.sessions.lock().await;
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key(&live.id));
    }
}
