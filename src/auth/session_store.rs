use crate::auth::{memory_store::MemorySessionStore, postgres_store::PostgresSessionStore};
use async_trait::async_trait;
use axum_login::tower_sessions::{
    ExpiredDeletion, SessionStore,
    session::{Id, Record},
    session_store::Error as SSError,
};

/// Whichever session store matches the configured student store.
#[derive(Debug, Clone)]
pub enum RosterSessionStore {
    Postgres(PostgresSessionStore),
    Memory(MemorySessionStore),
}

#[async_trait]
impl SessionStore for RosterSessionStore {
    async fn create(&self, session_record: &mut Record) -> Result<(), SSError> {
        match self {
            Self::Postgres(store) => store.create(session_record).await,
            Self::Memory(store) => store.create(session_record).await,
        }
    }

    async fn save(&self, session_record: &Record) -> Result<(), SSError> {
        match self {
            Self::Postgres(store) => store.save(session_record).await,
            Self::Memory(store) => store.save(session_record).await,
        }
    }

    async fn load(&self, session_id: &Id) -> Result<Option<Record>, SSError> {
        match self {
            Self::Postgres(store) => store.load(session_id).await,
            Self::Memory(store) => store.load(session_id).await,
        }
    }

    async fn delete(&self, session_id: &Id) -> Result<(), SSError> {
        match self {
            Self::Postgres(store) => store.delete(session_id).await,
            Self::Memory(store) => store.delete(session_id).await,
        }
    }
}

#[async_trait]
impl ExpiredDeletion for RosterSessionStore {
    async fn delete_expired(&self) -> Result<(), SSError> {
        match self {
            Self::Postgres(store) => store.delete_expired().await,
            Self::Memory(store) => store.delete_expired().await,
        }
    }
}
