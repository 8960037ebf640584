use crate::error::{
    GetDatabaseConnectionSnafu, MakeQuerySnafu, RmpSerdeDecodeSnafu, RmpSerdeEncodeSnafu,
    RosterError,
};
use async_trait::async_trait;
use crate::auth::is_live;
use axum_login::tower_sessions::{
    ExpiredDeletion, SessionStore,
    cookie::time::OffsetDateTime,
    session::{Id, Record},
    session_store::Error as SSError,
};
use snafu::ResultExt;
use sqlx::{PgConnection, Pool, Postgres};

#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: Pool<Postgres>,
}

impl PostgresSessionStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

impl PostgresSessionStore {
    async fn connection(&self) -> Result<sqlx::pool::PoolConnection<Postgres>, SSError> {
        self.pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)
            .map_err(|e| SSError::Backend(e.to_string()))
    }

    async fn id_exists(id: Id, conn: &mut PgConnection) -> Result<bool, RosterError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM public.sessions WHERE id = $1)")
            .bind(id.to_string())
            .fetch_one(conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn save_session(record: &Record, conn: &mut PgConnection) -> Result<(), RosterError> {
        let serialised_data = rmp_serde::to_vec(&record.data).context(RmpSerdeEncodeSnafu)?;

        sqlx::query("INSERT INTO public.sessions VALUES ($1, $2, $3) ON CONFLICT (id) DO UPDATE SET data = excluded.data, expiry_date = excluded.expiry_date")
            .bind(record.id.to_string())
            .bind(serialised_data)
            .bind(record.expiry_date)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn create(&self, session_record: &mut Record) -> Result<(), SSError> {
        let mut connection = self.connection().await?;

        while Self::id_exists(session_record.id, &mut connection)
            .await
            .map_err(|e| SSError::Backend(e.to_string()))?
        {
            session_record.id = Id::default();
        }

        Self::save_session(session_record, &mut connection)
            .await
            .map_err(|e| SSError::Encode(e.to_string()))?;

        Ok(())
    }

    async fn save(&self, session_record: &Record) -> Result<(), SSError> {
        let mut connection = self.connection().await?;

        Self::save_session(session_record, &mut connection)
            .await
            .map_err(|e| SSError::Encode(e.to_string()))?;

        Ok(())
    }

    async fn load(&self, session_id: &Id) -> Result<Option<Record>, SSError> {
        let mut connection = self.connection().await?;

        let Some((data, expiry_date)) = sqlx::query_as::<_, (Vec<u8>, OffsetDateTime)>(
            "SELECT data, expiry_date FROM public.sessions WHERE id = $1",
        )
        .bind(session_id.to_string())
        .fetch_optional(&mut *connection)
        .await
        .context(MakeQuerySnafu)
        .map_err(|e| SSError::Backend(e.to_string()))?
        else {
            return Ok(None);
        };

        if !is_live(expiry_date) {
            sqlx::query("DELETE FROM public.sessions WHERE id = $1")
                .bind(session_id.to_string())
                .execute(&mut *connection)
                .await
                .context(MakeQuerySnafu)
                .map_err(|e| SSError::Backend(e.to_string()))?;
            return Ok(None);
        }

        let data = rmp_serde::from_slice(&data)
            .context(RmpSerdeDecodeSnafu)
            .map_err(|e| SSError::Decode(e.to_string()))?;

        Ok(Some(Record {
            id: *session_id,
            data,
            expiry_date,
        }))
    }

    async fn delete(&self, session_id: &Id) -> Result<(), SSError> {
        let mut connection = self.connection().await?;

        sqlx::query("DELETE FROM public.sessions WHERE id = $1")
            .bind(session_id.to_string())
            .execute(&mut *connection)
            .await
            .context(MakeQuerySnafu)
            .map_err(|e| SSError::Backend(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for PostgresSessionStore {
    async fn delete_expired(&self) -> Result<(), SSError> {
        let mut connection = self.connection().await?;

        let deleted = sqlx::query("DELETE FROM public.sessions WHERE expiry_date <= now()")
            .execute(&mut *connection)
            .await
            .context(MakeQuerySnafu)
            .map_err(|e| SSError::Backend(e.to_string()))?
            .rows_affected();
        debug!(deleted, "removed expired sessions");

        Ok(())
    }
}
