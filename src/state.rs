use crate::{
    auth::{
        RosterSession, memory_store::MemorySessionStore, postgres_store::PostgresSessionStore,
        session_store::RosterSessionStore,
    },
    config::{RuntimeConfiguration, StoreConfig},
    error::{MigrateSnafu, OpenDatabaseSnafu, RosterResult, SweepSessionsSnafu},
    maud_conveniences::render_nav,
    query::StudentQuery,
    store::{
        StudentStore, StudentStoreHandle, UserStore, UserStoreHandle,
        memory::{MemoryStudentStore, MemoryUserStore},
        postgres::{PostgresStudentStore, PostgresUserStore},
    },
};
use axum_login::tower_sessions::ExpiredDeletion;
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct RosterState {
    students: StudentStoreHandle,
    users: UserStoreHandle,
    sessions: RosterSessionStore,
    pool: Option<Pool<Postgres>>,
    config: RuntimeConfiguration,
    student_query: StudentQuery,
}

impl RosterState {
    pub async fn new(options: PgPoolOptions, config: RuntimeConfiguration) -> RosterResult<Self> {
        let student_query = StudentQuery::new(config.pagination());

        Ok(match &*config.store_config() {
            StoreConfig::Postgres(db_config) => {
                let pool = options
                    .connect(&db_config.get_db_path())
                    .await
                    .context(OpenDatabaseSnafu)?;

                sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;
                info!("database migrated");

                let sessions = RosterSessionStore::Postgres(PostgresSessionStore::new(pool.clone()));
                sessions.delete_expired().await.context(SweepSessionsSnafu)?;

                Self {
                    students: Arc::new(PostgresStudentStore::new(pool.clone())),
                    users: Arc::new(PostgresUserStore::new(pool.clone())),
                    sessions,
                    pool: Some(pool),
                    config: config.clone(),
                    student_query,
                }
            }
            StoreConfig::Memory => {
                warn!("using in-memory stores, nothing will survive a restart");

                Self {
                    students: Arc::new(MemoryStudentStore::default()),
                    users: Arc::new(MemoryUserStore::default()),
                    sessions: RosterSessionStore::Memory(MemorySessionStore::default()),
                    pool: None,
                    config: config.clone(),
                    student_query,
                }
            }
        })
    }

    #[allow(clippy::unused_self, clippy::needless_pass_by_value)] //in case self is ever needed :), and to allow direct html! usage
    pub fn render(&self, auth_session: RosterSession, markup: Markup) -> Markup {
        let nav = render_nav(auth_session.user.as_ref());

        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Roster" }
                }
                body class="bg-gray-900 min-h-screen flex flex-col items-center text-white" {
                    (nav)
                    main class="w-full flex flex-col items-center p-8" {
                        (markup)
                    }
                }
            }
        }
    }

    pub fn students(&self) -> &dyn StudentStore {
        self.students.as_ref()
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn session_store(&self) -> RosterSessionStore {
        self.sessions.clone()
    }

    pub const fn student_query(&self) -> &StudentQuery {
        &self.student_query
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub async fn sensible_shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("database pool closed");
        }
    }
}
