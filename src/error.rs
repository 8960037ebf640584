use crate::auth::backend::RosterAuthBackend;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::num::ParseIntError;
use uuid::Uuid;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Error serialising with rmp_serde"))]
    RmpSerdeEncode { source: rmp_serde::encode::Error },
    #[snafu(display("Error deserialising with rmp_serde"))]
    RmpSerdeDecode { source: rmp_serde::decode::Error },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unable to parse page size {:?}", original))]
    ParsePageSize {
        source: ParseIntError,
        original: String,
    },
    #[snafu(display("Page size must be at least 1"))]
    ZeroPageSize,
    #[snafu(display("Unknown store kind {:?}, expected `postgres` or `memory`", found))]
    UnknownStoreKind { found: String },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: i32 },
    #[snafu(display("No student could have the ID {:?}", raw))]
    UnknownStudentPath { raw: String },
    #[snafu(display("Unable to find user with UUID: {}", id))]
    MissingUser { id: Uuid },
    #[snafu(display("Error with hashing/password verification"))]
    Bcrypt { source: bcrypt::BcryptError },
    #[snafu(display("Error encoding query string"))]
    UrlEncode {
        source: serde_urlencoded::ser::Error,
    },
    #[snafu(display("Error joining blocking task"))]
    JoinTask { source: tokio::task::JoinError },
    #[snafu(display("Error clearing out expired sessions"))]
    SweepSessions {
        source: axum_login::tower_sessions::session_store::Error,
    },
    #[snafu(display("Error with sessions"))]
    TowerSession {
        source: axum_login::tower_sessions::session::Error,
    },
}

impl From<axum_login::Error<RosterAuthBackend>> for RosterError {
    fn from(value: axum_login::Error<RosterAuthBackend>) -> Self {
        match value {
            axum_login::Error::Session(source) => Self::TowerSession { source },
            axum_login::Error::Backend(backend) => backend,
        }
    }
}

impl IntoResponse for RosterError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        let basic_error = |desc| {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Roster Error"}
                    " "
                    span {(desc)}
                }
            }
        };

        let status_code = match &self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::RmpSerdeEncode { .. } => ISE,
            Self::RmpSerdeDecode { .. } => BI,
            Self::BadEnvVar { .. } | Self::ParsePort { .. } => ISE,
            Self::ParsePageSize { .. } | Self::ZeroPageSize => ISE,
            Self::UnknownStoreKind { .. } => ISE,
            Self::MissingStudent { .. } | Self::UnknownStudentPath { .. } => NF,
            Self::MissingUser { .. } => NF,
            Self::Bcrypt { .. } | Self::JoinTask { .. } => ISE,
            Self::UrlEncode { .. } => ISE,
            Self::TowerSession { .. } | Self::SweepSessions { .. } => ISE,
        };

        if status_code == NF {
            warn!(?self, "Not found");
        } else {
            error!(?self, "Error!");
        }
        (status_code, Html(basic_error(self.to_string()))).into_response()
    }
}
