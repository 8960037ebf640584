use crate::error::{
    BadEnvVarSnafu, ParsePageSizeSnafu, ParsePortSnafu, RosterResult, UnknownStoreKindSnafu,
    ZeroPageSizeSnafu,
};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::{OptionExt, ResultExt};
use std::{num::NonZeroU64, sync::Arc};

pub const DEFAULT_PAGE_SIZE: NonZeroU64 = NonZeroU64::new(10).unwrap();
const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    store_config: Arc<StoreConfig>,
    pagination: PaginationConfig,
    server_ip: String,
    bcrypt_cost: u32,
}

impl RuntimeConfiguration {
    pub fn new() -> RosterResult<Self> {
        let store_config = match var("STORE_KIND").ok().as_deref() {
            None | Some("postgres") => StoreConfig::Postgres(DbConfig::new()?),
            Some("memory") => StoreConfig::Memory,
            Some(found) => {
                return UnknownStoreKindSnafu {
                    found: found.to_string(),
                }
                .fail();
            }
        };

        let pagination = match var("PAGE_SIZE") {
            Ok(page_size) => PaginationConfig::parse(&page_size)?,
            Err(_) => PaginationConfig::default(),
        };

        Ok(Self {
            store_config: Arc::new(store_config),
            pagination,
            server_ip: var("ROSTER_SERVER_IP").unwrap_or_else(|_| DEFAULT_SERVER_IP.to_string()),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        })
    }

    #[cfg(test)]
    pub fn in_memory(pagination: PaginationConfig) -> Self {
        Self {
            store_config: Arc::new(StoreConfig::Memory),
            pagination,
            server_ip: DEFAULT_SERVER_IP.to_string(),
            //cheapest cost bcrypt allows, keeps tests fast
            bcrypt_cost: 4,
        }
    }

    pub fn store_config(&self) -> Arc<StoreConfig> {
        self.store_config.clone()
    }

    pub const fn pagination(&self) -> PaginationConfig {
        self.pagination
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub const fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

#[derive(Debug)]
pub enum StoreConfig {
    Postgres(DbConfig),
    Memory,
}

/// How many students are shown on a single listing page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationConfig {
    pub page_size: NonZeroU64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationConfig {
    pub fn parse(raw: &str) -> RosterResult<Self> {
        let page_size: u64 = raw.trim().parse().context(ParsePageSizeSnafu {
            original: raw.to_string(),
        })?;
        let page_size = NonZeroU64::new(page_size).context(ZeroPageSizeSnafu)?;

        Ok(Self { page_size })
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> RosterResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RosterError;

    #[test]
    fn page_size_parses_with_whitespace() {
        let config = PaginationConfig::parse(" 25 ").unwrap();
        assert_eq!(config.page_size.get(), 25);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(matches!(
            PaginationConfig::parse("0"),
            Err(RosterError::ZeroPageSize)
        ));
    }

    #[test]
    fn non_numeric_page_size_is_rejected() {
        assert!(matches!(
            PaginationConfig::parse("lots"),
            Err(RosterError::ParsePageSize { .. })
        ));
    }

    #[test]
    fn default_page_size_is_ten() {
        assert_eq!(PaginationConfig::default().page_size.get(), 10);
    }
}
