use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use postbox_db::Database;

const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    InMemory,
}

impl DatabaseTarget {
    pub fn open(&self) -> postbox_db::Result<Database> {
        match self {
            DatabaseTarget::File(path) => Database::open(path),
            DatabaseTarget::InMemory => Database::open_in_memory(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: DatabaseTarget,
    pub host: String,
    pub port: u16,
    /// Drop all tables once the server has stopped.
    pub teardown_on_shutdown: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database = match lookup("POSTBOX_DB_PATH").as_deref() {
            Some(IN_MEMORY) => DatabaseTarget::InMemory,
            Some(path) if !path.is_empty() => DatabaseTarget::File(path.into()),
            _ => DatabaseTarget::File("postbox.db".into()),
        };

        let host = lookup("POSTBOX_HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port: u16 = lookup("POSTBOX_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("POSTBOX_PORT must be a port number")?;

        let teardown_on_shutdown = match lookup("POSTBOX_TEARDOWN_ON_SHUTDOWN") {
            Some(raw) => parse_flag(&raw).context("POSTBOX_TEARDOWN_ON_SHUTDOWN")?,
            None => false,
        };

        Ok(Self {
            database,
            host,
            port,
            teardown_on_shutdown,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}
