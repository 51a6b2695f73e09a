//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Parse connection strings into file or in-memory targets.
//! - Open SQLite connections and configure required pragmas.
//! - Trigger collection migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Returned connections wait up to 5s on a locked database.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

const SQLITE_SCHEME: &str = "sqlite:";
const MEMORY_TARGET: &str = ":memory:";

/// Where a connection string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Private in-memory database, dropped with the connection.
    Memory,
    /// Database file on disk, created when absent.
    File(PathBuf),
}

impl FromStr for ConnectionTarget {
    type Err = DbError;

    /// Accepts `sqlite::memory:`, `:memory:`, `sqlite://<path>`,
    /// `sqlite:<path>` or a bare file path.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DbError::InvalidConnectionString(
                "connection string cannot be empty".to_string(),
            ));
        }

        let rest = match trimmed.strip_prefix(SQLITE_SCHEME) {
            Some(rest) => rest.strip_prefix("//").unwrap_or(rest),
            None if trimmed.contains("://") => {
                let scheme = trimmed.split("://").next().unwrap_or_default();
                return Err(DbError::InvalidConnectionString(format!(
                    "unsupported scheme `{scheme}`; expected `sqlite`"
                )));
            }
            None => trimmed,
        };

        if rest == MEMORY_TARGET {
            return Ok(Self::Memory);
        }
        if rest.is_empty() {
            return Err(DbError::InvalidConnectionString(format!(
                "missing database path in `{trimmed}`"
            )));
        }
        Ok(Self::File(PathBuf::from(rest)))
    }
}

impl ConnectionTarget {
    /// Opens this target and applies all pending migrations.
    pub fn open(&self) -> DbResult<Connection> {
        match self {
            Self::Memory => open_db_in_memory(),
            Self::File(path) => open_db(path),
        }
    }
}

/// Connects to the target named by a connection string.
///
/// # Side effects
/// - Same as `open_db` / `open_db_in_memory`.
pub fn connect(connection_string: &str) -> DbResult<Connection> {
    match connection_string.parse::<ConnectionTarget>() {
        Ok(target) => target.open(),
        Err(err) => {
            error!(
                "event=db_open module=db status=error error_code=invalid_connection_string error={}",
                err
            );
            Err(err)
        }
    }
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
