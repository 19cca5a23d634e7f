//! Connection lifecycle for the document store.
//!
//! # Responsibility
//! - Open file or in-memory connections and configure pragmas.
//! - Trigger schema migrations before returning a usable connection.
//! - Close the connection once at shutdown and report the outcome.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Every open/close attempt emits exactly one terminal `ok|error` event.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::StoreUri;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens the store identified by a parsed connection URI.
pub fn open_store(uri: &StoreUri) -> DbResult<Connection> {
    match uri {
        StoreUri::Memory => open_db_in_memory(),
        StoreUri::File(path) => open_db(path),
    }
}

/// Opens a database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens a private in-memory database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Closes the connection, waiting for SQLite to release it.
///
/// Failures are logged and returned; the connection is dropped either way.
pub fn close_db(conn: Connection) -> DbResult<()> {
    let started_at = Instant::now();
    info!("event=db_close module=db status=start");

    match conn.close() {
        Ok(()) => {
            info!(
                "event=db_close module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err((_conn, err)) => {
            error!(
                "event=db_close module=db status=error duration_ms={} error_code=db_close_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
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
