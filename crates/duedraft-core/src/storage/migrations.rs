//! Database schema migrations for duedraft.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    }) {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: proposals and the sync baseline.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS proposals (
            id                     TEXT PRIMARY KEY,
            seq                    INTEGER NOT NULL,
            status                 TEXT NOT NULL DEFAULT 'pending',
            project_id             TEXT NOT NULL,
            project_name           TEXT NOT NULL,
            checklist_item_id      TEXT NOT NULL,
            task_name              TEXT NOT NULL,
            work_category          TEXT NOT NULL DEFAULT '',
            event_date             TEXT,
            due_date               TEXT,
            deadline_basis         TEXT NOT NULL DEFAULT 'event_date',
            offset_days            INTEGER NOT NULL,
            due_date_source        TEXT NOT NULL DEFAULT 'rule_table',
            final_due_text         TEXT NOT NULL DEFAULT '',
            suggestion_offset_days INTEGER,
            task_page_id           TEXT,
            task_page_url          TEXT,
            created_at             TEXT NOT NULL,
            updated_at             TEXT NOT NULL,
            approved_at            TEXT
        );

        CREATE TABLE IF NOT EXISTS sync_state (
            sync_id     TEXT PRIMARY KEY,
            project_ids TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_proposals_status_seq ON proposals(status, seq);
        CREATE INDEX IF NOT EXISTS idx_proposals_project ON proposals(project_id, checklist_item_id);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('proposals', 'sync_state')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn fresh_database_has_proposal_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index'
                 AND name IN ('idx_proposals_status_seq', 'idx_proposals_project')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 2);
        assert_eq!(SCHEMA_VERSION, 1);
    }
}
