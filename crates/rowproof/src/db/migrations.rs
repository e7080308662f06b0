//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies
//! pending ones in order. ADD COLUMN migrations are skipped when the
//! column already exists, so re-running against a patched database is safe.

use rusqlite::Connection;

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    /// Execute the SQL directly.
    Standard,
    /// ALTER TABLE ADD COLUMN, skipped if the column already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_proof_images_table",
        sql: include_str!("sql/001_create_proof_images.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "create_training_entries_table",
        sql: include_str!("sql/002_create_training_entries.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 3,
        description: "create_proof_extraction_jobs_table",
        sql: include_str!("sql/003_create_proof_extraction_jobs.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 4,
        description: "add_extraction_confidence_to_proof_images",
        sql: include_str!("sql/004_add_extraction_confidence.sql"),
        kind: MigrationKind::AddColumn {
            table: "proof_images",
            column: "extraction_confidence",
        },
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let should_run = match &migration.kind {
            MigrationKind::Standard => true,
            MigrationKind::AddColumn { table, column } => !column_exists(conn, table, column)?,
        };

        if should_run {
            conn.execute_batch(migration.sql)
                .map_err(|e| DatabaseError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
        } else {
            log::info!(
                "Skipping migration v{} (condition not met)",
                migration.version
            );
        }

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

/// Checks whether a column exists on a table using `PRAGMA table_info`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::Migration {
            version: 0,
            reason: format!("Invalid table name: {}", table),
        });
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|r| r.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_all(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = migrated();
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = migrated();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_add_column_skipped_when_present() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("sql/001_create_proof_images.sql"))
            .unwrap();
        conn.execute_batch(include_str!("sql/004_add_extraction_confidence.sql"))
            .unwrap();

        run_all(&conn).unwrap();
        assert!(column_exists(&conn, "proof_images", "extraction_confidence").unwrap());
    }

    #[test]
    fn test_column_exists_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE test_tbl (id TEXT, name TEXT);")
            .unwrap();

        assert!(column_exists(&conn, "test_tbl", "id").unwrap());
        assert!(!column_exists(&conn, "test_tbl", "missing").unwrap());
        assert!(column_exists(&conn, "bad;name", "id").is_err());
    }

    #[test]
    fn test_job_image_is_unique() {
        let conn = migrated();
        let insert = "INSERT INTO proof_extraction_jobs (id, proof_image_id, created_at, updated_at)
                      VALUES (?1, 'img-1', '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')";
        conn.execute(insert, ["j1"]).unwrap();
        assert!(conn.execute(insert, ["j2"]).is_err());
    }
}
