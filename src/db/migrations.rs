//! Schema migrations: `.sql` files applied once each, in file-name order,
//! recorded in a `schema_migrations` table.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::error::AppResult;

pub fn run_migrations(conn: &Connection, dir: &Path) -> AppResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let applied: HashSet<String> = {
        let mut stmt = conn.prepare("SELECT name FROM schema_migrations")?;
        let applied = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<_>>()?;
        applied
    };

    let mut pending = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "sql") {
            pending.push(path);
        }
    }
    pending.sort();

    let mut fresh = 0;
    for path in pending {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if applied.contains(&name) {
            continue;
        }

        tracing::info!(%name, "Applying schema migration");
        conn.execute_batch(&fs::read_to_string(&path)?)?;
        conn.execute("INSERT INTO schema_migrations (name) VALUES (?)", [&name])?;
        fresh += 1;
    }

    if fresh == 0 {
        tracing::debug!("Schema is up to date");
    }

    Ok(())
}
