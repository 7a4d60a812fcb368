use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

/// Define all schema migrations.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // v1: chunk table + single-row build metadata
        M::up(
            "CREATE TABLE chunks (
                id               INTEGER PRIMARY KEY,
                source_path      TEXT NOT NULL,
                document_index   INTEGER NOT NULL,
                page_index       INTEGER NOT NULL,
                content          TEXT NOT NULL,
                embedding        BLOB NOT NULL
            );

            CREATE TABLE index_meta (
                id               INTEGER PRIMARY KEY CHECK (id = 1),
                dimension        INTEGER NOT NULL,
                row_count        INTEGER NOT NULL,
                embedder         TEXT NOT NULL,
                built_at         TEXT NOT NULL
            );",
        ),
    ])
}

/// Apply all pending migrations to the database.
pub fn apply_migrations(conn: &mut Connection) -> anyhow::Result<()> {
    migrations()
        .to_latest(conn)
        .map_err(|e| anyhow::anyhow!("Failed to apply migrations: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn migrations_are_valid() {
        migrations().validate().unwrap();
    }

    #[test]
    fn apply_migrations_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        assert!(table_exists(&conn, "chunks"));
        assert!(table_exists(&conn, "index_meta"));
    }

    #[test]
    fn apply_migrations_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        apply_migrations(&mut conn).unwrap();
    }

    #[test]
    fn index_meta_holds_one_row() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO index_meta (id, dimension, row_count, embedder, built_at)
             VALUES (1, 3, 0, 'x', 'now')",
            [],
        )
        .unwrap();
        let second = conn.execute(
            "INSERT INTO index_meta (id, dimension, row_count, embedder, built_at)
             VALUES (2, 3, 0, 'x', 'now')",
            [],
        );
        assert!(second.is_err());
    }
}
