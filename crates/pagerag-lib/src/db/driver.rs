use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::{Connection, OpenFlags};

use crate::db::schema::apply_migrations;

/// Where the index database lives.
pub enum DatabaseDriver {
    /// On-disk database file.
    File(PathBuf),
    /// Named shared-cache in-memory database. The anchor connection keeps it
    /// alive for as long as the driver exists.
    InMemory { uri: String, _anchor: Connection },
}

impl DatabaseDriver {
    pub fn file(path: PathBuf) -> Self {
        Self::File(path)
    }

    /// Create an in-memory database. `name` must be unique per test.
    pub fn in_memory(name: &str) -> anyhow::Result<Self> {
        let uri = format!("file:{name}?mode=memory&cache=shared");
        let anchor = open_uri(&uri)?;
        Ok(Self::InMemory {
            uri,
            _anchor: anchor,
        })
    }

    /// Whether a database exists to read from.
    pub fn is_ready(&self) -> bool {
        match self {
            Self::File(path) => path.exists(),
            Self::InMemory { .. } => true,
        }
    }

    /// Path of the database file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::InMemory { .. } => None,
        }
    }

    /// Open a connection with all migrations applied, creating the file and
    /// its parent directory if needed.
    pub fn open(&self) -> anyhow::Result<Connection> {
        let mut conn = match self {
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory {}", parent.display())
                    })?;
                }
                Connection::open(path)
                    .with_context(|| format!("Failed to open database {}", path.display()))?
            }
            Self::InMemory { uri, .. } => open_uri(uri)?,
        };
        apply_migrations(&mut conn)?;
        Ok(conn)
    }
}

fn open_uri(uri: &str) -> anyhow::Result<Connection> {
    Connection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
    )
    .with_context(|| format!("Failed to open in-memory database {uri}"))
}
