#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::RagError;
use crate::pipeline::corpus::Chunk;
use crate::pipeline::index::{EmbeddedChunk, SimilarityIndex};

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Metadata recorded alongside a committed index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    pub dimension: usize,
    pub row_count: usize,
    /// Model identifier of the embedder used for the build.
    pub embedder: String,
    /// RFC 3339 timestamp of the commit.
    pub built_at: String,
}

/// Replace the stored index with `index`.
///
/// The old rows are deleted and the new ones written in a single
/// transaction, so a failure leaves the previous build untouched.
pub fn persist_index(
    conn: &mut Connection,
    index: &SimilarityIndex,
    embedder: &str,
) -> anyhow::Result<IndexMeta> {
    let meta = IndexMeta {
        dimension: index.dimension(),
        row_count: index.len(),
        embedder: embedder.to_string(),
        built_at: jiff::Timestamp::now().to_string(),
    };

    let tx = conn.transaction().context("Failed to begin index transaction")?;
    let deleted = tx
        .execute("DELETE FROM chunks", [])
        .context("Failed to clear previous index")?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO chunks (id, source_path, document_index, page_index, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .context("Failed to prepare chunk insert")?;
        for (position, row) in index.rows().iter().enumerate() {
            stmt.execute(params![
                position as i64,
                row.chunk.source_path,
                row.chunk.document_index as i64,
                row.chunk.page_index as i64,
                row.chunk.chunk_text,
                encode_embedding(&row.embedding),
            ])
            .with_context(|| format!("Failed to insert chunk {position}"))?;
        }
    }
    tx.execute(
        "INSERT INTO index_meta (id, dimension, row_count, embedder, built_at)
         VALUES (1, ?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           dimension = excluded.dimension,
           row_count = excluded.row_count,
           embedder = excluded.embedder,
           built_at = excluded.built_at",
        params![
            meta.dimension as i64,
            meta.row_count as i64,
            meta.embedder,
            meta.built_at,
        ],
    )
    .context("Failed to write index metadata")?;
    tx.commit().context("Failed to commit index")?;

    info!(
        rows = meta.row_count,
        dimension = meta.dimension,
        replaced = deleted,
        "Index persisted"
    );
    Ok(meta)
}

/// Metadata of the last committed build, if any.
pub fn read_index_meta(conn: &Connection) -> anyhow::Result<Option<IndexMeta>> {
    conn.query_row(
        "SELECT dimension, row_count, embedder, built_at FROM index_meta WHERE id = 1",
        [],
        |row| {
            Ok(IndexMeta {
                dimension: row.get::<_, i64>(0)? as usize,
                row_count: row.get::<_, i64>(1)? as usize,
                embedder: row.get(2)?,
                built_at: row.get(3)?,
            })
        },
    )
    .optional()
    .context("Failed to read index metadata")
}

/// Load the committed index.
///
/// Fails with [`RagError::IndexNotBuilt`] when no build has been committed.
pub fn load_index(conn: &Connection) -> anyhow::Result<SimilarityIndex> {
    let Some(meta) = read_index_meta(conn)? else {
        return Err(RagError::IndexNotBuilt.into());
    };

    let mut stmt = conn
        .prepare(
            "SELECT source_path, document_index, page_index, content, embedding
             FROM chunks ORDER BY id",
        )
        .context("Failed to prepare index load")?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                Chunk {
                    source_path: row.get(0)?,
                    document_index: row.get::<_, i64>(1)? as usize,
                    page_index: row.get::<_, i64>(2)? as usize,
                    chunk_text: row.get(3)?,
                },
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read index rows")?;

    anyhow::ensure!(
        raw.len() == meta.row_count,
        "Index is inconsistent: metadata says {} rows, found {}",
        meta.row_count,
        raw.len()
    );

    let mut rows = Vec::with_capacity(raw.len());
    for (chunk, blob) in raw {
        let embedding = decode_embedding(&blob)?;
        if embedding.len() != meta.dimension {
            return Err(RagError::DimensionMismatch {
                expected: meta.dimension,
                actual: embedding.len(),
            }
            .into());
        }
        rows.push(EmbeddedChunk { chunk, embedding });
    }

    let index = SimilarityIndex::from_rows(rows)?;
    debug!(
        rows = index.len(),
        dimension = index.dimension(),
        built_at = %meta.built_at,
        "Index loaded"
    );
    Ok(index)
}

/// Little-endian `f32` bytes; lossless.
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> anyhow::Result<Vec<f32>> {
    anyhow::ensure!(
        blob.len() % F32_BYTES == 0,
        "Embedding blob of {} bytes is not a whole number of f32 values",
        blob.len()
    );
    Ok(blob
        .chunks_exact(F32_BYTES)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
