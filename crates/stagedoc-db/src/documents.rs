//! Document record locator.
//!
//! The `documents` table varies across deployments: `original_name`,
//! `file_size`, and `user_id` may be absent. [`DocumentSchema::detect`] probes
//! `information_schema` once at startup and the repositories build their
//! SELECT lists from that adapter, so per-request queries only name columns
//! that actually exist.

use sqlx::{PgPool, Row};
use stagedoc_core::models::DocumentRecord;
use stagedoc_core::AppError;

const OPTIONAL_COLUMNS: &[&str] = &["original_name", "file_size", "user_id"];

/// Which optional `documents` columns exist in this deployment.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSchema {
    pub has_original_name: bool,
    pub has_file_size: bool,
    pub has_owner: bool,
}

impl DocumentSchema {
    /// Probe `information_schema.columns` for the optional columns.
    /// Runs once at startup; the result is shared by all repositories.
    pub async fn detect(pool: &PgPool) -> Result<Self, AppError> {
        let names: Vec<String> = OPTIONAL_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = sqlx::query(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = 'documents' AND column_name = ANY($1)",
        )
        .bind(&names)
        .fetch_all(pool)
        .await?;

        let mut schema = DocumentSchema {
            has_original_name: false,
            has_file_size: false,
            has_owner: false,
        };
        for row in rows {
            let name: String = row.try_get("column_name")?;
            match name.as_str() {
                "original_name" => schema.has_original_name = true,
                "file_size" => schema.has_file_size = true,
                "user_id" => schema.has_owner = true,
                _ => {}
            }
        }

        tracing::info!(
            has_original_name = schema.has_original_name,
            has_file_size = schema.has_file_size,
            has_owner = schema.has_owner,
            "Detected documents schema"
        );

        Ok(schema)
    }

    /// Schema with every optional column present (tests, fixed deployments).
    pub fn full() -> Self {
        DocumentSchema {
            has_original_name: true,
            has_file_size: true,
            has_owner: true,
        }
    }

    /// SELECT list for loading a document record, restricted to columns that
    /// exist; absent columns are selected as typed NULLs so row mapping stays
    /// uniform.
    fn select_list(&self) -> String {
        let original_name = if self.has_original_name {
            "original_name"
        } else {
            "NULL::TEXT AS original_name"
        };
        let file_size = if self.has_file_size {
            "file_size"
        } else {
            "NULL::BIGINT AS file_size"
        };
        let owner = if self.has_owner {
            "user_id"
        } else {
            "NULL::BIGINT AS user_id"
        };
        format!(
            "id, title, {}, media_type, {}, {}, external_url, storage_key, local_path",
            original_name, file_size, owner
        )
    }
}

/// Read-only repository for document metadata.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
    schema: DocumentSchema,
}

impl DocumentRepository {
    pub fn new(pool: PgPool, schema: DocumentSchema) -> Self {
        Self { pool, schema }
    }

    /// Load one document's metadata.
    ///
    /// Returns `Ok(None)` when the row is missing - including the benign race
    /// where it disappeared between the authorization check and this load.
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    pub async fn get(&self, document_id: i64) -> Result<Option<DocumentRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE id = $1",
            self.schema.select_list()
        );

        let row = sqlx::query(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        Ok(Some(DocumentRecord {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            original_name: row.try_get("original_name")?,
            media_type: row.try_get("media_type")?,
            file_size: row.try_get("file_size")?,
            owner_id: row.try_get("user_id")?,
            external_url: row.try_get("external_url")?,
            storage_key: row.try_get("storage_key")?,
            local_path: row.try_get("local_path")?,
        }))
    }
}
