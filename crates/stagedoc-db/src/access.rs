//! Authorization relation-chain resolver.
//!
//! Follows document → scheduled act → scheduled day → stage → event in a
//! single LEFT JOIN query to find the owner candidates for a document. Every
//! link is optional; a document with no act chain can still be authorized via
//! its own owner column.

use sqlx::{PgPool, Row};
use stagedoc_core::models::DocumentOwners;
use stagedoc_core::AppError;

use crate::documents::DocumentSchema;

/// Read-only repository resolving owner candidates for authorization.
#[derive(Clone)]
pub struct AccessRepository {
    pool: PgPool,
    schema: DocumentSchema,
}

impl AccessRepository {
    pub fn new(pool: PgPool, schema: DocumentSchema) -> Self {
        Self { pool, schema }
    }

    fn owners_sql(&self) -> String {
        // The owner column is deployment-optional; select a typed NULL when
        // it does not exist so the row shape stays uniform.
        let document_owner = if self.schema.has_owner {
            "d.user_id"
        } else {
            "NULL::BIGINT"
        };
        format!(
            "SELECT e.user_id AS event_owner_id, {} AS document_owner_id \
             FROM documents d \
             LEFT JOIN scheduled_acts sa ON sa.id = d.scheduled_act_id \
             LEFT JOIN scheduled_days sd ON sd.id = sa.scheduled_day_id \
             LEFT JOIN stages st ON st.id = sd.stage_id \
             LEFT JOIN events e ON e.id = st.event_id \
             WHERE d.id = $1",
            document_owner
        )
    }

    /// Resolve the event-owner and document-owner candidates for a document.
    ///
    /// Returns `Ok(None)` when no document row exists at all.
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    pub async fn resolve_owners(
        &self,
        document_id: i64,
    ) -> Result<Option<DocumentOwners>, AppError> {
        let sql = self.owners_sql();
        let row = sqlx::query(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        Ok(Some(DocumentOwners {
            event_owner_id: row.try_get("event_owner_id")?,
            document_owner_id: row.try_get("document_owner_id")?,
        }))
    }
}
