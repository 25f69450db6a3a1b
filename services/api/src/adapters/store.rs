//! services/api/src/adapters/store.rs
//!
//! The document store adapter: the concrete implementation of the
//! `DocumentStore` port over PostgreSQL using `sqlx`. Records live in one
//! `documents` table as `jsonb` payloads alongside the columns the port's
//! query shape filters on (kind discriminant, subject partition key,
//! category, activity flag).

use async_trait::async_trait;
use caretaker_core::domain::StoredDocument;
use caretaker_core::ports::{DocumentQuery, DocumentStore, PortError, PortResult};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn to_payload(document: &StoredDocument) -> PortResult<serde_json::Value> {
    serde_json::to_value(document).map_err(|e| PortError::Unexpected(e.to_string()))
}

fn from_payload(payload: serde_json::Value) -> PortResult<StoredDocument> {
    serde_json::from_value(payload)
        .map_err(|e| PortError::Unexpected(format!("malformed stored document: {e}")))
}

fn category_column(document: &StoredDocument) -> Option<String> {
    match document {
        StoredDocument::Alert(a) => Some(a.category.to_string()),
        StoredDocument::Reminder(_) => None,
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, document: StoredDocument) -> PortResult<()> {
        let payload = to_payload(&document)?;
        sqlx::query(
            "INSERT INTO documents (id, kind, subject, category, active, created_at, payload) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(document.id())
        .bind(document.kind().as_str())
        .bind(document.subject())
        .bind(category_column(&document))
        .bind(document.is_active())
        .bind(document.created_at())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn query(&self, query: DocumentQuery) -> PortResult<Vec<StoredDocument>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT payload FROM documents WHERE TRUE");
        if let Some(kind) = query.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(subject) = &query.subject {
            builder.push(" AND subject = ").push_bind(subject.clone());
        }
        if let Some(category) = query.category {
            builder
                .push(" AND category = ")
                .push_bind(category.to_string());
        }
        if query.active_only {
            builder.push(" AND active = TRUE");
        }
        if query.newest_first {
            builder.push(" ORDER BY created_at DESC");
        }
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let payloads: Vec<serde_json::Value> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        payloads.into_iter().map(from_payload).collect()
    }

    async fn read(&self, id: Uuid, subject: &str) -> PortResult<Option<StoredDocument>> {
        let payload: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT payload FROM documents WHERE id = $1 AND subject = $2")
                .bind(id)
                .bind(subject)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        payload.map(from_payload).transpose()
    }

    async fn find(&self, id: Uuid) -> PortResult<Option<StoredDocument>> {
        let payload: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT payload FROM documents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        payload.map(from_payload).transpose()
    }

    async fn replace(&self, document: StoredDocument) -> PortResult<()> {
        let payload = to_payload(&document)?;
        let result = sqlx::query(
            "UPDATE documents SET category = $3, active = $4, payload = $5 \
             WHERE id = $1 AND subject = $2",
        )
        .bind(document.id())
        .bind(document.subject())
        .bind(category_column(&document))
        .bind(document.is_active())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Document {} not found",
                document.id()
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid, subject: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND subject = $2")
            .bind(id)
            .bind(subject)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document {id} not found")));
        }
        Ok(())
    }
}
