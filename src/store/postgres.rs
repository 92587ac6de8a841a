//! PostgreSQL document store: one table per collection inside `STORE_SCHEMA`, attributes as JSONB.

use crate::config::CollectionKind;
use crate::document::{generate_key, generate_rev, handle, Document, DocumentBody};
use crate::error::StoreError;
use crate::store::DocumentStore;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;

const COLUMNS: &str = "_key, _rev, _from, _to, attributes";

pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    pub async fn connect(database_url: &str, schema: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, schema))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Schema-qualified, quoted table name for a collection.
    fn table(&self, collection: &str) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(collection))
    }
}

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Map engine error codes onto the store taxonomy; anything else stays a raw database error.
fn classify(err: sqlx::Error, collection: &str, key: &str) -> StoreError {
    let code = match &err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    };
    match code.as_deref() {
        Some("23505") => StoreError::DuplicateKey {
            collection: collection.to_string(),
            key: key.to_string(),
        },
        Some("42P01") => StoreError::CollectionNotFound(collection.to_string()),
        Some("42P07") => StoreError::DuplicateCollection(collection.to_string()),
        Some("23514") => StoreError::InvalidEdge(collection.to_string()),
        _ => StoreError::Database(err),
    }
}

fn not_found(collection: &str, key: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

fn row_to_document(collection: &str, row: &PgRow) -> Result<Document, StoreError> {
    let key: String = row.try_get("_key")?;
    let attributes: Json<Map<String, Value>> = row.try_get("attributes")?;
    Ok(Document {
        id: handle(collection, &key),
        key,
        rev: row.try_get("_rev")?,
        from: row.try_get("_from")?,
        to: row.try_get("_to")?,
        attributes: attributes.0,
    })
}

impl PgStore {
    /// Lock the row and check its revision inside `tx`.
    async fn lock_for_write(
        &self,
        tx: &mut sqlx::PgConnection,
        collection: &str,
        key: &str,
        expected_rev: Option<&str>,
    ) -> Result<(), StoreError> {
        let sql = format!("SELECT _rev FROM {} WHERE _key = $1 FOR UPDATE", self.table(collection));
        tracing::debug!(sql = %sql, key = %key, "query (tx)");
        let current: Option<(String,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify(e, collection, key))?;
        let (rev,) = current.ok_or_else(|| not_found(collection, key))?;
        if let Some(expected) = expected_rev {
            if expected != rev {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(&self.schema)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), StoreError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(&self.schema)))
            .execute(&self.pool)
            .await?;
        let edge_check = match kind {
            CollectionKind::Edge => ",\n                CHECK (_from IS NOT NULL AND _to IS NOT NULL)",
            CollectionKind::Document => "",
        };
        let table = self.table(name);
        let ddl = format!(
            r#"
            CREATE TABLE {} (
                _key TEXT PRIMARY KEY,
                _rev TEXT NOT NULL,
                _from TEXT,
                _to TEXT,
                attributes JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(){}
            )
            "#,
            table, edge_check
        );
        tracing::debug!(sql = %ddl, "ddl");
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, name, ""))?;
        if kind == CollectionKind::Edge {
            // Unnamed so the server picks a unique name that fits its identifier limit.
            for column in ["_from", "_to"] {
                let index = format!("CREATE INDEX ON {} ({})", table, column);
                sqlx::query(&index).execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<(), StoreError> {
        let sql = format!("DROP TABLE {}", self.table(name));
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, name, ""))?;
        Ok(())
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let sql = format!("SELECT {} FROM {}", COLUMNS, self.table(collection));
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, collection, ""))?;
        rows.iter().map(|r| row_to_document(collection, r)).collect()
    }

    async fn insert(&self, collection: &str, body: DocumentBody) -> Result<Document, StoreError> {
        let key = body.key.clone().unwrap_or_else(generate_key);
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            self.table(collection),
            COLUMNS,
            COLUMNS
        );
        tracing::debug!(sql = %sql, key = %key, "query");
        let row = sqlx::query(&sql)
            .bind(&key)
            .bind(generate_rev())
            .bind(body.from)
            .bind(body.to)
            .bind(Json(body.attributes))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, collection, &key))?;
        row_to_document(collection, &row)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Document, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE _key = $1", COLUMNS, self.table(collection));
        tracing::debug!(sql = %sql, key = %key, "query");
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, collection, key))?
            .ok_or_else(|| not_found(collection, key))?;
        row_to_document(collection, &row)
    }

    async fn replace(
        &self,
        collection: &str,
        key: &str,
        body: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<Document, StoreError> {
        let mut tx = self.pool.begin().await?;
        self.lock_for_write(&mut tx, collection, key, expected_rev).await?;
        let sql = format!(
            "UPDATE {} SET _rev = $2, _from = $3, _to = $4, attributes = $5, updated_at = NOW() WHERE _key = $1 RETURNING {}",
            self.table(collection),
            COLUMNS
        );
        tracing::debug!(sql = %sql, key = %key, "query (tx)");
        let row = sqlx::query(&sql)
            .bind(key)
            .bind(generate_rev())
            .bind(body.from)
            .bind(body.to)
            .bind(Json(body.attributes))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(e, collection, key))?;
        let doc = row_to_document(collection, &row)?;
        tx.commit().await?;
        Ok(doc)
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        self.lock_for_write(&mut tx, collection, key, expected_rev).await?;
        let sql = format!(
            "UPDATE {} SET _rev = $2, _from = COALESCE($3, _from), _to = COALESCE($4, _to), attributes = attributes || $5, updated_at = NOW() WHERE _key = $1",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, key = %key, "query (tx)");
        sqlx::query(&sql)
            .bind(key)
            .bind(generate_rev())
            .bind(patch.from)
            .bind(patch.to)
            .bind(Json(patch.attributes))
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, collection, key))?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE _key = $1", self.table(collection));
        tracing::debug!(sql = %sql, key = %key, "query");
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, collection, key))?;
        if result.rows_affected() == 0 {
            return Err(not_found(collection, key));
        }
        Ok(())
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let Some((admin_url, db_name)) = parse_db_name_from_url(database_url) else {
        return Ok(());
    };
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Option<(String, String)> {
    let scheme_end = url.find("://")? + 3;
    let path_start = url[scheme_end..].find('/')? + scheme_end + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Some((format!("{}postgres", base), db_name.to_string()))
}
