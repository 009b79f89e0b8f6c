//! Diesel-backed document store for SQLite.
//!
//! Every document is one row holding its JSON body. Filters, ordering and
//! atomic increments are expressed with SQLite's JSON1 functions so that no
//! operation needs a read-modify-write round trip.

use async_trait::async_trait;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::Sqlite;
use diesel::QueryableByName;
use diesel_async::{AsyncConnection, RunQueryDsl, SimpleAsyncConnection};
use serde_json::Value;
use tracing::debug;

use super::backend::{
    validate_field_name, validate_updates, DocumentStore, FieldUpdate, Fields, Filter, OrderBy,
    Query, StoreError, StoreResult, WriteOp, MAX_BATCH_SIZE,
};
use super::pool::{SqliteConn, SqlitePool};
use super::Document;

#[derive(QueryableByName)]
struct DocumentRow {
    #[diesel(sql_type = Text)]
    id: String,
    #[diesel(sql_type = Text)]
    body: String,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

impl DocumentRow {
    fn into_document(self) -> StoreResult<Document> {
        let fields = match serde_json::from_str::<Value>(&self.body)? {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        };
        Ok(Document::new(self.id, fields))
    }
}

enum Bind {
    Text(String),
    Int(i64),
}

/// SQL text plus its positional binds, assembled in textual order.
struct Statement {
    sql: String,
    binds: Vec<Bind>,
}

impl Statement {
    fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            binds: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    fn text(&mut self, value: impl Into<String>) -> &mut Self {
        self.binds.push(Bind::Text(value.into()));
        self
    }

    fn int(&mut self, value: i64) -> &mut Self {
        self.binds.push(Bind::Int(value));
        self
    }

    fn json(&mut self, value: &Value) -> &mut Self {
        self.text(value.to_string())
    }

    fn path(&mut self, field: &str) -> &mut Self {
        self.text(json_path(field))
    }

    fn build(self) -> BoxedSqlQuery<'static, Sqlite, SqlQuery> {
        let mut query = diesel::sql_query(self.sql).into_boxed::<Sqlite>();
        for bind in self.binds {
            query = match bind {
                Bind::Text(value) => query.bind::<Text, _>(value),
                Bind::Int(value) => query.bind::<BigInt, _>(value),
            };
        }
        query
    }
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

fn push_filters(stmt: &mut Statement, filters: &[Filter]) {
    for filter in filters {
        stmt.push(" AND json_extract(body, ?) = json_extract(?, '$')")
            .path(&filter.field)
            .json(&filter.value);
    }
}

fn update_statement(collection: &str, id: &str, updates: &[(String, FieldUpdate)]) -> Statement {
    let mut stmt = Statement::new("UPDATE documents SET body = json_set(body");
    for (field, update) in updates {
        match update {
            FieldUpdate::Set(value) => {
                stmt.push(", ?, json(?)").path(field).json(value);
            }
            FieldUpdate::Increment(by) => {
                stmt.push(", ?, COALESCE(json_extract(body, ?), 0) + ?")
                    .path(field)
                    .path(field)
                    .int(*by);
            }
        }
    }
    stmt.push(") WHERE collection = ? AND id = ?")
        .text(collection)
        .text(id);
    stmt
}

fn delete_statement(collection: &str, id: &str) -> Statement {
    let mut stmt = Statement::new("DELETE FROM documents WHERE collection = ? AND id = ?");
    stmt.text(collection).text(id);
    stmt
}

/// Document store persisted in a SQLite database.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a store at a database URL and make sure its schema exists.
    pub async fn open(database_url: &str) -> StoreResult<Self> {
        let store = Self::new(SqlitePool::new(database_url));
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the documents table if it doesn't exist.
    pub async fn init_schema(&self) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn execute_op(conn: &mut SqliteConn, collection: &str, op: WriteOp) -> StoreResult<()> {
        match op {
            WriteOp::Update { id, updates } => {
                if updates.is_empty() {
                    return Ok(());
                }
                let rows = update_statement(collection, &id, &updates)
                    .build()
                    .execute(conn)
                    .await?;
                if rows == 0 {
                    return Err(StoreError::NotFound(id));
                }
            }
            WriteOp::Delete { id } => {
                delete_statement(collection, &id).build().execute(conn).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut conn = self.pool.get().await?;
        let mut stmt =
            Statement::new("SELECT id, body FROM documents WHERE collection = ? AND id = ?");
        stmt.text(collection).text(id);

        let rows: Vec<DocumentRow> = stmt.build().load(&mut conn).await?;
        rows.into_iter().next().map(DocumentRow::into_document).transpose()
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        query.validate()?;

        let mut stmt = Statement::new("SELECT id, body FROM documents WHERE collection = ?");
        stmt.text(collection);
        push_filters(&mut stmt, &query.filters);

        if let Some(cursor) = &query.start_after {
            match &query.order_by {
                OrderBy::DocumentId => {
                    stmt.push(" AND id > ?").text(cursor.id.as_str());
                }
                OrderBy::Field(field) => match cursor.get(field) {
                    Some(value) if !value.is_null() => {
                        stmt.push(
                            " AND (json_extract(body, ?) > json_extract(?, '$') \
                             OR (json_extract(body, ?) = json_extract(?, '$') AND id > ?))",
                        )
                        .path(field)
                        .json(value)
                        .path(field)
                        .json(value)
                        .text(cursor.id.as_str());
                    }
                    _ => {
                        stmt.push(" AND (json_extract(body, ?) IS NOT NULL OR id > ?)")
                            .path(field)
                            .text(cursor.id.as_str());
                    }
                },
            }
        }

        match &query.order_by {
            OrderBy::DocumentId => {
                stmt.push(" ORDER BY id");
            }
            OrderBy::Field(field) => {
                stmt.push(" ORDER BY json_extract(body, ?), id").path(field);
            }
        }

        let limit = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        stmt.push(" LIMIT ? OFFSET ?").int(limit).int(offset);

        let mut conn = self.pool.get().await?;
        let rows: Vec<DocumentRow> = stmt.build().load(&mut conn).await?;
        debug!(collection, rows = rows.len(), "query complete");
        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = serde_json::to_string(&Value::Object(fields))?;

        let mut stmt =
            Statement::new("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)");
        stmt.text(collection).text(id.as_str()).text(body);

        let mut conn = self.pool.get().await?;
        stmt.build().execute(&mut conn).await?;
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> StoreResult<()> {
        validate_updates(&updates)?;
        if updates.is_empty() {
            return match self.get(collection, id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound(id.to_string())),
            };
        }

        let mut conn = self.pool.get().await?;
        let rows = update_statement(collection, id, &updates)
            .build()
            .execute(&mut conn)
            .await?;
        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut conn = self.pool.get().await?;
        let rows = delete_statement(collection, id)
            .build()
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }

    async fn commit_batch(&self, collection: &str, ops: Vec<WriteOp>) -> StoreResult<()> {
        if ops.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge(ops.len()));
        }
        for op in &ops {
            if let WriteOp::Update { updates, .. } = op {
                validate_updates(updates)?;
            }
        }

        let op_count = ops.len();
        let mut conn = self.pool.get().await?;
        conn.transaction(|conn| {
            Box::pin(async move {
                for op in ops {
                    Self::execute_op(conn, collection, op).await?;
                }
                Ok::<(), StoreError>(())
            })
        })
        .await?;

        debug!(collection, ops = op_count, "batch committed");
        Ok(())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> StoreResult<u64> {
        for filter in filters {
            validate_field_name(&filter.field)?;
        }

        let mut stmt =
            Statement::new("SELECT COUNT(*) AS count FROM documents WHERE collection = ?");
        stmt.text(collection);
        push_filters(&mut stmt, filters);

        let mut conn = self.pool.get().await?;
        let rows: Vec<CountRow> = stmt.build().load(&mut conn).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|r| r.count.max(0) as u64)
            .unwrap_or(0))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute("SELECT 1;")
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
