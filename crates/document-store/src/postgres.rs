use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Document, DocumentId, DocumentQuery, DocumentStoreError, Filter, Result,
    query::SortDirection,
    store::{DocumentStore, DocumentStream},
};

/// Page size used when streaming documents out of PostgreSQL.
const STREAM_PAGE_SIZE: usize = 500;

/// PostgreSQL-backed document store.
///
/// Every collection lives in the single `documents` table with the body
/// stored as JSONB; filters are compiled into JSONB path expressions.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        let body: Value = row.try_get("body")?;
        Document::from_value(body)
    }
}

/// Parameter collected while compiling a query.
enum Bind {
    Text(String),
    Path(Vec<String>),
    Json(Value),
    Int(i64),
}

/// Accumulates SQL text and positional parameters.
struct SqlBuilder {
    sql: String,
    binds: Vec<Bind>,
}

impl SqlBuilder {
    fn new(select: &str, collection: &str) -> Self {
        Self {
            sql: format!("{select} FROM documents WHERE collection = $1"),
            binds: vec![Bind::Text(collection.to_string())],
        }
    }

    fn bind(&mut self, value: Bind) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    fn bind_path(&mut self, path: &str) -> String {
        let placeholder = self.bind(Bind::Path(split_path(path)));
        format!("{placeholder}::text[]")
    }

    fn bind_json(&mut self, value: &Value) -> String {
        let placeholder = self.bind(Bind::Json(value.clone()));
        format!("{placeholder}::jsonb")
    }

    fn push_filter(&mut self, filter: &Filter) {
        if *filter == Filter::All {
            return;
        }
        let condition = self.condition(filter);
        self.sql.push_str(" AND ");
        self.sql.push_str(&condition);
    }

    fn condition(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::All => "TRUE".to_string(),
            Filter::Eq { path, value } => self.equals(path, value),
            Filter::Ne { path, value } => {
                let equals = self.equals(path, value);
                format!("NOT COALESCE({equals}, FALSE)")
            }
            Filter::Gte { path, value } => self.compare(path, ">=", value),
            Filter::Lte { path, value } => self.compare(path, "<=", value),
            Filter::ElemMatch {
                array,
                field,
                value,
            } => {
                let element = nest(&split_path(field), value.clone());
                let contained = nest(&split_path(array), Value::Array(vec![element]));
                let p = self.bind_json(&contained);
                format!("(body @> {p})")
            }
            Filter::And(filters) if filters.is_empty() => "TRUE".to_string(),
            Filter::And(filters) => {
                let parts: Vec<String> = filters.iter().map(|f| self.condition(f)).collect();
                format!("({})", parts.join(" AND "))
            }
        }
    }

    fn equals(&mut self, path: &str, value: &Value) -> String {
        let p = self.bind_path(path);
        if value.is_null() {
            return format!("(body #> {p} IS NULL OR body #> {p} = 'null'::jsonb)");
        }
        let v = self.bind_json(value);
        format!("(body #> {p} = {v})")
    }

    fn compare(&mut self, path: &str, op: &str, value: &Value) -> String {
        let p = self.bind_path(path);
        let v = self.bind_json(value);
        format!("(jsonb_typeof(body #> {p}) = jsonb_typeof({v}) AND body #> {p} {op} {v})")
    }

    fn push_order_and_paging(&mut self, query: &DocumentQuery) {
        let mut keys = Vec::with_capacity(query.sort.len() + 1);
        for key in &query.sort {
            let p = self.bind_path(&key.path);
            keys.push(match key.direction {
                SortDirection::Ascending => format!("body #> {p} ASC NULLS FIRST"),
                SortDirection::Descending => format!("body #> {p} DESC NULLS LAST"),
            });
        }
        keys.push("inserted_at ASC, id ASC".to_string());
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(&keys.join(", "));

        if let Some(limit) = query.limit {
            let p = self.bind(Bind::Int(limit as i64));
            self.sql.push_str(&format!(" LIMIT {p}"));
        }
        if let Some(skip) = query.skip {
            let p = self.bind(Bind::Int(skip as i64));
            self.sql.push_str(&format!(" OFFSET {p}"));
        }
    }

    fn build(&self) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
        let mut query = sqlx::query(&self.sql);
        for bind in &self.binds {
            query = match bind {
                Bind::Text(s) => query.bind(s.as_str()),
                Bind::Path(p) => query.bind(p.clone()),
                Bind::Json(v) => query.bind(v.clone()),
                Bind::Int(i) => query.bind(*i),
            };
        }
        query
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

/// Wraps `leaf` in one object level per path segment.
fn nest(segments: &[String], leaf: Value) -> Value {
    segments.iter().rev().fold(leaf, |acc, segment| {
        let mut map = serde_json::Map::new();
        map.insert(segment.clone(), acc);
        Value::Object(map)
    })
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, collection: &str, mut document: Document) -> Result<DocumentId> {
        let id = document.id().unwrap_or_else(DocumentId::generate);
        document.set_id(&id);

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id.as_str())
            .bind(document.into_value())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return DocumentStoreError::DuplicateId {
                        collection: collection.to_string(),
                        id: id.clone(),
                    };
                }
                DocumentStoreError::Database(e)
            })?;

        Ok(id)
    }

    async fn find(&self, collection: &str, query: DocumentQuery) -> Result<Vec<Document>> {
        let mut builder = SqlBuilder::new("SELECT body", collection);
        builder.push_filter(&query.filter);
        builder.push_order_and_paging(&query);
        tracing::trace!(sql = %builder.sql, "find");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut builder = SqlBuilder::new("SELECT COUNT(*) AS n", collection);
        builder.push_filter(filter);

        let row = builder.build().fetch_one(&self.pool).await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stream(&self, collection: &str, query: DocumentQuery) -> Result<DocumentStream> {
        // Pages through the result set so the stream owns all its state
        let store = self.clone();
        let collection = collection.to_string();
        let start = (query.skip.unwrap_or(0), query.limit);

        let pages = futures_util::stream::try_unfold(start, move |(offset, remaining)| {
            let store = store.clone();
            let collection = collection.clone();
            let query = query.clone();
            async move {
                if remaining == Some(0) {
                    return Ok::<_, DocumentStoreError>(None);
                }
                let page_size = remaining.map_or(STREAM_PAGE_SIZE, |r| r.min(STREAM_PAGE_SIZE));
                let page = store
                    .find(&collection, query.skip(offset).limit(page_size))
                    .await?;
                if page.is_empty() {
                    return Ok(None);
                }
                let fetched = page.len();
                Ok(Some((page, (offset + fetched, remaining.map(|r| r - fetched)))))
            }
        });

        let documents = pages
            .map_ok(|page| futures_util::stream::iter(page.into_iter().map(Ok::<_, DocumentStoreError>)))
            .try_flatten();

        Ok(documents.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nest_builds_containment_document() {
        let element = nest(&split_path("order_id"), json!(1001));
        let contained = nest(&split_path("orders"), Value::Array(vec![element]));
        assert_eq!(contained, json!({"orders": [{"order_id": 1001}]}));
    }

    #[test]
    fn filter_compiles_to_numbered_parameters() {
        let mut builder = SqlBuilder::new("SELECT body", "btw_orders");
        builder.push_filter(
            &Filter::gte("date_created", "2025-08-01 00:00:00")
                .and(Filter::ne("order_status_id", 4)),
        );

        assert!(builder.sql.starts_with(
            "SELECT body FROM documents WHERE collection = $1 AND ((jsonb_typeof(body #> $2::text[])"
        ));
        assert!(builder.sql.contains("NOT COALESCE((body #> $4::text[] = $5::jsonb), FALSE)"));
        assert_eq!(builder.binds.len(), 5);
    }

    #[test]
    fn all_filter_adds_no_condition() {
        let mut builder = SqlBuilder::new("SELECT body", "c");
        builder.push_filter(&Filter::All);
        assert_eq!(builder.sql, "SELECT body FROM documents WHERE collection = $1");
    }

    #[test]
    fn paging_appends_order_limit_and_offset() {
        let mut builder = SqlBuilder::new("SELECT body", "c");
        builder.push_order_and_paging(&DocumentQuery::new().sort_desc("created_date").skip(10).limit(5));
        assert!(builder.sql.ends_with(
            "ORDER BY body #> $2::text[] DESC NULLS LAST, inserted_at ASC, id ASC LIMIT $3 OFFSET $4"
        ));
    }
}
