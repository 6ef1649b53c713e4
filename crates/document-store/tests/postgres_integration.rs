//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container; each test works in its own
//! collection so they can run in parallel.
//!
//! ```bash
//! cargo test -p document-store --test postgres_integration
//! ```

use std::sync::Arc;

use document_store::{
    Document, DocumentId, DocumentQuery, DocumentStore, DocumentStoreError, DocumentStoreExt,
    Filter, PostgresDocumentStore,
};
use futures_util::TryStreamExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_documents_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresDocumentStore {
    let info = get_container_info().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();
    PostgresDocumentStore::new(pool)
}

/// A collection name no other test uses.
fn fresh_collection(prefix: &str) -> String {
    format!("{prefix}_{}", DocumentId::generate())
}

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

async fn seed_orders(store: &PostgresDocumentStore, collection: &str) {
    store
        .insert_many(
            collection,
            vec![
                doc(json!({
                    "_id": "o1", "full_order_code": "WN1", "order_status_id": 1,
                    "date_created": "2025-08-01 10:00:00", "created_date": "2025-08-01 10:00:00"
                })),
                doc(json!({
                    "_id": "o2", "full_order_code": "WN1", "order_status_id": 4,
                    "date_created": "2025-08-05 10:00:00", "created_date": "2025-08-05 10:00:00"
                })),
                doc(json!({
                    "_id": "o3", "full_order_code": "WN2",
                    "date_created": "2025-09-01 10:00:00", "created_date": "2025-09-01 10:00:00"
                })),
            ],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn insert_and_find_by_id() {
    let store = get_test_store().await;
    let collection = fresh_collection("insert");

    let id = store
        .insert(&collection, doc(json!({"name": "Nareeya"})))
        .await
        .unwrap();

    let found = store.find_by_id(&collection, &id).await.unwrap().unwrap();
    assert_eq!(found.id(), Some(id));
    assert_eq!(found.get("name"), Some(&json!("Nareeya")));
}

#[tokio::test]
async fn duplicate_id_is_rejected() {
    let store = get_test_store().await;
    let collection = fresh_collection("dup");

    store
        .insert(&collection, doc(json!({"_id": "x"})))
        .await
        .unwrap();
    let err = store
        .insert(&collection, doc(json!({"_id": "x"})))
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::DuplicateId { .. }));
}

#[tokio::test]
async fn newest_first_with_limit() {
    let store = get_test_store().await;
    let collection = fresh_collection("orders");
    seed_orders(&store, &collection).await;

    let newest = store
        .find_one(
            &collection,
            DocumentQuery::matching(Filter::eq("full_order_code", "WN1")).sort_desc("created_date"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(newest.id(), Some(DocumentId::new("o2")));
}

#[tokio::test]
async fn range_and_not_equal_filters() {
    let store = get_test_store().await;
    let collection = fresh_collection("orders");
    seed_orders(&store, &collection).await;

    let filter = Filter::gte("date_created", "2025-08-01 00:00:00")
        .and(Filter::lte("date_created", "2025-08-31 23:59:59"))
        .and(Filter::ne("order_status_id", 4));

    assert_eq!(store.count(&collection, &filter).await.unwrap(), 1);

    let docs = store
        .find(&collection, DocumentQuery::matching(filter))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id(), Some(DocumentId::new("o1")));
}

#[tokio::test]
async fn ne_matches_missing_field() {
    let store = get_test_store().await;
    let collection = fresh_collection("orders");
    seed_orders(&store, &collection).await;

    let count = store
        .count(&collection, &Filter::ne("order_status_id", 4))
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn elem_match_on_nested_order_id() {
    let store = get_test_store().await;
    let collection = fresh_collection("profiles");

    store
        .insert_many(
            &collection,
            vec![
                doc(json!({"_id": "cust_0", "orders": [{"order_id": 1001}, {"order_id": 1002}]})),
                doc(json!({"_id": "cust_1", "orders": [{"order_id": 2001}]})),
                doc(json!({"_id": "cust_2", "orders": []})),
            ],
        )
        .await
        .unwrap();

    let found = store
        .find_one(
            &collection,
            DocumentQuery::matching(Filter::elem_match("orders", "order_id", 1002)),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), Some(DocumentId::new("cust_0")));

    let missing = store
        .find_one(
            &collection,
            DocumentQuery::matching(Filter::elem_match("orders", "order_id", 9999)),
        )
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn delete_by_id_reports_result() {
    let store = get_test_store().await;
    let collection = fresh_collection("orders");
    seed_orders(&store, &collection).await;

    let id = DocumentId::new("o3");
    assert!(store.delete_by_id(&collection, &id).await.unwrap());
    assert!(!store.delete_by_id(&collection, &id).await.unwrap());
    assert_eq!(store.count(&collection, &Filter::All).await.unwrap(), 2);
}

#[tokio::test]
async fn stream_pages_through_all_documents() {
    let store = get_test_store().await;
    let collection = fresh_collection("stream");

    let docs: Vec<Document> = (0..1200)
        .map(|i| doc(json!({"_id": format!("d{i:04}"), "seq": i})))
        .collect();
    store.insert_many(&collection, docs).await.unwrap();

    let streamed: Vec<Document> = store
        .stream(&collection, DocumentQuery::new().sort_asc("seq").skip(100).limit(1050))
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(streamed.len(), 1050);
    assert_eq!(streamed[0].get("seq"), Some(&json!(100)));
    assert_eq!(streamed[1049].get("seq"), Some(&json!(1149)));
}
