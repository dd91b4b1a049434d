use crate::{
    config::DatabaseConfig,
    db::{
        Document, Record, UpdatePatch,
        backend::{
            Backend, BackendKind, BackendTransaction, DEFAULT_MAX_ATTEMPTS, MemoryBackend,
            open_backend,
        },
        query::{FilterOp, PageSpec, Predicate, QueryPlan},
    },
    error::{ErrorClass, ErrorDetail, StoreError},
    value::Value,
};

const PRODUCTS: &str = "Product";

fn product(stock: i64) -> Record {
    Record::new().with("name", "Mat").with("stock", stock)
}

fn stock_of(doc: Option<Document>) -> Option<i64> {
    doc.and_then(|doc| doc.data.get("stock").and_then(Value::as_i64))
}

#[tokio::test]
async fn create_with_id_rejects_existing_id() {
    let backend = MemoryBackend::new();
    backend.create_with_id(PRODUCTS, "p1", product(5)).await.unwrap();

    let err = backend
        .create_with_id(PRODUCTS, "p1", product(9))
        .await
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Conflict);
    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Store(StoreError::AlreadyExists { .. }))
    ));
    assert_eq!(stock_of(backend.get(PRODUCTS, "p1").await.unwrap()), Some(5));
}

#[tokio::test]
async fn generated_ids_are_unique() {
    let backend = MemoryBackend::new();
    let a = backend.create(PRODUCTS, product(1)).await.unwrap();
    let b = backend.create(PRODUCTS, product(1)).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(backend.document_count(PRODUCTS).await, 2);
}

#[tokio::test]
async fn update_of_missing_document_is_not_found() {
    let backend = MemoryBackend::new();
    let err = backend
        .update(PRODUCTS, "nope", &UpdatePatch::new().set("stock", 1))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_keeps_create_time() {
    let backend = MemoryBackend::new();
    backend.create_with_id(PRODUCTS, "p1", product(5)).await.unwrap();
    let before = backend.get(PRODUCTS, "p1").await.unwrap().unwrap();

    backend
        .update(PRODUCTS, "p1", &UpdatePatch::new().set("stock", 4))
        .await
        .unwrap();
    let after = backend.get(PRODUCTS, "p1").await.unwrap().unwrap();

    assert_eq!(after.create_time, before.create_time);
    assert!(after.update_time >= before.update_time);
    assert_eq!(after.data.get("stock"), Some(&Value::Int(4)));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let backend = MemoryBackend::new();
    backend.create_with_id(PRODUCTS, "p1", product(5)).await.unwrap();

    backend.delete(PRODUCTS, "p1").await.unwrap();
    backend.delete(PRODUCTS, "p1").await.unwrap();

    assert!(backend.get(PRODUCTS, "p1").await.unwrap().is_none());
}

#[tokio::test]
async fn get_all_is_positional() {
    let backend = MemoryBackend::new();
    backend.create_with_id(PRODUCTS, "a", product(1)).await.unwrap();
    backend.create_with_id(PRODUCTS, "c", product(3)).await.unwrap();

    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let docs = backend.get_all(PRODUCTS, &ids).await.unwrap();

    let stocks: Vec<_> = docs.into_iter().map(stock_of).collect();
    assert_eq!(stocks, vec![Some(1), None, Some(3)]);
}

#[tokio::test]
async fn staged_writes_are_invisible_until_commit() {
    let backend = MemoryBackend::new();
    backend.create_with_id(PRODUCTS, "p1", product(5)).await.unwrap();

    let mut tx = backend.begin().await.unwrap();
    tx.update(PRODUCTS, "p1", &UpdatePatch::new().set("stock", 2))
        .await
        .unwrap();

    assert_eq!(stock_of(tx.get(PRODUCTS, "p1").await.unwrap()), Some(2));
    assert_eq!(stock_of(backend.get(PRODUCTS, "p1").await.unwrap()), Some(5));

    tx.commit().await.unwrap();
    assert_eq!(stock_of(backend.get(PRODUCTS, "p1").await.unwrap()), Some(2));
}

#[tokio::test]
async fn rollback_discards_staged_writes() {
    let backend = MemoryBackend::new();

    let mut tx = backend.begin().await.unwrap();
    tx.create_with_id(PRODUCTS, "p1", product(5)).await.unwrap();
    tx.rollback().await;

    assert!(backend.get(PRODUCTS, "p1").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_modification_aborts_commit() {
    let backend = MemoryBackend::new();
    backend.create_with_id(PRODUCTS, "p1", product(5)).await.unwrap();

    let mut tx = backend.begin().await.unwrap();
    tx.get(PRODUCTS, "p1").await.unwrap();
    tx.update(PRODUCTS, "p1", &UpdatePatch::new().set("stock", 2))
        .await
        .unwrap();

    backend
        .update(PRODUCTS, "p1", &UpdatePatch::new().set("stock", 4))
        .await
        .unwrap();

    let err = tx.commit().await.unwrap_err();
    assert_eq!(err.class, ErrorClass::Conflict);
    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Store(StoreError::VersionMismatch { .. }))
    ));
    assert_eq!(stock_of(backend.get(PRODUCTS, "p1").await.unwrap()), Some(4));
}

#[tokio::test]
async fn absent_read_conflicts_with_concurrent_create() {
    let backend = MemoryBackend::new();

    let mut tx = backend.begin().await.unwrap();
    assert!(tx.get(PRODUCTS, "p1").await.unwrap().is_none());
    tx.create_with_id(PRODUCTS, "p1", product(1)).await.unwrap();

    backend.create_with_id(PRODUCTS, "p1", product(7)).await.unwrap();

    assert!(tx.commit().await.unwrap_err().is_conflict());
    assert_eq!(stock_of(backend.get(PRODUCTS, "p1").await.unwrap()), Some(7));
}

#[tokio::test]
async fn transaction_query_sees_staged_documents() {
    let backend = MemoryBackend::new();
    backend.create_with_id(PRODUCTS, "a", product(0)).await.unwrap();

    let plan = QueryPlan {
        filters: vec![Predicate::new("stock", FilterOp::Gte, 1)],
        sort: None,
        page: PageSpec {
            offset: 0,
            limit: 10,
        },
    };

    let mut tx = backend.begin().await.unwrap();
    tx.create_with_id(PRODUCTS, "b", product(3)).await.unwrap();
    tx.update(PRODUCTS, "a", &UpdatePatch::new().set("stock", 2))
        .await
        .unwrap();

    let ids: Vec<_> = tx
        .query(PRODUCTS, &plan)
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);

    assert!(backend.query(PRODUCTS, &plan).await.unwrap().is_empty());
}

#[test]
fn backend_kind_parses_case_insensitively() {
    assert_eq!("Memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
    assert_eq!(BackendKind::Memory.to_string(), "memory");
}

#[test]
fn unknown_backend_is_unavailable() {
    let config = DatabaseConfig {
        backend: "firestore".to_string(),
        name: "test".to_string(),
        ..DatabaseConfig::default()
    };

    let Err(err) = open_backend(&config) else {
        panic!("unknown backend should not open");
    };
    assert_eq!(err.class, ErrorClass::Unavailable);

    let empty = DatabaseConfig {
        backend: String::new(),
        ..config
    };
    assert!(open_backend(&empty).is_err());
}

#[test]
fn configured_attempt_bound_reaches_backend() {
    let config = DatabaseConfig {
        max_attempts: 2,
        ..DatabaseConfig::default()
    };

    let backend = open_backend(&config).unwrap();
    assert_eq!(backend.max_attempts(), 2);
    assert_eq!(MemoryBackend::new().max_attempts(), DEFAULT_MAX_ATTEMPTS);
}
