mod support;

use chrono::{NaiveDate, Utc};
use kairon::{db::backend::MemoryBackend, prelude::*};
use std::sync::Arc;
use support::GatedBackend;

fn setup() -> Db {
    Db::new(Arc::new(MemoryBackend::new()))
}

async fn stock(db: &Db, id: &str, stock: i64, infinite_stock: bool) {
    let product = Product {
        name: format!("product {id}"),
        price: 10.0,
        available: true,
        stock,
        infinite_stock,
        ..Product::default()
    };
    Repository::new(db.clone())
        .create_with_id(id, &product)
        .await
        .unwrap();
}

async fn stock_of(db: &Db, id: &str) -> i64 {
    Repository::<Product>::new(db.clone())
        .read(id)
        .await
        .unwrap()
        .stock
}

fn order(lines: &[(&str, i64)]) -> Order {
    Order {
        amount: 30.0,
        member_id: "m1".to_string(),
        products: lines
            .iter()
            .map(|(id, quantity)| SelectedProduct {
                id: (*id).to_string(),
                quantity: *quantity,
                price: 10.0,
            })
            .collect(),
        ..Order::default()
    }
}

fn midnight(year: i32, month: u32, day: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}

#[tokio::test]
async fn placing_an_order_takes_stock() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());

    let placed = service.create(order(&[("p1", 2)])).await.unwrap();

    assert!(placed.id.is_some());
    assert_eq!(placed.status, OrderStatus::Pending);
    assert!(placed.created > 0);
    assert_eq!(stock_of(&db, "p1").await, 3);
}

#[tokio::test]
async fn client_supplied_status_and_time_are_ignored() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());

    let mut input = order(&[("p1", 1)]);
    input.status = OrderStatus::Paid;
    input.created = 1;
    let placed = service.create(input).await.unwrap();

    assert_eq!(placed.status, OrderStatus::Pending);
    assert!(placed.created > 1);
}

#[tokio::test]
async fn short_line_leaves_every_product_untouched() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    stock(&db, "p2", 1, false).await;
    let service = OrderService::new(db.clone());

    let err = service
        .create(order(&[("p1", 1), ("p2", 2)]))
        .await
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::InsufficientResource);
    assert_eq!(stock_of(&db, "p1").await, 5);
    assert_eq!(stock_of(&db, "p2").await, 1);
    assert!(service.list(&QueryOptions::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());

    let err = service
        .create(order(&[("p1", 1), ("ghost", 1)]))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(stock_of(&db, "p1").await, 5);
}

#[tokio::test]
async fn repeated_lines_are_checked_together() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());

    let err = service
        .create(order(&[("p1", 3), ("p1", 3)]))
        .await
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::InsufficientResource);
    assert_eq!(stock_of(&db, "p1").await, 5);
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());

    let err = service.create(order(&[("p1", 0)])).await.unwrap_err();

    assert_eq!(err.class, ErrorClass::InvalidInput);
    assert_eq!(stock_of(&db, "p1").await, 5);
}

#[tokio::test]
async fn infinite_stock_is_never_decremented() {
    let db = setup();
    stock(&db, "p1", 0, true).await;
    let service = OrderService::new(db.clone());

    service.create(order(&[("p1", 50)])).await.unwrap();

    assert_eq!(stock_of(&db, "p1").await, 0);
}

// Two orders read the same product before either commits.
async fn race(initial: i64, quantity: i64) -> (Db, Result<Order, Error>, Result<Order, Error>) {
    let backend = Arc::new(GatedBackend::new(2));
    let db = Db::new(backend.clone());
    stock(&db, "p1", initial, false).await;
    let first = OrderService::new(db.clone());
    let second = first.clone();

    backend.arm();
    let (a, b) = tokio::join!(
        first.create(order(&[("p1", quantity)])),
        second.create(order(&[("p1", quantity)])),
    );

    (db, a, b)
}

#[tokio::test]
async fn competing_orders_cannot_oversell() {
    let (db, a, b) = race(5, 3).await;

    let placed = [&a, &b].iter().filter(|result| result.is_ok()).count();
    assert_eq!(placed, 1);
    assert_eq!(stock_of(&db, "p1").await, 2);

    let loser = a.err().or(b.err()).unwrap();
    assert_eq!(loser.class, ErrorClass::InsufficientResource);
    let orders = OrderService::new(db).list(&QueryOptions::new()).await.unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn competing_orders_with_room_both_succeed() {
    let (db, a, b) = race(10, 3).await;

    a.unwrap();
    b.unwrap();
    assert_eq!(stock_of(&db, "p1").await, 4);
}

#[tokio::test]
async fn paid_orders_are_final() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());
    let id = service
        .create(order(&[("p1", 1)]))
        .await
        .unwrap()
        .id
        .unwrap();

    let paid = service.pay(&id).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);

    assert_eq!(service.pay(&id).await.unwrap_err().class, ErrorClass::InvalidState);
    assert_eq!(service.cancel(&id).await.unwrap_err().class, ErrorClass::InvalidState);
    assert_eq!(service.read(&id).await.unwrap().status, OrderStatus::Paid);
}

#[tokio::test]
async fn pending_orders_can_be_cancelled() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());
    let id = service
        .create(order(&[("p1", 1)]))
        .await
        .unwrap()
        .id
        .unwrap();

    assert_eq!(service.cancel(&id).await.unwrap().status, OrderStatus::Cancelled);
    assert_eq!(service.pay(&id).await.unwrap_err().class, ErrorClass::InvalidState);
}

#[tokio::test]
async fn report_window_covers_whole_days() {
    let db = setup();
    let orders = Repository::<Order>::new(db.clone());
    let rows = [
        ("before", midnight(2024, 1, 10) - 1, OrderStatus::Paid, 1.0),
        ("start", midnight(2024, 1, 10), OrderStatus::Paid, 10.0),
        ("last", midnight(2024, 1, 12) - 1, OrderStatus::Paid, 20.5),
        ("after", midnight(2024, 1, 12), OrderStatus::Paid, 100.0),
        ("unpaid", midnight(2024, 1, 11), OrderStatus::Pending, 1000.0),
    ];
    for (id, created, status, amount) in rows {
        let row = Order {
            created,
            status,
            amount,
            member_id: "m1".to_string(),
            ..Order::default()
        };
        orders.create_with_id(id, &row).await.unwrap();
    }

    let report = ReportService::new(db)
        .financial_report(
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(report.start_date, "2024-01-10");
    assert_eq!(report.end_date, "2024-01-11");
    assert_eq!(report.total_sales, 2);
    assert!((report.total_sales_income - 30.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn report_counts_orders_paid_today() {
    let db = setup();
    stock(&db, "p1", 5, false).await;
    let service = OrderService::new(db.clone());
    let id = service
        .create(order(&[("p1", 1)]))
        .await
        .unwrap()
        .id
        .unwrap();
    service.pay(&id).await.unwrap();

    let today = Utc::now().date_naive();
    let report = ReportService::new(db)
        .financial_report(today, today)
        .await
        .unwrap();

    assert_eq!(report.total_sales, 1);
}

#[tokio::test]
async fn inverted_report_window_is_rejected() {
    let report = ReportService::new(setup())
        .financial_report(
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
        .await;

    assert_eq!(report.unwrap_err().class, ErrorClass::InvalidInput);
}
