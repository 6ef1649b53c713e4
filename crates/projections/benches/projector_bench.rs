use criterion::{Criterion, criterion_group, criterion_main};
use document_store::{Document, DocumentStoreExt, InMemoryDocumentStore};
use projections::{DateWindow, ExportOptions, ORDERS_COLLECTION, OrderExport, RecordProjector};
use serde_json::json;

fn marketplace_order(i: usize) -> Document {
    Document::from_value(json!({
        "_id": format!("order-{i}"),
        "order_id": i,
        "full_order_code": format!("WN{i:07}"),
        "order_status_id": 1,
        "date_created": format!("2025-08-{:02} 12:00:00", i % 28 + 1),
        "created_date": format!("2025-08-{:02} 12:00:00", i % 28 + 1),
        "shipping_firstname": "Nareeya",
        "shipping_lastname": "Tansakul",
        "shipping_phone": "0891234567",
        "grand_total": 590.0,
        "order_lazada": [{"customer_first_name": "Nareeya", "customer_last_name": "T."}],
        "order_shopee": [{"raw_body": {"buyer_user_id": 123456, "buyer_username": "buyer_a"}}],
        "order_line_shopping": {
            "shipping_address": {
                "recipientName": "Nareeya T.",
                "address": "123 Main Rd",
                "province": "Bangkok",
                "postalCode": "10260"
            }
        }
    }))
    .unwrap()
}

fn bench_project_single(c: &mut Criterion) {
    let projector = RecordProjector::for_orders();
    let record = marketplace_order(1);

    c.bench_function("projector/project_single", |b| {
        b.iter(|| projector.project(std::hint::black_box(&record)));
    });
}

fn bench_export_1000_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryDocumentStore::new();
    rt.block_on(async {
        let orders = (0..1000).map(marketplace_order).collect();
        store.insert_many(ORDERS_COLLECTION, orders).await.unwrap();
    });
    let window = DateWindow::parse("2025-08-01", "2025-08-31").unwrap();

    c.bench_function("projector/export_1000_orders", |b| {
        b.iter(|| {
            rt.block_on(async {
                let export = OrderExport::new(store.clone(), ExportOptions::default());
                export.export(&window).await.unwrap()
            })
        });
    });
}

criterion_group!(benches, bench_project_single, bench_export_1000_orders);
criterion_main!(benches);
