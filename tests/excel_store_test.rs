use lokok_backend::domain::country::Country;
use lokok_backend::models::supplier::{RecordRef, SupplierRecord};
use lokok_backend::storage::{excel::ExcelStore, SupplierStore};
use serde_json::json;

fn record(fields: serde_json::Value) -> SupplierRecord {
    SupplierRecord::from_value(fields).expect("object")
}

#[tokio::test]
async fn append_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("suppliers.xlsx");

    let store = ExcelStore::open(&path).expect("open");
    store
        .append(
            Country::Us,
            record(json!({
                "Name": "Acme Wholesale",
                "Website": "https://www.acme.com/",
                "Created_At": "2024-01-01T00:00:00+00:00"
            })),
        )
        .await
        .expect("append us");
    store
        .append(
            Country::Mx,
            record(json!({
                "Name": "Proveedora Norte",
                "Email": "ventas@norte.mx",
                "Created_At": "2024-02-01T00:00:00+00:00"
            })),
        )
        .await
        .expect("append mx");

    let reopened = ExcelStore::open(&path).expect("reopen");
    let all = reopened.list(None).await.expect("list");
    assert_eq!(all.len(), 2);

    let us_rows = reopened.list(Some(Country::Us)).await.expect("list us");
    assert_eq!(us_rows.len(), 1);
    assert_eq!(us_rows[0].record.name().as_deref(), Some("Acme Wholesale"));
    assert_eq!(us_rows[0].country, Country::Us);
}

#[tokio::test]
async fn update_by_website_identity_rewrites_the_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("suppliers.xlsx");
    let store = ExcelStore::open(&path).expect("open");

    store
        .append(
            Country::Us,
            record(json!({
                "Name": "Acme Wholesale",
                "Website": "https://www.acme.com/",
                "Created_At": "2024-01-01T00:00:00+00:00"
            })),
        )
        .await
        .expect("append");

    // Identity arrives without the row's exact formatting or timestamp.
    let reference = RecordRef {
        id: None,
        country: None,
        record: record(json!({"Website": "ACME.COM"})),
    };
    let affected = store
        .update(
            &reference,
            record(json!({"Name": "Acme Wholesale LLC", "Website": "acme.com", "Status": "active"})),
        )
        .await
        .expect("update");
    assert_eq!(affected, 1);

    let rows = store.list(Some(Country::Us)).await.expect("list");
    assert_eq!(rows[0].record.name().as_deref(), Some("Acme Wholesale LLC"));
    // Creation stamp carried over from the old row.
    assert_eq!(
        rows[0].record.created_at_raw().as_deref(),
        Some("2024-01-01T00:00:00+00:00")
    );
}

#[tokio::test]
async fn delete_of_unmatched_identity_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("suppliers.xlsx");
    let store = ExcelStore::open(&path).expect("open");

    store
        .append(Country::Ca, record(json!({"Name": "Maple Goods"})))
        .await
        .expect("append");

    let missing = RecordRef {
        id: None,
        country: None,
        record: record(json!({"Name": "Nobody"})),
    };
    let err = store.delete(&missing).await.expect_err("should miss");
    assert!(matches!(err, lokok_backend::error::Error::NotFound(_)));

    let hit = RecordRef {
        id: None,
        country: Some(Country::Ca),
        record: record(json!({"Name": "maple goods", "Country": "canada"})),
    };
    let deleted = store.delete(&hit).await.expect("delete");
    assert_eq!(deleted, 1);
    assert!(store.list(None).await.expect("list").is_empty());
}

#[tokio::test]
async fn dedup_keeps_the_newest_per_website() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("suppliers.xlsx");
    let store = ExcelStore::open(&path).expect("open");

    store
        .append_many(vec![
            (
                Country::Us,
                record(json!({"Website": "dup.com", "Name": "Old", "Created_At": "2024-01-01"})),
            ),
            (
                Country::Us,
                record(json!({"Website": "www.dup.com/", "Name": "New", "Created_At": "2024-06-01"})),
            ),
            (
                Country::Us,
                record(json!({"Name": "Keyless Row"})),
            ),
        ])
        .await
        .expect("append many");

    let report = store.dedup(Some(Country::Us)).await.expect("dedup");
    assert_eq!(report.total, 3);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.kept, 2);

    let rows = store.list(Some(Country::Us)).await.expect("list");
    let names: Vec<_> = rows.iter().filter_map(|r| r.record.name()).collect();
    assert!(names.contains(&"New".to_string()));
    assert!(names.contains(&"Keyless Row".to_string()));
    assert!(!names.contains(&"Old".to_string()));
}

#[tokio::test]
async fn legacy_china_sheet_is_read_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("suppliers.xlsx");
    let store = ExcelStore::open(&path).expect("open");

    store
        .append(Country::Cn, record(json!({"Name": "Legacy Exporter"})))
        .await
        .expect("append cn");

    let reopened = ExcelStore::open(&path).expect("reopen");
    let rows = reopened.list(Some(Country::Cn)).await.expect("list cn");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].country, Country::Cn);
}
