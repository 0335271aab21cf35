use lokok_backend::domain::country::Country;
use lokok_backend::models::supplier::{StoredSupplier, SupplierRecord};
use lokok_backend::services::export_service::ExportService;
use lokok_backend::storage::excel::parse_workbook_bytes;
use serde_json::json;

fn stored(country: Country, fields: serde_json::Value) -> StoredSupplier {
    StoredSupplier {
        id: None,
        country,
        record: SupplierRecord::from_value(fields).expect("object"),
    }
}

#[test]
fn exported_workbook_parses_back_with_country_sheets() {
    let rows = vec![
        stored(
            Country::Us,
            json!({
                "Name": "Acme Wholesale",
                "Website": "acme.com",
                "Responsable": "Maria Lopez",
                "Created_At": "2024-01-01T00:00:00+00:00"
            }),
        ),
        stored(
            Country::Mx,
            json!({"Name": "Proveedora Norte", "Email": "ventas@norte.mx"}),
        ),
    ];

    let bytes = ExportService::generate_suppliers_xlsx(&rows).expect("export");
    let parsed = parse_workbook_bytes(bytes).expect("parse");
    assert_eq!(parsed.len(), 2);

    let (us_country, us_record) = parsed
        .iter()
        .find(|(_, r)| r.name().as_deref() == Some("Acme Wholesale"))
        .expect("us row");
    assert_eq!(*us_country, Country::Us);
    assert_eq!(us_record.website().as_deref(), Some("acme.com"));
    assert_eq!(us_record.manager_field().as_deref(), Some("Maria Lopez"));
    // The sheet name fills in a missing Country column on import.
    assert_eq!(us_record.country(), Some(Country::Us));

    let (mx_country, mx_record) = parsed
        .iter()
        .find(|(_, r)| r.name().as_deref() == Some("Proveedora Norte"))
        .expect("mx row");
    assert_eq!(*mx_country, Country::Mx);
    assert_eq!(mx_record.email().as_deref(), Some("ventas@norte.mx"));
}

#[test]
fn workbook_without_country_sheets_yields_no_rows() {
    // A workbook whose sheets have unrecognizable names imports nothing.
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Notes").expect("name");
    sheet.write_string(0, 0, "Name").expect("write");
    sheet.write_string(1, 0, "Someone").expect("write");
    let bytes = workbook.save_to_buffer().expect("buffer");

    let parsed = parse_workbook_bytes(bytes).expect("parse");
    assert!(parsed.is_empty());
}
