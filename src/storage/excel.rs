use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::country::{normalize_country, Country};
use crate::domain::dedup::{self, DedupReport};
use crate::domain::matcher;
use crate::error::{Error, Result};
use crate::models::supplier::{RecordRef, StoredSupplier, SupplierRecord};
use crate::storage::SupplierStore;

/// Column order used when rewriting a sheet; anything else follows sorted.
const PREFERRED_COLUMNS: &[&str] = &[
    "Name",
    "Website",
    "Email",
    "Phone",
    "Category",
    "Account Status",
    "Status",
    "Country",
    "Responsable",
    "Manager",
    "Buyer",
    "Priority",
    "Date",
    "Created_At",
    "Created_By_User_Id",
    "Created_By_User_Name",
    "Created_By_User_Email",
];

type Sheets = BTreeMap<Country, Vec<SupplierRecord>>;

/// Supplier store backed by a cached Excel workbook, sheet per country.
///
/// The whole workbook lives in memory behind one RwLock; every mutation
/// rewrites the file from that state. The legacy CHINA sheet is read and kept
/// like any other, but country grants never include it.
pub struct ExcelStore {
    path: PathBuf,
    state: RwLock<Sheets>,
}

impl ExcelStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sheets = if path.exists() {
            load_sheets(&path)?
        } else {
            Sheets::new()
        };
        Ok(Self {
            path,
            state: RwLock::new(sheets),
        })
    }

    /// Re-read the workbook from disk, discarding the in-memory state. Called
    /// after a remote refresh replaces the file.
    pub async fn reload(&self) -> Result<()> {
        let sheets = load_sheets(&self.path)?;
        *self.state.write().await = sheets;
        Ok(())
    }

    fn persist(&self, sheets: &Sheets) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        write_workbook(&self.path, sheets)
    }
}

/// Flatten the sheet map into one row list, remembering where each row lives.
fn flatten(sheets: &Sheets, scope: Option<Country>) -> (Vec<StoredSupplier>, Vec<(Country, usize)>) {
    let mut rows = Vec::new();
    let mut locations = Vec::new();
    for (&country, records) in sheets {
        if let Some(scoped) = scope {
            if country != scoped {
                continue;
            }
        }
        for (index, record) in records.iter().enumerate() {
            rows.push(StoredSupplier {
                id: None,
                country,
                record: record.clone(),
            });
            locations.push((country, index));
        }
    }
    (rows, locations)
}

/// Remove rows by (country, index), highest index first so positions stay valid.
fn remove_rows(sheets: &mut Sheets, mut targets: Vec<(Country, usize)>) {
    targets.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    for (country, index) in targets {
        if let Some(records) = sheets.get_mut(&country) {
            if index < records.len() {
                records.remove(index);
            }
        }
    }
}

#[async_trait]
impl SupplierStore for ExcelStore {
    async fn list(&self, country: Option<Country>) -> Result<Vec<StoredSupplier>> {
        let sheets = self.state.read().await;
        let (rows, _) = flatten(&sheets, country);
        Ok(rows)
    }

    async fn append(&self, country: Country, record: SupplierRecord) -> Result<StoredSupplier> {
        let mut sheets = self.state.write().await;
        sheets.entry(country).or_default().push(record.clone());
        self.persist(&sheets)?;
        Ok(StoredSupplier {
            id: None,
            country,
            record,
        })
    }

    async fn append_many(&self, rows: Vec<(Country, SupplierRecord)>) -> Result<u64> {
        let mut sheets = self.state.write().await;
        let count = rows.len() as u64;
        for (country, record) in rows {
            sheets.entry(country).or_default().push(record);
        }
        self.persist(&sheets)?;
        Ok(count)
    }

    async fn replace_all(&self, rows: Vec<(Country, SupplierRecord)>) -> Result<u64> {
        let mut sheets = self.state.write().await;
        sheets.clear();
        let count = rows.len() as u64;
        for (country, record) in rows {
            sheets.entry(country).or_default().push(record);
        }
        self.persist(&sheets)?;
        Ok(count)
    }

    async fn update(&self, reference: &RecordRef, new_record: SupplierRecord) -> Result<u64> {
        let mut sheets = self.state.write().await;
        let (rows, locations) = flatten(&sheets, reference.country);
        let outcome = matcher::find_matches(reference, &rows)
            .ok_or_else(|| Error::NotFound("No record matched the given identity".to_string()))?;

        let mut written = 0u64;
        for position in outcome.positions {
            let (country, index) = locations[position];
            let records = sheets.get_mut(&country).expect("sheet exists");
            let mut merged = new_record.clone();
            merged.preserve_creation_from(&records[index]);
            records[index] = merged;
            written += 1;
        }
        self.persist(&sheets)?;
        Ok(written)
    }

    async fn delete(&self, reference: &RecordRef) -> Result<u64> {
        let mut sheets = self.state.write().await;
        let (rows, locations) = flatten(&sheets, reference.country);
        let outcome = matcher::find_matches(reference, &rows)
            .ok_or_else(|| Error::NotFound("No record matched the given identity".to_string()))?;

        let targets: Vec<(Country, usize)> = outcome
            .positions
            .iter()
            .map(|&position| locations[position])
            .collect();
        let deleted = targets.len() as u64;
        remove_rows(&mut sheets, targets);
        self.persist(&sheets)?;
        Ok(deleted)
    }

    async fn dedup(&self, country: Option<Country>) -> Result<DedupReport> {
        let mut sheets = self.state.write().await;
        let (rows, locations) = flatten(&sheets, country);
        let plan = dedup::plan(&rows);
        if !plan.drop.is_empty() {
            let targets: Vec<(Country, usize)> =
                plan.drop.iter().map(|&position| locations[position]).collect();
            remove_rows(&mut sheets, targets);
            self.persist(&sheets)?;
        }
        Ok(plan.report)
    }
}

fn load_sheets(path: &Path) -> Result<Sheets> {
    let mut workbook = open_workbook_auto(path)?;
    sheets_from_reader(&mut workbook)
}

/// Parse an uploaded workbook into (country, record) rows, sheet order kept.
pub fn parse_workbook_bytes(bytes: Vec<u8>) -> Result<Vec<(Country, SupplierRecord)>> {
    let cursor = std::io::Cursor::new(bytes);
    let mut workbook = calamine::Xlsx::new(cursor).map_err(calamine::Error::from)?;
    let sheets = sheets_from_reader(&mut workbook)?;
    let mut rows = Vec::new();
    for (country, records) in sheets {
        for mut record in records {
            if record.country_raw().is_none() {
                record.set("Country", Value::String(country.code().to_string()));
            }
            rows.push((country, record));
        }
    }
    Ok(rows)
}

fn sheets_from_reader<RS, R>(workbook: &mut R) -> Result<Sheets>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    calamine::Error: From<R::Error>,
{
    let mut sheets = Sheets::new();

    for name in workbook.sheet_names().to_owned() {
        let Some(country) = normalize_country(&name) else {
            warn!(sheet = %name, "skipping sheet with unrecognized country name");
            continue;
        };
        let range = workbook.worksheet_range(&name).map_err(calamine::Error::from)?;
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            sheets.entry(country).or_default();
            continue;
        };
        let headers: Vec<String> = header_row.iter().map(cell_to_header).collect();

        let records = sheets.entry(country).or_default();
        for row in rows {
            let mut record = SupplierRecord::new();
            for (column, cell) in row.iter().enumerate() {
                let Some(header) = headers.get(column) else {
                    continue;
                };
                if header.is_empty() {
                    continue;
                }
                if let Some(value) = cell_to_value(cell) {
                    record.set(header, value);
                }
            }
            if !record.as_map().is_empty() {
                records.push(record);
            }
        }
    }
    Ok(sheets)
}

fn cell_to_header(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_to_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        Data::Int(i) => Some(Value::Number((*i).into())),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| Value::String(naive.format("%Y-%m-%d %H:%M:%S").to_string())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::Error(_) => None,
    }
}

fn write_workbook(path: &Path, sheets: &Sheets) -> Result<()> {
    let mut workbook = rust_xlsxwriter::Workbook::new();

    for (country, records) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(country.sheet_name())?;

        let columns = column_order(records);
        for (col, header) in columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, header)?;
        }
        for (row_index, record) in records.iter().enumerate() {
            let row = (row_index + 1) as u32;
            for (col, header) in columns.iter().enumerate() {
                let col = col as u16;
                match record.as_map().get(header) {
                    Some(Value::String(s)) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    Some(Value::Number(n)) => {
                        if let Some(f) = n.as_f64() {
                            worksheet.write_number(row, col, f)?;
                        }
                    }
                    Some(Value::Bool(b)) => {
                        worksheet.write_boolean(row, col, *b)?;
                    }
                    _ => {}
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Union of the record keys, preferred columns first, the rest sorted.
pub(crate) fn column_order(records: &[SupplierRecord]) -> Vec<String> {
    let mut present: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    for record in records {
        for key in record.as_map().keys() {
            present.insert(key.clone());
        }
    }
    let mut ordered = Vec::new();
    for preferred in PREFERRED_COLUMNS {
        if present.remove(*preferred) {
            ordered.push(preferred.to_string());
        }
    }
    ordered.extend(present);
    ordered
}
