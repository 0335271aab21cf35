use std::collections::BTreeMap;

use rust_xlsxwriter::*;
use serde_json::Value;

use crate::domain::country::Country;
use crate::error::Result;
use crate::models::supplier::StoredSupplier;
use crate::storage::excel::column_order;

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook from supplier rows, one sheet per
    /// country.
    pub fn generate_suppliers_xlsx(rows: &[StoredSupplier]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row = Color::RGB(0xF8FAFC);
        let border_color = Color::RGB(0xE2E8F0);

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let base_format = Format::new()
            .set_font_size(10)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let alt_format = Format::new()
            .set_font_size(10)
            .set_background_color(alt_row)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let mut by_country: BTreeMap<Country, Vec<&StoredSupplier>> = BTreeMap::new();
        for row in rows {
            by_country.entry(row.country).or_default().push(row);
        }

        for (country, group) in &by_country {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(country.sheet_name())?;

            let records: Vec<_> = group.iter().map(|s| s.record.clone()).collect();
            let columns = column_order(&records);

            for (col, header) in columns.iter().enumerate() {
                worksheet.set_column_width(col as u16, column_width(header))?;
                worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
            }
            worksheet.set_row_height(0, 24)?;

            for (row_index, record) in records.iter().enumerate() {
                let row = (row_index + 1) as u32;
                let format = if row_index % 2 == 0 {
                    &base_format
                } else {
                    &alt_format
                };
                for (col, header) in columns.iter().enumerate() {
                    let col = col as u16;
                    match record.as_map().get(header) {
                        Some(Value::String(s)) => {
                            worksheet.write_string_with_format(row, col, s, format)?;
                        }
                        Some(Value::Number(n)) => {
                            if let Some(f) = n.as_f64() {
                                worksheet.write_number_with_format(row, col, f, format)?;
                            }
                        }
                        Some(Value::Bool(b)) => {
                            worksheet.write_boolean_with_format(row, col, *b, format)?;
                        }
                        _ => {
                            worksheet.write_string_with_format(row, col, "", format)?;
                        }
                    }
                }
            }

            worksheet.autofilter(0, 0, records.len() as u32, (columns.len().max(1) - 1) as u16)?;
            worksheet.set_freeze_panes(1, 0)?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

fn column_width(header: &str) -> f64 {
    match header {
        "Name" | "Website" | "Email" => 30.0,
        "Created_By_User_Id" | "Created_At" => 24.0,
        "Responsable" | "Manager" | "Buyer" | "Category" => 20.0,
        _ => 16.0,
    }
}
