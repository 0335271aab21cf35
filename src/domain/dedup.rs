use std::collections::HashMap;

use serde::Serialize;

use crate::domain::normalize::{normalize_email, normalize_website};
use crate::models::supplier::{StoredSupplier, SupplierRecord};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DedupReport {
    pub total: usize,
    pub kept: usize,
    pub deleted: usize,
}

/// Positions to drop, plus the counts reported back to the caller.
#[derive(Debug, Clone)]
pub struct DedupPlan {
    pub drop: Vec<usize>,
    pub report: DedupReport,
}

/// Best-effort duplicate grouping key, priority website > email > name+country.
/// Records yielding none of the three are never deduped.
pub fn dedup_key(record: &SupplierRecord) -> Option<String> {
    if let Some(site) = record.website().as_deref().and_then(normalize_website) {
        return Some(format!("w:{}", site));
    }
    if let Some(email) = record.email().as_deref().and_then(normalize_email) {
        return Some(format!("e:{}", email));
    }
    if let Some(name) = record.name() {
        let country = record
            .country()
            .map(|c| c.code().to_string())
            .or_else(|| record.country_raw().map(|raw| raw.trim().to_lowercase()))
            .unwrap_or_default();
        return Some(format!("n:{}:{}", name.trim().to_lowercase(), country));
    }
    None
}

/// Bucket rows by dedup key and keep the newest record per bucket (missing
/// creation timestamps sort oldest; an exact timestamp tie keeps the row seen
/// first). Rows without a derivable key are always kept.
pub fn plan(rows: &[StoredSupplier]) -> DedupPlan {
    let mut best: HashMap<String, usize> = HashMap::new();
    let mut drop = Vec::new();

    for (pos, row) in rows.iter().enumerate() {
        let Some(key) = dedup_key(&row.record) else {
            continue;
        };
        match best.get(&key) {
            None => {
                best.insert(key, pos);
            }
            Some(&held) => {
                let held_at = rows[held].record.created_at();
                let candidate_at = row.record.created_at();
                if candidate_at > held_at {
                    drop.push(held);
                    best.insert(key, pos);
                } else {
                    drop.push(pos);
                }
            }
        }
    }

    drop.sort_unstable();
    let report = DedupReport {
        total: rows.len(),
        kept: rows.len() - drop.len(),
        deleted: drop.len(),
    };
    DedupPlan { drop, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::country::Country;
    use serde_json::json;

    fn stored(country: Country, fields: serde_json::Value) -> StoredSupplier {
        StoredSupplier {
            id: None,
            country,
            record: SupplierRecord::from_value(fields).unwrap(),
        }
    }

    #[test]
    fn same_normalized_website_shares_a_key() {
        let a = stored(Country::Us, json!({"Website": "WWW.Example.com/", "Country": "usa"}));
        let b = stored(Country::Us, json!({"Website": "example.com", "Country": "US"}));
        assert_eq!(dedup_key(&a.record), dedup_key(&b.record));
        assert_eq!(dedup_key(&a.record), Some("w:example.com".to_string()));
    }

    #[test]
    fn website_outranks_email_and_name() {
        let rec = SupplierRecord::from_value(
            json!({"Website": "a.com", "Email": "x@a.com", "Name": "A", "Country": "US"}),
        )
        .unwrap();
        assert_eq!(dedup_key(&rec), Some("w:a.com".to_string()));

        let rec = SupplierRecord::from_value(json!({"Email": "X@A.com", "Name": "A"})).unwrap();
        assert_eq!(dedup_key(&rec), Some("e:x@a.com".to_string()));

        let rec = SupplierRecord::from_value(json!({"Name": "Acme Co", "Country": "usa"})).unwrap();
        assert_eq!(dedup_key(&rec), Some("n:acme co:US".to_string()));
    }

    #[test]
    fn newest_record_survives() {
        let rows = vec![
            stored(Country::Us, json!({"Website": "dup.com", "Created_At": "2024-01-01T00:00:00Z"})),
            stored(Country::Us, json!({"Website": "www.dup.com/", "Created_At": "2024-05-01T00:00:00Z"})),
            stored(Country::Us, json!({"Website": "dup.com", "Created_At": "2024-03-01T00:00:00Z"})),
        ];
        let plan = plan(&rows);
        assert_eq!(plan.drop, vec![0, 2]);
        assert_eq!(
            plan.report,
            DedupReport {
                total: 3,
                kept: 1,
                deleted: 2
            }
        );
    }

    #[test]
    fn missing_timestamp_loses_to_any_timestamp() {
        let rows = vec![
            stored(Country::Us, json!({"Website": "dup.com"})),
            stored(Country::Us, json!({"Website": "dup.com", "Created_At": "2020-01-01"})),
        ];
        let plan = plan(&rows);
        assert_eq!(plan.drop, vec![0]);
    }

    #[test]
    fn keyless_rows_are_never_deduped() {
        let rows = vec![
            stored(Country::Us, json!({"Phone": "123"})),
            stored(Country::Us, json!({"Phone": "123"})),
        ];
        let plan = plan(&rows);
        assert!(plan.drop.is_empty());
        assert_eq!(plan.report.kept, 2);
    }
}
