use crate::domain::country::Country;
use crate::domain::normalize::normalize_website;
use crate::models::supplier::{RecordRef, StoredSupplier};

/// Which identity rule located the target rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    StorageId,
    CreatedAt,
    Website,
    NameCountry,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub rule: MatchRule,
    pub positions: Vec<usize>,
}

/// Resolve the rows a loosely-identified record refers to.
///
/// Rules are tried in order: storage row id, embedded creation timestamp,
/// normalized website, name + country. The first rule that matches at least one
/// row wins. Ties are not arbitrated: every matching row is returned and the
/// caller applies the operation to all of them.
pub fn find_matches(reference: &RecordRef, rows: &[StoredSupplier]) -> Option<MatchOutcome> {
    if let Some(id) = reference.id {
        let positions: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.id == Some(id))
            .map(|(pos, _)| pos)
            .collect();
        if !positions.is_empty() {
            return Some(MatchOutcome {
                rule: MatchRule::StorageId,
                positions,
            });
        }
    }

    if let Some(stamp) = reference.record.created_at_raw() {
        let stamp = stamp.trim().to_string();
        let positions: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.record
                    .created_at_raw()
                    .map(|s| s.trim() == stamp)
                    .unwrap_or(false)
            })
            .map(|(pos, _)| pos)
            .collect();
        if !positions.is_empty() {
            return Some(MatchOutcome {
                rule: MatchRule::CreatedAt,
                positions,
            });
        }
    }

    if let Some(website) = reference.record.website().as_deref().and_then(normalize_website) {
        let positions: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.record
                    .website()
                    .as_deref()
                    .and_then(normalize_website)
                    .map(|w| w == website)
                    .unwrap_or(false)
            })
            .map(|(pos, _)| pos)
            .collect();
        if !positions.is_empty() {
            return Some(MatchOutcome {
                rule: MatchRule::Website,
                positions,
            });
        }
    }

    if let Some(name) = reference.record.name() {
        let name = name.trim().to_lowercase();
        let country = reference_country(reference);
        let positions: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let row_name = match row.record.name() {
                    Some(n) => n.trim().to_lowercase(),
                    None => return false,
                };
                row_name == name && row_country(row) == country
            })
            .map(|(pos, _)| pos)
            .collect();
        if !positions.is_empty() {
            return Some(MatchOutcome {
                rule: MatchRule::NameCountry,
                positions,
            });
        }
    }

    None
}

fn reference_country(reference: &RecordRef) -> Option<Country> {
    reference.record.country().or(reference.country)
}

fn row_country(row: &StoredSupplier) -> Option<Country> {
    row.record.country().or(Some(row.country))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::supplier::SupplierRecord;
    use serde_json::json;

    fn stored(id: Option<i64>, country: Country, fields: serde_json::Value) -> StoredSupplier {
        StoredSupplier {
            id,
            country,
            record: SupplierRecord::from_value(fields).unwrap(),
        }
    }

    fn reference(fields: serde_json::Value) -> RecordRef {
        RecordRef {
            id: None,
            country: None,
            record: SupplierRecord::from_value(fields).unwrap(),
        }
    }

    #[test]
    fn storage_id_wins_over_everything() {
        let rows = vec![
            stored(Some(1), Country::Us, json!({"Name": "Acme", "Website": "acme.com"})),
            stored(Some(2), Country::Us, json!({"Name": "Acme", "Website": "acme.com"})),
        ];
        let mut re = reference(json!({"Website": "acme.com"}));
        re.id = Some(2);
        let outcome = find_matches(&re, &rows).unwrap();
        assert_eq!(outcome.rule, MatchRule::StorageId);
        assert_eq!(outcome.positions, vec![1]);
    }

    #[test]
    fn timestamp_beats_website() {
        let rows = vec![
            stored(None, Country::Us, json!({"Created_At": "2024-01-01T00:00:00Z", "Website": "a.com"})),
            stored(None, Country::Us, json!({"Created_At": "2024-02-02T00:00:00Z", "Website": "a.com"})),
        ];
        let re = reference(json!({"Created_At": "2024-02-02T00:00:00Z", "Website": "a.com"}));
        let outcome = find_matches(&re, &rows).unwrap();
        assert_eq!(outcome.rule, MatchRule::CreatedAt);
        assert_eq!(outcome.positions, vec![1]);
    }

    #[test]
    fn website_matches_across_formatting() {
        let rows = vec![
            stored(None, Country::Us, json!({"Website": "https://www.acme.com/"})),
            stored(None, Country::Ca, json!({"Website": "other.com"})),
        ];
        let re = reference(json!({"Website": "ACME.COM"}));
        let outcome = find_matches(&re, &rows).unwrap();
        assert_eq!(outcome.rule, MatchRule::Website);
        assert_eq!(outcome.positions, vec![0]);
    }

    #[test]
    fn name_country_uses_aliases_and_hint() {
        let rows = vec![
            stored(None, Country::Us, json!({"Name": "Acme", "Country": "USA"})),
            stored(None, Country::Mx, json!({"Name": "Acme", "Country": "Mexico"})),
        ];
        let mut re = reference(json!({"Name": "acme"}));
        re.country = Some(Country::Mx);
        let outcome = find_matches(&re, &rows).unwrap();
        assert_eq!(outcome.rule, MatchRule::NameCountry);
        assert_eq!(outcome.positions, vec![1]);
    }

    #[test]
    fn ties_return_every_matching_row() {
        let rows = vec![
            stored(None, Country::Us, json!({"Website": "dup.com", "Name": "A"})),
            stored(None, Country::Us, json!({"Website": "www.dup.com", "Name": "B"})),
        ];
        let re = reference(json!({"Website": "dup.com/"}));
        let outcome = find_matches(&re, &rows).unwrap();
        assert_eq!(outcome.positions, vec![0, 1]);
    }

    #[test]
    fn zero_matches_is_none() {
        let rows = vec![stored(None, Country::Us, json!({"Name": "Acme"}))];
        assert!(find_matches(&reference(json!({"Name": "Nope"})), &rows).is_none());
    }
}
