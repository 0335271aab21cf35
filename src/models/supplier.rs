use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::country::{normalize_country, Country};
use crate::models::user::SessionUser;

/// Header aliases seen across sheets and import sources. Records carry whatever
/// columns their source had, so every lookup goes through these lists.
pub const NAME_FIELDS: &[&str] = &["Name", "NAME", "Company", "Company Name", "Nombre"];
pub const WEBSITE_FIELDS: &[&str] = &["Website", "WEBSITE", "Web", "Url", "URL"];
pub const EMAIL_FIELDS: &[&str] = &["Email", "EMAIL", "E-mail", "Mail", "Correo"];
pub const MANAGER_FIELDS: &[&str] = &[
    "Responsable",
    "RESPONSABLE",
    "Respónsable",
    "Responsible",
    "Manager",
    "MANAGER",
    "Buyer",
    "BUYER",
];
pub const CREATED_AT_FIELDS: &[&str] = &["Created_At", "CREATED_AT", "DATE", "Date", "Fecha"];
pub const COUNTRY_FIELDS: &[&str] = &["Country", "COUNTRY", "Pais", "País"];
pub const PRIORITY_FIELDS: &[&str] = &["Priority", "PRIORITY", "Prioridad"];
pub const STATUS_FIELDS: &[&str] = &["Status", "STATUS", "Account Status"];

/// A supplier row: a loosely-typed mapping of column names to values. There is
/// no fixed schema and no stable identifier; identity is inferred downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierRecord(pub Map<String, Value>);

impl SupplierRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// First non-empty value among the alias list, compared case-insensitively
    /// against the record's actual keys.
    pub fn first_text(&self, aliases: &[&str]) -> Option<String> {
        for alias in aliases {
            for (key, value) in &self.0 {
                if key.eq_ignore_ascii_case(alias) {
                    if let Some(text) = value_to_text(value) {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    pub fn name(&self) -> Option<String> {
        self.first_text(NAME_FIELDS)
    }

    pub fn website(&self) -> Option<String> {
        self.first_text(WEBSITE_FIELDS)
    }

    pub fn email(&self) -> Option<String> {
        self.first_text(EMAIL_FIELDS)
    }

    pub fn manager_field(&self) -> Option<String> {
        self.first_text(MANAGER_FIELDS)
    }

    pub fn country_raw(&self) -> Option<String> {
        self.first_text(COUNTRY_FIELDS)
    }

    pub fn country(&self) -> Option<Country> {
        self.country_raw().and_then(|raw| normalize_country(&raw))
    }

    pub fn status(&self) -> Option<String> {
        self.first_text(STATUS_FIELDS)
    }

    pub fn created_at_raw(&self) -> Option<String> {
        self.first_text(CREATED_AT_FIELDS)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at_raw().and_then(|raw| parse_timestamp(&raw))
    }

    pub fn created_by_id(&self) -> Option<String> {
        self.first_text(&["Created_By_User_Id", "CREATED_BY_USER_ID"])
    }

    pub fn created_by_name(&self) -> Option<String> {
        self.first_text(&["Created_By_User_Name", "CREATED_BY_USER_NAME"])
    }

    pub fn created_by_email(&self) -> Option<String> {
        self.first_text(&["Created_By_User_Email", "CREATED_BY_USER_EMAIL"])
    }

    pub fn is_high_priority(&self) -> bool {
        self.first_text(PRIORITY_FIELDS)
            .map(|p| {
                let p = p.trim().to_lowercase();
                matches!(p.as_str(), "high" | "alta" | "urgent" | "1" | "true" | "yes")
            })
            .unwrap_or(false)
    }

    /// Carry creation stamps over from an older copy of the row so the record
    /// stays matchable on the next cycle. Only fills fields the new copy lacks.
    pub fn preserve_creation_from(&mut self, old: &SupplierRecord) {
        for key in [
            "Created_At",
            "Created_By_User_Id",
            "Created_By_User_Name",
            "Created_By_User_Email",
        ] {
            if self.first_text(&[key]).is_none() {
                if let Some(value) = old.first_text(&[key]) {
                    self.set(key, Value::String(value));
                }
            }
        }
        if self.created_at_raw().is_none() {
            if let Some(stamp) = old.created_at_raw() {
                self.set("Created_At", Value::String(stamp));
            }
        }
    }

    /// Stamp creation metadata from the session. The embedded timestamp doubles
    /// as a matching key on later updates.
    pub fn stamp_creation(&mut self, user: &SessionUser, country: Country, now: DateTime<Utc>) {
        self.set("Created_At", Value::String(now.to_rfc3339()));
        self.set("Created_By_User_Id", Value::String(user.id.to_string()));
        self.set("Created_By_User_Name", Value::String(user.name.clone()));
        self.set("Created_By_User_Email", Value::String(user.email.clone()));
        self.set("Country", Value::String(country.code().to_string()));
    }
}

/// A record as it sits in a backend. `id` is the Postgres row id; Excel rows
/// have none and are addressed by position within the loaded set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSupplier {
    pub id: Option<i64>,
    pub country: Country,
    pub record: SupplierRecord,
}

/// The identity basis an update or delete arrives with: a possibly-stale copy
/// of the record, an optional row id, and an optional country hint.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordRef {
    pub id: Option<i64>,
    pub country: Option<Country>,
    pub record: SupplierRecord,
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Creation timestamps arrive in whatever shape the source wrote them.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> SupplierRecord {
        SupplierRecord::from_value(fields).expect("object")
    }

    #[test]
    fn field_lookup_is_alias_and_case_insensitive() {
        let rec = record(json!({"WEBSITE": "http://acme.com", "Nombre": "Acme"}));
        assert_eq!(rec.website().as_deref(), Some("http://acme.com"));
        assert_eq!(rec.name().as_deref(), Some("Acme"));
    }

    #[test]
    fn blank_values_are_treated_as_missing() {
        let rec = record(json!({"Responsable": "   ", "Manager": "alice"}));
        assert_eq!(rec.manager_field().as_deref(), Some("alice"));
    }

    #[test]
    fn timestamps_parse_from_common_shapes() {
        for raw in [
            "2024-03-01T10:00:00+00:00",
            "2024-03-01 10:00:00",
            "2024-03-01",
        ] {
            let rec = record(json!({"Created_At": raw}));
            assert!(rec.created_at().is_some(), "failed on {raw}");
        }
    }

    #[test]
    fn priority_flags_cover_spanish_sources() {
        assert!(record(json!({"Prioridad": "ALTA"})).is_high_priority());
        assert!(record(json!({"Priority": "high"})).is_high_priority());
        assert!(!record(json!({"Priority": "normal"})).is_high_priority());
    }
}
