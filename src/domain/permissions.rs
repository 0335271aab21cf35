use crate::models::supplier::SupplierRecord;
use crate::models::user::{Role, SessionUser};

/// Edit/delete eligibility for a record.
///
/// Admins pass unconditionally. Managers pass if the manager-like field is
/// unclaimed or mentions them, if the record's country is in their grant, or if
/// they created the record. Operators never pass. The mention check is a
/// permissive OR of substring heuristics over free text, so coincidental
/// name-token hits can grant access; see DESIGN.md.
pub fn can_modify(user: &SessionUser, record: &SupplierRecord) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Operator => false,
        Role::Manager => {
            manager_field_open_or_mentions(user, record)
                || country_granted(user, record)
                || is_creator(user, record)
        }
    }
}

fn manager_field_open_or_mentions(user: &SessionUser, record: &SupplierRecord) -> bool {
    match record.manager_field() {
        // Blank means unclaimed.
        None => true,
        Some(field) => mentions_user(&field, user),
    }
}

/// Free-text mention: email substring, full-name substring, or any name token
/// of length >= 3. All comparisons case-insensitive.
pub fn mentions_user(field: &str, user: &SessionUser) -> bool {
    let haystack = field.to_lowercase();
    let email = user.email.trim().to_lowercase();
    if !email.is_empty() && haystack.contains(&email) {
        return true;
    }
    let full_name = user.name.trim().to_lowercase();
    if !full_name.is_empty() && haystack.contains(&full_name) {
        return true;
    }
    full_name
        .split_whitespace()
        .filter(|token| token.len() >= 3)
        .any(|token| haystack.contains(token))
}

fn country_granted(user: &SessionUser, record: &SupplierRecord) -> bool {
    match record.country() {
        Some(country) => user.allowed_countries.contains(&country),
        None => false,
    }
}

fn is_creator(user: &SessionUser, record: &SupplierRecord) -> bool {
    if let Some(id) = record.created_by_id() {
        if id.trim() == user.id.to_string() {
            return true;
        }
    }
    if let Some(email) = record.created_by_email() {
        if email.trim().eq_ignore_ascii_case(user.email.trim()) {
            return true;
        }
    }
    if let Some(name) = record.created_by_name() {
        if !name.trim().is_empty() && name.trim().eq_ignore_ascii_case(user.name.trim()) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::country::Country;
    use serde_json::json;
    use uuid::Uuid;

    fn user(role: Role, countries: Vec<Country>) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "maria.lopez@lokok.example".to_string(),
            name: "Maria Lopez".to_string(),
            role,
            allowed_countries: countries,
        }
    }

    fn record(fields: serde_json::Value) -> SupplierRecord {
        SupplierRecord::from_value(fields).unwrap()
    }

    #[test]
    fn admin_is_always_allowed() {
        let admin = user(Role::Admin, vec![]);
        let rec = record(json!({"Country": "CN", "Responsable": "somebody else"}));
        assert!(can_modify(&admin, &rec));
    }

    #[test]
    fn operator_is_never_allowed() {
        let op = user(Role::Operator, vec![Country::Us, Country::Ca, Country::Mx]);
        let rec = record(json!({"Responsable": "maria lopez", "Country": "US"}));
        assert!(!can_modify(&op, &rec));
    }

    #[test]
    fn manager_denied_when_no_heuristic_fires() {
        let mgr = user(Role::Manager, vec![Country::Ca]);
        let rec = record(json!({
            "Responsable": "john smith",
            "Country": "US",
            "Created_By_User_Email": "other@lokok.example"
        }));
        assert!(!can_modify(&mgr, &rec));
    }

    #[test]
    fn blank_manager_field_is_unclaimed() {
        let mgr = user(Role::Manager, vec![]);
        assert!(can_modify(&mgr, &record(json!({"Country": "US"}))));
        assert!(can_modify(&mgr, &record(json!({"Responsable": "  ", "Country": "US"}))));
    }

    #[test]
    fn mention_by_email_name_or_token() {
        let mgr = user(Role::Manager, vec![]);
        let by_email = record(json!({"Responsable": "assigned: MARIA.LOPEZ@lokok.example", "Country": "US"}));
        let by_full_name = record(json!({"Buyer": "Maria Lopez / backup: Juan", "Country": "US"}));
        let by_token = record(json!({"Manager": "lopez handles this", "Country": "US"}));
        assert!(can_modify(&mgr, &by_email));
        assert!(can_modify(&mgr, &by_full_name));
        assert!(can_modify(&mgr, &by_token));
    }

    #[test]
    fn country_grant_alone_is_enough() {
        let mgr = user(Role::Manager, vec![Country::Mx]);
        let rec = record(json!({"Responsable": "someone else entirely", "Country": "mexico"}));
        assert!(can_modify(&mgr, &rec));
    }

    #[test]
    fn creator_match_alone_is_enough() {
        let mgr = user(Role::Manager, vec![]);
        let rec = record(json!({
            "Responsable": "someone else entirely",
            "Country": "CN",
            "Created_By_User_Id": mgr.id.to_string()
        }));
        assert!(can_modify(&mgr, &rec));
    }
}
