use serde::{Deserialize, Serialize};

/// Canonical market codes. CN is recognized for legacy CHINA sheet data but is
/// never part of an allowed-countries grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Us,
    Ca,
    Mx,
    Cn,
}

/// Countries a manager may be granted. CN is deliberately absent.
pub const GRANTABLE: [Country; 3] = [Country::Us, Country::Ca, Country::Mx];

impl Country {
    pub fn code(&self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Ca => "CA",
            Country::Mx => "MX",
            Country::Cn => "CN",
        }
    }

    /// Workbook sheet name. The legacy workbook uses a full-word CHINA sheet.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Ca => "CA",
            Country::Mx => "MX",
            Country::Cn => "CHINA",
        }
    }

    pub fn is_grantable(&self) -> bool {
        GRANTABLE.contains(self)
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Canonicalize a free-text country value. Sheet names, ISO codes and the common
/// spelled-out variants all resolve; anything unrecognized returns None.
pub fn normalize_country(raw: &str) -> Option<Country> {
    let cleaned = raw.trim().to_lowercase();
    match cleaned.as_str() {
        "us" | "usa" | "u.s." | "u.s.a." | "united states" | "united states of america"
        | "estados unidos" | "eeuu" | "ee.uu." | "america" => Some(Country::Us),
        "ca" | "can" | "canada" | "canadá" => Some(Country::Ca),
        "mx" | "mex" | "mexico" | "méxico" | "mejico" => Some(Country::Mx),
        "cn" | "chn" | "china" => Some(Country::Cn),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_collapse_to_one_code() {
        assert_eq!(normalize_country("united states"), Some(Country::Us));
        assert_eq!(normalize_country("USA"), Some(Country::Us));
        assert_eq!(normalize_country(" US "), Some(Country::Us));
        assert_eq!(
            normalize_country("united states"),
            normalize_country("USA")
        );
        assert_eq!(normalize_country("México"), Some(Country::Mx));
        assert_eq!(normalize_country("Canada"), Some(Country::Ca));
    }

    #[test]
    fn china_resolves_but_is_not_grantable() {
        let cn = normalize_country("CHINA").unwrap();
        assert_eq!(cn, Country::Cn);
        assert!(!cn.is_grantable());
        assert!(!GRANTABLE.contains(&Country::Cn));
    }

    #[test]
    fn unknown_values_stay_unresolved() {
        assert_eq!(normalize_country("germany"), None);
        assert_eq!(normalize_country(""), None);
    }
}
