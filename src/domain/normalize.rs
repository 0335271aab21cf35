use url::Url;

/// Canonical form of a website value: lowercase host without scheme, `www.`
/// prefix, port, query, fragment or trailing slash. Idempotent.
pub fn normalize_website(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.clone()
    } else {
        format!("http://{}", trimmed)
    };

    let normalized = match Url::parse(&with_scheme) {
        Ok(url) => {
            let host = url.host_str()?.trim_start_matches("www.").to_string();
            let path = url.path().trim_end_matches('/');
            format!("{}{}", host, path)
        }
        // Values like bare "acme" or malformed URLs still need a stable key.
        Err(_) => {
            let mut s = trimmed;
            for scheme in ["https://", "http://"] {
                if let Some(rest) = s.strip_prefix(scheme) {
                    s = rest.to_string();
                    break;
                }
            }
            if let Some(rest) = s.strip_prefix("www.") {
                s = rest.to_string();
            }
            s = s.split(['?', '#']).next().unwrap_or("").to_string();
            s.trim_end_matches('/').to_string()
        }
    };

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

pub fn normalize_email(raw: &str) -> Option<String> {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_www_port_and_trailing_slash() {
        assert_eq!(
            normalize_website("HTTPS://WWW.Example.com:8080/shop/"),
            Some("example.com/shop".to_string())
        );
        assert_eq!(
            normalize_website("http://example.com/"),
            Some("example.com".to_string())
        );
        assert_eq!(
            normalize_website("www.example.com"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn drops_query_and_fragment() {
        assert_eq!(
            normalize_website("example.com/a?b=1#c"),
            Some("example.com/a".to_string())
        );
    }

    #[test]
    fn is_idempotent() {
        for raw in [
            "HTTPS://WWW.Example.com:8080/shop/",
            "www.example.com",
            "example.com/a?b=1",
            "weird value with spaces",
        ] {
            if let Some(once) = normalize_website(raw) {
                assert_eq!(normalize_website(&once), Some(once.clone()), "not idempotent for {raw}");
            }
        }
    }

    #[test]
    fn empty_values_yield_no_key() {
        assert_eq!(normalize_website("   "), None);
        assert_eq!(normalize_email(" "), None);
        assert_eq!(normalize_email(" Bob@Example.COM "), Some("bob@example.com".to_string()));
    }
}
