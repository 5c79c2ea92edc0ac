//! Input normalization and validation for server entries.

use std::error::Error;

/// Prefix `http://` when no scheme is given and drop trailing slashes.
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_url("jf.local:8096/"), "http://jf.local:8096");
/// ```
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// Reject empty and reserved server names
pub fn validate_server_name(name: &str) -> Result<(), Box<dyn Error>> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Server name cannot be empty".into());
    }
    if name.eq_ignore_ascii_case("add another server") {
        return Err(format!("'{name}' is reserved").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(normalize_url("jf.local:8096"), "http://jf.local:8096");
    }

    #[test]
    fn test_normalize_url_keeps_https_and_strips_slashes() {
        assert_eq!(normalize_url(" https://jf.example.com// "), "https://jf.example.com");
    }

    #[test]
    fn test_validate_server_name() {
        assert!(validate_server_name("home").is_ok());
        assert!(validate_server_name("   ").is_err());
        let err = validate_server_name("Add another server").unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }
}
