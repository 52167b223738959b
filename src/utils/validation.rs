use crate::utils::error::{IngestError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> IngestError {
    IngestError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 只接受 http/https 的 base URL
pub fn validate_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_required<'a>(field_name: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() && !is_unresolved_placeholder(v) => Ok(v),
        _ => Err(IngestError::MissingConfigError {
            field: field_name.to_string(),
        }),
    }
}

pub fn validate_non_empty_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.iter().all(|v| v.trim().is_empty()) {
        return Err(invalid(
            field_name,
            "[]",
            "At least one non-empty entry is required",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// `${VAR}` 沒有被環境變數取代時視為未設定
fn is_unresolved_placeholder(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("sources.adzuna.base_url", "https://api.adzuna.com").is_ok());
        assert!(validate_url("sources.adzuna.base_url", "http://localhost:8080").is_ok());
        assert!(validate_url("sources.adzuna.base_url", "").is_err());
        assert!(validate_url("sources.adzuna.base_url", "invalid-url").is_err());
        assert!(validate_url("sources.adzuna.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_required_rejects_placeholders() {
        assert_eq!(
            validate_required("app_id", &Some("abc".to_string())).unwrap(),
            "abc"
        );
        assert!(validate_required("app_id", &Some("${ADZUNA_APP_ID}".to_string())).is_err());
        assert!(validate_required("app_id", &Some("  ".to_string())).is_err());
        assert!(validate_required("app_id", &None).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("dedup.fuzzy_threshold", 0.85, 0.5, 1.0).is_ok());
        assert!(validate_range("dedup.fuzzy_threshold", 1.2, 0.5, 1.0).is_err());
        assert!(validate_positive_number("http.concurrent_requests", 0, 1).is_err());
    }
}
