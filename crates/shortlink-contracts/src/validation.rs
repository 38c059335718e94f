// URL validation
//
// Three independent checks run before a URL is handed to the dispatcher:
// length, syntax, and host existence. Only the existence check touches the
// network (a resolver lookup).

use thiserror::Error;
use url::{Host, ParseError, Url};

/// Shortest URL accepted, the length of `http://a.co`
pub const MIN_URL_LEN: usize = 11;

/// Longest URL accepted
pub const MAX_URL_LEN: usize = 2000;

/// Validation failures, raised before anything is dispatched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("url is empty")]
    Empty,

    #[error("url is too short")]
    TooShort,

    #[error("url is too long")]
    TooLong,

    #[error("invalid url provided, no scheme found")]
    MissingScheme,

    #[error("invalid url provided: {0}")]
    Parse(String),

    #[error("invalid url provided, no host found")]
    MissingHost,

    #[error("invalid url provided, host does not exist")]
    HostNotFound,
}

/// Check the URL is non-empty and within [`MIN_URL_LEN`, `MAX_URL_LEN`] characters
pub fn validate_url_length(url: &str) -> Result<(), ValidationError> {
    let len = url.chars().count();

    if len == 0 {
        return Err(ValidationError::Empty);
    }
    if len < MIN_URL_LEN {
        return Err(ValidationError::TooShort);
    }
    if len > MAX_URL_LEN {
        return Err(ValidationError::TooLong);
    }

    Ok(())
}

/// Check the URL parses as an absolute URI with a scheme and a host
pub fn validate_url_syntax(url: &str) -> Result<(), ValidationError> {
    parse_with_host(url).map(|_| ())
}

/// Check the URL's host resolves
pub async fn validate_url_exists(url: &str) -> Result<(), ValidationError> {
    let parsed = parse_with_host(url)?;

    let domain = match parsed.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        // IP literals need no lookup
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => return Ok(()),
        None => return Err(ValidationError::MissingHost),
    };
    let port = parsed.port_or_known_default().unwrap_or(443);

    let lookup = tokio::net::lookup_host((domain.as_str(), port)).await;
    match lookup {
        Ok(mut addrs) => {
            if addrs.next().is_some() {
                Ok(())
            } else {
                Err(ValidationError::HostNotFound)
            }
        }
        Err(e) => {
            tracing::debug!(host = %domain, error = %e, "Host lookup failed");
            Err(ValidationError::HostNotFound)
        }
    }
}

fn parse_with_host(url: &str) -> Result<Url, ValidationError> {
    let parsed = Url::parse(url).map_err(|e| match e {
        ParseError::RelativeUrlWithoutBase => ValidationError::MissingScheme,
        other => ValidationError::Parse(other.to_string()),
    })?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(ValidationError::MissingHost),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_QUERY: &str = "https://www.google.com/search?q=hello+world&oq=hello+world&aqs=chrome..69i57j0l7.1001j0j7&sourceid=chrome&ie=UTF-8";

    #[test]
    fn test_length_rejects_empty() {
        let err = validate_url_length("").unwrap_err();
        assert_eq!(err, ValidationError::Empty);
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_length_rejects_short() {
        assert_eq!(
            validate_url_length("https:/m").unwrap_err(),
            ValidationError::TooShort
        );
        assert!(validate_url_length("http://a.co").is_ok());
    }

    #[test]
    fn test_length_rejects_over_2000() {
        let url = format!("https://a.com/{}", "x".repeat(2001 - "https://a.com/".len()));
        assert_eq!(url.len(), 2001);

        let err = validate_url_length(&url).unwrap_err();
        assert_eq!(err, ValidationError::TooLong);
        assert!(err.to_string().contains("too long"));

        assert!(validate_url_length(&url[..2000]).is_ok());
    }

    #[test]
    fn test_length_ignores_syntax() {
        assert!(validate_url_length(LONG_QUERY).is_ok());
        assert!(validate_url_length(LONG_QUERY.trim_start_matches("https://")).is_ok());
    }

    #[test]
    fn test_syntax_accepts_absolute_urls() {
        assert!(validate_url_syntax("https://www.google.com").is_ok());
        assert!(validate_url_syntax(LONG_QUERY).is_ok());
    }

    #[test]
    fn test_syntax_rejects_relative_and_garbage() {
        let relative = LONG_QUERY.trim_start_matches("https://");
        assert_eq!(
            validate_url_syntax(relative).unwrap_err(),
            ValidationError::MissingScheme
        );
        assert_eq!(
            validate_url_syntax("not a url").unwrap_err(),
            ValidationError::MissingScheme
        );
        assert!(matches!(
            validate_url_syntax("http://[::1"),
            Err(ValidationError::Parse(_))
        ));
    }

    #[test]
    fn test_syntax_requires_host() {
        assert_eq!(
            validate_url_syntax("mailto:someone@example.com").unwrap_err(),
            ValidationError::MissingHost
        );
    }

    #[tokio::test]
    async fn test_exists_accepts_ip_literals_without_lookup() {
        assert!(validate_url_exists("http://127.0.0.1:8080/x").await.is_ok());
        assert!(validate_url_exists("http://[::1]/x").await.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires a system resolver"]
    async fn test_exists_resolves_localhost() {
        assert!(validate_url_exists("http://localhost/x").await.is_ok());
    }

    // `.invalid` never resolves, and a lookup error maps to the same variant,
    // so this holds with or without a resolver
    #[tokio::test]
    async fn test_exists_rejects_unresolvable_host() {
        assert_eq!(
            validate_url_exists("https://no-such-host.invalid/x")
                .await
                .unwrap_err(),
            ValidationError::HostNotFound
        );
        assert!(validate_url_exists("not a url").await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires public DNS"]
    async fn test_google_passes_all_validators() {
        let url = "https://www.google.com";
        assert!(validate_url_length(url).is_ok());
        assert!(validate_url_syntax(url).is_ok());
        assert!(validate_url_exists(url).await.is_ok());
    }
}
