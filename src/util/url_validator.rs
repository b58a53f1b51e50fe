use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a feed or webhook URL.
///
/// Only `http` and `https` URLs with a host are accepted. Private and
/// loopback addresses are allowed: self-hosted webhook relays commonly
/// live on the local network.
///
/// # Examples
///
/// ```
/// use feedhook::util::validate_http_url;
///
/// assert!(validate_http_url("https://example.com/feed.xml").is_ok());
/// assert!(validate_http_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_http_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_http_url("https://example.com/feed.xml").is_ok());
        assert!(validate_http_url("http://news.example.org").is_ok());
        assert!(validate_http_url("http://127.0.0.1:8080/hook").is_ok());
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_http_url("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_http_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_unparseable() {
        assert!(matches!(
            validate_http_url("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
        assert!(validate_http_url("").is_err());
    }
}
