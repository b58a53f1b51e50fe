//! Small helpers shared by the formatter and the configuration loader.
//!
//! - **Text processing**: HTML tag stripping and character-count truncation
//! - **URL validation**: scheme and host checks for feed and webhook URLs

mod text;
mod url_validator;

pub use text::{strip_html_tags, truncate_chars, ELLIPSIS};
pub use url_validator::{validate_http_url, UrlValidationError};
