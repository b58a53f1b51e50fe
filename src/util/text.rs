use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "...";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Removes every `<...>` tag from an HTML fragment, keeping the text between them.
///
/// Entities are left as they are. Returns `Cow::Borrowed` when there is
/// nothing to strip.
///
/// # Examples
///
/// ```
/// use feedhook::util::strip_html_tags;
///
/// assert_eq!(strip_html_tags("<p>hi</p>"), "hi");
/// assert_eq!(strip_html_tags("plain"), "plain");
/// ```
pub fn strip_html_tags(html: &str) -> Cow<'_, str> {
    TAG_PATTERN.replace_all(html, "")
}

/// Truncates to at most `max_chars` characters, appending [`ELLIPSIS`] when cut.
///
/// Counts Unicode scalar values, not bytes or display columns, so the cut
/// never lands inside a multi-byte character. Text that already fits is
/// returned borrowed and unchanged.
///
/// # Examples
///
/// ```
/// use feedhook::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Hello World", 5), "Hello...");
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS)),
        None => Cow::Borrowed(s),
    }
}
