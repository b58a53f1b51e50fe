//! Picks an image for an entry.
//!
//! Sources are tried in a fixed order and the first hit wins:
//! media content, media thumbnail, an `image/*` link, the first `<img>` in
//! the summary, then a per-site CDN guess built from the article URL.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::parser::FeedEntry;

static IMG_SRC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).expect("img pattern is valid")
});

static TRAILING_SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([a-z0-9-]+)$").expect("slug pattern is valid"));

/// Thumbnail URL convention of a news site's image CDN.
struct CdnThumbnailRule {
    /// Registrable domains; subdomains match too.
    hosts: &'static [&'static str],
    url_prefix: &'static str,
    url_suffix: &'static str,
}

const CDN_RULES: &[CdnThumbnailRule] = &[CdnThumbnailRule {
    hosts: &["bbc.co.uk", "bbc.com"],
    url_prefix: "https://ichef.bbci.co.uk/news/1024/branded_news/",
    url_suffix: ".jpg",
}];

/// Return the best image URL for `entry`, if any.
pub fn extract_image(entry: &FeedEntry) -> Option<String> {
    if let Some(url) = entry.media_content.first() {
        return Some(url.clone());
    }

    if let Some(url) = entry.media_thumbnails.first() {
        return Some(url.clone());
    }

    if let Some(link) = entry.links.iter().find(|l| {
        l.media_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
    }) {
        return Some(link.href.clone());
    }

    if let Some(src) = entry.summary.as_deref().and_then(first_img_src) {
        return Some(src);
    }

    entry.link.as_deref().and_then(guess_cdn_thumbnail)
}

/// First `<img src="...">` in an HTML fragment, with `//host/...` made absolute.
fn first_img_src(html: &str) -> Option<String> {
    let src = IMG_SRC_PATTERN.captures(html)?.get(1)?.as_str();
    if src.starts_with("//") {
        Some(format!("https:{}", src))
    } else {
        Some(src.to_string())
    }
}

/// Best-effort thumbnail guess for known news sites. The result may 404.
fn guess_cdn_thumbnail(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?;

    let rule = CDN_RULES.iter().find(|rule| {
        rule.hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
    })?;

    let slug = TRAILING_SLUG_PATTERN.captures(url.path())?.get(1)?.as_str();
    Some(format!("{}{}{}", rule.url_prefix, slug, rule.url_suffix))
}
