use anyhow::Result;
use feed_rs::model::Entry;
use feed_rs::parser;
use url::Url;

/// Title used whenever an entry has none.
pub const UNTITLED: &str = "Untitled";

/// A link attached to an entry, with its declared media type if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryLink {
    pub href: String,
    pub media_type: Option<String>,
}

/// One item of a fetched feed.
///
/// Every field a downstream step may look at is present here, with absence
/// spelled out as `None` or an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    /// Article link; this is the article's identity in the seen-article store.
    pub link: Option<String>,
    /// Raw summary, usually HTML.
    pub summary: Option<String>,
    /// Publish date as RFC 3339.
    pub published: Option<String>,
    pub media_content: Vec<String>,
    pub media_thumbnails: Vec<String>,
    pub links: Vec<EntryLink>,
}

impl FeedEntry {
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }
}

/// Parse an RSS or Atom document into entries, preserving document order.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<FeedEntry>> {
    let feed = parser::parse(bytes)?;
    Ok(feed.entries.into_iter().map(to_feed_entry).collect())
}

fn to_feed_entry(entry: Entry) -> FeedEntry {
    let links: Vec<EntryLink> = entry
        .links
        .iter()
        .map(|l| EntryLink {
            href: l.href.clone(),
            media_type: l.media_type.clone(),
        })
        .collect();

    // Prefer the alternate link; fall back to whatever comes first
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .or_else(|| permalink_id(&entry.id));

    let title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty());
    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body));
    let published = entry.published.map(|dt| dt.to_rfc3339());

    let mut media_content = Vec::new();
    let mut media_thumbnails = Vec::new();
    for media in entry.media {
        for content in media.content {
            let is_image = content
                .content_type
                .as_ref()
                .map_or(true, |ct| ct.to_string().starts_with("image/"));
            if let (true, Some(url)) = (is_image, content.url) {
                media_content.push(url.to_string());
            }
        }
        for thumbnail in media.thumbnails {
            media_thumbnails.push(thumbnail.image.uri);
        }
    }

    FeedEntry {
        title,
        link,
        summary,
        published,
        media_content,
        media_thumbnails,
        links,
    }
}

/// An entry id usable as its link: RSS `<guid isPermaLink="true">` and
/// Atom ids that are plain web URLs.
fn permalink_id(id: &str) -> Option<String> {
    let id = id.trim();
    let url = Url::parse(id).ok()?;
    let is_web = matches!(url.scheme(), "http" | "https") && url.host_str().is_some();
    is_web.then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RSS_WITH_MEDIA: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
    <title>Example</title>
    <item>
        <title>First</title>
        <link>https://example.com/first</link>
        <description>&lt;p&gt;Hello&lt;/p&gt;</description>
        <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
        <media:thumbnail url="https://cdn.example.com/thumb.jpg" width="240" height="135"/>
    </item>
    <item>
        <title>Second</title>
        <link>https://example.com/second</link>
    </item>
</channel>
</rss>"#;

    const ATOM_WITH_IMAGE_LINK: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Example Atom</title>
    <id>urn:example</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <entry>
        <id>urn:example:1</id>
        <title>Atom Entry</title>
        <updated>2024-01-01T00:00:00Z</updated>
        <link rel="enclosure" type="image/png" href="https://example.com/pic.png"/>
        <link rel="alternate" href="https://example.com/atom-entry"/>
        <summary>Plain summary</summary>
    </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_entries_in_order() {
        let entries = parse_entries(RSS_WITH_MEDIA.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title.as_deref(), Some("First"));
        assert_eq!(first.link.as_deref(), Some("https://example.com/first"));
        assert_eq!(first.summary.as_deref(), Some("<p>Hello</p>"));
        assert!(first.published.as_deref().unwrap().starts_with("2024-01-01T12:00:00"));
        assert_eq!(
            first.media_thumbnails,
            vec!["https://cdn.example.com/thumb.jpg".to_string()]
        );

        let second = &entries[1];
        assert_eq!(second.title.as_deref(), Some("Second"));
        assert_eq!(second.summary, None);
        assert_eq!(second.published, None);
    }

    #[test]
    fn test_parse_atom_prefers_alternate_link() {
        let entries = parse_entries(ATOM_WITH_IMAGE_LINK.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.link.as_deref(), Some("https://example.com/atom-entry"));
        assert!(entry
            .links
            .iter()
            .any(|l| l.media_type.as_deref() == Some("image/png")));
    }

    #[test]
    fn test_media_content_keeps_images_only() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
    <title>Example</title>
    <item>
        <title>Clip</title>
        <link>https://example.com/clip</link>
        <media:content url="https://cdn.example.com/clip.mp4" type="video/mp4"/>
        <media:content url="https://cdn.example.com/still.jpg" type="image/jpeg"/>
    </item>
</channel>
</rss>"#;

        let entries = parse_entries(rss.as_bytes()).unwrap();
        assert_eq!(
            entries[0].media_content,
            vec!["https://cdn.example.com/still.jpg".to_string()]
        );
    }

    #[test]
    fn test_permalink_guid_used_when_link_missing() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
<channel>
    <title>Example</title>
    <item>
        <title>Guid only</title>
        <guid isPermaLink="true">https://example.com/guid-only</guid>
    </item>
    <item>
        <title>Opaque guid</title>
        <guid isPermaLink="false">tag:example.com,2024:42</guid>
    </item>
</channel>
</rss>"#;

        let entries = parse_entries(rss.as_bytes()).unwrap();
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/guid-only"));
        assert_eq!(entries[1].link, None);
    }

    #[test]
    fn test_link_beats_permalink_guid() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
<channel>
    <title>Example</title>
    <item>
        <title>Both</title>
        <link>https://example.com/article</link>
        <guid isPermaLink="true">https://example.com/?p=7</guid>
    </item>
</channel>
</rss>"#;

        let entries = parse_entries(rss.as_bytes()).unwrap();
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/article"));
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let entry = FeedEntry::default();
        assert_eq!(entry.title_or_default(), UNTITLED);
    }

    #[test]
    fn test_invalid_document_is_error() {
        assert!(parse_entries(b"<not valid xml").is_err());
    }
}
