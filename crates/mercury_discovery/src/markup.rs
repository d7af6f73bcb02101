//! Extraction of story fields from article pages and feed documents.
//!
//! Everything here is synchronous and returns owned data: `scraper::Html`
//! is not `Send`, so a parsed document must never live across an `.await`.

use mercury_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};

const TITLE_SELECTOR: &str = "h1, title";
const CONTENT_SELECTOR: &str =
    "p, div[class*=content], div[class*=article], div[class*=story]";
const DATE_SELECTOR: &str = "time[datetime], [datetime]";
const CONTENT_BLOCKS: usize = 5;

const ENTRY_SELECTOR: &str = "item, entry";
const ENTRY_DESCRIPTION_SELECTOR: &str = "description, summary";
// html5ever lowercases tag names, so RSS `pubDate` arrives as `pubdate`.
const ENTRY_DATE_SELECTOR: &str = "pubdate, published, updated";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePage {
    pub title: String,
    pub content: String,
    pub publish_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid selector {}: {:?}", css, e)))
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef) -> String {
    normalize(&element.text().collect::<String>())
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn parse_article_page(html: &str) -> Result<ArticlePage> {
    let document = Html::parse_document(html);
    let title_selector = selector(TITLE_SELECTOR)?;
    let content_selector = selector(CONTENT_SELECTOR)?;
    let date_selector = selector(DATE_SELECTOR)?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let content = document
        .select(&content_selector)
        .take(CONTENT_BLOCKS)
        .map(|el| element_text(&el))
        .collect::<Vec<_>>()
        .join(" ");

    let publish_date = document
        .select(&date_selector)
        .next()
        .map(|el| {
            let attr = el.value().attr("datetime").map(str::trim).unwrap_or_default();
            if attr.is_empty() {
                element_text(&el)
            } else {
                attr.to_string()
            }
        })
        .unwrap_or_default();

    Ok(ArticlePage {
        title,
        content,
        publish_date,
    })
}

/// The URL of an entry's `link` element.
///
/// RSS puts the URL in the element text, but HTML parsing treats `<link>` as
/// void so that text ends up as the following sibling. Atom uses `href`.
fn entry_link(link: ElementRef) -> Option<String> {
    non_empty(element_text(&link))
        .or_else(|| link.value().attr("href").map(|href| href.trim().to_string()))
        .filter(|href| !href.is_empty())
        .or_else(|| {
            link.next_sibling()
                .and_then(|node| node.value().as_text().map(|text| text.trim().to_string()))
                .filter(|text| !text.is_empty())
        })
}

fn strip_cdata(xml: &str) -> String {
    xml.replace("<![CDATA[", "").replace("]]>", "")
}

pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let document = Html::parse_document(&strip_cdata(xml));
    let entry_selector = selector(ENTRY_SELECTOR)?;
    let title_selector = selector("title")?;
    let link_selector = selector("link")?;
    let description_selector = selector(ENTRY_DESCRIPTION_SELECTOR)?;
    let date_selector = selector(ENTRY_DATE_SELECTOR)?;

    let entries = document
        .select(&entry_selector)
        .map(|entry| FeedEntry {
            title: entry
                .select(&title_selector)
                .next()
                .and_then(|el| non_empty(element_text(&el))),
            link: entry.select(&link_selector).next().and_then(entry_link),
            description: entry
                .select(&description_selector)
                .next()
                .map(|el| element_text(&el)),
            published: entry
                .select(&date_selector)
                .next()
                .and_then(|el| non_empty(element_text(&el))),
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article_page() {
        let html = r#"
            <html><head><title>Site title | Mercury</title></head>
            <body>
              <h1>  Council   votes on budget </h1>
              <time datetime="2025-05-06T09:00:00+10:00">6 May 2025</time>
              <p>First paragraph.</p>
              <div class="story-body">Story body text</div>
              <p>Second <b>bold</b> paragraph.</p>
            </body></html>
        "#;
        let page = parse_article_page(html).unwrap();
        assert_eq!(page.title, "Site title | Mercury");
        assert_eq!(page.publish_date, "2025-05-06T09:00:00+10:00");
        assert!(page.content.starts_with("First paragraph."));
        assert!(page.content.contains("Story body text"));
        assert!(page.content.contains("Second bold paragraph."));
    }

    #[test]
    fn test_article_title_prefers_document_order_and_date_falls_back_to_text() {
        let html = r#"
            <body>
              <h1>Headline</h1>
              <span datetime="">Yesterday</span>
            </body>
        "#;
        let page = parse_article_page(html).unwrap();
        assert_eq!(page.title, "Headline");
        assert_eq!(page.publish_date, "Yesterday");
        assert_eq!(page.content, "");
    }

    #[test]
    fn test_content_limited_to_five_blocks() {
        let html = (1..=8)
            .map(|i| format!("<p>para{}</p>", i))
            .collect::<String>();
        let page = parse_article_page(&html).unwrap();
        assert_eq!(page.content, "para1 para2 para3 para4 para5");
    }

    #[test]
    fn test_parse_rss_feed() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel>
              <title>Illawarra Mercury</title>
              <link>https://www.illawarramercury.com.au/</link>
              <item>
                <title><![CDATA[Council vote tonight]]></title>
                <link>https://www.illawarramercury.com.au/story/9053001/council-vote/</link>
                <description><![CDATA[<p>The council will vote.</p>]]></description>
                <pubDate>Tue, 06 May 2025 09:00:00 +1000</pubDate>
              </item>
              <item>
                <title>No link here</title>
              </item>
            </channel></rss>"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Council vote tonight"));
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://www.illawarramercury.com.au/story/9053001/council-vote/")
        );
        assert_eq!(entries[0].description.as_deref(), Some("The council will vote."));
        assert_eq!(
            entries[0].published.as_deref(),
            Some("Tue, 06 May 2025 09:00:00 +1000")
        );
        assert_eq!(entries[1].link, None);
        assert_eq!(entries[1].description, None);
    }

    #[test]
    fn test_parse_atom_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
              <entry>
                <title>Surf club rescue</title>
                <link href="https://www.illawarramercury.com.au/story/9050000/surf/"/>
                <summary>Lifesavers praised</summary>
                <updated>2025-05-06T09:00:00Z</updated>
              </entry>
            </feed>"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://www.illawarramercury.com.au/story/9050000/surf/")
        );
        assert_eq!(entries[0].description.as_deref(), Some("Lifesavers praised"));
    }

    #[test]
    fn test_empty_feed_has_no_entries() {
        let entries = parse_feed("<rss><channel><title>Empty</title></channel></rss>").unwrap();
        assert!(entries.is_empty());
    }
}
