use async_trait::async_trait;
use mercury_core::{Error, PageFetcher, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Serves canned bodies by exact URL. Anything else times out.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    pages: Arc<HashMap<String, String>>,
    calls: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(url.to_string(), body.to_string());
        Self {
            pages: Arc::new(pages),
            calls: self.calls,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Timeout(url.to_string()))
    }
}

pub fn article_html(title: &str, body: &str, published: Option<&str>) -> String {
    let time = published
        .map(|date| format!(r#"<time datetime="{}">{}</time>"#, date, date))
        .unwrap_or_default();
    format!(
        concat!(
            "<html><head><title>{title}</title></head>",
            "<body><h1>{title}</h1>{time}<p>{body}</p></body></html>"
        ),
        title = title,
        time = time,
        body = body
    )
}

/// An RSS document with one `<item>` per `(story_id, title, description)`.
pub fn rss_feed(base_url: &str, items: &[(i64, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(id, title, description)| {
            format!(
                concat!(
                    "<item><title>{}</title><link>{}/story/{}/slug/</link>",
                    "<description><![CDATA[{}]]></description></item>"
                ),
                title, base_url, id, description
            )
        })
        .collect();
    format!("<rss><channel><title>Feed</title>{}</channel></rss>", items)
}
