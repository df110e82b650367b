// src/ingest/providers/feed.rs
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use url::Url;

use super::{get_document, http_client};
use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError, ParseError};
use crate::ingest::types::{Listing, RawDocument, SiteId, SourceAdapter};
use crate::ingest::{collapse_whitespace, normalize_text};

/// Site branding appended to every item title.
pub const TITLE_SUFFIXES: [&str; 2] = [" - Upwork", " - oDesk"];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// Syndication feed (Upwork, formerly oDesk). No relevance filter: the feed URL is the query.
pub struct FeedSource {
    url: Url,
    client: reqwest::Client,
}

impl FeedSource {
    pub fn new(cfg: &SourceConfig, fetch_timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            url: cfg.endpoint.clone(),
            client: http_client(fetch_timeout, None)?,
        })
    }
}

pub fn strip_title_suffix(title: &str) -> String {
    let t = collapse_whitespace(title);
    TITLE_SUFFIXES
        .iter()
        .find_map(|s| t.strip_suffix(s))
        .map(str::to_string)
        .unwrap_or(t)
}

/// Parse an RSS 2.0 document; every item becomes one listing.
pub fn parse_feed(xml: &str) -> Result<Vec<Listing>, ParseError> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean)?;

    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| Listing {
            title: strip_title_suffix(it.title.as_deref().unwrap_or_default()),
            url: it.link.as_deref().map(str::trim).unwrap_or_default().to_string(),
            description: normalize_text(it.description.as_deref().unwrap_or_default()),
            bid_count: String::new(),
            skill_tags: Vec::new(),
            price: String::new(),
            source: SiteId::Upwork,
        })
        .collect())
}

#[async_trait]
impl SourceAdapter for FeedSource {
    fn site(&self) -> SiteId {
        SiteId::Upwork
    }

    fn endpoint(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch(&self) -> Result<RawDocument, FetchError> {
        get_document(&self.client, self.url.as_str()).await
    }

    fn parse(&self, doc: &RawDocument) -> Result<Vec<Listing>, ParseError> {
        parse_feed(&doc.body)
    }
}

/// Named HTML entities are not valid XML; replace the common ones before parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
