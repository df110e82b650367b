// src/ingest/providers/html_list.rs
//! Keyword-filtered blog-style listing page (fl.ru).
//!
//! The origin rejects non-browser clients, serves windows-1251, and wraps the
//! real markup in a `document.write('…')` script that has to be unwrapped
//! before the HTML parser sees it.

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::WINDOWS_1251;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::{get_bytes, http_client, resolve_link, selector, text_of};
use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError, ParseError};
use crate::ingest::types::{Listing, RawDocument, SiteId, SourceAdapter};
use crate::ingest::KeywordFilter;

pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/38.0.2125.101 YaBrowser/14.12.2125.8016 Safari/537.36";

const SCRIPT_OPEN: &str = "<script type=\"text/javascript\">document.write('";
const SCRIPT_CLOSE: &str = "');</script>";

static LIST: Lazy<Selector> = Lazy::new(|| selector("div#projects-list"));
static POST: Lazy<Selector> = Lazy::new(|| selector("div#projects-list div.b-post"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h2 a"));
static BODY: Lazy<Selector> = Lazy::new(|| selector("div.b-post__body"));
static BIDS: Lazy<Selector> = Lazy::new(|| selector("a.b-post__link_bold.b-page__desktop"));
static PRICE: Lazy<Selector> = Lazy::new(|| selector(".b-post__price"));

pub struct HtmlListSource {
    base: Url,
    page_url: String,
    keywords: KeywordFilter,
    client: reqwest::Client,
}

impl HtmlListSource {
    pub fn new(cfg: &SourceConfig, fetch_timeout: Duration) -> Result<Self, ConfigError> {
        let page_url = format!("{}/projects/", cfg.endpoint.as_str().trim_end_matches('/'));
        Ok(Self {
            base: cfg.endpoint.clone(),
            page_url,
            keywords: KeywordFilter::new(cfg.keywords())?,
            client: http_client(fetch_timeout, Some(USER_AGENT))?,
        })
    }
}

/// windows-1251 bytes to UTF-8 text, with the `document.write` wrapper removed.
pub fn decode_page(bytes: &[u8]) -> String {
    let (text, _had_errors) = WINDOWS_1251.decode_without_bom_handling(bytes);
    text.replace(SCRIPT_OPEN, "").replace(SCRIPT_CLOSE, "")
}

#[async_trait]
impl SourceAdapter for HtmlListSource {
    fn site(&self) -> SiteId {
        SiteId::FlRu
    }

    fn endpoint(&self) -> &str {
        &self.page_url
    }

    async fn fetch(&self) -> Result<RawDocument, FetchError> {
        let bytes = get_bytes(&self.client, &self.page_url).await?;
        Ok(RawDocument {
            url: self.page_url.clone(),
            body: decode_page(&bytes),
        })
    }

    fn parse(&self, doc: &RawDocument) -> Result<Vec<Listing>, ParseError> {
        let page = Html::parse_document(&doc.body);
        if page.select(&LIST).next().is_none() {
            return Err(ParseError::MissingElement("div#projects-list"));
        }

        let mut out = Vec::new();
        for post in page.select(&POST) {
            let link = post
                .select(&TITLE)
                .next()
                .ok_or(ParseError::MissingElement("div.b-post h2 a"))?;
            let href = link
                .value()
                .attr("href")
                .ok_or(ParseError::MissingElement("div.b-post h2 a[href]"))?;

            let description = post.select(&BODY).next().map(text_of).unwrap_or_default();
            if !self.keywords.matches(&description) {
                continue;
            }

            out.push(Listing {
                title: text_of(link),
                url: resolve_link(&self.base, href)?,
                description,
                bid_count: post.select(&BIDS).next().map(text_of).unwrap_or_default(),
                skill_tags: Vec::new(),
                price: post.select(&PRICE).next().map(text_of).unwrap_or_default(),
                source: SiteId::FlRu,
            });
        }
        Ok(out)
    }
}
