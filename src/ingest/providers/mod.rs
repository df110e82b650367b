// src/ingest/providers/mod.rs
pub mod embedded_json;
pub mod feed;
pub mod html_list;
pub mod html_table;

use std::time::Duration;

use url::Url;

use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError, ParseError};
use crate::ingest::types::{RawDocument, SiteId, SourceAdapter};

use self::embedded_json::EmbeddedJsonSource;
use self::feed::FeedSource;
use self::html_list::HtmlListSource;
use self::html_table::HtmlTableSource;

/// Builds the adapter for one enabled config entry.
pub trait AdapterFactory: Send + Sync {
    fn build(
        &self,
        source: &SourceConfig,
        fetch_timeout: Duration,
    ) -> Result<Box<dyn SourceAdapter>, ConfigError>;
}

/// The production factory: one HTTP-backed variant per [`SiteId`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteAdapters;

impl AdapterFactory for SiteAdapters {
    fn build(
        &self,
        source: &SourceConfig,
        fetch_timeout: Duration,
    ) -> Result<Box<dyn SourceAdapter>, ConfigError> {
        build_adapter(source, fetch_timeout)
    }
}

pub fn build_adapter(
    source: &SourceConfig,
    fetch_timeout: Duration,
) -> Result<Box<dyn SourceAdapter>, ConfigError> {
    Ok(match source.site {
        SiteId::FlRu => Box::new(HtmlListSource::new(source, fetch_timeout)?),
        SiteId::Freelancer => Box::new(HtmlTableSource::new(source, fetch_timeout)?),
        SiteId::FreelancerJobs => Box::new(EmbeddedJsonSource::new(source, fetch_timeout)?),
        SiteId::Upwork => Box::new(FeedSource::new(source, fetch_timeout)?),
    })
}

pub(crate) fn http_client(
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5));
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    builder.build().map_err(ConfigError::Client)
}

/// GET `url` and return the body bytes; non-2xx is a fetch error.
pub(crate) async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

/// GET `url` as text (charset from the response, UTF-8 otherwise).
pub(crate) async fn get_document(
    client: &reqwest::Client,
    url: &str,
) -> Result<RawDocument, FetchError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = resp.text().await?;
    Ok(RawDocument {
        url: url.to_string(),
        body,
    })
}

/// Resolve a possibly relative link against the source base.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Result<String, ParseError> {
    base.join(href.trim())
        .map(String::from)
        .map_err(|source| ParseError::InvalidUrl {
            href: href.to_string(),
            source,
        })
}

/// Element text with whitespace collapsed.
pub(crate) fn text_of(el: scraper::ElementRef<'_>) -> String {
    crate::ingest::collapse_whitespace(&el.text().collect::<String>())
}

pub(crate) fn selector(css: &'static str) -> scraper::Selector {
    scraper::Selector::parse(css).expect("static css selector")
}
