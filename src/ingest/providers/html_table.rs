// src/ingest/providers/html_table.rs
//! Tabular marketplace front page (freelancer.com), one `tr.project-details` per project.
//!
//! The cells carry no names, only positions, so the layout lives in one place
//! ([`RowCells`]) and a short row fails loudly instead of shifting fields.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{get_document, http_client, resolve_link, selector, text_of};
use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError, ParseError};
use crate::ingest::skill_intersection;
use crate::ingest::types::{Listing, RawDocument, SiteId, SourceAdapter};

static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static ROW: Lazy<Selector> = Lazy::new(|| selector("tr.project-details"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));

/// Column positions of a project row.
mod col {
    pub const TITLE: usize = 0;
    pub const DESCRIPTION: usize = 1;
    pub const BIDS: usize = 2;
    pub const SKILLS: usize = 3;
    // 4: posted, 5: ends
    pub const PRICE: usize = 6;
    pub const COUNT: usize = 7;
}

/// Cells of one row, read strictly by position.
struct RowCells<'a> {
    cells: Vec<ElementRef<'a>>,
}

impl<'a> RowCells<'a> {
    fn from_row(row: ElementRef<'a>, index: usize) -> Result<Self, ParseError> {
        let cells: Vec<ElementRef<'a>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();
        if cells.len() < col::COUNT {
            return Err(ParseError::RowShape {
                row: index,
                found: cells.len(),
                expected: col::COUNT,
            });
        }
        Ok(Self { cells })
    }

    /// First link of the title cell outside the nested promotions list.
    fn title_link(&self) -> Option<ElementRef<'a>> {
        self.cells[col::TITLE]
            .select(&LINK)
            .find(|a| !inside_promotions(*a))
    }

    fn description(&self) -> String {
        text_of(self.cells[col::DESCRIPTION])
    }

    fn bids(&self) -> String {
        text_of(self.cells[col::BIDS])
    }

    fn skills(&self) -> Vec<String> {
        self.cells[col::SKILLS]
            .select(&LINK)
            .map(text_of)
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn price(&self) -> String {
        text_of(self.cells[col::PRICE])
    }
}

fn inside_promotions(el: ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|a| {
        a.value().name() == "ul" && a.value().classes().any(|c| c == "promotions")
    })
}

pub struct HtmlTableSource {
    base: Url,
    skills: Vec<String>,
    client: reqwest::Client,
}

impl HtmlTableSource {
    pub fn new(cfg: &SourceConfig, fetch_timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            base: cfg.endpoint.clone(),
            skills: cfg.skills().to_vec(),
            client: http_client(fetch_timeout, None)?,
        })
    }
}

#[async_trait]
impl SourceAdapter for HtmlTableSource {
    fn site(&self) -> SiteId {
        SiteId::Freelancer
    }

    fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    async fn fetch(&self) -> Result<RawDocument, FetchError> {
        get_document(&self.client, self.base.as_str()).await
    }

    fn parse(&self, doc: &RawDocument) -> Result<Vec<Listing>, ParseError> {
        let page = Html::parse_document(&doc.body);
        if page.select(&TABLE).next().is_none() {
            return Err(ParseError::MissingElement("table"));
        }

        let mut out = Vec::new();
        for (index, row) in page.select(&ROW).enumerate() {
            let cells = RowCells::from_row(row, index)?;

            let link = cells
                .title_link()
                .ok_or(ParseError::MissingElement("tr.project-details td a"))?;
            let href = link
                .value()
                .attr("href")
                .ok_or(ParseError::MissingElement("tr.project-details td a[href]"))?;

            let matched = skill_intersection(&self.skills, &cells.skills());
            if matched.is_empty() {
                continue;
            }

            out.push(Listing {
                title: text_of(link),
                url: resolve_link(&self.base, href)?,
                description: cells.description(),
                bid_count: cells.bids(),
                skill_tags: matched,
                price: cells.price(),
                source: SiteId::Freelancer,
            });
        }
        Ok(out)
    }
}
