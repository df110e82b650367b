// src/ingest/types.rs
use std::fmt;

use serde::Deserialize;

use crate::error::{FetchError, ParseError};

/// Closed set of supported sites. Unknown identifiers are rejected when the config is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteId {
    FlRu,
    Freelancer,
    FreelancerJobs,
    #[serde(alias = "odesk")]
    Upwork,
}

impl SiteId {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteId::FlRu => "fl_ru",
            SiteId::Freelancer => "freelancer",
            SiteId::FreelancerJobs => "freelancer_jobs",
            SiteId::Upwork => "upwork",
        }
    }

    /// Short tag used as the notification subject prefix.
    pub fn tag(self) -> &'static str {
        match self {
            SiteId::FlRu => "FL",
            SiteId::Freelancer => "FR",
            SiteId::FreelancerJobs => "FJ",
            SiteId::Upwork => "UW",
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized project record. `description` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub url: String,
    pub description: String,
    pub bid_count: String,
    pub skill_tags: Vec<String>,
    pub price: String,
    pub source: SiteId,
}

impl Listing {
    pub fn subject(&self) -> String {
        format!("{}: {}", self.source.tag(), self.title)
    }

    /// Plain-text notification body; blank fields are left out.
    pub fn render_body(&self) -> String {
        let skills = self.skill_tags.join(", ");
        let fields = [
            ("Price", self.price.as_str()),
            ("Skills", skills.as_str()),
            ("Url", self.url.as_str()),
            ("Bids", self.bid_count.as_str()),
            ("Desc", self.description.as_str()),
        ];
        fields
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| format!("{k}: {}", v.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fetched page or feed, already decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub body: String,
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn site(&self) -> SiteId;
    fn endpoint(&self) -> &str;

    async fn fetch(&self) -> Result<RawDocument, FetchError>;

    /// Extract listings and apply the source's relevance filter.
    fn parse(&self, doc: &RawDocument) -> Result<Vec<Listing>, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            title: "Rust crawler".into(),
            url: "https://example.test/p/1".into(),
            description: "Need a crawler".into(),
            bid_count: "".into(),
            skill_tags: vec!["Rust".into(), "Go".into()],
            price: "  ".into(),
            source: SiteId::Freelancer,
        }
    }

    #[test]
    fn subject_uses_tag_and_title() {
        assert_eq!(listing().subject(), "FR: Rust crawler");
    }

    #[test]
    fn body_skips_blank_fields() {
        let body = listing().render_body();
        assert_eq!(
            body,
            "Skills: Rust, Go\nUrl: https://example.test/p/1\nDesc: Need a crawler"
        );
    }
}
