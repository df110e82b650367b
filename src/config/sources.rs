// src/config/sources.rs
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::ingest::types::SiteId;
use crate::ingest::KeywordFilter;

/// Relevance criteria for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    /// Regex patterns, matched case-insensitively against the description (any-match).
    Keywords(Vec<String>),
    /// Required skill tags (non-empty intersection).
    Skills(Vec<String>),
    /// Every item is relevant.
    Unfiltered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub site: SiteId,
    /// Operator switch; disabled entries get no adapter.
    pub enabled: bool,
    pub endpoint: Url,
    pub criteria: Criteria,
}

/// Accepts either a TOML array or a comma separated string (`"php, python"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum StringList {
    List(Vec<String>),
    Csv(String),
}

impl StringList {
    fn into_items(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            StringList::List(v) => v,
            StringList::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        let mut out: Vec<String> = Vec::with_capacity(raw.len());
        for it in raw {
            let t = it.trim();
            if !t.is_empty() && !out.iter().any(|o| o == t) {
                out.push(t.to_string());
            }
        }
        out
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SourceEntry {
    site: SiteId,
    #[serde(default = "super::default_true")]
    enabled: bool,
    uri: String,
    #[serde(default)]
    keywords: Option<StringList>,
    #[serde(default)]
    skills: Option<StringList>,
}

impl TryFrom<SourceEntry> for SourceConfig {
    type Error = ConfigError;

    fn try_from(e: SourceEntry) -> Result<Self, Self::Error> {
        let site = e.site;
        let endpoint = Url::parse(e.uri.trim()).map_err(|err| ConfigError::InvalidEndpoint {
            site: site.as_str(),
            uri: e.uri.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                site: site.as_str(),
                uri: e.uri,
                reason: "scheme must be http or https".to_string(),
            });
        }

        let criteria = match site {
            SiteId::FlRu => {
                let keywords = required(e.keywords, site, "keywords")?;
                // compile once here so a bad pattern fails the reload, not the cycle
                KeywordFilter::new(&keywords)?;
                Criteria::Keywords(keywords)
            }
            SiteId::Freelancer | SiteId::FreelancerJobs => {
                Criteria::Skills(required(e.skills, site, "skills")?)
            }
            SiteId::Upwork => Criteria::Unfiltered,
        };

        Ok(SourceConfig {
            site,
            enabled: e.enabled,
            endpoint,
            criteria,
        })
    }
}

fn required(
    list: Option<StringList>,
    site: SiteId,
    field: &'static str,
) -> Result<Vec<String>, ConfigError> {
    let items = list.map(StringList::into_items).unwrap_or_default();
    if items.is_empty() {
        return Err(ConfigError::MissingCriteria {
            site: site.as_str(),
            field,
        });
    }
    Ok(items)
}

impl SourceConfig {
    pub fn keywords(&self) -> &[String] {
        match &self.criteria {
            Criteria::Keywords(k) => k,
            _ => &[],
        }
    }

    pub fn skills(&self) -> &[String] {
        match &self.criteria {
            Criteria::Skills(s) => s,
            _ => &[],
        }
    }
}
