// src/ingest/providers/embedded_json.rs
//! Marketplace page that ships its data as two inline script assignments:
//! `var jobInfo = {…};` (skill id → name) and `var aaData = […];` (projects).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{get_document, http_client, resolve_link};
use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError, ParseError};
use crate::ingest::types::{Listing, RawDocument, SiteId, SourceAdapter};
use crate::ingest::{collapse_whitespace, normalize_text, skill_intersection};

pub const JOB_INFO_MARKER: &str = "var jobInfo = ";
pub const PROJECTS_MARKER: &str = "var aaData = ";

static RE_JOB_INFO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\s+jobInfo\s*=\s*").expect("jobInfo marker regex"));
static RE_PROJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\s+aaData\s*=\s*").expect("aaData marker regex"));

/// Number or string in the page data.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(v) => f.write_str(v.trim()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillName {
    Plain(String),
    Named { name: String },
}

impl SkillName {
    fn into_name(self) -> String {
        match self {
            SkillName::Plain(n) | SkillName::Named { name: n } => n,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SkillRecord {
    id: Scalar,
    name: String,
}

/// `jobInfo` is either an id-keyed object or a list of `{id, name}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobInfo {
    Map(HashMap<String, SkillName>),
    List(Vec<SkillRecord>),
}

impl JobInfo {
    fn into_lookup(self) -> HashMap<String, String> {
        match self {
            JobInfo::Map(m) => m.into_iter().map(|(k, v)| (k, v.into_name())).collect(),
            JobInfo::List(v) => v
                .into_iter()
                .map(|r| (r.id.to_string(), r.name))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Budget {
    #[serde(default)]
    min: Option<Scalar>,
    #[serde(default)]
    max: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    #[serde(alias = "project_name")]
    title: String,
    #[serde(default, alias = "seo_url")]
    url: String,
    #[serde(default, alias = "project_desc")]
    description: String,
    #[serde(default, alias = "bids")]
    bid_count: Option<Scalar>,
    #[serde(default, alias = "jobs")]
    job_ids: Vec<Scalar>,
    #[serde(default)]
    budget: Option<Budget>,
    #[serde(default)]
    currency: Option<String>,
}

/// First JSON value following `marker`; trailing `;` and later script are ignored.
fn json_after<T: DeserializeOwned>(
    body: &str,
    marker: &Regex,
    name: &'static str,
) -> Result<T, ParseError> {
    let m = marker.find(body).ok_or(ParseError::MissingMarker(name))?;
    let mut stream = serde_json::Deserializer::from_str(&body[m.end()..]).into_iter::<T>();
    match stream.next() {
        Some(Ok(v)) => Ok(v),
        Some(Err(e)) => Err(ParseError::Json(e)),
        None => Err(ParseError::MissingMarker(name)),
    }
}

fn synthesize_price(budget: Option<&Budget>, currency: &str) -> String {
    let Some(b) = budget else {
        return String::new();
    };
    match (&b.min, &b.max) {
        (Some(min), Some(max)) => format!("{currency}{min} - {currency}{max}"),
        (Some(min), None) => format!("from {currency}{min}"),
        (None, Some(max)) => format!("up to {currency}{max}"),
        (None, None) => String::new(),
    }
}

pub struct EmbeddedJsonSource {
    base: Url,
    skills: Vec<String>,
    client: reqwest::Client,
}

impl EmbeddedJsonSource {
    pub fn new(cfg: &SourceConfig, fetch_timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            base: cfg.endpoint.clone(),
            skills: cfg.skills().to_vec(),
            client: http_client(fetch_timeout, None)?,
        })
    }
}

#[async_trait]
impl SourceAdapter for EmbeddedJsonSource {
    fn site(&self) -> SiteId {
        SiteId::FreelancerJobs
    }

    fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    async fn fetch(&self) -> Result<RawDocument, FetchError> {
        get_document(&self.client, self.base.as_str()).await
    }

    fn parse(&self, doc: &RawDocument) -> Result<Vec<Listing>, ParseError> {
        let lookup = json_after::<JobInfo>(&doc.body, &RE_JOB_INFO, JOB_INFO_MARKER)?.into_lookup();
        let projects: Vec<ProjectRecord> = json_after(&doc.body, &RE_PROJECTS, PROJECTS_MARKER)?;

        let mut out = Vec::new();
        for p in projects {
            let names: Vec<String> = p
                .job_ids
                .iter()
                .filter_map(|id| lookup.get(&id.to_string()).cloned())
                .collect();
            let matched = skill_intersection(&self.skills, &names);
            if matched.is_empty() {
                continue;
            }

            let url = if p.url.trim().is_empty() {
                String::new()
            } else {
                resolve_link(&self.base, &p.url)?
            };
            let currency = p.currency.as_deref().unwrap_or_default();

            out.push(Listing {
                title: collapse_whitespace(&p.title),
                url,
                description: normalize_text(&p.description),
                bid_count: p.bid_count.map(|b| b.to_string()).unwrap_or_default(),
                skill_tags: matched,
                price: synthesize_price(p.budget.as_ref(), currency),
                source: SiteId::FreelancerJobs,
            });
        }
        Ok(out)
    }
}
