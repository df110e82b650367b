// src/ingest/mod.rs
pub mod collector;
pub mod dedup;
pub mod providers;
pub mod types;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p>").expect("break regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Collapse runs of whitespace (including NBSP) to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    RE_WS
        .replace_all(&s.replace('\u{00A0}', " "), " ")
        .trim()
        .to_string()
}

/// Normalize an HTML fragment (feed descriptions) to plain text:
/// entity decode, tag strip, whitespace collapse.
pub fn normalize_text(s: &str) -> String {
    // 1) Line breaks become spaces before the tags go
    let out = RE_BREAKS.replace_all(s, " ");

    // 2) Strip tags (may be entity-encoded in feeds, so decode first as well)
    let out = RE_TAGS.replace_all(&out, "");
    let out = html_escape::decode_html_entities(&out).to_string();
    let out = RE_TAGS.replace_all(&out, "");

    // 3) Collapse whitespace
    collapse_whitespace(&out)
}

/// Any-match filter over case-insensitive regex patterns.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    patterns: Vec<Regex>,
}

impl KeywordFilter {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidKeyword {
                        pattern: p.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// Tags of `row` that are also in `required` (ASCII case-insensitive), in row order.
pub fn skill_intersection(required: &[String], row: &[String]) -> Vec<String> {
    row.iter()
        .filter(|tag| required.iter().any(|r| r.eq_ignore_ascii_case(tag.trim())))
        .map(|tag| tag.trim().to_string())
        .collect()
}
