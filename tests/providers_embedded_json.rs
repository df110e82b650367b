// tests/providers_embedded_json.rs
use std::time::Duration;

use projects_notifier::config::{Criteria, SourceConfig};
use projects_notifier::error::ParseError;
use projects_notifier::ingest::providers::embedded_json::EmbeddedJsonSource;
use projects_notifier::{RawDocument, SiteId, SourceAdapter};
use url::Url;

const PAGE: &str = include_str!("fixtures/freelancer_jobs.html");

fn source(skills: &[&str]) -> EmbeddedJsonSource {
    let cfg = SourceConfig {
        site: SiteId::FreelancerJobs,
        enabled: true,
        endpoint: Url::parse("https://www.freelancer.com/jobs/").unwrap(),
        criteria: Criteria::Skills(skills.iter().map(|s| s.to_string()).collect()),
    };
    EmbeddedJsonSource::new(&cfg, Duration::from_secs(5)).expect("adapter")
}

fn doc(body: &str) -> RawDocument {
    RawDocument {
        url: "https://www.freelancer.com/jobs/".into(),
        body: body.into(),
    }
}

#[test]
fn resolves_skill_ids_and_filters() {
    let items = source(&["python", "go"]).parse(&doc(PAGE)).expect("parse ok");
    let titles: Vec<&str> = items.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Django dashboard", "Go microservice"]);
    assert_eq!(items[0].skill_tags, vec!["Python".to_string()]);
    assert_eq!(items[1].skill_tags, vec!["Go".to_string()]);
    assert!(items.iter().all(|l| l.source == SiteId::FreelancerJobs));
}

#[test]
fn builds_price_bids_and_links() {
    let items = source(&["php"]).parse(&doc(PAGE)).unwrap();
    assert_eq!(items.len(), 1);
    let p = &items[0];
    assert_eq!(p.price, "$30 - $250");
    assert_eq!(p.bid_count, "4");
    assert_eq!(
        p.url,
        "https://www.freelancer.com/projects/python/django-dashboard-501.html"
    );
    assert_eq!(
        p.description,
        "Admin dashboard for a small shop; Django preferred."
    );
}

#[test]
fn no_budget_leaves_price_blank() {
    let items = source(&["go"]).parse(&doc(PAGE)).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price, "");
    assert_eq!(items[0].bid_count, "2");
}

#[test]
fn missing_projects_marker_is_a_parse_error() {
    let body = r#"<script>var jobInfo = {"1": "Rust"};</script>"#;
    let err = source(&["rust"]).parse(&doc(body)).unwrap_err();
    assert!(matches!(err, ParseError::MissingMarker(_)));
}

#[test]
fn broken_json_is_a_parse_error() {
    let body = r#"<script>var jobInfo = {"1": "Rust"}; var aaData = [{"title": ];</script>"#;
    let err = source(&["rust"]).parse(&doc(body)).unwrap_err();
    assert!(matches!(err, ParseError::Json(_)));
}
