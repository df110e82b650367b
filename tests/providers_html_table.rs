// tests/providers_html_table.rs
use std::time::Duration;

use projects_notifier::config::{Criteria, SourceConfig};
use projects_notifier::error::ParseError;
use projects_notifier::ingest::providers::html_table::HtmlTableSource;
use projects_notifier::{RawDocument, SiteId, SourceAdapter};
use url::Url;

const PAGE: &str = include_str!("fixtures/freelancer_table.html");

fn source(skills: &[&str]) -> HtmlTableSource {
    let cfg = SourceConfig {
        site: SiteId::Freelancer,
        enabled: true,
        endpoint: Url::parse("https://www.freelancer.com/jobs/").unwrap(),
        criteria: Criteria::Skills(skills.iter().map(|s| s.to_string()).collect()),
    };
    HtmlTableSource::new(&cfg, Duration::from_secs(5)).expect("adapter")
}

fn doc(body: &str) -> RawDocument {
    RawDocument {
        url: "https://www.freelancer.com/jobs/".into(),
        body: body.into(),
    }
}

#[test]
fn keeps_rows_with_shared_skill() {
    let items = source(&["python", "go"]).parse(&doc(PAGE)).expect("parse ok");
    let titles: Vec<&str> = items.iter().map(|l| l.title.as_str()).collect();
    // the Java/C++ row shares nothing with {python, go}
    assert_eq!(titles, vec!["Web scraper in Python", "REST API in Go"]);
    assert_eq!(items[0].skill_tags, vec!["Python".to_string()]);
    assert_eq!(items[1].skill_tags, vec!["Go".to_string()]);
}

#[test]
fn reads_cells_by_position() {
    let items = source(&["python"]).parse(&doc(PAGE)).unwrap();
    let p = &items[0];
    assert_eq!(
        p.url,
        "https://www.freelancer.com/projects/python/scraper-401.html"
    );
    assert_eq!(p.description, "Scrape three shops daily and export CSV.");
    assert_eq!(p.bid_count, "14");
    assert_eq!(p.price, "$250");
    assert_eq!(p.source, SiteId::Freelancer);
}

#[test]
fn promotions_do_not_leak_into_title() {
    let items = source(&["java"]).parse(&doc(PAGE)).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "ERP module");
    assert_eq!(
        items[0].url,
        "https://www.freelancer.com/projects/java/erp-402.html"
    );
    assert!(!items.iter().any(|l| l.title.contains("URGENT")));
}

#[test]
fn short_row_violates_layout() {
    let html = r#"<table><tr class="project-details"><td><a href="/p/1">T</a></td><td>D</td><td>1</td></tr></table>"#;
    let err = source(&["python"]).parse(&doc(html)).unwrap_err();
    assert!(matches!(
        err,
        ParseError::RowShape {
            row: 0,
            found: 3,
            expected: 7
        }
    ));
}

#[test]
fn page_without_table_is_a_parse_error() {
    let err = source(&["python"])
        .parse(&doc("<html><body>maintenance</body></html>"))
        .unwrap_err();
    assert!(matches!(err, ParseError::MissingElement("table")));
}
