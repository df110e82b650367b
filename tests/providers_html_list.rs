// tests/providers_html_list.rs
use std::time::Duration;

use projects_notifier::config::{Criteria, SourceConfig};
use projects_notifier::error::ParseError;
use projects_notifier::ingest::providers::html_list::{decode_page, HtmlListSource};
use projects_notifier::{RawDocument, SiteId, SourceAdapter};
use url::Url;

const PAGE: &str = include_str!("fixtures/fl_ru_projects.html");

fn source(keywords: &[&str]) -> HtmlListSource {
    let cfg = SourceConfig {
        site: SiteId::FlRu,
        enabled: true,
        endpoint: Url::parse("https://www.fl.ru").unwrap(),
        criteria: Criteria::Keywords(keywords.iter().map(|k| k.to_string()).collect()),
    };
    HtmlListSource::new(&cfg, Duration::from_secs(5)).expect("adapter")
}

fn doc(body: &str) -> RawDocument {
    RawDocument {
        url: "https://www.fl.ru/projects/".into(),
        body: body.into(),
    }
}

#[test]
fn keeps_only_keyword_matches() {
    let s = source(&["urgent", "python"]);
    let items = s.parse(&doc(PAGE)).expect("parse ok");

    let titles: Vec<&str> = items.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Парсер на Python", "Срочно: телеграм-бот"]);
    assert!(items.iter().all(|l| l.source == SiteId::FlRu));
}

#[test]
fn extracts_fields_and_resolves_links() {
    let s = source(&["python"]);
    let items = s.parse(&doc(PAGE)).unwrap();
    assert_eq!(items.len(), 1);

    let p = &items[0];
    assert_eq!(
        p.url,
        "https://www.fl.ru/projects/1001/parser-na-python.html"
    );
    assert_eq!(p.description, "Нужен Python-разработчик для парсера сайтов.");
    assert_eq!(p.price, "5 000 руб.");
    assert_eq!(p.bid_count, "7 ответов");
    assert!(p.skill_tags.is_empty());
}

#[test]
fn absolute_links_are_kept_and_missing_fields_blank() {
    let s = source(&["URGENT"]);
    let items = s.parse(&doc(PAGE)).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url, "https://www.fl.ru/projects/1003/bot.html");
    assert_eq!(items[0].price, "");
    assert_eq!(items[0].bid_count, "");
}

#[test]
fn page_without_list_is_a_parse_error() {
    let s = source(&["python"]);
    let err = s
        .parse(&doc("<html><body><p>Access denied</p></body></html>"))
        .unwrap_err();
    assert!(matches!(err, ParseError::MissingElement("div#projects-list")));
}

#[test]
fn decode_transcodes_cp1251_and_unwraps_script() {
    // "Привет" in windows-1251
    let mut bytes = b"<script type=\"text/javascript\">document.write('<div id=\"projects-list\">".to_vec();
    bytes.extend_from_slice(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]);
    bytes.extend_from_slice(b"</div>');</script>");

    let text = decode_page(&bytes);
    assert_eq!(text, "<div id=\"projects-list\">Привет</div>");
}
