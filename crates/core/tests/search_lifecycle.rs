//! Search lifecycle integration tests.
//!
//! These tests drive a configured searcher end to end through the public API:
//! config -> terms -> requests (both sort orders) -> parsing -> unioned records

use std::collections::HashSet;
use std::sync::Arc;

use kat_search_core::{
    load_config_from_str,
    searcher::{TransportError, TransportResponse},
    testing::{fixtures, MockTransport},
    validate_config, KatSearcher, ResultRecord, SearchOptions, SearchRequest, Searcher,
};

/// Test helper wiring a searcher to a scripted transport.
struct TestHarness {
    transport: Arc<MockTransport>,
    searcher: Arc<dyn Searcher>,
    options: SearchOptions,
}

impl TestHarness {
    fn new(config_toml: &str) -> Self {
        let config = load_config_from_str(config_toml).expect("Failed to parse config");
        validate_config(&config).expect("Config should be valid");

        let transport = Arc::new(MockTransport::new());
        let searcher: Arc<dyn Searcher> =
            Arc::new(KatSearcher::new(transport.clone(), &config.kat));

        Self {
            transport,
            searcher,
            options: config.kat.options,
        }
    }

    async fn search(&self, request: SearchRequest) -> HashSet<ResultRecord> {
        self.searcher.search(&request, &self.options).await
    }
}

const HTML_CONFIG: &str = r#"
[kat]
base_url = "https://kat.test"
"#;

const FEED_CONFIG: &str = r#"
[kat]
base_url = "https://kat.test"

[kat.options]
category = "movies"
rss = true
"#;

#[tokio::test]
async fn test_html_search_lifecycle() {
    let harness = TestHarness::new(HTML_CONFIG);
    harness.transport.respond_to_sort(
        "seeders",
        TransportResponse::ok(fixtures::html_results_page(&[
            fixtures::html_row("torrent_bar1", "Bar", "//site/bar.torrent", "5", "1"),
            fixtures::html_row("torrent_baz2", "Baz", "//site/baz.torrent", "40", "12"),
        ])),
    );
    harness.transport.respond_to_sort(
        "time_add",
        TransportResponse::ok(fixtures::html_results_page(&[fixtures::html_row(
            "torrent_bar1",
            "Bar",
            "//site/bar.torrent",
            "5",
            "1",
        )])),
    );

    let results = harness.search(SearchRequest::from_title("Bar")).await;

    assert_eq!(results.len(), 2);
    let bar = results.iter().find(|r| r.title == "Bar").unwrap();
    assert_eq!(bar.locator, "https://site/bar.torrent");
    assert_eq!(bar.seeds(), 5);
    assert_eq!(bar.leeches(), 1);
    assert_eq!(bar.rank(), 11);
    assert!(bar.size_mb.is_none());

    let requests = harness.transport.recorded_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.url == "https://kat.test/usearch/bar/"));
}

#[tokio::test]
async fn test_feed_search_lifecycle() {
    let harness = TestHarness::new(FEED_CONFIG);
    harness.transport.respond_to_term(
        "foo",
        TransportResponse::ok(fixtures::rss_feed(&[
            fixtures::feed_item_xml(
                "Foo",
                Some("http://x/f.torrent"),
                "10",
                "2",
                "2097152",
                "ABC123",
            ),
            fixtures::feed_item_xml("No Link", None, "1", "1", "1048576", "DEF456"),
        ])),
    );

    let request = SearchRequest::with_search_strings("Foo", ["FOO", "foo", "other"]);
    let results = harness.search(request).await;

    let expected = ResultRecord::new("Foo", "http://x/f.torrent", 10, 2)
        .with_size_bytes(2_097_152)
        .with_content_hash("ABC123");
    assert_eq!(results, HashSet::from([expected]));

    // "FOO" and "foo" normalize to one term; two terms times two sort orders
    let requests = harness.transport.recorded_requests();
    assert_eq!(requests.len(), 4);
    for request in &requests {
        assert_eq!(request.param("rss"), Some("1"));
        assert_eq!(request.param("category"), Some("movies"));
        assert_eq!(request.param("sorder"), Some("desc"));
    }
    let terms: HashSet<_> = harness.transport.requested_terms().into_iter().collect();
    assert_eq!(terms, HashSet::from(["foo".to_string(), "other".to_string()]));
}

#[tokio::test]
async fn test_malformed_feed_and_failures_yield_nothing() {
    let harness = TestHarness::new(FEED_CONFIG);
    harness
        .transport
        .respond_to_sort("time_add", TransportResponse::ok("<html>not a feed</html>"));
    harness
        .transport
        .fail_sort("seeders", TransportError::Connection("reset".into()));

    let results = harness.search(SearchRequest::from_title("anything")).await;
    assert!(results.is_empty());
    assert_eq!(harness.transport.recorded_requests().len(), 2);
}

#[tokio::test]
async fn test_lenient_config_keeps_good_rows() {
    let strict = TestHarness::new(HTML_CONFIG);
    let lenient = TestHarness::new(
        r#"
[kat]
base_url = "https://kat.test"
skip_malformed_items = true
"#,
    );

    let page = TransportResponse::ok(fixtures::html_results_page(&[
        fixtures::html_row("torrent_ok", "Good", "//site/good.torrent", "3", "3"),
        fixtures::html_row("torrent_bad", "Bad", "//site/bad.torrent", "n/a", "3"),
    ]));
    strict.transport.respond_to_all(page.clone());
    lenient.transport.respond_to_all(page);

    assert!(strict
        .search(SearchRequest::from_title("good"))
        .await
        .is_empty());

    let results = lenient.search(SearchRequest::from_title("good")).await;
    assert_eq!(
        results,
        HashSet::from([fixtures::html_record("Good", "//site/good.torrent", 3, 3)])
    );
}

#[tokio::test]
async fn test_verified_term_is_sent() {
    let harness = TestHarness::new(
        r#"
[kat.options]
verified = true
"#,
    );

    harness.search(SearchRequest::from_title("foo")).await;

    let requests = harness.transport.recorded_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.url == "https://kat.cr/usearch/foo%20verified%3A1/"));
}
