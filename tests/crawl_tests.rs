//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use site_mirror::config::{parse_config, Config};
use site_mirror::crawler::{crawl, CrawlEngine, FetchRequest, FetchResponse, Fetcher};
use site_mirror::output::{CrawlObserver, CrawlRow, CrawlStats};
use site_mirror::state::FetchError;
use site_mirror::MirrorError;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given URL
fn create_test_config(url: &str, extra: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
url = "{}"
max-workers = 3
timeout = 5
{}
"#,
        url, extra
    ))
    .expect("valid test config")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

/// Collects every row it receives
#[derive(Clone, Default)]
struct Recorder {
    rows: Arc<Mutex<Vec<CrawlRow>>>,
    finished: Arc<Mutex<Option<CrawlStats>>>,
}

impl CrawlObserver for Recorder {
    fn on_row(&mut self, row: &CrawlRow) {
        self.rows.lock().unwrap().push(row.clone());
    }

    fn on_finish(&mut self, stats: &CrawlStats) {
        *self.finished.lock().unwrap() = Some(stats.clone());
    }
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(
            r#"<html><head><title>Home</title>
            <link rel="stylesheet" href="/style.css"></head><body>
            <a href="/page1">Page 1</a>
            <a href="{}/page2">Page 2</a>
            <a href="/page1#details">Page 1 again</a>
            <a href="mailto:info@example.com">Mail</a>
            <a href="https://other.example.org/">Elsewhere</a>
            </body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(r#"<a href="/">Home</a><a href="/page2">Page 2</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/style.css"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/css"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url), r#"crawl-assets = ["styles"]"#);
    let recorder = Recorder::default();
    let observers: Vec<Box<dyn CrawlObserver>> = vec![Box::new(recorder.clone())];
    let report = crawl(&config, observers, std::future::pending())
        .await
        .expect("crawl succeeds");

    assert!(!report.interrupted);
    assert_eq!(report.stats.total_urls, 4);
    assert_eq!(report.stats.count_by_status.get(&200), Some(&3));
    assert_eq!(report.stats.count_by_status.get(&404), Some(&1));

    let rows = recorder.rows.lock().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.last().unwrap().progress, (4, 4));
    assert!(recorder.finished.lock().unwrap().is_some());

    let mut urls: Vec<_> = report.records.iter().map(|r| r.url.clone()).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
            format!("{}/style.css", base_url),
        ]
    );
    // Bodies are only kept for the offline export
    assert!(report.bodies.is_empty());
}

#[tokio::test]
async fn test_ignore_regex_and_query_removal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/list?page=1">1</a><a href="/list?page=2">2</a><a href="/private/x">x</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html("<p>list</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &format!("{}/", mock_server.uri()),
        r#"remove-query-params = true
ignore-regex = ["/private/"]"#,
    );
    let report = crawl(&config, Vec::new(), std::future::pending())
        .await
        .expect("crawl succeeds");

    assert_eq!(report.stats.total_urls, 2);
}

#[tokio::test]
async fn test_queue_capacity_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &format!("{}/", mock_server.uri()),
        "\n[limits]\nmax-queue-length = 2\n",
    );
    let result = crawl(&config, Vec::new(), std::future::pending()).await;

    match result {
        Err(MirrorError::Admission(e)) => assert!(e.to_string().contains("max-queue-length")),
        other => panic!("expected a capacity error, got {:?}", other.map(|r| r.stats)),
    }
}

#[tokio::test]
async fn test_connection_failure_recorded_as_negative_status() {
    // Nothing listens on this port once the listener is dropped
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = create_test_config(&format!("http://127.0.0.1:{}/", port), "");
    let report = crawl(&config, Vec::new(), std::future::pending())
        .await
        .expect("network errors are not fatal");

    assert_eq!(report.stats.total_urls, 1);
    let status = report.records[0].status().unwrap();
    assert_eq!(status, FetchError::ConnectionFail.status_code());
}

/// Serves `/` linking to 49 more pages, all answered instantly
struct FiftyPages;

impl Fetcher for FiftyPages {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let body = if request.url == "https://example.com/" {
            (1..50)
                .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
                .collect::<String>()
        } else {
            "<p>leaf</p>".to_string()
        };
        Ok(FetchResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            size: body.len() as u64,
            body: body.into_bytes(),
        })
    }
}

/// Requests shutdown once the given number of rows has been seen
struct StopAfter {
    rows: usize,
    limit: usize,
    notify: Arc<Notify>,
}

impl CrawlObserver for StopAfter {
    fn on_row(&mut self, _row: &CrawlRow) {
        self.rows += 1;
        if self.rows == self.limit {
            self.notify.notify_one();
        }
    }
}

#[tokio::test]
async fn test_interrupt_reports_only_completed_urls() {
    let config = parse_config(
        r#"
[crawler]
url = "https://example.com/"
max-workers = 5
"#,
    )
    .unwrap();

    let notify = Arc::new(Notify::new());
    let mut engine = CrawlEngine::new(&config, FiftyPages).unwrap();
    engine.add_observer(Box::new(StopAfter {
        rows: 0,
        limit: 10,
        notify: Arc::clone(&notify),
    }));

    let shutdown = {
        let notify = Arc::clone(&notify);
        async move { notify.notified().await }
    };
    let report = engine.run(shutdown).await.unwrap();

    assert!(report.interrupted);
    assert!(report.stats.partial);
    assert_eq!(report.stats.total_urls, 10);
    assert!(report.incomplete.len() <= 5);
    assert_eq!(
        report.records.iter().filter(|r| r.result().is_some()).count(),
        10
    );
}
