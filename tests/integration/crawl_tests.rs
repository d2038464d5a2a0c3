//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, writing into a temporary directory.

use markdown_spider::config::{Config, OutputFormat, PathConfigEntry};
use markdown_spider::crawler::Crawler;
use markdown_spider::state::VisitStatus;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps `body` in a minimal HTML document served as text/html
fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

/// Creates a test configuration seeded at the server root
fn create_test_config(server: &MockServer, output_dir: &Path) -> Config {
    let mut config = Config::new(format!("{}/", server.uri()));
    config.output_dir = output_dir.to_path_buf();
    config.throttle = 0.0;
    config.num_threads = 4;
    config.timeout = 5.0;
    config
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name))
        .unwrap_or_else(|e| panic!("expected {} to exist: {}", name, e))
}

fn page_url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

#[tokio::test]
async fn test_full_crawl_writes_mirrored_tree() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<h1>Welcome</h1>
           <a href="/a">Page A</a>
           <a href="/b">Page B</a>
           <a href="http://other.example/x">Elsewhere</a>"#,
    )
    .await;
    mount_page(&server, "/a", "A", r#"<h2>Alpha</h2><a href="/">Home</a>"#).await;
    mount_page(&server, "/b", "B", "<p>Beta content</p>").await;

    let mut config = create_test_config(&server, output.path());
    config.same_domain_only = true;

    let crawler = Crawler::new(config).unwrap();
    let frontier = crawler.frontier();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.pages_written, 3);
    assert!(!summary.stopped);

    let index = read(&output, "index.md");
    assert!(index.contains("# Welcome"));
    assert!(index.contains("](a.md)"));
    assert!(index.contains("](b.md)"));
    assert!(index.contains("http://other.example/x"));

    assert!(read(&output, "a.md").contains("## Alpha"));
    assert!(read(&output, "b.md").contains("Beta content"));

    let other = Url::parse("http://other.example/x").unwrap();
    assert!(frontier.record(&other).is_none());
}

#[tokio::test]
async fn test_cycles_fetch_each_page_once() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    for (route, next) in [("/", "/a"), ("/a", "/b"), ("/b", "/")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html_page(
                route,
                &format!(r#"<a href="{}">next</a><a href="{}">self</a>"#, next, route),
            ))
            .expect(1)
            .mount(&server)
            .await;
    }

    let summary = Crawler::new(create_test_config(&server, output.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.total_processed(), 3);
}

#[tokio::test]
async fn test_max_depth_limits_fetching() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&server, "/", "Root", r#"<a href="/level1">down</a>"#).await;
    mount_page(&server, "/level1", "L1", r#"<a href="/level2">down</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html_page("L2", "<p>too deep</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, output.path());
    config.max_depth = 1;

    let crawler = Crawler::new(config).unwrap();
    let frontier = crawler.frontier();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert!(output.path().join("level1.md").exists());
    assert!(!output.path().join("level2.md").exists());

    if let Some(record) = frontier.record(&page_url(&server, "/level2")) {
        assert_eq!(record.status, VisitStatus::Skipped);
    }
}

#[tokio::test]
async fn test_non_html_skipped_and_http_errors_failed() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/manual.pdf">PDF</a><a href="/gone">Gone</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(&server, output.path())).unwrap();
    let frontier = crawler.frontier();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);

    let pdf = frontier.record(&page_url(&server, "/manual.pdf")).unwrap();
    assert_eq!(pdf.status, VisitStatus::Skipped);

    let gone = frontier.record(&page_url(&server, "/gone")).unwrap();
    assert_eq!(gone.status, VisitStatus::Failed);
    assert!(gone.reason.unwrap().contains("404"));

    assert!(!output.path().join("gone.md").exists());
}

#[tokio::test]
async fn test_result_independent_of_worker_count() {
    let server = MockServer::start().await;

    let links: String = (0..12)
        .map(|i| format!(r#"<a href="/p{}">page {}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", "Home", &links).await;
    for i in 0..12 {
        mount_page(
            &server,
            &format!("/p{}", i),
            "Page",
            &format!(r#"<p>Page {}</p><a href="/p{}">next</a>"#, i, (i + 1) % 12),
        )
        .await;
    }

    let mut results = Vec::new();
    for threads in [1, 16] {
        let output = TempDir::new().unwrap();
        let mut config = create_test_config(&server, output.path());
        config.num_threads = threads;

        let crawler = Crawler::new(config).unwrap();
        let frontier = crawler.frontier();
        let summary = crawler.run().await.unwrap();
        assert_eq!(summary.succeeded, 13);

        let succeeded: BTreeSet<String> = frontier
            .records()
            .into_iter()
            .filter(|r| r.status == VisitStatus::Success)
            .map(|r| r.url)
            .collect();
        results.push(succeeded);
    }

    assert_eq!(results[0], results[1]);
}

#[tokio::test]
async fn test_max_pages_caps_the_run() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">page {}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", "Home", &links).await;
    for i in 0..10 {
        mount_page(&server, &format!("/p{}", i), "Page", "<p>leaf</p>").await;
    }

    let mut config = create_test_config(&server, output.path());
    config.max_pages = Some(3);

    let summary = Crawler::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.total_processed(), 3);
    assert!(summary.unfinished > 0);
}

#[tokio::test]
async fn test_most_specific_rule_selects_content() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<nav><a href="/nav-only">Nav</a></nav>
           <main><p>Landing</p><a href="/docs/intro">Docs</a></main>"#,
    )
    .await;
    mount_page(
        &server,
        "/docs/intro",
        "Intro",
        r#"<main><p>Outer chrome</p>
           <article><h1>Introduction</h1><div class="ad">Buy now</div><p>Read me</p></article></main>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/nav-only"))
        .respond_with(html_page("Nav", "<p>nav</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, output.path());
    config.path_configs = vec![
        PathConfigEntry {
            path_prefix: Some("/".to_string()),
            target_content: vec!["main".to_string()],
            ignore_selectors: vec!["nav".to_string()],
            description: "Site".to_string(),
            ..Default::default()
        },
        PathConfigEntry {
            path_prefix: Some("/docs".to_string()),
            target_content: vec!["article".to_string()],
            ignore_selectors: vec![".ad".to_string()],
            description: "Docs".to_string(),
            ..Default::default()
        },
    ];

    let summary = Crawler::new(config).unwrap().run().await.unwrap();
    assert_eq!(summary.succeeded, 2);

    let index = read(&output, "index.md");
    assert!(index.contains("Landing"));
    assert!(index.contains("](docs/intro.md)"));
    assert!(!index.contains("Nav"));

    let intro = read(&output, "docs/intro.md");
    assert!(intro.contains("# Introduction"));
    assert!(intro.contains("Read me"));
    assert!(!intro.contains("Buy now"));
    assert!(!intro.contains("Outer chrome"));
}

#[tokio::test]
async fn test_existing_files_kept_without_force_overwrite() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_page(&server, "/", "Home", "<p>Fresh content</p>").await;

    fs::write(output.path().join("index.md"), "stale\n").unwrap();

    let summary = Crawler::new(create_test_config(&server, output.path()))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.pages_written, 0);
    assert_eq!(read(&output, "index.md"), "stale\n");

    let mut config = create_test_config(&server, output.path());
    config.force_overwrite = true;
    let summary = Crawler::new(config).unwrap().run().await.unwrap();
    assert_eq!(summary.pages_written, 1);
    assert!(read(&output, "index.md").contains("Fresh content"));
}

#[tokio::test]
async fn test_html_format_and_summary_file() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let reports = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<p>Hello <b>world</b></p><a href="/missing">Missing</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summary_path = reports.path().join("nested").join("summary.md");
    let mut config = create_test_config(&server, output.path());
    config.format = OutputFormat::Html;
    config.summary_path = Some(summary_path.clone());

    let summary = Crawler::new(config).unwrap().run().await.unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);

    let index = read(&output, "index.html");
    assert!(index.contains("<b>world</b>"));
    assert!(index.contains(r#"href="missing.html""#));

    let report = fs::read_to_string(&summary_path).unwrap();
    assert!(report.starts_with("# Markdown Spider Crawl Summary"));
    assert!(report.contains("/missing"));
    assert!(report.contains("500"));
}

#[tokio::test]
async fn test_links_to_uncrawled_pages_stay_absolute() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/a">Page A</a> <a href="/b">Page B</a>"#,
    )
    .await;
    mount_page(&server, "/a", "A", "<p>Alpha</p>").await;
    mount_page(&server, "/b", "B", "<p>Beta</p>").await;

    let mut config = create_test_config(&server, output.path());
    config.max_depth = 0;
    let summary = Crawler::new(config).unwrap().run().await.unwrap();
    assert_eq!(summary.pages_written, 1);

    let index = read(&output, "index.md");
    assert!(index.contains(&format!("[Page A]({})", page_url(&server, "/a"))));
    assert!(!index.contains("](a.md)"));
    assert!(!output.path().join("a.md").exists());

    let output = TempDir::new().unwrap();
    let mut config = create_test_config(&server, output.path());
    config.max_children_per_page = Some(1);
    let summary = Crawler::new(config).unwrap().run().await.unwrap();
    assert_eq!(summary.pages_written, 2);

    let index = read(&output, "index.md");
    assert!(index.contains("[Page A](a.md)"));
    assert!(index.contains(&format!("[Page B]({})", page_url(&server, "/b"))));
    assert!(!output.path().join("b.md").exists());
}

#[tokio::test]
async fn test_tables_written_as_pipe_tables() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<table><thead><tr><th>Name</th><th align="right">Size</th></tr></thead><tbody><tr><td>a</td><td align="right">10</td></tr></tbody></table>"#,
    )
    .await;

    let summary = Crawler::new(create_test_config(&server, output.path()))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);

    let index = read(&output, "index.md");
    assert!(index.contains("| Name | Size |\n|---|---:|\n| a   | 10  |"));
}
