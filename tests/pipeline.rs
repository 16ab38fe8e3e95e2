//! End-to-end pipeline tests against a mock HTTP server standing in for
//! the S3 filing mirror: index retrieval, per-filing failure policy,
//! bounded runs, and the written dataset itself.

use std::path::Path;
use std::time::Duration;

use irs990_extractor::run::{execute, RunConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds an index body shaped like the real one; columns the pipeline
/// does not use are included to prove they are ignored.
fn index_body(rows: &[(u64, &str)]) -> String {
    let mut body = String::from("EIN,TAX_PERIOD,TAXPAYER_NAME,RETURN_TYPE,OBJECT_ID\n");
    for (object_id, name) in rows {
        body.push_str(&format!("{},201512,{},990,{}\n", object_id, name, object_id));
    }
    body
}

fn run_config(server: &MockServer, dir: &Path, limit: Option<usize>) -> RunConfig {
    RunConfig {
        index_url: format!("{}/index_2016.csv", server.uri()),
        base_url: server.uri(),
        index_cache: dir.join("index.csv"),
        output: dir.join("npo_dataset.csv"),
        limit,
        timeout: Duration::from_millis(500),
        refresh_index: false,
    }
}

async fn mount_index(server: &MockServer, rows: &[(u64, &str)]) {
    Mock::given(method("GET"))
        .and(path("/index_2016.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_body(rows)))
        .mount(server)
        .await;
}

async fn mount_filing(server: &MockServer, object_id: u64, xml: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}_public.xml", object_id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml.to_string()))
        .mount(server)
        .await;
}

fn read_rows(out: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let contents = std::fs::read_to_string(out).expect("dataset file must exist");
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn field<'a>(header: &[String], row: &'a [String], name: &str) -> &'a str {
    let idx = header.iter().position(|h| h == name).expect("missing column");
    &row[idx]
}

#[tokio::test]
async fn timeout_skips_and_unexpected_failure_aborts_with_flush() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_index(&server, &[(111, "ALPHA ORG"), (222, "BETA ORG"), (333, "GAMMA ORG")]).await;

    // Filing 111 stalls past the client timeout.
    Mock::given(method("GET"))
        .and(path("/111_public.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<Return/>")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    // Filing 222 is well-formed, carries the leading artifact, and has no EIN tag.
    mount_filing(
        &server,
        222,
        "\u{feff}\u{11}<Return xmlns=\"http://www.irs.gov/efile\">\
         <TotalRevenueAmt>50000</TotalRevenueAmt>\
         <CYTotalExpensesAmt>30000</CYTotalExpensesAmt></Return>",
    )
    .await;

    // Filing 333 fails with an unexpected status.
    Mock::given(method("GET"))
        .and(path("/333_public.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = run_config(&server, dir.path(), None);
    let summary = execute(&config).await.unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 1);
    assert!(summary.fatal.is_some(), "HTTP 500 must abort the run");

    // The one good record was flushed despite the abort.
    let (header, rows) = read_rows(&config.output);
    assert_eq!(rows.len(), 1);
    assert_eq!(field(&header, &rows[0], "ein"), "0");
    assert_eq!(field(&header, &rows[0], "total_revenue"), "50000");
    assert_eq!(field(&header, &rows[0], "total_expenses"), "30000");
    assert_eq!(field(&header, &rows[0], "pol_act"), "2");

    // The metadata sidecar reports the same counts.
    let meta = std::fs::read_to_string(dir.path().join("npo_dataset.meta.json")).unwrap();
    let meta: serde_json::Value = serde_json::from_str(&meta).unwrap();
    assert_eq!(meta["records_written"], 1);
    assert_eq!(meta["filings_attempted"], 3);
    assert!(meta["fatal_error"].is_string());
}

#[tokio::test]
async fn run_cap_bounds_attempted_filings() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_index(&server, &[(1, "A"), (2, "B"), (3, "C"), (4, "D")]).await;
    for object_id in 1..=2u64 {
        mount_filing(
            &server,
            object_id,
            &format!("<Return><EIN>{}</EIN></Return>", object_id),
        )
        .await;
    }
    // Filings 3 and 4 are deliberately unmounted; with the cap in place
    // they must never be requested.

    let config = run_config(&server, dir.path(), Some(2));
    let summary = execute(&config).await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.written, 2);
    assert!(summary.fatal.is_none());

    let (header, rows) = read_rows(&config.output);
    assert_eq!(rows.len(), 2);
    assert_eq!(field(&header, &rows[0], "ein"), "1");
    assert_eq!(field(&header, &rows[1], "ein"), "2");
}

#[tokio::test]
async fn redirect_loop_is_skipped_not_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_index(&server, &[(555, "LOOPY ORG"), (666, "FINE ORG")]).await;

    Mock::given(method("GET"))
        .and(path("/555_public.xml"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/555_public.xml"),
        )
        .mount(&server)
        .await;
    mount_filing(&server, 666, "<Return><EIN>666</EIN></Return>").await;

    let config = run_config(&server, dir.path(), None);
    let summary = execute(&config).await.unwrap();

    assert!(summary.fatal.is_none(), "redirect loop is a per-filing skip");
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 1);
}

#[tokio::test]
async fn malformed_filing_is_skipped() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_index(&server, &[(777, "BROKEN ORG")]).await;
    mount_filing(&server, 777, "<Return><EIN>7").await;

    let config = run_config(&server, dir.path(), None);
    let summary = execute(&config).await.unwrap();

    assert!(summary.fatal.is_none());
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 0);
}

#[tokio::test]
async fn fetched_index_is_persisted_verbatim() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_index(&server, &[(888, "CACHE ORG")]).await;
    mount_filing(&server, 888, "<Return><EIN>888</EIN></Return>").await;

    let config = run_config(&server, dir.path(), None);
    execute(&config).await.unwrap();

    let cached = std::fs::read_to_string(&config.index_cache).unwrap();
    assert_eq!(cached, index_body(&[(888, "CACHE ORG")]));
}

#[tokio::test]
async fn cached_index_avoids_refetch() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // No index mock is mounted: a fetch attempt would 404 and abort. The
    // pre-seeded cache must satisfy the run instead.
    let config = run_config(&server, dir.path(), None);
    std::fs::write(&config.index_cache, index_body(&[(999, "CACHED ORG")])).unwrap();
    mount_filing(&server, 999, "<Return><EIN>999</EIN></Return>").await;

    let summary = execute(&config).await.unwrap();
    assert_eq!(summary.written, 1);
}
