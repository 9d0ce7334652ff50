//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to serve listing and detail pages and run
//! the full listing -> detail -> merge -> output cycle end-to-end.

use catalog_harvest::config::{load_config, Config};
use catalog_harvest::output::{write_run, DatasetWriter, FINAL_CSV_FILE};
use catalog_harvest::{HarvestError, MergePipeline, SENTINEL};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a config for a generic storefront served by `base_url`
fn create_test_config(dir: &Path, base_url: &str, seeds: &[String], extra: &str) -> Config {
    let seeds = seeds
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");

    let content = format!(
        r#"
[site]
base-url = "{base_url}/"

[site.profile]
name = "teststore"
base-url = "https://teststore.invalid/"

[site.profile.listing]
item-selector = "li.product"
ready-selector = "ul.results"

[site.profile.listing.pagination]
style = "page"
param = "page"

[site.profile.listing.identity]
id-attribute = "data-id"

[[site.profile.listing.fields]]
name = "Product Name"
selectors = ["h3.name"]
kind = "text"

[[site.profile.listing.fields]]
name = "Price"
selectors = ["span.price"]
kind = "text"

[[site.profile.detail.fields]]
name = "Material"
selectors = ["dd.material"]
kind = "text"

[[site.profile.detail.fields]]
name = "Sizes"
selectors = ["ul.sizes li"]
kind = "list"

[input]
seeds = [{seeds}]
per-seed-limit = 3

[pipeline]
page-delay-ms = 0
field-timeout-ms = 1000
{extra}

[output]
directory = "{output}"
"#,
        base_url = base_url,
        seeds = seeds,
        extra = extra,
        output = dir.join("out").display(),
    );

    let config_path = dir.join("harvest.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    file.write_all(content.as_bytes()).unwrap();

    load_config(&config_path).expect("test config should be valid")
}

fn listing_page(ids: &[u32]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="product" data-id="{id}">
                    <a href="/p/{id}"><h3 class="name">Shirt {id}</h3></a>
                    <span class="price">{id}99</span>
                </li>"#
            )
        })
        .collect();
    format!(r#"<html><body><ul class="results">{}</ul></body></html>"#, items)
}

fn detail_page(material: &str) -> String {
    format!(
        r#"<html><body><dl><dd class="material">{material}</dd></dl>
        <ul class="sizes"><li>S</li><li>M</li><li>L</li></ul></body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_detail(server: &MockServer, id: u32, material: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/p/{}", id)))
        .respond_with(html(detail_page(material)))
        .mount(server)
        .await;
}

fn read_json(path: &Path) -> Vec<Value> {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_end_to_end_with_one_detail_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/c/shirts"))
        .and(query_param("page", "1"))
        .respond_with(html(listing_page(&[1, 2, 3, 4, 5])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_detail(&mock_server, 1, "Cotton").await;
    mount_detail(&mock_server, 3, "Linen").await;
    Mock::given(method("GET"))
        .and(path("/p/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        temp.path(),
        &base_url,
        &[format!("{}/c/shirts", base_url)],
        "",
    );
    let pipeline = MergePipeline::new(&config).unwrap();
    let outcome = pipeline
        .run(&config.seed_urls().unwrap(), config.input.per_seed_limit)
        .await
        .unwrap();

    let ids: Vec<_> = outcome
        .dataset
        .records
        .iter()
        .map(|r| r.identifier.as_str())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(outcome.stats.duplicates_removed, 0);
    assert_eq!(outcome.stats.detail_failures, 1);
    assert_eq!(outcome.stats.final_records, 3);

    let writer = DatasetWriter::from_config(&config.output);
    let paths = write_run(&writer, &outcome, "teststore", "hash").unwrap();
    assert_eq!(paths.len(), 5);
    for path in &paths {
        assert!(path.exists(), "{} should exist", path.display());
    }

    // final.json: record 2 keeps listing fields, detail fields are the sentinel
    let final_records = read_json(&writer.path_for("final.json"));
    assert_eq!(final_records.len(), 3);
    assert_eq!(final_records[0]["Material"], "Cotton");
    assert_eq!(final_records[0]["Sizes"], serde_json::json!(["S", "M", "L"]));
    assert_eq!(final_records[1]["Product Name"], "Shirt 2");
    assert_eq!(final_records[1]["Material"], SENTINEL);
    assert_eq!(final_records[1]["Sizes"], SENTINEL);
    assert_eq!(
        final_records[2]["canonical_url"],
        format!("{}/p/3", base_url)
    );

    // detail.json: the failed URL is an error placeholder
    let details = read_json(&writer.path_for("detail.json"));
    assert_eq!(details.len(), 3);
    assert!(details[1]["error"].as_str().unwrap().contains("500"));
    assert!(details[0].get("error").is_none());

    // listing.json: the three collected items in order
    let listing = read_json(&writer.path_for("listing.json"));
    assert_eq!(listing.len(), 3);
    assert_eq!(listing[2]["Price"], "399");

    // final.csv: one row per record, empty cells for absent columns
    let mut reader = csv::Reader::from_path(writer.path_for(FINAL_CSV_FILE)).unwrap();
    let rows: Vec<BTreeMap<String, String>> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["Material"], SENTINEL);
    assert_eq!(rows[0]["Sizes"], r#"["S","M","L"]"#);
    assert_eq!(rows[1]["detail_extracted_at"], "");

    let summary = std::fs::read_to_string(writer.path_for("summary.md")).unwrap();
    assert!(summary.contains("- **Detail Failures**: 1"));
}

#[tokio::test]
async fn test_stagnation_stops_pagination() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp = TempDir::new().unwrap();

    // Every page repeats the same five products
    Mock::given(method("GET"))
        .and(path("/c/dresses"))
        .respond_with(html(listing_page(&[1, 2, 3, 4, 5])))
        .expect(3)
        .mount(&mock_server)
        .await;
    for id in 1..=5 {
        mount_detail(&mock_server, id, "Viscose").await;
    }

    let config = create_test_config(
        temp.path(),
        &base_url,
        &[format!("{}/c/dresses", base_url)],
        "stagnation-threshold = 2",
    );
    let pipeline = MergePipeline::new(&config).unwrap();
    let outcome = pipeline
        .run(&config.seed_urls().unwrap(), 50)
        .await
        .unwrap();

    assert_eq!(outcome.listing.len(), 5);
    assert_eq!(outcome.seeds[0].pages_loaded, 3);
    assert_eq!(outcome.seeds[0].termination.to_string(), "no new items");
    assert_eq!(outcome.stats.detail_fetched, 5);
}

#[tokio::test]
async fn test_cross_seed_duplicates_and_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/c/men"))
        .respond_with(html(listing_page(&[1, 2, 3, 4])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/sale"))
        .respond_with(html(listing_page(&[3, 9, 1, 7])))
        .mount(&mock_server)
        .await;
    for id in [1, 2, 3, 9] {
        mount_detail(&mock_server, id, "Cotton").await;
    }

    let config = create_test_config(
        temp.path(),
        &base_url,
        &[
            format!("{}/c/men", base_url),
            format!("{}/c/sale", base_url),
        ],
        "",
    );
    let pipeline = MergePipeline::new(&config).unwrap();
    let outcome = pipeline
        .run(&config.seed_urls().unwrap(), config.input.per_seed_limit)
        .await
        .unwrap();

    for seed in &outcome.seeds {
        assert!(seed.collected <= 3);
    }
    assert_eq!(outcome.listing.len(), 6);

    let ids: Vec<_> = outcome
        .dataset
        .records
        .iter()
        .map(|r| r.identifier.as_str())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "9"]);
    assert_eq!(outcome.stats.duplicates_removed, 2);
    assert_eq!(
        outcome.stats.listing_records - outcome.stats.final_records,
        outcome.stats.duplicates_removed
    );
}

#[tokio::test]
async fn test_detail_retry_recovers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/c/kurta"))
        .respond_with(html(listing_page(&[1])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_detail(&mock_server, 1, "Silk").await;

    let config = create_test_config(
        temp.path(),
        &base_url,
        &[format!("{}/c/kurta", base_url)],
        "detail-attempts = 3\nretry-backoff-ms = 10",
    );
    let pipeline = MergePipeline::new(&config).unwrap();
    let outcome = pipeline
        .run(&config.seed_urls().unwrap(), 1)
        .await
        .unwrap();

    assert_eq!(outcome.stats.detail_failures, 0);
    assert_eq!(
        outcome.dataset.records[0].fields["Material"].to_string(),
        "Silk"
    );
}

#[tokio::test]
async fn test_no_seed_loaded_is_an_error() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(html("<html><body>Access denied</body></html>".to_string()))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        temp.path(),
        &base_url,
        &[format!("{}/c/blocked", base_url)],
        "",
    );
    let pipeline = MergePipeline::new(&config).unwrap();
    let result = pipeline.run(&config.seed_urls().unwrap(), 3).await;

    assert!(matches!(result, Err(HarvestError::NoSeedLoaded { seeds: 1 })));
    assert!(!temp.path().join("out").exists());
}
