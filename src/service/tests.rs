//! Tests for the extraction service

use super::*;
use crate::config::{AuthSettings, ExtractionConfig, RetryConfig};
use crate::error::{ConfigField, Error, ErrorKind};
use crate::http::ResponseContainer;
use crate::metadata::fixtures::{catalog, CATALOG_METADATA};
use crate::pagination::ReaderState;
use crate::partition::Partition;
use crate::transform::FieldValue;
use crate::types::{BackoffType, PaginationType};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn base_config(base_url: &str) -> ExtractionConfig {
    ExtractionConfig::new(base_url, "Products", AuthSettings::basic("admin", "secret")).with_retry(
        RetryConfig {
            max_attempts: 2,
            backoff_type: BackoffType::Constant,
            initial_ms: 10,
            max_ms: 10,
        },
    )
}

fn service(
    server: &MockServer,
    config: impl FnOnce(ExtractionConfig) -> ExtractionConfig,
) -> ExtractionService {
    let config = config(base_config(&format!("{}/odata", server.uri())));
    ExtractionService::new(config).unwrap()
}

fn feed(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("dataserviceversion", "2.0")
        .set_body_json(body)
}

fn response(status: u16, body: &str) -> ResponseContainer {
    ResponseContainer::new(status, "Status", Some("2.0".to_string()), body.as_bytes().to_vec())
}

async fn mount_metadata(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/odata/Products/$metadata"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(CATALOG_METADATA),
        )
        .mount(server)
        .await;
}

async fn mount_count(server: &MockServer, count: u64) {
    Mock::given(method("GET"))
        .and(path("/odata/Products/$count"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("dataserviceversion", "2.0")
                .set_body_string(count.to_string()),
        )
        .mount(server)
        .await;
}

async fn mount_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param("$top", "1"))
        .respond_with(feed(json!({"d": {"results": []}})))
        .mount(server)
        .await;
}

// ============================================================================
// URLs
// ============================================================================

#[test]
fn test_probe_url() {
    let config = base_config("https://api.example.com/odata/v2/")
        .with_filter("price gt 10")
        .with_expand("category");
    let urls = UrlBuilder::new(&config);

    assert_eq!(
        urls.probe_url().unwrap().as_str(),
        "https://api.example.com/odata/v2/Products?$filter=price%20gt%2010&$expand=category&$top=1"
    );
}

#[test]
fn test_metadata_url() {
    let config = base_config("https://api.example.com/odata/v2");
    assert_eq!(
        UrlBuilder::new(&config).metadata_url().unwrap().as_str(),
        "https://api.example.com/odata/v2/Products/$metadata"
    );

    let config = config.with_associated_entity("Categories");
    assert_eq!(
        UrlBuilder::new(&config).metadata_url().unwrap().as_str(),
        "https://api.example.com/odata/v2/Products,Categories/$metadata"
    );
}

#[test]
fn test_count_url() {
    let config = base_config("https://api.example.com/odata/v2")
        .with_filter("stock eq 0")
        .with_select("id");
    assert_eq!(
        UrlBuilder::new(&config).count_url().unwrap().as_str(),
        "https://api.example.com/odata/v2/Products/$count?$filter=stock%20eq%200"
    );
}

#[test]
fn test_data_url_paging_params() {
    let config = base_config("https://api.example.com/odata/v2").with_select("id, name");
    let urls = UrlBuilder::new(&config);

    assert_eq!(
        urls.data_url(None, Some(0), Some(1000)).unwrap().as_str(),
        "https://api.example.com/odata/v2/Products?$select=id%2Cname&$top=1000"
    );
    assert_eq!(
        urls.data_url(None, Some(2000), Some(500)).unwrap().as_str(),
        "https://api.example.com/odata/v2/Products?$select=id%2Cname&$skip=2000&$top=500"
    );
    assert_eq!(
        urls.data_url(None, None, None).unwrap().as_str(),
        "https://api.example.com/odata/v2/Products?$select=id%2Cname&paging=snapshot"
    );
}

#[test]
fn test_data_url_default_select_only_without_configured_select() {
    let config = base_config("https://api.example.com/odata/v2");
    let urls = UrlBuilder::new(&config);
    assert_eq!(
        urls.data_url(Some("id,name"), None, Some(10)).unwrap().as_str(),
        "https://api.example.com/odata/v2/Products?$select=id%2Cname&$top=10"
    );

    let config = config.with_select("stock");
    let urls = UrlBuilder::new(&config);
    assert_eq!(
        urls.data_url(Some("id,name"), None, Some(10)).unwrap().as_str(),
        "https://api.example.com/odata/v2/Products?$select=stock&$top=10"
    );
}

// ============================================================================
// Response classification
// ============================================================================

#[test]
fn test_success_with_supported_version() {
    assert!(check_response("Probe", &response(200, "{}")).is_ok());
}

#[test]
fn test_unauthorized_is_attributed_to_credentials() {
    let err = check_response("Probe 'Products'", &response(401, "")).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.config_field(), Some(ConfigField::Credentials));
    assert!(err.to_string().contains("invalid credentials"));
}

#[test]
fn test_not_found_is_attributed_to_entity() {
    let err = check_response("Probe 'Products'", &response(404, "")).unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.config_field(), Some(ConfigField::EntityName));
    assert!(err.to_string().contains("invalid entity name"));
}

#[test]
fn test_remote_error_payload_is_parsed() {
    let body = r#"{"error":{"code":"COE_PROPERTY_NOT_FOUND","message":{"lang":"en-US","value":"Invalid property names: colour. Refer to https://help.example.com for details"},"innererror":{"transactionid":"abc-123"}}}"#;
    // Everything from the reference marker on is dropped, JSON included
    let err = check_response("Probe", &response(400, body)).unwrap_err();
    assert!(matches!(&err, Error::Service(e) if e.remote.is_none()));

    let body = r#"{"error":{"code":"COE_PROPERTY_NOT_FOUND","message":{"lang":"en-US","value":"Invalid property names: colour"},"innererror":{"transactionid":"abc-123"}}}"#;
    let err = check_response("Probe", &response(400, body)).unwrap_err();

    let Error::Service(service) = &err else {
        panic!("Expected service error, got {err:?}");
    };
    let remote = service.remote.as_ref().unwrap();
    assert_eq!(remote.code.as_deref(), Some("COE_PROPERTY_NOT_FOUND"));
    assert_eq!(remote.message.as_deref(), Some("Invalid property names: colour"));
    assert_eq!(remote.transaction_id.as_deref(), Some("abc-123"));
    assert_eq!(service.status, Some(400));
    assert_eq!(service.config_field, Some(ConfigField::EntityName));
}

#[test]
fn test_reference_marker_is_truncated() {
    let err = check_response(
        "Pull",
        &response(500, "Internal failure. Refer to https://help.example.com"),
    )
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Internal failure."));
    assert!(!message.contains("help.example.com"));
    assert_eq!(err.config_field(), None);
}

#[test]
fn test_html_body_means_invalid_entity() {
    let err =
        check_response("Probe", &response(400, "<html><body>Not here</body></html>")).unwrap_err();

    assert!(err.to_string().contains("invalid entity name"));
    assert_eq!(err.status(), Some(400));
}

#[test]
fn test_forbidden_plain_body_is_appended() {
    let err = check_response("Probe", &response(403, "no access to Products")).unwrap_err();

    assert!(err.to_string().contains("no access to Products"));
    assert_eq!(err.config_field(), Some(ConfigField::EntityName));
}

#[test]
fn test_missing_version_is_fatal() {
    let response = ResponseContainer::new(200, "OK", None, Vec::new());
    let err = check_response("Probe", &response).unwrap_err();
    assert!(err.to_string().contains("missing data service version"));
}

#[test]
fn test_unsupported_version_is_fatal() {
    let response = ResponseContainer::new(200, "OK", Some("1.0".to_string()), Vec::new());
    let err = check_response("Probe", &response).unwrap_err();
    assert!(err.to_string().contains("unsupported data service version '1.0'"));
}

#[test]
fn test_check_status_ignores_version() {
    let response = ResponseContainer::new(200, "OK", None, Vec::new());
    assert!(check_status("Metadata", &response).is_ok());
}

// ============================================================================
// Orchestrator calls
// ============================================================================

#[tokio::test]
async fn test_check_url() {
    let mock_server = MockServer::start().await;
    mount_probe(&mock_server).await;

    let service = service(&mock_server, |c| c);
    service.check_url().await.unwrap();
}

#[tokio::test]
async fn test_check_url_rejects_other_version() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("dataserviceversion", "3.0")
                .set_body_string("{}"),
        )
        .mount(&mock_server)
        .await;

    let err = service(&mock_server, |c| c).check_url().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
}

#[tokio::test]
async fn test_total_row_count() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/Products/$count"))
        .and(query_param("$filter", "stock gt 0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("dataserviceversion", "2.0")
                .set_body_string("378403\n"),
        )
        .mount(&mock_server)
        .await;

    let service = service(&mock_server, |c| c.with_filter("stock gt 0"));
    assert_eq!(service.total_row_count().await.unwrap(), 378_403);
}

#[tokio::test]
async fn test_total_row_count_rejects_garbage() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/Products/$count"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("dataserviceversion", "2.0")
                .set_body_string("many"),
        )
        .mount(&mock_server)
        .await;

    let err = service(&mock_server, |c| c).total_row_count().await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_metadata_and_schema() {
    let mock_server = MockServer::start().await;
    mount_metadata(&mock_server).await;

    let service = service(&mock_server, |c| c.with_select("id,name"));
    let metadata = service.fetch_metadata().await.unwrap();
    assert!(metadata.entity_type("Products").is_some());

    let schema = service.build_schema().await.unwrap();
    let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name"]);
}

#[tokio::test]
async fn test_encoded_metadata_round_trips() {
    let mock_server = MockServer::start().await;
    mount_metadata(&mock_server).await;

    let service = service(&mock_server, |c| c);
    let encoded = service.encoded_metadata().await.unwrap();
    let decoded = ExtractionService::decode_metadata(&encoded).unwrap();

    assert_eq!(decoded.raw(), CATALOG_METADATA);
}

#[tokio::test]
async fn test_metadata_not_found() {
    let mock_server = MockServer::start().await;

    let err = service(&mock_server, |c| c).fetch_metadata().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.config_field(), Some(ConfigField::EntityName));
}

#[test]
fn test_partitions_per_pagination_type() {
    let config = base_config("https://api.example.com/odata");

    let offset =
        ExtractionService::new(config.clone().with_pagination(PaginationType::ClientOffset))
            .unwrap();
    assert_eq!(offset.partitions(190_000).len(), 19);

    let cursor =
        ExtractionService::new(config.with_pagination(PaginationType::ServerSide)).unwrap();
    assert_eq!(cursor.partitions(190_000), vec![Partition::new(1, 190_000, 1000)]);
    assert_eq!(cursor.partitions(12), vec![Partition::new(1, 12, 12)]);
    assert!(cursor.partitions(0).is_empty());
}

// ============================================================================
// Data pages
// ============================================================================

#[tokio::test]
async fn test_fetch_page_uses_default_select() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param(
            "$select",
            "id,name,price,weight,rating,stock,discontinued,createdAt,updatedAt,openingTime,thumbnail,dimensions,category",
        ))
        .and(query_param("$expand", "category"))
        .and(query_param("$skip", "1000"))
        .and(query_param("$top", "1000"))
        .respond_with(feed(json!({"d": {"results": [{"id": "1"}]}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server, |c| c.with_expand("category"))
        .with_metadata(Arc::new(catalog()));
    let page = service.fetch_page(Some(1000), Some(1000)).await.unwrap();

    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_default_request_matches_default_schema() {
    let mock_server = MockServer::start().await;
    mount_metadata(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param(
            "$select",
            "id,name,price,weight,rating,stock,discontinued,createdAt,updatedAt,openingTime,thumbnail,dimensions",
        ))
        .and(query_param("$top", "10"))
        .respond_with(feed(json!({"d": {"results": [{"id": "1"}]}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server, |c| c);
    let schema = service.build_schema().await.unwrap();
    assert!(schema.field("category").is_none());
    assert!(schema.field("reviews").is_none());

    let service = service.with_metadata(Arc::new(catalog()));
    let page = service.fetch_page(None, Some(10)).await.unwrap();
    assert_eq!(page.len(), 1);

    let requests = mock_server.received_requests().await.unwrap();
    let data = requests.iter().find(|r| r.url.path() == "/odata/Products").unwrap();
    assert!(data.url.query_pairs().all(|(k, _)| k != "$expand"));
}

#[tokio::test]
async fn test_fetch_page_strips_duplicated_expansions() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param("paging", "snapshot"))
        .respond_with(feed(json!({
            "d": {
                "results": [{
                    "id": "1",
                    "category": {
                        "code": "TOOLS",
                        "parent": {"code": "ROOT"},
                        "products": {"results": [{"id": "1"}]}
                    }
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let service = service(&mock_server, |c| c.with_select("id,category").with_expand("category"));
    let page = service.fetch_page(None, None).await.unwrap();

    let category = page.entries[0]["category"].as_object().unwrap();
    assert_eq!(category.get("code"), Some(&json!("TOOLS")));
    assert!(category.get("parent").is_none());
    assert!(category.get("products").is_none());
}

#[tokio::test]
async fn test_fetch_page_retries_server_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .respond_with(feed(json!({"d": {"results": [{"id": "7"}]}})))
        .mount(&mock_server)
        .await;

    let service = service(&mock_server, |c| c.with_select("id"));
    let page = service.fetch_page(Some(0), Some(10)).await.unwrap();
    assert_eq!(page.entries[0]["id"], json!("7"));
}

#[tokio::test]
async fn test_fetch_page_surfaces_client_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "BAD_FILTER", "message": {"value": "Invalid filter"}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server, |c| c.with_select("id"));
    let err = service.fetch_page(Some(0), Some(10)).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("BAD_FILTER"));
}

// ============================================================================
// Run context
// ============================================================================

#[tokio::test]
async fn test_prepare_plans_offset_partitions() {
    let mock_server = MockServer::start().await;
    mount_probe(&mock_server).await;
    mount_count(&mock_server, 10_500).await;
    mount_metadata(&mock_server).await;

    let service = service(&mock_server, |c| {
        c.with_select("id,name")
            .with_pagination(PaginationType::ClientOffset)
    });
    let context = service.prepare().await.unwrap();

    assert_eq!(
        context.partitions,
        vec![
            Partition::new(1, 10_000, 1000),
            Partition::new(10_001, 10_500, 500),
        ]
    );
    assert_eq!(context.schema.fields.len(), 2);
    assert_eq!(
        ExtractionService::decode_metadata(&context.encoded_metadata)
            .unwrap()
            .raw(),
        CATALOG_METADATA
    );
}

#[tokio::test]
async fn test_prepare_validates_before_network() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = ExtractionConfig::new(
        format!("{}/odata", mock_server.uri()),
        "Products('42')",
        AuthSettings::basic("admin", "secret"),
    );
    let err = ExtractionService::new(config).unwrap().prepare().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_context_reader_follows_server_cursor() {
    let mock_server = MockServer::start().await;
    mount_probe(&mock_server).await;
    mount_count(&mock_server, 3).await;
    mount_metadata(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param("paging", "snapshot"))
        .respond_with(feed(json!({
            "d": {
                "results": [{"id": "1", "name": "Hammer"}, {"id": "2", "name": "Saw"}],
                "__next": format!("{}/odata/Products?$skiptoken=2", mock_server.uri())
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param("$skiptoken", "2"))
        .respond_with(feed(json!({"d": {"results": [{"id": "3", "name": "Drill"}]}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server, |c| c.with_select("id,name"));
    let json = service.prepare().await.unwrap().to_json().unwrap();

    let context = RunContext::from_json(&json).unwrap();
    assert_eq!(context.partitions.len(), 1);

    let mut reader = context.reader(context.partition(0).unwrap()).unwrap();
    let records = reader.collect_all().await.unwrap();

    let names: Vec<&FieldValue> = records.iter().filter_map(|r| r.get("name")).collect();
    assert_eq!(
        names,
        vec![
            &FieldValue::String("Hammer".to_string()),
            &FieldValue::String("Saw".to_string()),
            &FieldValue::String("Drill".to_string()),
        ]
    );
    assert_eq!(records[2].get("id"), Some(&FieldValue::Long(3)));
    assert_eq!(reader.state(), ReaderState::Done);
}

#[test]
fn test_partition_index_out_of_range() {
    let context = RunContext {
        config: base_config("https://api.example.com/odata"),
        partitions: Vec::new(),
        encoded_metadata: String::new(),
        schema: crate::schema::OutputSchema::new("Products", Vec::new()),
    };

    assert!(context.partition(0).is_err());
}
