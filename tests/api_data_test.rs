// ============================================================================
// Public Data Gateway Tests
// ============================================================================
//
// End-to-end tests for GET /api-data:
// - resource whitelist and format validation
// - singleton lookup vs ordered collection listing
// - column projection confidentiality
// - JSON envelope and CSV wire format
// - cross-cutting response headers
//
// ============================================================================

use serde_json::Value;
use serial_test::serial;

mod test_utils;
use test_utils::spawn_app;

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn get_json(app_address: &str, query: &str) -> (reqwest::StatusCode, Value) {
    let response = client()
        .get(format!("http://{}/api-data{}", app_address, query))
        .send()
        .await
        .unwrap();
    let status = response.status();
    let body: Value = response.json().await.unwrap();
    (status, body)
}

// ============================================================================
// Singleton and Collection Resolution
// ============================================================================

#[tokio::test]
#[serial]
async fn test_article_singleton_by_id() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app.address, "?resource=articles&id=5").await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let data = body["data"].as_object().expect("data should be an object");
    assert_eq!(data["article_number"], 5);
    assert_eq!(data["title"], "Article 5");
    assert_eq!(body["recordCount"], 1);

    // Exactly the declared projection, in order - no internal columns.
    let keys: Vec<String> = data.keys().cloned().collect();
    assert_eq!(
        keys,
        vec!["article_number", "title", "content", "chapter_id", "section_id"]
    );
}

#[tokio::test]
#[serial]
async fn test_collection_is_ordered_and_counted() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app.address, "?resource=articles").await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let data = body["data"].as_array().expect("data should be an array");
    assert_eq!(data.len(), 5);
    assert_eq!(body["recordCount"], 5);

    let numbers: Vec<i64> = data
        .iter()
        .map(|row| row["article_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
#[serial]
async fn test_missing_singleton_yields_null_data() {
    let app = spawn_app().await;

    // In range, but not seeded.
    let (status, body) = get_json(&app.address, "?resource=articles&id=9999").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert!(body["data"].is_null());
    assert_eq!(body["recordCount"], 0);
}

#[tokio::test]
#[serial]
async fn test_unusable_id_falls_back_to_collection() {
    let app = spawn_app().await;

    for query in [
        "?resource=articles&id=abc",
        "?resource=articles&id=0",
        "?resource=articles&id=-2",
        "?resource=articles&id=10001",
    ] {
        let (status, body) = get_json(&app.address, query).await;
        assert_eq!(status, reqwest::StatusCode::OK, "query {}", query);
        assert!(body["data"].is_array(), "query {} should list all", query);
        assert_eq!(body["recordCount"], 5);
    }
}

#[tokio::test]
#[serial]
async fn test_projection_hides_internal_columns() {
    let app = spawn_app().await;

    let (_, body) = get_json(&app.address, "?resource=articles").await;
    for row in body["data"].as_array().unwrap() {
        let object = row.as_object().unwrap();
        assert!(!object.contains_key("internal_notes"));
        assert!(!object.contains_key("updated_at"));
        assert!(!object.contains_key("id"));
    }
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
#[serial]
async fn test_invalid_resource_enumerates_whitelist() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app.address, "?resource=bogus&format=csv&id=3").await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_RESOURCE");

    let allowed = body["allowedResources"].as_array().unwrap();
    for name in ["articles", "recitals", "definitions", "chapters", "implementing-acts", "metadata"] {
        assert!(allowed.iter().any(|v| v == name), "missing {}", name);
    }

    // Each whitelisted resource is documented with its projected columns.
    let resources = body["resources"].as_array().unwrap();
    assert_eq!(resources.len(), allowed.len());
    let definitions = resources
        .iter()
        .find(|r| r["name"] == "definitions")
        .expect("definitions missing from resources");
    assert_eq!(
        definitions["columns"],
        serde_json::json!(["id", "term", "definition", "article_number"])
    );
}

#[tokio::test]
#[serial]
async fn test_invalid_format_rejected() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app.address, "?resource=articles&format=xml").await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_FORMAT");
}

#[tokio::test]
#[serial]
async fn test_method_not_allowed() {
    let app = spawn_app().await;

    let response = client()
        .post(format!("http://{}/api-data?resource=articles", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errorCode"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
#[serial]
async fn test_options_preflight() {
    let app = spawn_app().await;

    let response = client()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/api-data", app.address),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

// ============================================================================
// Envelope and Metadata
// ============================================================================

#[tokio::test]
#[serial]
async fn test_json_envelope_shape() {
    let app = spawn_app().await;

    let (_, body) = get_json(&app.address, "?resource=recitals").await;
    assert_eq!(body["@context"], "https://schema.org");
    assert_eq!(body["@type"], "Dataset");
    assert_eq!(body["identifier"], "eu-ai-act-recitals");
    assert_eq!(body["license"], "https://creativecommons.org/licenses/by/4.0/");
    assert!(body["dateModified"].is_string());
    assert!(body["publisher"]["name"].is_string());
}

#[tokio::test]
#[serial]
async fn test_metadata_resource_is_static_singleton() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app.address, "?resource=metadata").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["recordCount"], 1);
    assert_eq!(body["data"]["api"]["endpoint"], "/api-data");
    assert!(body["data"]["regulation"]["name"].is_string());
}

// ============================================================================
// CSV Output
// ============================================================================

#[tokio::test]
#[serial]
async fn test_csv_definitions_wire_format() {
    let app = spawn_app().await;

    let response = client()
        .get(format!(
            "http://{}/api-data?resource=definitions&format=csv",
            app.address
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"ai-act-definitions.csv\""
    );

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(lines.next().unwrap(), "id,term,definition,article_number");

    // Seeded definition contains a comma, an embedded quote and a newline;
    // it must come back quote-doubled with the newline flattened.
    assert!(body.contains(
        "\"a machine-based system, designed with \"\"autonomy\"\" that infers outputs\""
    ));
}

#[tokio::test]
#[serial]
async fn test_csv_falls_back_to_json_for_metadata() {
    let app = spawn_app().await;

    let response = client()
        .get(format!(
            "http://{}/api-data?resource=metadata&format=csv",
            app.address
        ))
        .send()
        .await
        .unwrap();

    // Silent fallback: not an error, and not CSV.
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("application/json"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["recordCount"], 1);
}

#[tokio::test]
#[serial]
async fn test_csv_falls_back_to_json_for_singleton() {
    let app = spawn_app().await;

    let response = client()
        .get(format!(
            "http://{}/api-data?resource=articles&format=csv&id=2",
            app.address
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["article_number"], 2);
}

// ============================================================================
// Cross-Cutting Headers
// ============================================================================

#[tokio::test]
#[serial]
async fn test_headers_present_on_success_and_error() {
    let app = spawn_app().await;

    for query in ["?resource=chapters", "?resource=bogus"] {
        let response = client()
            .get(format!("http://{}/api-data{}", app.address, query))
            .send()
            .await
            .unwrap();
        let headers = response.headers();

        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(headers.get("cache-control").unwrap(), "public, max-age=300");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    }
}

#[tokio::test]
#[serial]
async fn test_health_endpoint() {
    let app = spawn_app().await;

    let response = client()
        .get(format!("http://{}/health", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}
