mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{read_json, TestApp};

fn row(
    sku: &str,
    brand: &str,
    name: &str,
    location: &str,
    item_type: &str,
    owner: &str,
) -> Value {
    json!({
        "sku": sku,
        "brand": brand,
        "name": name,
        "owner_category": owner,
        "location": location,
        "item_type": item_type,
        "system_qty": 5,
    })
}

/// One row per combination the filters distinguish.
async fn seed_mixed_session(app: &TestApp) {
    let rows = vec![
        row("C-1", "Anker", "Anker USB-C Cable", "Floor", "Stock", "Regular"),
        row("C-2", "Anker", "Anker Wall Charger", "Warehouse", "Stock", "Regular"),
        row("D-1", "Bose", "Bose Demo Speaker", "Floor", "Demo", "Consignment"),
    ];
    let response = app
        .request(
            Method::POST,
            "/api/v1/sessions",
            Some(json!({ "session_name": "mixed", "rows": rows })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn skus_for(app: &TestApp, query: &str) -> Vec<String> {
    let response = app
        .request(Method::GET, &format!("/api/v1/records{}", query), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK, "query {:?}", query);
    let body = read_json(response).await;
    body["data"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["sku"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn location_filter_narrows_to_one_floor() {
    let app = TestApp::new().await;
    seed_mixed_session(&app).await;

    assert_eq!(skus_for(&app, "?location=Floor").await, vec!["C-1", "D-1"]);
    assert_eq!(skus_for(&app, "?location=Warehouse").await, vec!["C-2"]);
}

#[tokio::test]
async fn item_type_filter_splits_stock_from_demo() {
    let app = TestApp::new().await;
    seed_mixed_session(&app).await;

    assert_eq!(skus_for(&app, "?item_type=Demo").await, vec!["D-1"]);
    assert_eq!(skus_for(&app, "?item_type=Stock").await, vec!["C-1", "C-2"]);
}

#[tokio::test]
async fn owner_filter_splits_consignment_from_regular() {
    let app = TestApp::new().await;
    seed_mixed_session(&app).await;

    assert_eq!(skus_for(&app, "?owner=Consignment").await, vec!["D-1"]);
    assert_eq!(skus_for(&app, "?owner=Regular").await, vec!["C-1", "C-2"]);
}

#[tokio::test]
async fn filters_combine_conjunctively() {
    let app = TestApp::new().await;
    seed_mixed_session(&app).await;

    assert_eq!(
        skus_for(&app, "?location=Floor&item_type=Stock").await,
        vec!["C-1"]
    );
    assert!(skus_for(&app, "?location=Warehouse&owner=Consignment")
        .await
        .is_empty());
}

#[tokio::test]
async fn search_is_case_insensitive_across_name_brand_and_sku() {
    let app = TestApp::new().await;
    seed_mixed_session(&app).await;

    // Name match, any case.
    assert_eq!(skus_for(&app, "?search=bose").await, vec!["D-1"]);
    // Brand match in the opposite case.
    assert_eq!(skus_for(&app, "?search=ANKER").await, vec!["C-1", "C-2"]);
    // Sku match.
    assert_eq!(skus_for(&app, "?search=c-1").await, vec!["C-1"]);
    // Substring inside a name.
    assert_eq!(skus_for(&app, "?search=CABLE").await, vec!["C-1"]);
    // Whitespace-only search is ignored, not matched literally.
    assert_eq!(
        skus_for(&app, "?search=%20%20").await,
        vec!["C-1", "C-2", "D-1"]
    );
}

#[tokio::test]
async fn search_combines_with_filters() {
    let app = TestApp::new().await;
    seed_mixed_session(&app).await;

    assert_eq!(
        skus_for(&app, "?search=anker&location=Warehouse").await,
        vec!["C-2"]
    );
    assert!(skus_for(&app, "?search=bose&item_type=Stock").await.is_empty());
}
