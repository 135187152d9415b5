//! Payment recording, status derivation, override, and delete tests.

mod common;

use common::{create_invoice, get_invoice, TestApp};
use serde_json::json;

fn invoice_body(client_name: &str, down_payment: f64) -> serde_json::Value {
    json!({
        "clientName": client_name,
        "clientPhone": "+62 812 6666 7777",
        "invoiceDate": "2026-08-01T00:00:00Z",
        "lineItems": [
            { "description": "Package", "total": 1_000_000.0 },
            { "description": "Extras", "total": 500_000.0 }
        ],
        "downPayment": down_payment
    })
}

async fn post_payment(
    app: &TestApp,
    selector: &str,
    id: &str,
    body: serde_json::Value,
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!(
            "{}/invoices/{}/{}/payment",
            app.address, selector, id
        ))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn payment_completing_the_total_marks_the_invoice_paid() {
    let app = TestApp::spawn().await;

    // Worked example: 1,500,000 total, 500,000 down payment
    let created = create_invoice(&app, "/invoices", invoice_body("Lunas Client", 500_000.0)).await;
    assert_eq!(created["status"], "deposit-paid");
    let id = created["id"].as_str().unwrap().to_string();

    let response = post_payment(&app, "general", &id, json!({ "amount": 1_000_000.0 })).await;
    assert_eq!(reqwest::StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "paid");

    let fetched = get_invoice(&app, &format!("/invoices/{}", id)).await;
    assert_eq!(fetched["status"], "paid");
    let payments = fetched["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    let total_paid: f64 = payments
        .iter()
        .map(|p| p["amount"].as_f64().unwrap())
        .sum();
    assert_eq!(total_paid, 1_500_000.0);

    app.cleanup().await;
}

#[tokio::test]
async fn partial_payment_moves_an_unpaid_invoice_to_deposit_paid() {
    let app = TestApp::spawn().await;

    let created = create_invoice(&app, "/invoices", invoice_body("Partial Client", 0.0)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = post_payment(&app, "general", &id, json!({ "amount": 200_000.0 })).await;
    assert_eq!(reqwest::StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "deposit-paid");

    app.cleanup().await;
}

#[tokio::test]
async fn payment_defaults_fill_date_and_notes() {
    let app = TestApp::spawn().await;

    let created = create_invoice(&app, "/invoices", invoice_body("Defaults Client", 0.0)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = post_payment(&app, "general", &id, json!({ "amount": 100_000.0 })).await;
    assert_eq!(reqwest::StatusCode::OK, response.status());

    let fetched = get_invoice(&app, &format!("/invoices/{}", id)).await;
    let payments = fetched["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["notes"], "Payment");
    assert!(payments[0]["date"].as_str().is_some());

    app.cleanup().await;
}

#[tokio::test]
async fn non_positive_or_missing_amount_is_rejected() {
    let app = TestApp::spawn().await;

    let created = create_invoice(&app, "/invoices", invoice_body("Amount Client", 0.0)).await;
    let id = created["id"].as_str().unwrap().to_string();

    for body in [json!({}), json!({ "amount": 0.0 }), json!({ "amount": -50.0 })] {
        let response = post_payment(&app, "general", &id, body).await;
        assert_eq!(reqwest::StatusCode::BAD_REQUEST, response.status());
    }

    // Nothing was recorded
    let fetched = get_invoice(&app, &format!("/invoices/{}", id)).await;
    assert_eq!(fetched["payments"].as_array().unwrap().len(), 0);
    assert_eq!(fetched["status"], "unpaid");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_type_selector_is_rejected() {
    let app = TestApp::spawn().await;

    let response = post_payment(
        &app,
        "retail",
        "652f1a2b3c4d5e6f70818283",
        json!({ "amount": 100.0 }),
    )
    .await;
    assert_eq!(reqwest::StatusCode::BAD_REQUEST, response.status());

    app.cleanup().await;
}

#[tokio::test]
async fn payment_against_a_missing_invoice_is_not_found() {
    let app = TestApp::spawn().await;

    let response = post_payment(
        &app,
        "general",
        "652f1a2b3c4d5e6f70818283",
        json!({ "amount": 100.0 }),
    )
    .await;
    assert_eq!(reqwest::StatusCode::NOT_FOUND, response.status());

    app.cleanup().await;
}

#[tokio::test]
async fn status_can_be_overridden_regardless_of_totals() {
    let app = TestApp::spawn().await;

    let created = create_invoice(&app, "/invoices", invoice_body("Override Client", 0.0)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let client = reqwest::Client::new();
    let response = client
        .patch(format!("{}/invoices/general/{}/status", app.address, id))
        .json(&json!({ "status": "paid" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reqwest::StatusCode::OK, response.status());

    // Paid despite zero payments: manual override is an escape hatch
    let fetched = get_invoice(&app, &format!("/invoices/{}", id)).await;
    assert_eq!(fetched["status"], "paid");
    assert_eq!(fetched["payments"].as_array().unwrap().len(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_status_value_is_rejected() {
    let app = TestApp::spawn().await;

    let created = create_invoice(&app, "/invoices", invoice_body("Bad Status Client", 0.0)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let client = reqwest::Client::new();
    let response = client
        .patch(format!("{}/invoices/general/{}/status", app.address, id))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reqwest::StatusCode::BAD_REQUEST, response.status());

    app.cleanup().await;
}

#[tokio::test]
async fn hotel_payment_route_targets_the_hotel_collection() {
    let app = TestApp::spawn().await;

    let created =
        create_invoice(&app, "/invoices/hotel", invoice_body("Hotel Payer", 0.0)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = post_payment(&app, "hotel", &id, json!({ "amount": 1_500_000.0 })).await;
    assert_eq!(reqwest::StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "paid");

    app.cleanup().await;
}

#[tokio::test]
async fn delete_is_permanent_and_a_second_delete_is_not_found() {
    let app = TestApp::spawn().await;

    let created = create_invoice(&app, "/invoices", invoice_body("Delete Client", 0.0)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/invoices/{}", app.address, id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reqwest::StatusCode::OK, response.status());

    let response = client
        .delete(format!("{}/invoices/{}", app.address, id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reqwest::StatusCode::NOT_FOUND, response.status());

    let response = client
        .get(format!("{}/invoices/{}", app.address, id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reqwest::StatusCode::NOT_FOUND, response.status());

    app.cleanup().await;
}
