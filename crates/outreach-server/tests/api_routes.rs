//! End-to-end tests of the REST API against an on-disk store.

mod common;

use axum::http::StatusCode;
use common::{send, send_raw, test_app};
use serde_json::json;

// ============================================================================
// CONTACTS
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _dir) = test_app(|_| {});
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_repeated_ingest_merges() {
    let (app, _dir) = test_app(|_| {});

    let (status, body) = send(
        &app,
        "POST",
        "/api/contacts",
        Some(json!({"email": "a@x.com", "company": "Acme"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "inserted");

    let (status, body) = send(
        &app,
        "POST",
        "/api/contacts",
        Some(json!({"email": "A@x.com", "company_name": "Acme Corp", "phone": "555-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "updated");

    let (status, body) = send(&app, "GET", "/api/contacts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["contacts"][0]["company_name"], "Acme Corp");
    assert_eq!(body["contacts"][0]["phone"], "555-1");
}

#[tokio::test]
async fn test_invalid_email_is_unprocessable() {
    let (app, _dir) = test_app(|_| {});
    let (status, _) = send(
        &app,
        "POST",
        "/api/contacts",
        Some(json!({"email": "nope", "first_name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_status_transitions_and_history() {
    let (app, _dir) = test_app(|_| {});
    send(&app, "POST", "/api/contacts", Some(json!({"email": "a@x.com"}))).await;

    for next in ["contacted", "qualified"] {
        let (status, body) = send(
            &app,
            "PUT",
            "/api/contacts/a@x.com/status",
            Some(json!({"status": next})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], next);
    }

    let (status, body) = send(&app, "GET", "/api/contacts/a@x.com/interactions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["interactions"][0]["kind"], "status_change");
    assert_eq!(body["interactions"][0]["metadata"]["to"], "qualified");
}

#[tokio::test]
async fn test_closed_contacts_need_reopen() {
    let (app, _dir) = test_app(|_| {});
    send(&app, "POST", "/api/contacts", Some(json!({"email": "a@x.com"}))).await;
    send(
        &app,
        "PUT",
        "/api/contacts/a@x.com/status",
        Some(json!({"status": "closed_lost"})),
    )
    .await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/contacts/a@x.com/status",
        Some(json!({"status": "negotiation"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "POST",
        "/api/contacts/a@x.com/reopen",
        Some(json!({"status": "negotiation"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "negotiation");
}

#[tokio::test]
async fn test_unknown_contact_and_bad_status() {
    let (app, _dir) = test_app(|_| {});

    let (status, _) = send(&app, "GET", "/api/contacts/ghost@x.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/contacts/ghost@x.com/status",
        Some(json!({"status": "contacted"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, "POST", "/api/contacts", Some(json!({"email": "a@x.com"}))).await;
    let (status, body) = send_raw(
        &app,
        "PUT",
        "/api/contacts/a@x.com/status",
        Some(json!({"status": "won"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("won"));
}

#[tokio::test]
async fn test_search_and_status_filter() {
    let (app, _dir) = test_app(|_| {});
    send(
        &app,
        "POST",
        "/api/contacts",
        Some(json!({"email": "ada@engines.io", "first_name": "Ada", "last_name": "Lovelace"})),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/contacts",
        Some(json!({"email": "grace@navy.mil", "company": "US Navy", "status": "qualified"})),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/contacts?q=lovelace", None).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["contacts"][0]["email"], "ada@engines.io");

    let (_, body) = send(&app, "GET", "/api/contacts?status=qualified", None).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["contacts"][0]["email"], "grace@navy.mil");

    let (_, body) = send(&app, "GET", "/api/contacts?q=.&status=new", None).await;
    assert_eq!(body["total_count"], 1);

    let (status, _) = send(&app, "GET", "/api/contacts?status=bogus", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search_status_filter_applies_before_limit() {
    let (app, _dir) = test_app(|_| {});
    send(&app, "POST", "/api/contacts", Some(json!({"email": "a@acme.com"}))).await;
    send(
        &app,
        "PUT",
        "/api/contacts/a@acme.com/status",
        Some(json!({"status": "contacted"})),
    )
    .await;
    send(&app, "POST", "/api/contacts", Some(json!({"email": "b@acme.com"}))).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/contacts?q=acme&status=contacted&limit=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["contacts"][0]["email"], "a@acme.com");
}

// ============================================================================
// INTERACTIONS
// ============================================================================

#[tokio::test]
async fn test_log_interaction() {
    let (app, _dir) = test_app(|_| {});
    send(&app, "POST", "/api/contacts", Some(json!({"email": "a@x.com"}))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/contacts/a@x.com/interactions",
        Some(json!({"kind": "email_sent", "content": "Hi Ada", "metadata": {"ai_generated": true}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let logged_at = body["timestamp"].clone();

    let (_, contact) = send(&app, "GET", "/api/contacts/a@x.com", None).await;
    assert_eq!(contact["last_contacted_at"], logged_at);

    let (status, _) = send(
        &app,
        "POST",
        "/api/contacts/a@x.com/interactions",
        Some(json!({"kind": "fax"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/api/contacts/ghost@x.com/interactions",
        Some(json!({"kind": "note"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// REPORTING, EXPORT, IMPORT
// ============================================================================

#[tokio::test]
async fn test_dashboard_and_pipeline() {
    let (app, _dir) = test_app(|_| {});
    for (email, status) in [("a@x.com", "closed_won"), ("b@x.com", "closed_lost"), ("c@x.com", "new")] {
        send(
            &app,
            "POST",
            "/api/contacts",
            Some(json!({"email": email, "status": status})),
        )
        .await;
    }

    let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["by_status"]["closed_won"], 1);
    assert_eq!(body["by_status"]["negotiation"], 0);
    assert_eq!(body["conversion_rate"], 0.5);

    let (_, body) = send(&app, "GET", "/api/pipeline", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(9));
    assert_eq!(body[0]["status"], "new");
    assert_eq!(body[0]["contacts"][0], "c@x.com");
}

#[tokio::test]
async fn test_export_then_import_into_fresh_store() {
    let (source, _source_dir) = test_app(|_| {});
    send(
        &source,
        "POST",
        "/api/contacts",
        Some(json!({"email": "a@x.com", "first_name": "Ada", "tags": ["vip", "london"]})),
    )
    .await;
    send(&source, "POST", "/api/contacts", Some(json!({"email": "b@x.com"}))).await;

    let (status, csv) = send_raw(&source, "GET", "/api/export?format=csv", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(csv.starts_with("email,first_name"));

    let (target, _target_dir) = test_app(|_| {});
    let (status, report) = send(
        &target,
        "POST",
        "/api/contacts/import",
        Some(json!({"format": "csv", "data": csv})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["inserted"], 2);

    let (_, contact) = send(&target, "GET", "/api/contacts/a@x.com", None).await;
    assert_eq!(contact["first_name"], "Ada");
    assert_eq!(contact["tags"], json!(["vip", "london"]));

    let (status, _) = send(&source, "GET", "/api/export?format=xml", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_batch_import_reports_failures() {
    let (app, _dir) = test_app(|_| {});
    let (status, report) = send(
        &app,
        "POST",
        "/api/contacts/import",
        Some(json!([
            {"email": "a@x.com"},
            {"first_name": "No Email"},
            {"email": "b@x.com"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["inserted"], 2);
    assert_eq!(report["failures"][0]["index"], 1);
}

#[tokio::test]
async fn test_batch_import_reports_undecodable_records() {
    let (app, _dir) = test_app(|_| {});
    let (status, report) = send(
        &app,
        "POST",
        "/api/contacts/import",
        Some(json!([
            {"email": "good@x.com"},
            {"email": "bad@x.com", "status": "won"},
            {"email": "late@x.com", "status": "Closed Won"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["inserted"], 2);
    assert_eq!(report["failures"][0]["index"], 1);
    assert_eq!(report["failures"][0]["email"], "bad@x.com");

    let (_, contact) = send(&app, "GET", "/api/contacts/late@x.com", None).await;
    assert_eq!(contact["status"], "closed_won");
}

#[tokio::test]
async fn test_csv_import_skips_bad_rows() {
    let (app, _dir) = test_app(|_| {});
    let data = "email,status,lead_score\n\
                good@x.com,new,5\n\
                bad@x.com,new,high\n\
                also@x.com,contacted,1\n";
    let (status, report) = send(
        &app,
        "POST",
        "/api/contacts/import",
        Some(json!({"format": "csv", "data": data})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["inserted"], 2);
    assert_eq!(report["failures"][0]["index"], 1);

    let (status, _) = send(&app, "GET", "/api/contacts/bad@x.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreadable_import_document_is_unprocessable() {
    let (app, _dir) = test_app(|_| {});
    let (status, _) = send(
        &app,
        "POST",
        "/api/contacts/import",
        Some(json!({"format": "json", "data": "not json"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// CAMPAIGNS
// ============================================================================

#[tokio::test]
async fn test_campaign_lifecycle() {
    let (app, _dir) = test_app(|_| {});

    let (status, campaign) = send(
        &app,
        "POST",
        "/api/campaigns",
        Some(json!({"name": "Spring push", "start_date": "2024-03-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = campaign["id"].as_str().unwrap().to_string();

    send(&app, "POST", "/api/contacts", Some(json!({"email": "a@x.com"}))).await;
    send(
        &app,
        "POST",
        "/api/contacts/a@x.com/interactions",
        Some(json!({"kind": "email_sent", "metadata": {"campaign_id": id}})),
    )
    .await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/campaigns/{}/status", id),
        Some(json!({"status": "active"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["emails_sent"], 1);

    let (_, body) = send(&app, "GET", "/api/campaigns", None).await;
    assert_eq!(body["campaigns"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &app,
        "GET",
        "/api/campaigns/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// TOOL SELECTION
// ============================================================================

#[tokio::test]
async fn test_capabilities_reflect_configuration() {
    let (app, _dir) = test_app(|config| {
        config.integrations.search_api_key = Some("serp-123".into());
    });

    let (status, body) = send(&app, "GET", "/api/tools/capabilities", None).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 3);

    let scraper = tools.iter().find(|t| t["tool"] == "browser_scraper").unwrap();
    assert_eq!(scraper["available"], false);
    assert_eq!(scraper["missing"], json!(["browser automation"]));

    let search = tools.iter().find(|t| t["tool"] == "search_api").unwrap();
    assert_eq!(search["available"], true);
}

#[tokio::test]
async fn test_select_without_browser_has_no_tool() {
    let (app, _dir) = test_app(|config| {
        config.integrations.search_api_key = Some("serp-123".into());
        config.integrations.enrichment_api_key = Some("snov-123".into());
    });

    let (status, _) = send(
        &app,
        "POST",
        "/api/tools/select",
        Some(json!({
            "input": {"type": "linkedin_urls", "value": ["https://linkedin.com/in/ada"]},
            "constraints": {"budget": "free", "priority": "accuracy"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_select_search_over_budget() {
    let (app, _dir) = test_app(|config| {
        config.integrations.browser_automation = true;
        config.integrations.search_api_key = Some("serp-123".into());
    });

    let (status, body) = send(
        &app,
        "POST",
        "/api/tools/select",
        Some(json!({
            "input": {"type": "search_queries", "value": ["CTO fintech Berlin"]},
            "constraints": {"budget": "free", "priority": "speed"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chosen"]["tool"], "search_api");
    assert_eq!(body["rationale"]["over_budget"], true);
}
