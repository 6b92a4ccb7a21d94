mod common;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use common::{chat_config, intent_json, seeded_pool, service_with, FailingHistoryStore, ScriptedProvider, STORE_FAILURE};
use sqlchat::api::routes::configure;
use sqlchat::chat::responder::APOLOGY_MESSAGE;
use sqlchat::chat::ChatService;
use sqlchat::db::DuckDbCatalog;
use sqlchat::llm::LlmError;

macro_rules! app_with {
    ($provider:expr) => {{
        let data = web::Data::new(service_with($provider, chat_config()));
        test::init_service(App::new().app_data(data).configure(configure)).await
    }};
}

#[actix_web::test]
async fn rejects_empty_and_oversized_messages() {
    let app = app_with!(Arc::new(ScriptedProvider::default()));

    for message in [String::new(), "a".repeat(501)] {
        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({ "message": message }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["details"][0]["field"], "message");
        assert_eq!(body["details"][0]["rule"], "length");
        assert!(body["error"].as_str().unwrap().contains("message"));
    }
}

#[actix_web::test]
async fn accepts_a_500_character_message() {
    let reply = intent_json("", "ok", 0.95);
    let app = app_with!(Arc::new(ScriptedProvider::replying(&[&reply])));

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "message": "a".repeat(500) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn missing_message_and_bad_json_are_400() {
    let app = app_with!(Arc::new(ScriptedProvider::default()));

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "sessionId": "abc" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"][0]["field"], "message");

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["details"][0]["field"], "body");
}

#[actix_web::test]
async fn chat_round_trip_and_history() {
    let reply = intent_json("SELECT id, name FROM users ORDER BY id", "All users.", 0.85);
    let app = app_with!(Arc::new(ScriptedProvider::replying(&[&reply])));

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "message": "Show me all users", "sessionId": "web-1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["sessionId"], "web-1");
    assert_eq!(body["data"]["message"]["role"], "assistant");
    assert_eq!(body["data"]["message"]["content"], "All users.");
    assert_eq!(body["data"]["sqlQuery"], "SELECT id, name FROM users ORDER BY id");
    assert_eq!(body["data"]["queryResult"]["rowCount"], 3);
    assert_eq!(body["data"]["queryResult"]["rows"][1]["name"], "Grace");

    let req = test::TestRequest::get().uri("/api/chat/history/web-1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["generatedQuery"], "SELECT id, name FROM users ORDER BY id");

    let req = test::TestRequest::delete().uri("/api/chat/history/web-1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/chat/history/web-1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn session_id_is_generated_when_absent() {
    let reply = intent_json("", "Hi!", 0.99);
    let app = app_with!(Arc::new(ScriptedProvider::replying(&[&reply])));

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "message": "hello" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let session_id = body["data"]["sessionId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(session_id).is_ok());
    assert!(body["data"].get("sqlQuery").is_none());
    assert_eq!(body["data"]["queryResult"]["rowCount"], 0);
}

#[actix_web::test]
async fn provider_failure_is_still_a_successful_response() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(LlmError::Timeout(30))]));
    let app = app_with!(provider);

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "message": "Show me all users", "sessionId": "s" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"]["content"], APOLOGY_MESSAGE);
    assert_eq!(body["data"]["confidence"], 0.0);
}

#[actix_web::test]
async fn storage_failures_are_opaque_500s() {
    let reply = intent_json("SELECT * FROM users", "All users.", 0.85);
    let service = ChatService::new(
        Arc::new(ScriptedProvider::replying(&[&reply])),
        Arc::new(DuckDbCatalog::new(seeded_pool())),
        Arc::new(FailingHistoryStore),
        chat_config(),
    );
    let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(configure)).await;

    let requests = [
        test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({ "message": "Show me all users", "sessionId": "s" }))
            .to_request(),
        test::TestRequest::get().uri("/api/chat/history/s").to_request(),
        test::TestRequest::delete().uri("/api/chat/history/s").to_request(),
    ];
    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let raw = test::read_body(resp).await;
        let text = String::from_utf8(raw.to_vec()).unwrap();
        assert!(!text.contains(STORE_FAILURE));
        assert!(!text.contains("disk quota"));

        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");
    }
}

#[actix_web::test]
async fn unknown_sessions_are_not_errors() {
    let app = app_with!(Arc::new(ScriptedProvider::default()));

    let req = test::TestRequest::get().uri("/api/chat/history/never-seen").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "success": true, "data": [] }));

    let req = test::TestRequest::delete().uri("/api/chat/history/never-seen").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
}

#[actix_web::test]
async fn suggestions_reference_the_first_table() {
    let app = app_with!(Arc::new(ScriptedProvider::default()));

    let req = test::TestRequest::get().uri("/api/chat/suggestions").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let list: Vec<String> = serde_json::from_value(body["data"].clone()).unwrap();

    // Tables are listed alphabetically, so `orders` comes first
    let table_specific: Vec<&String> = list.iter().filter(|s| s.contains("orders") && s.contains("rows")).collect();
    assert_eq!(table_specific.len(), 2);
}

#[actix_web::test]
async fn schema_endpoints() {
    let app = app_with!(Arc::new(ScriptedProvider::default()));

    let req = test::TestRequest::get().uri("/api/schema/tables").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let tables = body["data"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1]["name"], "users");
    assert_eq!(tables[1]["primaryKey"], json!(["id"]));
    assert_eq!(tables[1]["columns"][0]["isPrimaryKey"], true);
    assert_eq!(tables[1]["columns"][1]["type"], "VARCHAR");

    let req = test::TestRequest::get().uri("/api/schema/tables/users/sample?limit=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["rowCount"], 2);

    let req = test::TestRequest::get().uri("/api/schema/tables/nope/sample").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/schema/tables/users/sample?limit=0").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn health_reports_provider() {
    let app = app_with!(Arc::new(ScriptedProvider::default()));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["provider"], "scripted");
}
