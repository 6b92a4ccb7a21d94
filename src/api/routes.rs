use actix_web::{delete, get, post, web, HttpResponse};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::models::{ApiResponse, ChatRequestBody, SampleQuery, MAX_SAMPLE_LIMIT};
use crate::chat::models::ChatRequest;
use crate::chat::ChatService;

// --- Chat ---

#[post("/chat")]
pub async fn submit_chat(
    service: web::Data<ChatService>,
    req: web::Json<ChatRequestBody>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    req.validate()?;

    let session_id = req.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    info!("Chat message for session {}", session_id);

    let reply = service
        .handle(ChatRequest {
            session_id,
            message: req.message,
            context: req.context.unwrap_or_default(),
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(reply)))
}

#[get("/chat/history/{session_id}")]
pub async fn get_history(
    service: web::Data<ChatService>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let messages = service.history(&session_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(messages)))
}

#[delete("/chat/history/{session_id}")]
pub async fn clear_history(
    service: web::Data<ChatService>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let session_id = session_id.into_inner();
    service.clear_history(&session_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "sessionId": session_id,
        "cleared": true,
    }))))
}

#[get("/chat/suggestions")]
pub async fn get_suggestions(service: web::Data<ChatService>) -> Result<HttpResponse, ApiError> {
    let suggestions = service.suggestions().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(suggestions)))
}

// --- Schema ---

#[get("/schema/tables")]
pub async fn list_tables(service: web::Data<ChatService>) -> Result<HttpResponse, ApiError> {
    let tables = service.tables().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(tables)))
}

#[get("/schema/tables/{table}/sample")]
pub async fn sample_table(
    service: web::Data<ChatService>,
    table: web::Path<String>,
    query: web::Query<SampleQuery>,
) -> Result<HttpResponse, ApiError> {
    if query.limit == 0 || query.limit > MAX_SAMPLE_LIMIT {
        return Err(ApiError::invalid(
            "limit",
            "range",
            format!("limit must be between 1 and {}", MAX_SAMPLE_LIMIT),
        ));
    }
    let rows = service.sample_rows(&table, query.limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(rows)))
}

#[get("/health")]
pub async fn health(service: web::Data<ChatService>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "provider": service.provider_name(),
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| ApiError::invalid("body", "json", err.to_string()).into());

    cfg.app_data(json_config).service(health).service(
        web::scope("/api")
            .service(submit_chat)
            .service(get_history)
            .service(clear_history)
            .service(get_suggestions)
            .service(list_tables)
            .service(sample_table),
    );
}
