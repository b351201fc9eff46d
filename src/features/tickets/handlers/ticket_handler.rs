use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::tickets::dtos::{
    ClassificationSuggestionDto, ClassifyRequestDto, CreateTicketDto, TicketFilterQuery,
    TicketResponseDto, TicketStatsDto, UpdateTicketDto,
};
use crate::features::tickets::routes::TicketsState;
use crate::features::tickets::services::ClassificationOutcome;
use crate::shared::validation::validate_payload;

/// Submit a new ticket
#[utoipa::path(
    post,
    path = "/tickets",
    request_body = CreateTicketDto,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponseDto),
        (status = 400, description = "Invalid payload")
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    State(state): State<TicketsState>,
    AppJson(dto): AppJson<CreateTicketDto>,
) -> Result<(StatusCode, Json<TicketResponseDto>)> {
    let ticket = state.tickets.create(dto).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List tickets, newest first
#[utoipa::path(
    get,
    path = "/tickets",
    params(TicketFilterQuery),
    responses(
        (status = 200, description = "Matching tickets", body = Vec<TicketResponseDto>),
    ),
    tag = "tickets"
)]
pub async fn list_tickets(
    State(state): State<TicketsState>,
    Query(filter): Query<TicketFilterQuery>,
) -> Result<Json<Vec<TicketResponseDto>>> {
    let tickets = state.tickets.find(&filter).await?;
    Ok(Json(tickets))
}

/// Partially update a ticket
#[utoipa::path(
    patch,
    path = "/tickets/{id}",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = UpdateTicketDto,
    responses(
        (status = 200, description = "Updated ticket", body = TicketResponseDto),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Ticket not found")
    ),
    tag = "tickets"
)]
pub async fn update_ticket(
    State(state): State<TicketsState>,
    Path(id): Path<Uuid>,
    AppJson(patch): AppJson<UpdateTicketDto>,
) -> Result<Json<TicketResponseDto>> {
    let ticket = state.tickets.update_by_id(id, patch).await?;
    Ok(Json(ticket))
}

/// Suggest a category and priority for a ticket description.
///
/// When the classifier is unavailable the endpoint still answers 200 with
/// the static default suggestion.
#[utoipa::path(
    post,
    path = "/tickets/classify",
    request_body = ClassifyRequestDto,
    responses(
        (status = 200, description = "Classification suggestion", body = ClassificationSuggestionDto),
        (status = 400, description = "Invalid payload")
    ),
    tag = "tickets"
)]
pub async fn classify_ticket(
    State(state): State<TicketsState>,
    AppJson(dto): AppJson<ClassifyRequestDto>,
) -> Result<Json<ClassificationSuggestionDto>> {
    validate_payload(&dto)?;

    let suggestion = match state.classifier.classify(&dto.description).await {
        ClassificationOutcome::Suggested { category, priority } => ClassificationSuggestionDto {
            suggested_category: category,
            suggested_priority: priority,
        },
        ClassificationOutcome::Unavailable => {
            tracing::warn!("Classifier unavailable, returning default suggestion");
            ClassificationSuggestionDto {
                suggested_category: Default::default(),
                suggested_priority: Default::default(),
            }
        }
    };

    Ok(Json(suggestion))
}

/// Aggregate ticket statistics
#[utoipa::path(
    get,
    path = "/tickets/stats",
    responses(
        (status = 200, description = "Ticket statistics", body = TicketStatsDto),
    ),
    tag = "tickets"
)]
pub async fn get_stats(State(state): State<TicketsState>) -> Result<Json<TicketStatsDto>> {
    let stats = state.tickets.get_stats().await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::features::tickets::routes;
    use crate::features::tickets::services::{ClassificationService, TicketService};
    use crate::shared::test_helpers::{disabled_classifier_config, test_pool, valid_ticket_payload};

    async fn test_server() -> TestServer {
        let tickets = Arc::new(TicketService::new(test_pool().await));
        let classifier =
            Arc::new(ClassificationService::new(disabled_classifier_config()).unwrap());
        TestServer::new(routes::routes(tickets, classifier)).unwrap()
    }

    #[tokio::test]
    async fn test_create_ticket_returns_201_with_defaults() {
        let server = test_server().await;

        let response = server.post("/tickets").json(&valid_ticket_payload()).await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["status"], "open");
        assert_eq!(body["category"], "technical");
        assert!(body["id"].is_string());
        assert!(body["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_create_ticket_rejects_invalid_email() {
        let server = test_server().await;

        let mut payload = valid_ticket_payload();
        payload["contact_email"] = json!("not-an-email");

        let response = server.post("/tickets").json(&payload).await;
        response.assert_status_bad_request();

        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_create_ticket_rejects_unknown_category() {
        let server = test_server().await;

        let mut payload = valid_ticket_payload();
        payload["category"] = json!("urgent");

        let response = server.post("/tickets").json(&payload).await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_list_tickets_filters_and_orders() {
        let server = test_server().await;

        let mut first = valid_ticket_payload();
        first["title"] = json!("Password reset loop");
        server.post("/tickets").json(&first).await.assert_status(axum::http::StatusCode::CREATED);

        let mut second = valid_ticket_payload();
        second["title"] = json!("Refund request");
        second["category"] = json!("billing");
        second["priority"] = json!("low");
        server.post("/tickets").json(&second).await.assert_status(axum::http::StatusCode::CREATED);

        let all: Vec<Value> = server.get("/tickets").await.json();
        assert_eq!(all.len(), 2);

        let billing: Vec<Value> = server
            .get("/tickets")
            .add_query_param("category", "billing")
            .await
            .json();
        assert_eq!(billing.len(), 1);
        assert_eq!(billing[0]["title"], "Refund request");

        let searched: Vec<Value> = server
            .get("/tickets")
            .add_query_param("search", "PASSWORD")
            .await
            .json();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0]["title"], "Password reset loop");
    }

    #[tokio::test]
    async fn test_update_ticket_patches_status() {
        let server = test_server().await;

        let created: Value = server.post("/tickets").json(&valid_ticket_payload()).await.json();
        let id = created["id"].as_str().unwrap();

        let response = server
            .patch(&format!("/tickets/{}", id))
            .json(&json!({"status": "in_progress"}))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "in_progress");
        assert_eq!(body["title"], created["title"]);
    }

    #[tokio::test]
    async fn test_update_unknown_ticket_returns_404() {
        let server = test_server().await;

        let response = server
            .patch("/tickets/00000000-0000-0000-0000-000000000000")
            .json(&json!({"status": "closed"}))
            .await;
        response.assert_status_not_found();

        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_update_with_invalid_field_returns_400() {
        let server = test_server().await;

        let created: Value = server.post("/tickets").json(&valid_ticket_payload()).await.json();
        let id = created["id"].as_str().unwrap();

        let response = server
            .patch(&format!("/tickets/{}", id))
            .json(&json!({"title": ""}))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_classify_falls_back_when_classifier_disabled() {
        let server = test_server().await;

        let response = server
            .post("/tickets/classify")
            .json(&json!({"description": "I was charged twice this month"}))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["suggested_category"], "general");
        assert_eq!(body["suggested_priority"], "medium");
    }

    #[tokio::test]
    async fn test_classify_rejects_empty_description() {
        let server = test_server().await;

        let response = server
            .post("/tickets/classify")
            .json(&json!({"description": ""}))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_stats_reflect_created_tickets() {
        let server = test_server().await;

        let empty: Value = server.get("/tickets/stats").await.json();
        assert_eq!(empty["total_tickets"], 0);
        assert_eq!(empty["avg_tickets_per_day"], 0.0);

        for _ in 0..2 {
            server
                .post("/tickets")
                .json(&valid_ticket_payload())
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let created: Value = server.post("/tickets").json(&valid_ticket_payload()).await.json();
        server
            .patch(&format!("/tickets/{}", created["id"].as_str().unwrap()))
            .json(&json!({"status": "resolved"}))
            .await
            .assert_status_ok();

        let stats: Value = server.get("/tickets/stats").await.json();
        assert_eq!(stats["total_tickets"], 3);
        assert_eq!(stats["open_tickets"], 2);
        assert_eq!(stats["avg_tickets_per_day"], 3.0);
        assert_eq!(stats["priority_breakdown"]["high"], 3);
        assert_eq!(stats["category_breakdown"]["technical"], 3);
        assert!(stats["priority_breakdown"].get("low").is_none());
    }
}
