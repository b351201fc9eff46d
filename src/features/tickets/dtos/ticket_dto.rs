use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::tickets::models::{Ticket, TicketCategory, TicketPriority, TicketStatus};

/// Request DTO for creating a ticket
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: String,

    pub category: TicketCategory,

    pub priority: TicketPriority,

    /// Defaults to `open` when omitted
    pub status: Option<TicketStatus>,
}

/// Request DTO for partially updating a ticket. Omitted fields keep their
/// stored values; `id` and `created_at` are never touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,

    pub category: Option<TicketCategory>,

    pub priority: Option<TicketPriority>,

    pub status: Option<TicketStatus>,
}

/// Query parameters for listing tickets
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TicketFilterQuery {
    /// Exact category match
    pub category: Option<TicketCategory>,
    /// Exact priority match
    pub priority: Option<TicketPriority>,
    /// Exact status match
    pub status: Option<TicketStatus>,
    /// Case-insensitive substring match on title or description
    pub search: Option<String>,
}

/// Response DTO for a ticket
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponseDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub contact_email: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketResponseDto {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            contact_email: ticket.contact_email,
            category: ticket.category,
            priority: ticket.priority,
            status: ticket.status,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

/// Request DTO for classifying free text
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ClassifyRequestDto {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Advisory classification result. Never authoritative; the intake form may
/// override both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClassificationSuggestionDto {
    pub suggested_category: TicketCategory,
    pub suggested_priority: TicketPriority,
}

/// Aggregate statistics for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketStatsDto {
    pub total_tickets: i64,
    pub open_tickets: i64,
    /// Mean of per-day ticket counts over days with at least one ticket,
    /// rounded to one decimal place
    pub avg_tickets_per_day: f64,
    /// Priority value -> ticket count; zero-count priorities are omitted
    pub priority_breakdown: BTreeMap<String, i64>,
    /// Category value -> ticket count; zero-count categories are omitted
    pub category_breakdown: BTreeMap<String, i64>,
}
