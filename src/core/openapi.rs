use utoipa::{Modify, OpenApi};

use crate::features::tickets::{
    dtos as tickets_dtos, handlers as tickets_handlers, models as tickets_models,
};
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        tickets_handlers::create_ticket,
        tickets_handlers::list_tickets,
        tickets_handlers::update_ticket,
        tickets_handlers::classify_ticket,
        tickets_handlers::get_stats,
    ),
    components(schemas(
        tickets_dtos::CreateTicketDto,
        tickets_dtos::UpdateTicketDto,
        tickets_dtos::TicketResponseDto,
        tickets_dtos::ClassifyRequestDto,
        tickets_dtos::ClassificationSuggestionDto,
        tickets_dtos::TicketStatsDto,
        tickets_models::TicketCategory,
        tickets_models::TicketPriority,
        tickets_models::TicketStatus,
        ErrorResponse,
    )),
    tags(
        (name = "tickets", description = "Support ticket intake, triage and statistics")
    )
)]
pub struct ApiDoc;

/// Overrides the generated OpenAPI info block with configured values
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
