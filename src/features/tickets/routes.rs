use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::tickets::handlers;
use crate::features::tickets::services::{ClassificationService, TicketService};

/// Shared state for the tickets feature
#[derive(Clone)]
pub struct TicketsState {
    pub tickets: Arc<TicketService>,
    pub classifier: Arc<ClassificationService>,
}

/// Create routes for the tickets feature
pub fn routes(tickets: Arc<TicketService>, classifier: Arc<ClassificationService>) -> Router {
    let state = TicketsState {
        tickets,
        classifier,
    };

    Router::new()
        .route(
            "/tickets",
            post(handlers::create_ticket).get(handlers::list_tickets),
        )
        .route("/tickets/stats", get(handlers::get_stats))
        .route("/tickets/classify", post(handlers::classify_ticket))
        .route("/tickets/{id}", patch(handlers::update_ticket))
        .with_state(state)
}
