pub mod classification_service;
pub mod ticket_service;

pub use classification_service::{ClassificationOutcome, ClassificationService};
pub use ticket_service::TicketService;
