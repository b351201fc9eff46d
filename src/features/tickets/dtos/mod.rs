pub mod ticket_dto;

pub use ticket_dto::{
    ClassificationSuggestionDto, ClassifyRequestDto, CreateTicketDto, TicketFilterQuery,
    TicketResponseDto, TicketStatsDto, UpdateTicketDto,
};
