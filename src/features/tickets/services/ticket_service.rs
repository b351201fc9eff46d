use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::dtos::{
    CreateTicketDto, TicketFilterQuery, TicketResponseDto, TicketStatsDto, UpdateTicketDto,
};
use crate::features::tickets::models::{Ticket, TicketStatus};
use crate::shared::validation::validate_payload;

const TICKET_COLUMNS: &str =
    "id, title, description, contact_email, category, priority, status, created_at, updated_at";

/// Escape LIKE metacharacters so a search term matches literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Field a breakdown can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Priority,
    Category,
}

impl GroupField {
    fn column(self) -> &'static str {
        match self {
            GroupField::Priority => "priority",
            GroupField::Category => "category",
        }
    }
}

/// Service for ticket persistence and aggregation
pub struct TicketService {
    pool: SqlitePool,
}

impl TicketService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Validate and persist a new ticket. The identifier and timestamps are
    /// assigned here; `status` defaults to `open` when omitted.
    pub async fn create(&self, dto: CreateTicketDto) -> Result<TicketResponseDto> {
        validate_payload(&dto)?;

        let now = Utc::now();
        let status = dto.status.unwrap_or_default();

        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            INSERT INTO tickets (id, title, description, contact_email, category, priority, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(&dto.contact_email)
        .bind(dto.category)
        .bind(dto.priority)
        .bind(status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create ticket: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Ticket created: id={}, category={}, priority={}",
            ticket.id,
            ticket.category,
            ticket.priority
        );

        Ok(ticket.into())
    }

    /// Find tickets matching the filter, newest first. An empty filter
    /// returns everything.
    pub async fn find(&self, filter: &TicketFilterQuery) -> Result<Vec<TicketResponseDto>> {
        let tickets = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets
            WHERE ($1 IS NULL OR category = $1)
              AND ($2 IS NULL OR priority = $2)
              AND ($3 IS NULL OR status = $3)
              AND ($4 IS NULL
                   OR title LIKE '%' || $4 || '%' ESCAPE '\'
                   OR description LIKE '%' || $4 || '%' ESCAPE '\')
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.category)
        .bind(filter.priority)
        .bind(filter.status)
        .bind(
            filter
                .search
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(escape_like),
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list tickets: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(tickets.into_iter().map(Into::into).collect())
    }

    /// Apply a partial update as a single atomic statement. `created_at`
    /// and `id` are immutable.
    pub async fn update_by_id(&self, id: Uuid, patch: UpdateTicketDto) -> Result<TicketResponseDto> {
        validate_payload(&patch)?;

        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            UPDATE tickets SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                contact_email = COALESCE($3, contact_email),
                category = COALESCE($4, category),
                priority = COALESCE($5, priority),
                status = COALESCE($6, status),
                updated_at = $7
            WHERE id = $8
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.contact_email)
        .bind(patch.category)
        .bind(patch.priority)
        .bind(patch.status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update ticket: {:?}", e);
            AppError::Database(e)
        })?;

        ticket
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", id)))
    }

    pub async fn count_all(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count tickets: {:?}", e);
                AppError::Database(e)
            })
    }

    pub async fn count_by_status(&self, status: TicketStatus) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count tickets by status: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Count tickets per observed value of the given field. Values with no
    /// tickets never appear.
    pub async fn group_count(&self, field: GroupField) -> Result<BTreeMap<String, i64>> {
        let column = field.column();
        let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
            "SELECT {column}, COUNT(*) FROM tickets GROUP BY {column}"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to group tickets by {}: {:?}", column, e);
            AppError::Database(e)
        })?;

        Ok(rows.into_iter().collect())
    }

    /// Mean of per-day ticket counts across days with at least one ticket.
    /// Days are UTC calendar dates; the stored timestamp's first ten
    /// characters are exactly that date. Returns 0 for an empty store.
    pub async fn average_per_day(&self) -> Result<f64> {
        sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(AVG(daily.n), 0.0)
            FROM (
                SELECT COUNT(*) AS n
                FROM tickets
                GROUP BY substr(created_at, 1, 10)
            ) AS daily
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute daily average: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Assemble dashboard statistics. Each aggregate is computed
    /// independently; the first failure aborts the whole response.
    pub async fn get_stats(&self) -> Result<TicketStatsDto> {
        let total_tickets = self.count_all().await?;
        let open_tickets = self.count_by_status(TicketStatus::Open).await?;
        let avg = self.average_per_day().await?;
        let priority_breakdown = self.group_count(GroupField::Priority).await?;
        let category_breakdown = self.group_count(GroupField::Category).await?;

        Ok(TicketStatsDto {
            total_tickets,
            open_tickets,
            avg_tickets_per_day: (avg * 10.0).round() / 10.0,
            priority_breakdown,
            category_breakdown,
        })
    }
}
