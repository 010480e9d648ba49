use chrono::Utc;

use crate::context::AppContext;
use crate::domain::classification::Classification;
use crate::domain::stats::TicketStats;
use crate::domain::ticket::{
    NewTicket, Ticket, TicketFilter, TicketPatch, validate_description, validate_title,
};
use crate::error::{AppError, AppResult};
use crate::workflow::classify::classify_description;

pub async fn create_ticket(ctx: &AppContext, ticket: NewTicket) -> AppResult<Ticket> {
    validate_title(&ticket.title).map_err(|msg| AppError::validation("title", msg))?;
    validate_description(&ticket.description)
        .map_err(|msg| AppError::validation("description", msg))?;

    let ticket = ctx.tickets.create(ticket).await?;
    tracing::info!(id = ticket.id, category = ticket.category.as_str(), "ticket created");
    Ok(ticket)
}

pub async fn list_tickets(ctx: &AppContext, filter: &TicketFilter) -> AppResult<Vec<Ticket>> {
    ctx.tickets.list(filter).await
}

pub async fn get_ticket(ctx: &AppContext, id: i64) -> AppResult<Ticket> {
    ctx.tickets.get(id).await?.ok_or(AppError::NotFound)
}

pub async fn update_ticket(ctx: &AppContext, id: i64, patch: TicketPatch) -> AppResult<Ticket> {
    if let Some(title) = &patch.title {
        validate_title(title).map_err(|msg| AppError::validation("title", msg))?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)
            .map_err(|msg| AppError::validation("description", msg))?;
    }

    ctx.tickets.update(id, patch).await?.ok_or(AppError::NotFound)
}

pub async fn delete_ticket(ctx: &AppContext, id: i64) -> AppResult<()> {
    if ctx.tickets.delete(id).await? {
        tracing::info!(id, "ticket deleted");
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

pub async fn ticket_stats(ctx: &AppContext) -> AppResult<TicketStats> {
    let aggregates = ctx.tickets.aggregates().await?;
    Ok(TicketStats::from_aggregates(aggregates, Utc::now()))
}

pub async fn classify_ticket(ctx: &AppContext, description: &str) -> Classification {
    tracing::debug!(
        provider = ctx.config.llm_provider.as_str(),
        enabled = ctx.language_model.is_some(),
        "classifying ticket description"
    );
    classify_description(ctx.language_model.as_deref(), description).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{AppConfig, LlmProvider};
    use crate::domain::ticket::{Category, Priority, Status};
    use crate::infra::sqlite::SqliteTicketStore;

    async fn context() -> AppContext {
        let store = SqliteTicketStore::connect("sqlite::memory:").await.unwrap();
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            llm_api_key: None,
            llm_provider: LlmProvider::OpenAi,
            llm_model: None,
        };
        AppContext::new(config, Arc::new(store), None)
    }

    fn new_ticket(title: &str) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            description: "Something broke".to_string(),
            category: Category::Technical,
            priority: Priority::Medium,
            status: None,
        }
    }

    #[tokio::test]
    async fn rejects_blank_title() {
        let ctx = context().await;
        let err = create_ticket(&ctx, new_ticket("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "title"));
    }

    #[tokio::test]
    async fn missing_ticket_is_not_found() {
        let ctx = context().await;
        assert!(matches!(get_ticket(&ctx, 42).await, Err(AppError::NotFound)));
        assert!(matches!(delete_ticket(&ctx, 42).await, Err(AppError::NotFound)));
        assert!(matches!(
            update_ticket(&ctx, 42, TicketPatch::default()).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn patch_validates_supplied_fields() {
        let ctx = context().await;
        let ticket = create_ticket(&ctx, new_ticket("Crash")).await.unwrap();

        let patch = TicketPatch {
            description: Some(String::new()),
            ..TicketPatch::default()
        };
        assert!(update_ticket(&ctx, ticket.id, patch).await.is_err());

        let patch = TicketPatch {
            status: Some(Status::InProgress),
            ..TicketPatch::default()
        };
        let updated = update_ticket(&ctx, ticket.id, patch).await.unwrap();
        assert_eq!(updated.status, Status::InProgress);
    }

    #[tokio::test]
    async fn stats_reflect_created_ticket() {
        let ctx = context().await;
        let mut ticket = new_ticket("Charge");
        ticket.category = Category::Billing;
        ticket.priority = Priority::High;
        create_ticket(&ctx, ticket).await.unwrap();

        let stats = ticket_stats(&ctx).await.unwrap();
        assert_eq!(stats.total_tickets, 1);
        assert_eq!(stats.open_tickets, 1);
        assert_eq!(stats.avg_tickets_per_day, 1.0);
        assert_eq!(stats.priority_breakdown[&Priority::High], 1);
        assert_eq!(stats.category_breakdown[&Category::Billing], 1);
    }
}
