use async_trait::async_trait;

use crate::domain::stats::TicketAggregates;
use crate::domain::ticket::{NewTicket, Ticket, TicketFilter, TicketPatch};
use crate::error::AppResult;

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> AppResult<Ticket>;
    async fn get(&self, id: i64) -> AppResult<Option<Ticket>>;
    /// Matching tickets, newest first.
    async fn list(&self, filter: &TicketFilter) -> AppResult<Vec<Ticket>>;
    async fn update(&self, id: i64, patch: TicketPatch) -> AppResult<Option<Ticket>>;
    /// Returns `false` when no ticket had that id.
    async fn delete(&self, id: i64) -> AppResult<bool>;
    async fn aggregates(&self) -> AppResult<TicketAggregates>;
}
