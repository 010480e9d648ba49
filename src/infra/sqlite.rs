use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::domain::stats::TicketAggregates;
use crate::domain::ticket::{
    Category, NewTicket, Priority, Status, Ticket, TicketFilter, TicketPatch,
};
use crate::error::{AppError, AppResult};
use crate::services::TicketStore;

const CREATE_TICKETS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS tickets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL,
    description TEXT    NOT NULL,
    category    TEXT    NOT NULL,
    priority    TEXT    NOT NULL,
    status      TEXT    NOT NULL DEFAULT 'open',
    created_at  TEXT    NOT NULL
)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets (created_at)";

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, category, priority, status, created_at FROM tickets";

pub struct SqliteTicketStore {
    pool: SqlitePool,
}

impl SqliteTicketStore {
    /// Opens (creating if needed) the database at `url` and ensures the schema exists.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` is a separate database, so keep exactly one alive.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(CREATE_TICKETS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_CREATED_AT_INDEX)
            .execute(&self.pool)
            .await?;
        tracing::debug!("tickets schema ready");
        Ok(())
    }

    async fn fetch(&self, id: i64) -> AppResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Ticket::try_from).transpose()
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn create(&self, ticket: NewTicket) -> AppResult<Ticket> {
        let status = ticket.status.unwrap_or_default();
        let created_at = Utc::now().trunc_subsecs(6);

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tickets (title, description, category, priority, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.category.as_str())
        .bind(ticket.priority.as_str())
        .bind(status.as_str())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Ticket {
            id,
            title: ticket.title,
            description: ticket.description,
            category: ticket.category,
            priority: ticket.priority,
            status,
            created_at,
        })
    }

    async fn get(&self, id: i64) -> AppResult<Option<Ticket>> {
        self.fetch(id).await
    }

    async fn list(&self, filter: &TicketFilter) -> AppResult<Vec<Ticket>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        query.push(" WHERE 1 = 1");

        if let Some(category) = filter.category() {
            query.push(" AND category = ").push_bind(category.to_string());
        }
        if let Some(priority) = filter.priority() {
            query.push(" AND priority = ").push_bind(priority.to_string());
        }
        if let Some(status) = filter.status() {
            query.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(search) = filter.search() {
            // LIKE folds ASCII case only; other characters match as written.
            let pattern = format!("%{}%", escape_like(search));
            query
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR description LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query
            .build_query_as::<TicketRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn update(&self, id: i64, patch: TicketPatch) -> AppResult<Option<Ticket>> {
        // One statement, so a concurrent delete yields no row instead of a stale ticket.
        let row = sqlx::query_as::<_, TicketRow>(
            "UPDATE tickets
             SET title = COALESCE(?, title),
                 description = COALESCE(?, description),
                 category = COALESCE(?, category),
                 priority = COALESCE(?, priority),
                 status = COALESCE(?, status)
             WHERE id = ?
             RETURNING id, title, description, category, priority, status, created_at",
        )
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.category.map(|c| c.as_str()))
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn aggregates(&self) -> AppResult<TicketAggregates> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets")
            .fetch_one(&self.pool)
            .await?;
        let open: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE status = ?")
            .bind(Status::Open.as_str())
            .fetch_one(&self.pool)
            .await?;
        let oldest_created_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM tickets ORDER BY created_at ASC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        let by_priority: Vec<(String, i64)> =
            sqlx::query_as("SELECT priority, COUNT(*) FROM tickets GROUP BY priority")
                .fetch_all(&self.pool)
                .await?;
        let by_category: Vec<(String, i64)> =
            sqlx::query_as("SELECT category, COUNT(*) FROM tickets GROUP BY category")
                .fetch_all(&self.pool)
                .await?;

        Ok(TicketAggregates {
            total,
            open,
            oldest_created_at,
            by_priority: by_priority
                .into_iter()
                .map(|(value, count)| {
                    parse_column("priority", &value, Priority::parse).map(|p| (p, count))
                })
                .collect::<AppResult<_>>()?,
            by_category: by_category
                .into_iter()
                .map(|(value, count)| {
                    parse_column("category", &value, Category::parse).map(|c| (c, count))
                })
                .collect::<AppResult<_>>()?,
        })
    }
}

#[derive(FromRow)]
struct TicketRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    priority: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = AppError;

    fn try_from(row: TicketRow) -> AppResult<Self> {
        Ok(Ticket {
            id: row.id,
            title: row.title,
            description: row.description,
            category: parse_column("category", &row.category, Category::parse)?,
            priority: parse_column("priority", &row.priority, Priority::parse)?,
            status: parse_column("status", &row.status, Status::parse)?,
            created_at: row.created_at,
        })
    }
}

fn parse_column<T>(column: &str, value: &str, parse: fn(&str) -> Option<T>) -> AppResult<T> {
    parse(value).ok_or_else(|| {
        AppError::Database(sqlx::Error::Decode(
            format!("unexpected {column} value in tickets table: {value:?}").into(),
        ))
    })
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteTicketStore {
        SqliteTicketStore::connect("sqlite::memory:").await.unwrap()
    }

    fn new_ticket(title: &str, description: &str, category: Category, priority: Priority) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            description: description.to_string(),
            category,
            priority,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_status_to_open() {
        let store = store().await;
        let ticket = store
            .create(new_ticket("Refund", "Charged twice", Category::Billing, Priority::High))
            .await
            .unwrap();

        assert_eq!(ticket.status, Status::Open);
        let stored = store.get(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Refund");
        assert_eq!(stored.description, "Charged twice");
        assert_eq!(stored.category, Category::Billing);
        assert_eq!(stored.priority, Priority::High);
    }

    #[tokio::test]
    async fn list_filters_compose_and_order_newest_first() {
        let store = store().await;
        store
            .create(new_ticket("Invoice missing", "No PDF", Category::Billing, Priority::Low))
            .await
            .unwrap();
        store
            .create(new_ticket("App crash", "Crashes on start", Category::Technical, Priority::High))
            .await
            .unwrap();
        let newest = store
            .create(new_ticket("Refund", "Double invoice charge", Category::Billing, Priority::High))
            .await
            .unwrap();

        let billing = store
            .list(&TicketFilter {
                category: Some("billing".to_string()),
                ..TicketFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(billing.len(), 2);
        assert_eq!(billing[0].id, newest.id);
        assert!(billing.iter().all(|t| t.category == Category::Billing));

        let billing_high = store
            .list(&TicketFilter {
                category: Some("billing".to_string()),
                priority: Some("high".to_string()),
                ..TicketFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(billing_high.len(), 1);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_title_and_description() {
        let store = store().await;
        store
            .create(new_ticket("VPN down", "Cannot connect", Category::Technical, Priority::Critical))
            .await
            .unwrap();
        store
            .create(new_ticket("Password", "Reset my vpn token", Category::Account, Priority::Low))
            .await
            .unwrap();
        store
            .create(new_ticket("Other", "Unrelated", Category::General, Priority::Low))
            .await
            .unwrap();

        let found = store
            .list(&TicketFilter {
                search: Some("Vpn".to_string()),
                ..TicketFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn search_matches_non_ascii_text() {
        let store = store().await;
        store
            .create(new_ticket("Échec de paiement", "Carte refusée", Category::Billing, Priority::High))
            .await
            .unwrap();
        store
            .create(new_ticket("Other", "Unrelated", Category::General, Priority::Low))
            .await
            .unwrap();

        for term in ["Échec", "refusée", "ÉCHEC DE paiement"] {
            let found = store
                .list(&TicketFilter {
                    search: Some(term.to_string()),
                    ..TicketFilter::default()
                })
                .await
                .unwrap();
            assert_eq!(found.len(), 1, "search for {term:?}");
        }
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let store = store().await;
        store
            .create(new_ticket("Discount", "Got 100% off", Category::Billing, Priority::Low))
            .await
            .unwrap();
        store
            .create(new_ticket("Other", "Nothing here", Category::General, Priority::Low))
            .await
            .unwrap();

        let found = store
            .list(&TicketFilter {
                search: Some("%".to_string()),
                ..TicketFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let store = store().await;
        let ticket = store
            .create(new_ticket("Login", "Locked out", Category::Account, Priority::Medium))
            .await
            .unwrap();

        let updated = store
            .update(
                ticket.id,
                TicketPatch {
                    status: Some(Status::Resolved),
                    ..TicketPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, Status::Resolved);
        assert_eq!(updated.title, "Login");
        assert_eq!(updated.created_at, ticket.created_at);

        assert!(store.update(9999, TicketPatch::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_deleted_ticket_returns_none() {
        let store = store().await;
        let ticket = store
            .create(new_ticket("Gone", "Soon deleted", Category::General, Priority::Low))
            .await
            .unwrap();
        store.delete(ticket.id).await.unwrap();

        let patch = TicketPatch {
            title: Some("Renamed".to_string()),
            ..TicketPatch::default()
        };
        assert!(store.update(ticket.id, patch).await.unwrap().is_none());
        assert_eq!(store.aggregates().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let store = store().await;
        let ticket = store
            .create(new_ticket("Spam", "Ignore", Category::General, Priority::Low))
            .await
            .unwrap();

        assert!(store.delete(ticket.id).await.unwrap());
        assert!(!store.delete(ticket.id).await.unwrap());
        assert!(store.get(ticket.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn aggregates_count_by_column() {
        let store = store().await;
        assert_eq!(store.aggregates().await.unwrap().total, 0);

        store
            .create(new_ticket("A", "a", Category::Billing, Priority::High))
            .await
            .unwrap();
        let closed = store
            .create(new_ticket("B", "b", Category::Billing, Priority::Low))
            .await
            .unwrap();
        store
            .update(
                closed.id,
                TicketPatch {
                    status: Some(Status::Closed),
                    ..TicketPatch::default()
                },
            )
            .await
            .unwrap();

        let aggregates = store.aggregates().await.unwrap();
        assert_eq!(aggregates.total, 2);
        assert_eq!(aggregates.open, 1);
        assert!(aggregates.oldest_created_at.is_some());
        assert_eq!(aggregates.by_category, vec![(Category::Billing, 2)]);
        assert_eq!(aggregates.by_priority.len(), 2);
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
