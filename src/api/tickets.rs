use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::context::AppContext;
use crate::domain::classification::Classification;
use crate::domain::stats::TicketStats;
use crate::domain::ticket::{NewTicket, Ticket, TicketFilter, TicketPatch};
use crate::error::{AppError, AppResult};
use crate::workflow::ticket as workflow;

pub async fn list(
    State(ctx): State<AppContext>,
    Query(filter): Query<TicketFilter>,
) -> AppResult<Json<Vec<Ticket>>> {
    Ok(Json(workflow::list_tickets(&ctx, &filter).await?))
}

pub async fn create(
    State(ctx): State<AppContext>,
    payload: Result<Json<NewTicket>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Ticket>)> {
    let Json(ticket) = payload.map_err(invalid_body)?;
    let ticket = workflow::create_ticket(&ctx, ticket).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn retrieve(
    State(ctx): State<AppContext>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Ticket>> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;
    Ok(Json(workflow::get_ticket(&ctx, id).await?))
}

/// PUT: every writable field except `status` must be present.
pub async fn replace(
    State(ctx): State<AppContext>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewTicket>, JsonRejection>,
) -> AppResult<Json<Ticket>> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;
    let Json(ticket) = payload.map_err(invalid_body)?;
    Ok(Json(workflow::update_ticket(&ctx, id, ticket.into()).await?))
}

pub async fn patch(
    State(ctx): State<AppContext>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TicketPatch>, JsonRejection>,
) -> AppResult<Json<Ticket>> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;
    let Json(patch) = payload.map_err(invalid_body)?;
    Ok(Json(workflow::update_ticket(&ctx, id, patch).await?))
}

pub async fn destroy(
    State(ctx): State<AppContext>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;
    workflow::delete_ticket(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(State(ctx): State<AppContext>) -> AppResult<Json<TicketStats>> {
    Ok(Json(workflow::ticket_stats(&ctx).await?))
}

pub async fn classify(
    State(ctx): State<AppContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Classification>> {
    let Json(body) = payload.map_err(invalid_body)?;
    let description = match body.get("description") {
        None | Some(Value::Null) => {
            return Err(AppError::validation("description", "This field is required."));
        }
        Some(Value::String(text)) if text.trim().is_empty() => {
            return Err(AppError::validation(
                "description",
                "This field may not be blank.",
            ));
        }
        Some(Value::String(text)) => text,
        Some(_) => return Err(AppError::validation("description", "Not a valid string.")),
    };

    Ok(Json(workflow::classify_ticket(&ctx, description).await))
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    let text = rejection.body_text();
    match missing_field(&text) {
        Some(field) => AppError::validation(field, "This field is required."),
        None => AppError::validation("non_field_errors", text),
    }
}

/// Field name from serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.split("missing field `").nth(1)?;
    rest.split('`').next().filter(|field| !field.is_empty())
}
