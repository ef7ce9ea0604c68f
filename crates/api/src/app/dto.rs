use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use planora_budgets::{Budget, BudgetStatus};
use planora_comments::{Comment, CommentThread};
use planora_core::EventId;
use planora_events::{Event, EventStatus};
use planora_infra::document_store::{Page, Pagination};
use planora_inventory::{InventoryItem, Reservation};
use planora_tasks::{Task, TaskPriority, TaskStatus};
use planora_users::User;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------
//
// Create/update bodies reuse the domain draft/update structs directly; the
// types below cover everything else.

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BudgetListQuery {
    #[serde(default)]
    pub search: String,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub client_id: Option<String>,
}

impl BudgetListQuery {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
    /// Honored for states without a pinned progress value.
    pub progress: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskPriorityRequest {
    pub priority: TaskPriority,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetStatusRequest {
    pub status: BudgetStatus,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub event_id: EventId,
    /// `YYYY-MM-DD` or an RFC3339 timestamp; normalized to the calendar day.
    pub date: String,
    pub quantity: u32,
}

/// Normalize a reservation date to calendar-day granularity.
pub fn parse_reservation_date(raw: &str) -> Result<NaiveDate, axum::response::Response> {
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    Err(errors::json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        format!("date '{raw}' is neither YYYY-MM-DD nor RFC3339"),
    ))
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &User) -> Value {
    json!({
        "id": user.id.to_string(),
        "user_name": user.user_name,
        "email": user.email,
        "role": user.role,
        "address": user.address,
        "contact_number": user.contact_number,
        "profile_image": user.profile_image,
        "is_active": user.is_active,
        "created_at": user.created_at.to_rfc3339(),
        "updated_at": user.updated_at.to_rfc3339(),
    })
}

pub fn event_to_json(event: &Event, progress: u8) -> Value {
    json!({
        "id": event.id.to_string(),
        "name": event.name,
        "event_type": event.event_type,
        "description": event.description,
        "image": event.image,
        "start_date": event.start_date.to_rfc3339(),
        "end_date": event.end_date.to_rfc3339(),
        "proposed_location": event.proposed_location,
        "client_id": event.client_id.to_string(),
        "assignees": {
            "manager": event.assignees.manager.map(|m| m.to_string()),
            "team_members": event.assignees.team_members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
        },
        "tasks": event.tasks.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        "status": event.status,
        "progress": progress,
        "created_by": event.created_by.to_string(),
        "created_at": event.created_at.to_rfc3339(),
        "updated_at": event.updated_at.to_rfc3339(),
    })
}

pub fn task_to_json(task: &Task) -> Value {
    json!({
        "id": task.id.to_string(),
        "event_id": task.event_id.to_string(),
        "name": task.name,
        "description": task.description,
        "start_date": task.start_date.to_rfc3339(),
        "end_date": task.end_date.to_rfc3339(),
        "status": task.status,
        "priority": task.priority,
        "budget": task.budget,
        "assignee_id": task.assignee_id.map(|a| a.to_string()),
        "sub_tasks": task.sub_tasks.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        "comments": task.comments.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        "progress": task.progress,
        "created_by": task.created_by.to_string(),
        "created_at": task.created_at.to_rfc3339(),
        "updated_at": task.updated_at.to_rfc3339(),
    })
}

pub fn comment_to_json(comment: &Comment, user_name: Option<String>) -> Value {
    json!({
        "id": comment.id.to_string(),
        "task_id": comment.task_id.to_string(),
        "user_id": comment.user_id.to_string(),
        "user_name": user_name,
        "content": comment.content,
        "is_change_request": comment.is_change_request,
        "attachments": comment.attachments,
        "parent_comment_id": comment.parent_comment_id.map(|p| p.to_string()),
        "created_at": comment.created_at.to_rfc3339(),
    })
}

pub fn thread_to_json(thread: &CommentThread, mut user_name: impl FnMut(&Comment) -> Option<String>) -> Value {
    let mut root = comment_to_json(&thread.comment, user_name(&thread.comment));
    root["replies"] = Value::Array(
        thread
            .replies
            .iter()
            .map(|reply| comment_to_json(reply, user_name(reply)))
            .collect(),
    );
    root
}

pub struct BudgetNames {
    pub event_name: Option<String>,
    pub client_name: Option<String>,
    pub created_by_name: Option<String>,
}

pub fn budget_to_json(budget: &Budget, names: BudgetNames) -> Value {
    json!({
        "id": budget.id.to_string(),
        "event_id": budget.event_id.to_string(),
        "event_name": names.event_name,
        "client_id": budget.client_id.to_string(),
        "client_name": names.client_name,
        "status": budget.status,
        "expenses": budget.expenses.iter().map(|line| json!({
            "name": line.name,
            "amount": line.amount,
        })).collect::<Vec<_>>(),
        "total_amount": budget.total_amount,
        "discount": budget.discount,
        "remarks": budget.remarks,
        "created_by": budget.created_by.to_string(),
        "created_by_name": names.created_by_name,
        "created_at": budget.created_at.to_rfc3339(),
        "updated_at": budget.updated_at.to_rfc3339(),
    })
}

pub fn reservation_to_json(reservation: &Reservation) -> Value {
    json!({
        "id": reservation.id.to_string(),
        "event_id": reservation.event_id.to_string(),
        "date": reservation.date.to_string(),
        "quantity": reservation.quantity,
        "created_at": reservation.created_at.to_rfc3339(),
    })
}

pub fn item_to_json(item: &InventoryItem) -> Value {
    json!({
        "id": item.id.to_string(),
        "name": item.name,
        "description": item.description,
        "category": item.category,
        "condition": item.condition,
        "variations": item.variations,
        "images": item.images,
        "is_external": item.is_external,
        "price": item.price,
        "total_quantity": item.total_quantity,
        "reservations": item.reservations.iter().map(reservation_to_json).collect::<Vec<_>>(),
        "created_by": item.created_by.to_string(),
        "created_at": item.created_at.to_rfc3339(),
        "updated_at": item.updated_at.to_rfc3339(),
    })
}

pub fn pagination_json<T>(page: &Page<T>) -> Value {
    json!({
        "total": page.total,
        "page": page.page,
        "limit": page.limit,
        "total_pages": page.total_pages,
    })
}
