use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use planora_auth::Permission;
use planora_core::{EventId, ExpectedVersion};
use planora_events::{monthly_counts, monthly_view, status_counts, Event, EventDraft, EventUpdate};
use planora_infra::document_store::Collection;
use planora_tasks::event_progress;

use crate::app::routes::common::CmdAuth;
use crate::app::services::{sorted_by_id, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_event).get(list_events))
        .route("/monthly", get(monthly))
        .route("/counts/status", get(counts_by_status))
        .route("/counts/monthly", get(counts_by_month))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
        .route("/:id/status", put(update_status))
}

fn progress_for(services: &AppServices, event: &Event) -> u8 {
    services
        .tasks_for_event(&event.id)
        .map(|tasks| event_progress(&tasks))
        .unwrap_or(0)
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<EventDraft>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("events.create")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let event = match Event::create(
        EventId::new(),
        cmd_auth.inner,
        principal.user_id(),
        Utc::now(),
    ) {
        Ok(e) => e,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.events.insert(event) {
        Ok(stored) => (
            StatusCode::CREATED,
            Json(dto::event_to_json(&stored.doc, 0)),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("events.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let events = match services.events.list() {
        Ok(list) => sorted_by_id(list, |e: &Event| *e.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    let items: Vec<serde_json::Value> = events
        .iter()
        .map(|e| dto::event_to_json(e, progress_for(&services, e)))
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn monthly(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(query): Query<dto::MonthQuery>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("events.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let events = match services.events.list() {
        Ok(list) => sorted_by_id(list, |e: &Event| *e.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    let days = match monthly_view(&events, query.year, query.month) {
        Ok(days) => days,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let days: Vec<serde_json::Value> = days
        .iter()
        .map(|day| {
            serde_json::json!({
                "date": day.date.to_string(),
                "events": day.events.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "year": query.year,
            "month": query.month,
            "days": days,
        })),
    )
        .into_response()
}

pub async fn counts_by_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("events.counts")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let events = match services.events.list() {
        Ok(list) => sorted_by_id(list, |e: &Event| *e.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    let counts: Vec<serde_json::Value> = status_counts(&events)
        .into_iter()
        .map(|(status, count)| {
            serde_json::json!({
                "status": status,
                "count": count,
            })
        })
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "counts": counts }))).into_response()
}

pub async fn counts_by_month(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(query): Query<dto::YearQuery>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("events.counts")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let events = match services.events.list() {
        Ok(list) => sorted_by_id(list, |e: &Event| *e.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    let buckets = monthly_counts(&events, query.year);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "year": query.year,
            "counts": buckets,
        })),
    )
        .into_response()
}

pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("events.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let event_id: EventId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid event id")
        }
    };

    match services.events.get(&event_id) {
        Ok(Some(stored)) => {
            let progress = progress_for(&services, &stored.doc);
            (StatusCode::OK, Json(dto::event_to_json(&stored.doc, progress))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "event not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<EventUpdate>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("events.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let event_id: EventId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid event id")
        }
    };

    let stored = match services.events.get(&event_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "event not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut event = stored.doc;
    if let Err(e) = event.apply_update(cmd_auth.inner, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.events.put(event, ExpectedVersion::Any) {
        Ok(updated) => {
            let progress = progress_for(&services, &updated.doc);
            (StatusCode::OK, Json(dto::event_to_json(&updated.doc, progress))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateEventStatusRequest>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("events.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let event_id: EventId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid event id")
        }
    };

    let stored = match services.events.get(&event_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "event not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut event = stored.doc;
    event.set_status(cmd_auth.inner.status, Utc::now());

    match services.events.put(event, ExpectedVersion::Any) {
        Ok(updated) => {
            let progress = progress_for(&services, &updated.doc);
            (StatusCode::OK, Json(dto::event_to_json(&updated.doc, progress))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("events.delete")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let event_id: EventId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid event id")
        }
    };

    // Weak references by design: tasks, budgets, and reservations pointing at
    // this event are left in place.
    match services.events.remove(&event_id) {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": event_id.to_string(), "deleted": true })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "event not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
