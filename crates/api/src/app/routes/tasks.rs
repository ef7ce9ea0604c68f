use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use planora_auth::Permission;
use planora_core::{EventId, ExpectedVersion, TaskId};
use planora_infra::document_store::Collection;
use planora_tasks::{Task, TaskDraft, TaskUpdate};

use crate::app::routes::common::CmdAuth;
use crate::app::services::{sorted_by_id, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_task).get(list_tasks))
        .route("/event/:event_id", get(tasks_by_event))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/:id/status", put(update_status))
        .route("/:id/priority", put(update_priority))
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<TaskDraft>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("tasks.create")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let draft = cmd_auth.inner;

    // The parent event must exist before the task is persisted.
    let event = match services.events.get(&draft.event_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "event not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let now = Utc::now();
    let task = match Task::create(TaskId::new(), draft, principal.user_id(), now) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let stored = match services.tasks.insert(task) {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    // Record membership on the event (last-writer-wins; membership is a plain
    // id list, not invariant-bearing state).
    let mut event_doc = event.doc;
    event_doc.attach_task(stored.doc.id, now);
    if let Err(e) = services.events.put(event_doc, ExpectedVersion::Any) {
        tracing::warn!(task_id = %stored.doc.id, "failed to attach task to event: {e}");
    }

    (StatusCode::CREATED, Json(dto::task_to_json(&stored.doc))).into_response()
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("tasks.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let tasks = match services.tasks.list() {
        Ok(list) => sorted_by_id(list, |t: &Task| *t.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    let items: Vec<serde_json::Value> = tasks.iter().map(dto::task_to_json).collect();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn tasks_by_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(event_id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("tasks.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let event_id: EventId = match event_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid event id")
        }
    };

    let tasks = match services.tasks_for_event(&event_id) {
        Ok(t) => t,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items: Vec<serde_json::Value> = tasks.iter().map(dto::task_to_json).collect();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("tasks.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let task_id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    match services.tasks.get(&task_id) {
        Ok(Some(stored)) => (StatusCode::OK, Json(dto::task_to_json(&stored.doc))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<TaskUpdate>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("tasks.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let task_id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    let stored = match services.tasks.get(&task_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut task = stored.doc;
    if let Err(e) = task.apply_update(cmd_auth.inner, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.tasks.put(task, ExpectedVersion::Any) {
        Ok(updated) => (StatusCode::OK, Json(dto::task_to_json(&updated.doc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateTaskStatusRequest>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("tasks.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let task_id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    let stored = match services.tasks.get(&task_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let body = cmd_auth.inner;
    let mut task = stored.doc;
    task.set_status(body.status, body.progress, Utc::now());

    match services.tasks.put(task, ExpectedVersion::Any) {
        Ok(updated) => (StatusCode::OK, Json(dto::task_to_json(&updated.doc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_priority(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateTaskPriorityRequest>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("tasks.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let task_id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    let stored = match services.tasks.get(&task_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut task = stored.doc;
    task.set_priority(cmd_auth.inner.priority, Utc::now());

    match services.tasks.put(task, ExpectedVersion::Any) {
        Ok(updated) => (StatusCode::OK, Json(dto::task_to_json(&updated.doc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("tasks.delete")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let task_id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    let removed = match services.tasks.remove(&task_id) {
        Ok(Some(task)) => task,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    // Pull the id from the parent event's membership list.
    if let Ok(Some(event)) = services.events.get(&removed.event_id) {
        let mut event_doc = event.doc;
        event_doc.detach_task(task_id, Utc::now());
        if let Err(e) = services.events.put(event_doc, ExpectedVersion::Any) {
            tracing::warn!(task_id = %task_id, "failed to detach task from event: {e}");
        }
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "id": task_id.to_string(), "deleted": true })),
    )
        .into_response()
}
