use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;

use planora_auth::Permission;
use planora_comments::{build_threads, Comment, CommentDraft};
use planora_core::{CommentId, ExpectedVersion, TaskId};
use planora_infra::document_store::Collection;

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_comment))
        .route("/:id/replies", post(add_reply))
        .route("/task/:task_id", get(comments_by_task))
        .route("/:id", delete(delete_comment))
}

pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<CommentDraft>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("comments.create")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let draft = cmd_auth.inner;

    let task = match services.tasks.get(&draft.task_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let now = Utc::now();
    let comment = match Comment::create(CommentId::new(), draft, principal.user_id(), now) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let stored = match services.comments.insert(comment) {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    // Top-level comments are tracked on their task; replies are not.
    let mut task_doc = task.doc;
    task_doc.attach_comment(stored.doc.id, now);
    if let Err(e) = services.tasks.put(task_doc, ExpectedVersion::Any) {
        tracing::warn!(comment_id = %stored.doc.id, "failed to attach comment to task: {e}");
    }

    let user_name = services.user_name(&stored.doc.user_id);
    (
        StatusCode::CREATED,
        Json(dto::comment_to_json(&stored.doc, user_name)),
    )
        .into_response()
}

pub async fn add_reply(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReplyRequest>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("comments.create")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let parent_id: CommentId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid comment id")
        }
    };

    let parent = match services.comments.get(&parent_id) {
        Ok(Some(v)) => v,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "parent comment not found")
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let reply = match parent.doc.reply(
        CommentId::new(),
        cmd_auth.inner.content,
        principal.user_id(),
        Utc::now(),
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.comments.insert(reply) {
        Ok(stored) => {
            let user_name = services.user_name(&stored.doc.user_id);
            (
                StatusCode::CREATED,
                Json(dto::comment_to_json(&stored.doc, user_name)),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn comments_by_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(task_id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("comments.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let task_id: TaskId = match task_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    let comments: Vec<Comment> = match services.comments.list() {
        Ok(list) => list
            .into_iter()
            .map(|v| v.doc)
            .filter(|c| c.task_id == task_id)
            .collect(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let threads = build_threads(&comments);
    let items: Vec<serde_json::Value> = threads
        .iter()
        .map(|thread| dto::thread_to_json(thread, |c| services.user_name(&c.user_id)))
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("comments.delete")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let comment_id: CommentId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid comment id")
        }
    };

    // Replies stay behind as separate documents; only the addressed comment
    // is removed.
    let removed = match services.comments.remove(&comment_id) {
        Ok(Some(c)) => c,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "comment not found")
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if !removed.is_reply() {
        if let Ok(Some(task)) = services.tasks.get(&removed.task_id) {
            let mut task_doc = task.doc;
            task_doc.detach_comment(comment_id, Utc::now());
            if let Err(e) = services.tasks.put(task_doc, ExpectedVersion::Any) {
                tracing::warn!(comment_id = %comment_id, "failed to detach comment from task: {e}");
            }
        }
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "id": comment_id.to_string(), "deleted": true })),
    )
        .into_response()
}
