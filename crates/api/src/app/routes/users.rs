use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use planora_auth::Permission;
use planora_core::{ExpectedVersion, UserId};
use planora_infra::document_store::{paginate, Collection, TextSearch};
use planora_users::{User, UserDraft, UserUpdate};

use crate::app::routes::common::CmdAuth;
use crate::app::services::{sorted_by_id, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<UserDraft>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("users.create")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let draft = cmd_auth.inner;
    match services.user_identity_taken(&draft.user_name, &draft.email, None) {
        Ok(true) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "conflict",
                "user_name or email already in use",
            )
        }
        Ok(false) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    let user = match User::create(UserId::new(), draft, Utc::now()) {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.users.insert(user) {
        Ok(stored) => (StatusCode::CREATED, Json(dto::user_to_json(&stored.doc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("users.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let search = match TextSearch::new(&query.search) {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    let users = match services.users.list() {
        Ok(list) => sorted_by_id(list, |u: &User| *u.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    let filtered: Vec<User> = users
        .into_iter()
        .filter(|u| search.matches(&u.user_name))
        .collect();

    let page = paginate(filtered, query.pagination());
    let items: Vec<serde_json::Value> = page.items.iter().map(dto::user_to_json).collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "items": items,
            "pagination": dto::pagination_json(&page),
        })),
    )
        .into_response()
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("users.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let user_id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };

    match services.users.get(&user_id) {
        Ok(Some(stored)) => (StatusCode::OK, Json(dto::user_to_json(&stored.doc))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UserUpdate>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("users.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let user_id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };

    let stored = match services.users.get(&user_id) {
        Ok(Some(v)) => v,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let update = cmd_auth.inner;
    let user_name = update
        .user_name
        .clone()
        .unwrap_or_else(|| stored.doc.user_name.clone());
    let email = update
        .email
        .clone()
        .unwrap_or_else(|| stored.doc.email.clone());
    match services.user_identity_taken(&user_name, &email, Some(user_id)) {
        Ok(true) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "conflict",
                "user_name or email already in use",
            )
        }
        Ok(false) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    let mut user = stored.doc;
    if let Err(e) = user.apply_update(update, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.users.put(user, ExpectedVersion::Any) {
        Ok(updated) => (StatusCode::OK, Json(dto::user_to_json(&updated.doc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("users.delete")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let user_id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };

    match services.users.remove(&user_id) {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": user_id.to_string(), "deleted": true })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
