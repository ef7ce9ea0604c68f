use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use planora_auth::Permission;
use planora_core::{ExpectedVersion, ItemId, ReservationId};
use planora_infra::document_store::{paginate, Collection, TextSearch};
use planora_inventory::{InventoryItem, ItemDraft, ItemUpdate};

use crate::app::routes::common::CmdAuth;
use crate::app::services::{sorted_by_id, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/items/:id/availability", get(availability))
        .route("/items/:id/reservations", post(reserve))
        .route(
            "/items/:id/reservations/:reservation_id",
            axum::routing::delete(cancel_reservation),
        )
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<ItemDraft>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("inventory.items.create")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item = match InventoryItem::create(
        ItemId::new(),
        cmd_auth.inner,
        principal.user_id(),
        Utc::now(),
    ) {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.items.insert(item) {
        Ok(stored) => (StatusCode::CREATED, Json(dto::item_to_json(&stored.doc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("inventory.items.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let search = match TextSearch::new(&query.search) {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items = match services.items.list() {
        Ok(list) => sorted_by_id(list, |i: &InventoryItem| *i.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    // Name and description are the searchable fields.
    let filtered: Vec<InventoryItem> = items
        .into_iter()
        .filter(|i| search.matches_any([Some(i.name.as_str()), i.description.as_deref()]))
        .collect();

    let page = paginate(filtered, query.pagination());
    let mapped: Vec<serde_json::Value> = page.items.iter().map(dto::item_to_json).collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "items": mapped,
            "pagination": dto::pagination_json(&page),
        })),
    )
        .into_response()
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("inventory.items.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    match services.items.get(&item_id) {
        Ok(Some(stored)) => (StatusCode::OK, Json(dto::item_to_json(&stored.doc))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "inventory item not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ItemUpdate>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("inventory.items.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    let stored = match services.items.get(&item_id) {
        Ok(Some(v)) => v,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "inventory item not found")
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    // Metadata updates go through a compare-and-swap so they can never
    // clobber a reservation admitted between our read and write.
    let version = stored.version;
    let mut item = stored.doc;
    if let Err(e) = item.apply_update(cmd_auth.inner, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.items.put(item, ExpectedVersion::Exact(version)) {
        Ok(updated) => (StatusCode::OK, Json(dto::item_to_json(&updated.doc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("inventory.items.delete")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    match services.items.remove(&item_id) {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": item_id.to_string(), "deleted": true })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "inventory item not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn availability(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::AvailabilityQuery>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("inventory.items.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    let date = match dto::parse_reservation_date(&query.date) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match services.reservations.check_availability(&item_id, date) {
        Ok(available) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "item_id": item_id.to_string(),
                "date": date.to_string(),
                "available": available,
            })),
        )
            .into_response(),
        Err(e) => errors::reservation_error_to_response(e),
    }
}

pub async fn reserve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReserveRequest>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("inventory.items.reserve")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    let body = cmd_auth.inner;
    let date = match dto::parse_reservation_date(&body.date) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match services
        .reservations
        .reserve(&item_id, body.event_id, date, body.quantity, Utc::now())
    {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::reservation_error_to_response(e),
    }
}

pub async fn cancel_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path((id, reservation_id)): Path<(String, String)>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("inventory.items.cancel")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };
    let reservation_id: ReservationId = match reservation_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid reservation id",
            )
        }
    };

    match services
        .reservations
        .cancel(&item_id, &reservation_id, Utc::now())
    {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::reservation_error_to_response(e),
    }
}
