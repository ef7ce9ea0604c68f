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
use planora_budgets::{Budget, BudgetDraft, BudgetUpdate};
use planora_core::{BudgetId, ExpectedVersion, UserId};
use planora_infra::document_store::{paginate, Collection, TextSearch};

use crate::app::routes::common::CmdAuth;
use crate::app::services::{sorted_by_id, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_budget).get(list_budgets))
        .route("/:id", get(get_budget).put(update_budget).delete(delete_budget))
        .route("/:id/status", put(update_status))
}

fn names_for(services: &AppServices, budget: &Budget) -> dto::BudgetNames {
    dto::BudgetNames {
        event_name: services.event_name(&budget.event_id),
        client_name: services.user_name(&budget.client_id),
        created_by_name: services.user_name(&budget.created_by),
    }
}

pub async fn create_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<BudgetDraft>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("budgets.create")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let budget = match Budget::create(
        BudgetId::new(),
        cmd_auth.inner,
        principal.user_id(),
        Utc::now(),
    ) {
        Ok(b) => b,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.budgets.insert(budget) {
        Ok(stored) => {
            let names = names_for(&services, &stored.doc);
            (
                StatusCode::CREATED,
                Json(dto::budget_to_json(&stored.doc, names)),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_budgets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(query): Query<dto::BudgetListQuery>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("budgets.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let search = match TextSearch::new(&query.search) {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    let client_filter: Option<UserId> = match &query.client_id {
        Some(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id")
            }
        },
        None => None,
    };

    let budgets = match services.budgets.list() {
        Ok(list) => sorted_by_id(list, |b: &Budget| *b.id.as_uuid()),
        Err(e) => return errors::store_error_to_response(e),
    };

    // Search covers expense names and remarks.
    let filtered: Vec<Budget> = budgets
        .into_iter()
        .filter(|b| client_filter.is_none_or(|c| b.client_id == c))
        .filter(|b| {
            search.matches(&b.remarks)
                || b.expenses.iter().any(|line| search.matches(&line.name))
        })
        .collect();

    let page = paginate(filtered, query.pagination());
    let items: Vec<serde_json::Value> = page
        .items
        .iter()
        .map(|b| dto::budget_to_json(b, names_for(&services, b)))
        .collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "items": items,
            "pagination": dto::pagination_json(&page),
        })),
    )
        .into_response()
}

pub async fn get_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("budgets.read")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let budget_id: BudgetId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid budget id")
        }
    };

    match services.budgets.get(&budget_id) {
        Ok(Some(stored)) => {
            let names = names_for(&services, &stored.doc);
            (StatusCode::OK, Json(dto::budget_to_json(&stored.doc, names))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "budget not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<BudgetUpdate>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("budgets.update")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let budget_id: BudgetId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid budget id")
        }
    };

    let stored = match services.budgets.get(&budget_id) {
        Ok(Some(v)) => v,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "budget not found")
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut budget = stored.doc;
    if let Err(e) = budget.apply_update(cmd_auth.inner, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.budgets.put(budget, ExpectedVersion::Any) {
        Ok(updated) => {
            let names = names_for(&services, &updated.doc);
            (StatusCode::OK, Json(dto::budget_to_json(&updated.doc, names))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateBudgetStatusRequest>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: body,
        required: vec![Permission::new("budgets.approve")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let budget_id: BudgetId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid budget id")
        }
    };

    let stored = match services.budgets.get(&budget_id) {
        Ok(Some(v)) => v,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "budget not found")
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let body = cmd_auth.inner;
    let mut budget = stored.doc;
    if let Err(e) = budget.set_status(body.status, body.remarks, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.budgets.put(budget, ExpectedVersion::Any) {
        Ok(updated) => {
            let names = names_for(&services, &updated.doc);
            (StatusCode::OK, Json(dto::budget_to_json(&updated.doc, names))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let cmd_auth = CmdAuth {
        inner: (),
        required: vec![Permission::new("budgets.delete")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let budget_id: BudgetId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid budget id")
        }
    };

    match services.budgets.remove(&budget_id) {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": budget_id.to_string(), "deleted": true })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "budget not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
