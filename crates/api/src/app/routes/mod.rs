use axum::{routing::get, Router};

pub mod budgets;
pub mod comments;
pub mod common;
pub mod events;
pub mod inventory;
pub mod system;
pub mod tasks;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/events", events::router())
        .nest("/tasks", tasks::router())
        .nest("/comments", comments::router())
        .nest("/budgets", budgets::router())
        .nest("/inventory", inventory::router())
}
