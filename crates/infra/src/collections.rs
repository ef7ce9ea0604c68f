//! `Document` bindings for every persisted domain type.
//!
//! One named collection per type, mirroring how the records are grouped in
//! the backing database.

use planora_budgets::Budget;
use planora_comments::Comment;
use planora_events::Event;
use planora_inventory::InventoryItem;
use planora_tasks::Task;
use planora_users::User;

use crate::document_store::Document;

impl Document for User {
    const COLLECTION: &'static str = "users";
}

impl Document for Event {
    const COLLECTION: &'static str = "events";
}

impl Document for Task {
    const COLLECTION: &'static str = "tasks";
}

impl Document for Comment {
    const COLLECTION: &'static str = "comments";
}

impl Document for Budget {
    const COLLECTION: &'static str = "budgets";
}

impl Document for InventoryItem {
    const COLLECTION: &'static str = "inventory_items";
}
