use std::sync::Arc;

use planora_budgets::Budget;
use planora_comments::Comment;
use planora_core::{EventId, UserId};
use planora_events::Event;
use planora_infra::document_store::{Collection, InMemoryCollection, StoreError, Versioned};
use planora_infra::reservations::ReservationService;
use planora_inventory::InventoryItem;
use planora_tasks::Task;
use planora_users::User;

/// Storage wiring for the API: one collection per document type plus the
/// reservation write path, which holds the only handle that mutates
/// reservation lists.
pub struct AppServices {
    pub users: Arc<InMemoryCollection<User>>,
    pub events: Arc<InMemoryCollection<Event>>,
    pub tasks: Arc<InMemoryCollection<Task>>,
    pub comments: Arc<InMemoryCollection<Comment>>,
    pub budgets: Arc<InMemoryCollection<Budget>>,
    pub items: Arc<InMemoryCollection<InventoryItem>>,
    pub reservations: ReservationService<Arc<InMemoryCollection<InventoryItem>>>,
}

impl AppServices {
    pub fn build(allow_reservation_cancel: bool) -> Self {
        let items: Arc<InMemoryCollection<InventoryItem>> = Arc::new(InMemoryCollection::new());
        let reservations =
            ReservationService::new(items.clone()).with_cancellation(allow_reservation_cancel);

        Self {
            users: Arc::new(InMemoryCollection::new()),
            events: Arc::new(InMemoryCollection::new()),
            tasks: Arc::new(InMemoryCollection::new()),
            comments: Arc::new(InMemoryCollection::new()),
            budgets: Arc::new(InMemoryCollection::new()),
            items,
            reservations,
        }
    }

    /// Populate helper: display name of a user, if it still exists.
    pub fn user_name(&self, id: &UserId) -> Option<String> {
        self.users
            .get(id)
            .ok()
            .flatten()
            .map(|v| v.doc.user_name)
    }

    /// Populate helper: name of an event, if it still exists.
    pub fn event_name(&self, id: &EventId) -> Option<String> {
        self.events.get(id).ok().flatten().map(|v| v.doc.name)
    }

    /// All tasks belonging to one event, in creation order.
    pub fn tasks_for_event(&self, event_id: &EventId) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .list()?
            .into_iter()
            .map(|v| v.doc)
            .filter(|t| t.event_id == *event_id)
            .collect();
        tasks.sort_by(|a, b| a.id.as_uuid().cmp(b.id.as_uuid()));
        Ok(tasks)
    }

    /// True when another user already holds the user_name or email.
    pub fn user_identity_taken(
        &self,
        user_name: &str,
        email: &str,
        excluding: Option<UserId>,
    ) -> Result<bool, StoreError> {
        Ok(self.users.list()?.into_iter().any(|v| {
            excluding != Some(v.doc.id)
                && (v.doc.user_name.eq_ignore_ascii_case(user_name)
                    || v.doc.email.eq_ignore_ascii_case(email))
        }))
    }
}

/// Sort a listing by id (UUIDv7, so this is creation order) to keep
/// pagination stable across requests.
pub fn sorted_by_id<T, F>(mut items: Vec<Versioned<T>>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> uuid::Uuid,
{
    items.sort_by_key(|v| id_of(&v.doc));
    items.into_iter().map(|v| v.doc).collect()
}
