use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planora_core::{DomainError, DomainResult, Entity, EventId, TaskId, UserId};

/// Lifecycle status of an event.
///
/// Assigned directly by callers with the right permission; there is no
/// transition table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventStatus {
    #[default]
    Draft,
    PendingApproval,
    Approved,
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 6] = [
        EventStatus::Draft,
        EventStatus::PendingApproval,
        EventStatus::Approved,
        EventStatus::InProgress,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];
}

/// Staff assigned to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignees {
    pub manager: Option<UserId>,
    #[serde(default)]
    pub team_members: Vec<UserId>,
}

/// Event document.
///
/// `tasks` is maintained by the task write path (append on create, pull on
/// delete); everything referencing users is a weak reference with no cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub event_type: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub proposed_location: Option<String>,
    pub client_id: UserId,
    pub assignees: Assignees,
    pub tasks: Vec<TaskId>,
    pub status: EventStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub event_type: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub proposed_location: Option<String>,
    pub client_id: UserId,
    #[serde(default)]
    pub assignees: Assignees,
    #[serde(default)]
    pub status: EventStatus,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub proposed_location: Option<String>,
    pub client_id: Option<UserId>,
    pub assignees: Option<Assignees>,
    pub status: Option<EventStatus>,
}

impl Event {
    pub fn create(
        id: EventId,
        draft: EventDraft,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("event name cannot be empty"));
        }
        if draft.event_type.trim().is_empty() {
            return Err(DomainError::validation("event type cannot be empty"));
        }
        validate_date_range(draft.start_date, draft.end_date)?;

        Ok(Self {
            id,
            name: draft.name,
            event_type: draft.event_type,
            description: draft.description,
            image: draft.image,
            start_date: draft.start_date,
            end_date: draft.end_date,
            proposed_location: draft.proposed_location,
            client_id: draft.client_id,
            assignees: draft.assignees,
            tasks: Vec::new(),
            status: draft.status,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: EventUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("event name cannot be empty"));
            }
        }
        if let Some(event_type) = &update.event_type {
            if event_type.trim().is_empty() {
                return Err(DomainError::validation("event type cannot be empty"));
            }
        }
        let start = update.start_date.unwrap_or(self.start_date);
        let end = update.end_date.unwrap_or(self.end_date);
        validate_date_range(start, end)?;

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(event_type) = update.event_type {
            self.event_type = event_type;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(image) = update.image {
            self.image = Some(image);
        }
        self.start_date = start;
        self.end_date = end;
        if let Some(proposed_location) = update.proposed_location {
            self.proposed_location = Some(proposed_location);
        }
        if let Some(client_id) = update.client_id {
            self.client_id = client_id;
        }
        if let Some(assignees) = update.assignees {
            self.assignees = assignees;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn set_status(&mut self, status: EventStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Record a task as belonging to this event (id list only).
    pub fn attach_task(&mut self, task_id: TaskId, now: DateTime<Utc>) {
        if !self.tasks.contains(&task_id) {
            self.tasks.push(task_id);
            self.updated_at = now;
        }
    }

    pub fn detach_task(&mut self, task_id: TaskId, now: DateTime<Utc>) {
        if self.tasks.contains(&task_id) {
            self.tasks.retain(|t| *t != task_id);
            self.updated_at = now;
        }
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<()> {
    if end < start {
        return Err(DomainError::validation("end_date cannot precede start_date"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
    }

    fn draft() -> EventDraft {
        EventDraft {
            name: "Spring gala".to_string(),
            event_type: "Gala".to_string(),
            description: None,
            image: None,
            start_date: Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 5, 12, 23, 0, 0).unwrap(),
            proposed_location: Some("Harbour hall".to_string()),
            client_id: UserId::new(),
            assignees: Assignees::default(),
            status: EventStatus::Draft,
        }
    }

    #[test]
    fn create_rejects_inverted_date_range() {
        let mut d = draft();
        d.end_date = d.start_date - chrono::Duration::days(1);
        let err = Event::create(EventId::new(), d, UserId::new(), test_time()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn update_validates_combined_date_range() {
        let mut event = Event::create(EventId::new(), draft(), UserId::new(), test_time()).unwrap();

        // Moving only the start past the existing end must fail.
        let update = EventUpdate {
            start_date: Some(Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap()),
            ..EventUpdate::default()
        };
        assert!(event.apply_update(update, test_time()).is_err());

        // Moving both together succeeds.
        let update = EventUpdate {
            start_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap()),
            ..EventUpdate::default()
        };
        assert!(event.apply_update(update, test_time()).is_ok());
    }

    #[test]
    fn attach_task_is_idempotent() {
        let mut event = Event::create(EventId::new(), draft(), UserId::new(), test_time()).unwrap();
        let task_id = TaskId::new();

        event.attach_task(task_id, test_time());
        event.attach_task(task_id, test_time());
        assert_eq!(event.tasks, vec![task_id]);

        event.detach_task(task_id, test_time());
        assert!(event.tasks.is_empty());
    }

    #[test]
    fn status_is_assigned_directly() {
        let mut event = Event::create(EventId::new(), draft(), UserId::new(), test_time()).unwrap();
        event.set_status(EventStatus::Completed, test_time());
        assert_eq!(event.status, EventStatus::Completed);

        // No transition table: any status can follow any other.
        event.set_status(EventStatus::Draft, test_time());
        assert_eq!(event.status, EventStatus::Draft);
    }
}
