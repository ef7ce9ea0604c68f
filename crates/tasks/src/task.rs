use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planora_core::{CommentId, DomainError, DomainResult, Entity, EventId, TaskId, UserId};

/// Execution status of a task.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Delayed,
    Cancelled,
}

/// Scheduling priority of a task.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Task document.
///
/// `comments` is maintained by the comment write path; `event_id` is a strong
/// reference (a task cannot exist without its event at creation time), though
/// deleting the event later leaves the task behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub event_id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Budget in minor currency units.
    pub budget: u64,
    pub assignee_id: Option<UserId>,
    pub sub_tasks: Vec<TaskId>,
    pub comments: Vec<CommentId>,
    /// 0..=100; pinned by status for terminal states.
    pub progress: u8,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub event_id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub budget: u64,
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub sub_tasks: Vec<TaskId>,
}

/// Partial update; `None` leaves the field unchanged. Status and priority
/// have dedicated endpoints and are not part of the generic update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<u64>,
    pub assignee_id: Option<UserId>,
    pub sub_tasks: Option<Vec<TaskId>>,
}

impl Task {
    pub fn create(
        id: TaskId,
        draft: TaskDraft,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("task name cannot be empty"));
        }
        if draft.end_date < draft.start_date {
            return Err(DomainError::validation("end_date cannot precede start_date"));
        }

        let status = draft.status;
        Ok(Self {
            id,
            event_id: draft.event_id,
            name: draft.name,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status,
            priority: draft.priority,
            budget: draft.budget,
            assignee_id: draft.assignee_id,
            sub_tasks: draft.sub_tasks,
            comments: Vec::new(),
            progress: progress_for_status(status).unwrap_or(0),
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: TaskUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("task name cannot be empty"));
            }
        }
        let start = update.start_date.unwrap_or(self.start_date);
        let end = update.end_date.unwrap_or(self.end_date);
        if end < start {
            return Err(DomainError::validation("end_date cannot precede start_date"));
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        self.start_date = start;
        self.end_date = end;
        if let Some(budget) = update.budget {
            self.budget = budget;
        }
        if let Some(assignee_id) = update.assignee_id {
            self.assignee_id = Some(assignee_id);
        }
        if let Some(sub_tasks) = update.sub_tasks {
            self.sub_tasks = sub_tasks;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Set the status and re-derive `progress`.
    ///
    /// `reported_progress` is honored only for states without a pinned value
    /// and is clamped to 0..=100.
    pub fn set_status(
        &mut self,
        status: TaskStatus,
        reported_progress: Option<u8>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.progress = match progress_for_status(status) {
            Some(pinned) => pinned,
            None => reported_progress.unwrap_or(self.progress).min(100),
        };
        self.updated_at = now;
    }

    pub fn set_priority(&mut self, priority: TaskPriority, now: DateTime<Utc>) {
        self.priority = priority;
        self.updated_at = now;
    }

    pub fn attach_comment(&mut self, comment_id: CommentId, now: DateTime<Utc>) {
        if !self.comments.contains(&comment_id) {
            self.comments.push(comment_id);
            self.updated_at = now;
        }
    }

    pub fn detach_comment(&mut self, comment_id: CommentId, now: DateTime<Utc>) {
        if self.comments.contains(&comment_id) {
            self.comments.retain(|c| *c != comment_id);
            self.updated_at = now;
        }
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Pinned progress value for terminal/initial states; `None` means
/// caller-reported progress applies.
fn progress_for_status(status: TaskStatus) -> Option<u8> {
    match status {
        TaskStatus::NotStarted => Some(0),
        TaskStatus::Completed => Some(100),
        TaskStatus::Cancelled => Some(0),
        TaskStatus::InProgress | TaskStatus::Delayed => None,
    }
}

/// Percentage of an event's non-cancelled tasks that are completed.
///
/// 0 when the event has no countable tasks.
pub fn event_progress(tasks: &[Task]) -> u8 {
    let countable: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Cancelled)
        .collect();
    if countable.is_empty() {
        return 0;
    }

    let completed = countable
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    ((completed * 100) / countable.len()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 5, 9, 0, 0).unwrap()
    }

    fn draft() -> TaskDraft {
        TaskDraft {
            event_id: EventId::new(),
            name: "Book venue".to_string(),
            description: None,
            start_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 3, 8, 17, 0, 0).unwrap(),
            status: TaskStatus::NotStarted,
            priority: TaskPriority::Medium,
            budget: 50_000,
            assignee_id: Some(UserId::new()),
            sub_tasks: vec![],
        }
    }

    fn task_with_status(status: TaskStatus) -> Task {
        let mut task = Task::create(TaskId::new(), draft(), UserId::new(), test_time()).unwrap();
        task.set_status(status, None, test_time());
        task
    }

    #[test]
    fn completed_pins_progress_to_100() {
        let mut task = Task::create(TaskId::new(), draft(), UserId::new(), test_time()).unwrap();
        task.set_status(TaskStatus::Completed, Some(40), test_time());
        assert_eq!(task.progress, 100);

        task.set_status(TaskStatus::Cancelled, None, test_time());
        assert_eq!(task.progress, 0);
    }

    #[test]
    fn in_progress_honors_reported_progress_clamped() {
        let mut task = Task::create(TaskId::new(), draft(), UserId::new(), test_time()).unwrap();
        task.set_status(TaskStatus::InProgress, Some(60), test_time());
        assert_eq!(task.progress, 60);

        task.set_status(TaskStatus::InProgress, Some(130), test_time());
        assert_eq!(task.progress, 100);

        // Without a report, the previous value is kept.
        task.set_status(TaskStatus::Delayed, None, test_time());
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn event_progress_ignores_cancelled_tasks() {
        let tasks = vec![
            task_with_status(TaskStatus::Completed),
            task_with_status(TaskStatus::InProgress),
            task_with_status(TaskStatus::Cancelled),
        ];
        // 1 completed out of 2 countable.
        assert_eq!(event_progress(&tasks), 50);
    }

    #[test]
    fn event_progress_is_zero_without_countable_tasks() {
        assert_eq!(event_progress(&[]), 0);
        let tasks = vec![task_with_status(TaskStatus::Cancelled)];
        assert_eq!(event_progress(&tasks), 0);
    }

    #[test]
    fn create_rejects_inverted_date_range() {
        let mut d = draft();
        d.end_date = d.start_date - chrono::Duration::hours(1);
        assert!(Task::create(TaskId::new(), d, UserId::new(), test_time()).is_err());
    }

    #[test]
    fn comment_membership_round_trip() {
        let mut task = Task::create(TaskId::new(), draft(), UserId::new(), test_time()).unwrap();
        let comment_id = CommentId::new();

        task.attach_comment(comment_id, test_time());
        task.attach_comment(comment_id, test_time());
        assert_eq!(task.comments, vec![comment_id]);

        task.detach_comment(comment_id, test_time());
        assert!(task.comments.is_empty());
    }
}
