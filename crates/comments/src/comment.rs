use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planora_core::{CommentId, DomainError, DomainResult, Entity, TaskId, UserId};

/// Comment document.
///
/// `parent_comment_id` is `None` for top-level comments; replies point at
/// their parent and inherit its task. Threads are one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub content: String,
    pub is_change_request: bool,
    pub attachments: Vec<String>,
    pub parent_comment_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when posting a top-level comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    pub task_id: TaskId,
    pub content: String,
    #[serde(default)]
    pub is_change_request: bool,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// A top-level comment with its replies, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn create(
        id: CommentId,
        draft: CommentDraft,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_content(&draft.content)?;

        Ok(Self {
            id,
            task_id: draft.task_id,
            user_id,
            content: draft.content,
            is_change_request: draft.is_change_request,
            attachments: draft.attachments,
            parent_comment_id: None,
            created_at: now,
        })
    }

    /// Create a reply to this comment.
    ///
    /// The reply inherits the parent's task. Replying to a reply is rejected:
    /// threads stay one level deep.
    pub fn reply(
        &self,
        id: CommentId,
        content: String,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Comment> {
        if self.parent_comment_id.is_some() {
            return Err(DomainError::invariant(
                "cannot reply to a reply; threads are one level deep",
            ));
        }
        validate_content(&content)?;

        Ok(Comment {
            id,
            task_id: self.task_id,
            user_id,
            content,
            is_change_request: false,
            attachments: Vec::new(),
            parent_comment_id: Some(self.id),
            created_at: now,
        })
    }

    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_content(content: &str) -> DomainResult<()> {
    if content.trim().is_empty() {
        return Err(DomainError::validation("comment content cannot be empty"));
    }
    Ok(())
}

/// Assemble display threads for one task: top-level comments newest first,
/// each carrying its replies in creation order.
pub fn build_threads(comments: &[Comment]) -> Vec<CommentThread> {
    let mut top_level: Vec<&Comment> = comments.iter().filter(|c| !c.is_reply()).collect();
    top_level.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    top_level
        .into_iter()
        .map(|parent| {
            let mut replies: Vec<Comment> = comments
                .iter()
                .filter(|c| c.parent_comment_id == Some(parent.id))
                .cloned()
                .collect();
            replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            CommentThread {
                comment: parent.clone(),
                replies,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap()
    }

    fn comment_at(task_id: TaskId, minute: u32) -> Comment {
        Comment::create(
            CommentId::new(),
            CommentDraft {
                task_id,
                content: format!("note at {minute}"),
                is_change_request: false,
                attachments: vec![],
            },
            UserId::new(),
            at(minute),
        )
        .unwrap()
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = Comment::create(
            CommentId::new(),
            CommentDraft {
                task_id: TaskId::new(),
                content: "  \n".to_string(),
                is_change_request: false,
                attachments: vec![],
            },
            UserId::new(),
            at(0),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn reply_inherits_parent_task() {
        let task_id = TaskId::new();
        let parent = comment_at(task_id, 0);
        let reply = parent
            .reply(CommentId::new(), "agreed".to_string(), UserId::new(), at(1))
            .unwrap();

        assert_eq!(reply.task_id, task_id);
        assert_eq!(reply.parent_comment_id, Some(parent.id));
    }

    #[test]
    fn replying_to_a_reply_is_rejected() {
        let parent = comment_at(TaskId::new(), 0);
        let reply = parent
            .reply(CommentId::new(), "agreed".to_string(), UserId::new(), at(1))
            .unwrap();

        let err = reply
            .reply(CommentId::new(), "nested".to_string(), UserId::new(), at(2))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn threads_are_newest_first_with_ordered_replies() {
        let task_id = TaskId::new();
        let older = comment_at(task_id, 0);
        let newer = comment_at(task_id, 10);
        let reply_b = older
            .reply(CommentId::new(), "second".to_string(), UserId::new(), at(5))
            .unwrap();
        let reply_a = older
            .reply(CommentId::new(), "first".to_string(), UserId::new(), at(2))
            .unwrap();

        let all = vec![older.clone(), newer.clone(), reply_b.clone(), reply_a.clone()];
        let threads = build_threads(&all);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, newer.id);
        assert!(threads[0].replies.is_empty());
        assert_eq!(threads[1].comment.id, older.id);
        assert_eq!(
            threads[1].replies.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![reply_a.id, reply_b.id]
        );
    }
}
