use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planora_core::{BudgetId, DomainError, DomainResult, Entity, EventId, UserId};

/// Client approval status of a budget.
///
/// The single source of truth for approval state; no parallel boolean flag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BudgetStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// One expense line in a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub name: String,
    /// Amount in minor currency units.
    pub amount: u64,
}

/// Budget document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub event_id: EventId,
    pub client_id: UserId,
    pub status: BudgetStatus,
    pub expenses: Vec<ExpenseLine>,
    /// Total in minor currency units.
    pub total_amount: u64,
    pub discount: u64,
    pub remarks: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDraft {
    pub event_id: EventId,
    pub client_id: UserId,
    #[serde(default)]
    pub expenses: Vec<ExpenseLine>,
    pub total_amount: u64,
    #[serde(default)]
    pub discount: u64,
    #[serde(default)]
    pub remarks: String,
}

/// Partial update; `None` leaves the field unchanged. Approval status has a
/// dedicated operation with its own rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub expenses: Option<Vec<ExpenseLine>>,
    pub total_amount: Option<u64>,
    pub discount: Option<u64>,
    pub remarks: Option<String>,
}

impl Budget {
    pub fn create(
        id: BudgetId,
        draft: BudgetDraft,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_expenses(&draft.expenses)?;

        Ok(Self {
            id,
            event_id: draft.event_id,
            client_id: draft.client_id,
            status: BudgetStatus::Pending,
            expenses: draft.expenses,
            total_amount: draft.total_amount,
            discount: draft.discount,
            remarks: draft.remarks,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: BudgetUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(expenses) = &update.expenses {
            validate_expenses(expenses)?;
        }

        if let Some(expenses) = update.expenses {
            self.expenses = expenses;
        }
        if let Some(total_amount) = update.total_amount {
            self.total_amount = total_amount;
        }
        if let Some(discount) = update.discount {
            self.discount = discount;
        }
        if let Some(remarks) = update.remarks {
            self.remarks = remarks;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Move the budget to a new approval status.
    ///
    /// Approval and rejection both require remarks so the client's decision
    /// is always accompanied by a rationale; resetting to `Pending` clears
    /// them.
    pub fn set_status(
        &mut self,
        status: BudgetStatus,
        remarks: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        match status {
            BudgetStatus::Pending => {
                self.status = BudgetStatus::Pending;
                self.remarks = String::new();
            }
            BudgetStatus::Approved | BudgetStatus::Rejected => {
                let remarks = remarks.unwrap_or_default();
                if remarks.trim().is_empty() {
                    return Err(DomainError::validation(
                        "remarks are required when approving or rejecting a budget",
                    ));
                }
                self.status = status;
                self.remarks = remarks;
            }
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Budget {
    type Id = BudgetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_expenses(expenses: &[ExpenseLine]) -> DomainResult<()> {
    for (idx, line) in expenses.iter().enumerate() {
        if line.name.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "expense line {idx} has an empty name"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 11, 0, 0).unwrap()
    }

    fn draft() -> BudgetDraft {
        BudgetDraft {
            event_id: EventId::new(),
            client_id: UserId::new(),
            expenses: vec![
                ExpenseLine {
                    name: "Catering".to_string(),
                    amount: 120_000,
                },
                ExpenseLine {
                    name: "Sound".to_string(),
                    amount: 40_000,
                },
            ],
            total_amount: 160_000,
            discount: 0,
            remarks: String::new(),
        }
    }

    #[test]
    fn new_budget_starts_pending() {
        let budget = Budget::create(BudgetId::new(), draft(), UserId::new(), test_time()).unwrap();
        assert_eq!(budget.status, BudgetStatus::Pending);
    }

    #[test]
    fn approval_requires_remarks() {
        let mut budget =
            Budget::create(BudgetId::new(), draft(), UserId::new(), test_time()).unwrap();

        let err = budget
            .set_status(BudgetStatus::Approved, None, test_time())
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }

        let err = budget
            .set_status(BudgetStatus::Rejected, Some("  ".to_string()), test_time())
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }

        budget
            .set_status(
                BudgetStatus::Approved,
                Some("Within range".to_string()),
                test_time(),
            )
            .unwrap();
        assert_eq!(budget.status, BudgetStatus::Approved);
        assert_eq!(budget.remarks, "Within range");
    }

    #[test]
    fn reset_to_pending_clears_remarks() {
        let mut budget =
            Budget::create(BudgetId::new(), draft(), UserId::new(), test_time()).unwrap();
        budget
            .set_status(
                BudgetStatus::Rejected,
                Some("Too expensive".to_string()),
                test_time(),
            )
            .unwrap();

        budget
            .set_status(BudgetStatus::Pending, None, test_time())
            .unwrap();
        assert_eq!(budget.status, BudgetStatus::Pending);
        assert!(budget.remarks.is_empty());
    }

    #[test]
    fn empty_expense_name_is_rejected() {
        let mut d = draft();
        d.expenses.push(ExpenseLine {
            name: " ".to_string(),
            amount: 10,
        });
        assert!(Budget::create(BudgetId::new(), d, UserId::new(), test_time()).is_err());
    }
}
