use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use planora_core::{DomainError, DomainResult, Entity, EventId, ItemId, ReservationId, UserId};

/// Physical condition of an inventory item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    New,
    Used,
    Refurbished,
}

/// A claim on some quantity of an item for a single calendar date, tied to an
/// event. Reservations are embedded in their item and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    /// Weak reference: relation + lookup only. Deleting the event does not
    /// cascade here.
    pub event_id: EventId,
    /// Calendar-day granularity; request timestamps are normalized before
    /// they reach this type.
    pub date: NaiveDate,
    /// Reserved quantity, at least 1.
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// Inventory item document.
///
/// `reservations` is insertion-ordered (creation order) and is only ever
/// grown through [`InventoryItem::admit`](crate::ledger) plus the storage
/// layer's serialized append; generic field updates leave it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: Condition,
    pub variations: String,
    pub images: Vec<String>,
    pub is_external: bool,
    /// Price in minor currency units.
    pub price: u64,
    /// Physical count owned. Per calendar date, reservations never sum past
    /// this.
    pub total_quantity: u32,
    pub reservations: Vec<Reservation>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: Condition,
    pub variations: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_is_external")]
    pub is_external: bool,
    pub price: u64,
    pub total_quantity: u32,
}

fn default_is_external() -> bool {
    true
}

/// Partial update; `None` leaves the field unchanged. Reservations cannot be
/// edited through this path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition: Option<Condition>,
    pub variations: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_external: Option<bool>,
    pub price: Option<u64>,
    pub total_quantity: Option<u32>,
}

impl InventoryItem {
    /// Create a new item from a validated draft.
    pub fn create(
        id: ItemId,
        draft: ItemDraft,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if draft.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }

        Ok(Self {
            id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            condition: draft.condition,
            variations: draft.variations,
            images: draft.images,
            is_external: draft.is_external,
            price: draft.price,
            total_quantity: draft.total_quantity,
            reservations: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a metadata update.
    ///
    /// Lowering `total_quantity` below the busiest date's reserved sum would
    /// break the capacity invariant for already-admitted reservations, so it
    /// is rejected.
    pub fn apply_update(&mut self, update: ItemUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("item name cannot be empty"));
            }
        }
        if let Some(category) = &update.category {
            if category.trim().is_empty() {
                return Err(DomainError::validation("category cannot be empty"));
            }
        }
        if let Some(total) = update.total_quantity {
            let peak = self.peak_reserved();
            if total < peak {
                return Err(DomainError::invariant(format!(
                    "total_quantity {total} is below the peak reserved quantity {peak}"
                )));
            }
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(condition) = update.condition {
            self.condition = condition;
        }
        if let Some(variations) = update.variations {
            self.variations = variations;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(is_external) = update.is_external {
            self.is_external = is_external;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(total) = update.total_quantity {
            self.total_quantity = total;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Largest per-date reserved sum across all dates with reservations.
    fn peak_reserved(&self) -> u32 {
        let mut dates: Vec<NaiveDate> = self.reservations.iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
            .into_iter()
            .map(|d| self.reserved_on(d))
            .max()
            .unwrap_or(0)
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
