//! Serialized write path for inventory reservations.
//!
//! `check_availability` and the reservation append are two steps against the
//! same item record. Run bare, two concurrent calls can both observe the same
//! snapshot, both pass the capacity check, and both append — over-booking the
//! date. This service closes that gap: every admission re-reads the item and
//! writes back with an exact-version compare-and-swap, retrying a bounded
//! number of times when a concurrent writer wins the race. Capacity is scoped
//! per item, so no cross-item coordination exists.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use planora_core::{EventId, ExpectedVersion, ItemId, ReservationId};
use planora_inventory::{AdmissionError, InventoryItem};

use crate::document_store::{Collection, StoreError};

/// Attempt budget for the read-check-append sequence. Each failed attempt
/// implies another writer succeeded, so with N concurrent single admissions a
/// caller needs at most N attempts.
const MAX_ADMISSION_ATTEMPTS: u32 = 4;

/// Why a reservation operation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// The inventory item does not exist.
    #[error("inventory item not found")]
    NotFound,

    /// The admission check rejected the request (validation or capacity).
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// Concurrent writers kept winning the compare-and-swap; the caller may
    /// retry the whole call.
    #[error("reservation contention on item {0}, retries exhausted")]
    Contention(ItemId),

    /// Cancellation is not enabled on this deployment.
    #[error("reservation cancellation is disabled")]
    CancellationDisabled,

    /// The addressed reservation does not exist on the item.
    #[error("reservation not found")]
    ReservationNotFound,

    /// Underlying storage failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ReservationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => ReservationError::NotFound,
            other => ReservationError::Store(other),
        }
    }
}

/// The reservation ledger's write side.
///
/// Owns all mutation of an item's reservation list; nothing else in the
/// system touches it.
pub struct ReservationService<C> {
    items: C,
    allow_cancellation: bool,
}

impl<C> ReservationService<C>
where
    C: Collection<InventoryItem>,
{
    pub fn new(items: C) -> Self {
        Self {
            items,
            allow_cancellation: false,
        }
    }

    /// Enable the cancellation operation (off by default: reservations are
    /// append-only history unless an operator opts in).
    pub fn with_cancellation(mut self, allow: bool) -> Self {
        self.allow_cancellation = allow;
        self
    }

    pub fn cancellation_enabled(&self) -> bool {
        self.allow_cancellation
    }

    /// Remaining capacity for the date, clamped to zero.
    ///
    /// Read-only; repeated calls with no intervening write return the same
    /// value.
    pub fn check_availability(
        &self,
        item_id: &ItemId,
        date: NaiveDate,
    ) -> Result<u32, ReservationError> {
        let stored = self.items.get(item_id)?.ok_or(ReservationError::NotFound)?;
        Ok(stored.doc.available_on(date))
    }

    /// Admit and persist a reservation.
    ///
    /// Returns the updated item on success so callers can serialize it
    /// straight back to the client.
    pub fn reserve(
        &self,
        item_id: &ItemId,
        event_id: EventId,
        date: NaiveDate,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, ReservationError> {
        for attempt in 1..=MAX_ADMISSION_ATTEMPTS {
            let stored = self.items.get(item_id)?.ok_or(ReservationError::NotFound)?;
            let mut item = stored.doc;

            let reservation = item.admit(event_id, date, quantity, now)?;
            item.reservations.push(reservation);
            item.updated_at = now;

            match self.items.put(item, ExpectedVersion::Exact(stored.version)) {
                Ok(updated) => {
                    tracing::debug!(
                        item_id = %item_id,
                        %date,
                        quantity,
                        attempt,
                        "reservation admitted"
                    );
                    return Ok(updated.doc);
                }
                Err(StoreError::Concurrency(_)) => {
                    tracing::debug!(
                        item_id = %item_id,
                        attempt,
                        "reservation lost compare-and-swap, retrying"
                    );
                    continue;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ReservationError::Contention(*item_id))
    }

    /// Remove a reservation, when cancellation is enabled.
    pub fn cancel(
        &self,
        item_id: &ItemId,
        reservation_id: &ReservationId,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, ReservationError> {
        if !self.allow_cancellation {
            return Err(ReservationError::CancellationDisabled);
        }

        for _attempt in 1..=MAX_ADMISSION_ATTEMPTS {
            let stored = self.items.get(item_id)?.ok_or(ReservationError::NotFound)?;
            let mut item = stored.doc;

            let before = item.reservations.len();
            item.reservations.retain(|r| r.id != *reservation_id);
            if item.reservations.len() == before {
                return Err(ReservationError::ReservationNotFound);
            }
            item.updated_at = now;

            match self.items.put(item, ExpectedVersion::Exact(stored.version)) {
                Ok(updated) => return Ok(updated.doc),
                Err(StoreError::Concurrency(_)) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(ReservationError::Contention(*item_id))
    }
}
