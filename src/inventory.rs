//! In-memory food item store.
//!
//! Holds the items the matching pipeline reads from and enforces the item
//! lifecycle on every status change. Items are kept ordered by id.

use crate::error::{PantryError, Result};
use crate::types::{FoodItem, FoodItemStatus};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Items expiring within this many days are flagged on the dashboard.
pub const EXPIRING_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    items: BTreeMap<String, FoodItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly logged item. Ids must be unique and non-empty.
    pub fn insert(&mut self, item: FoodItem) -> Result<()> {
        if item.id.trim().is_empty() {
            return Err(PantryError::validation("id", "must not be empty"));
        }
        if !(item.weight_kg.is_finite() && item.weight_kg > 0.0) {
            return Err(PantryError::validation("weightKg", "must be greater than 0"));
        }
        if self.items.contains_key(&item.id) {
            return Err(PantryError::validation(
                "id",
                format!("an item with id '{}' already exists", item.id),
            ));
        }
        tracing::debug!(id = %item.id, status = %item.status, "item logged");
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&FoodItem> {
        self.items
            .get(id)
            .ok_or_else(|| PantryError::NotFound(id.to_string()))
    }

    pub fn list(&self) -> impl Iterator<Item = &FoodItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn by_status(&self, status: FoodItemStatus) -> Vec<&FoodItem> {
        self.items.values().filter(|i| i.status == status).collect()
    }

    /// Items expiring between `today` and `today + days` inclusive that have
    /// not been picked up or written off as expired.
    pub fn expiring_within(&self, days: i64, today: NaiveDate) -> Vec<&FoodItem> {
        self.items
            .values()
            .filter(|item| {
                let remaining = (item.expiration_date - today).num_days();
                (0..=days).contains(&remaining)
                    && !matches!(item.status, FoodItemStatus::PickedUp | FoodItemStatus::Expired)
            })
            .collect()
    }

    /// Move an item to `next` if the lifecycle allows it.
    ///
    /// Returning an allocated item to storage releases its recipient.
    pub fn advance(&mut self, id: &str, next: FoodItemStatus) -> Result<&FoodItem> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| PantryError::NotFound(id.to_string()))?;
        if !item.status.can_transition_to(next) {
            return Err(PantryError::InvalidTransition {
                from: item.status.to_string(),
                to: next.to_string(),
            });
        }
        if next == FoodItemStatus::Allocated {
            return Err(PantryError::validation(
                "recipientId",
                "use allocate to reserve an item for a recipient",
            ));
        }
        if item.status == FoodItemStatus::Allocated && next == FoodItemStatus::Stored {
            item.recipient_id = None;
        }
        tracing::debug!(id, from = %item.status, to = %next, "item status changed");
        item.status = next;
        Ok(&*item)
    }

    /// Reserve a stored item for a recipient.
    pub fn allocate(&mut self, id: &str, recipient_id: impl Into<String>) -> Result<&FoodItem> {
        let recipient_id = recipient_id.into();
        if recipient_id.trim().is_empty() {
            return Err(PantryError::validation("recipientId", "must not be empty"));
        }
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| PantryError::NotFound(id.to_string()))?;
        if !item.status.can_transition_to(FoodItemStatus::Allocated) {
            return Err(PantryError::InvalidTransition {
                from: item.status.to_string(),
                to: FoodItemStatus::Allocated.to_string(),
            });
        }
        tracing::debug!(id, recipient = %recipient_id, "item allocated");
        item.status = FoodItemStatus::Allocated;
        item.recipient_id = Some(recipient_id);
        Ok(&*item)
    }
}
