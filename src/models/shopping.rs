// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shopping list model (one document per user).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on items kept in one list.
pub const MAX_SHOPPING_ITEMS: usize = 100;

/// A user's shopping list, keyed by user ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    /// Owning user ID (also used as document ID)
    pub user_id: String,
    /// Set of items; compared case-insensitively
    pub items: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl ShoppingList {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        let key = item_key(item);
        self.items.iter().any(|existing| item_key(existing) == key)
    }

    /// Add items with set semantics. Returns how many were new.
    pub fn add_items<I, S>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for item in items {
            let item = item.as_ref().trim();
            if item.is_empty() || self.contains(item) {
                continue;
            }
            self.items.push(item.to_string());
            added += 1;
        }
        if added > 0 {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Remove one item. Returns false if it was not on the list.
    pub fn remove_item(&mut self, item: &str) -> bool {
        let key = item_key(item);
        let before = self.items.len();
        self.items.retain(|existing| item_key(existing) != key);
        let removed = self.items.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

fn item_key(item: &str) -> String {
    item.trim().to_lowercase()
}
