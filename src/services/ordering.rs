// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Grocery ordering links for shopping-list items.
//!
//! We don't integrate with any grocery service; we just build search URLs
//! the user can open in the provider's site or app.

use serde::Serialize;

/// A quick-commerce grocery provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryProvider {
    pub id: &'static str,
    pub name: &'static str,
    /// Search URL with `{query}` standing in for the encoded search text.
    #[serde(skip)]
    search_template: &'static str,
}

impl GroceryProvider {
    pub fn search_url(&self, query: &str) -> String {
        self.search_template
            .replace("{query}", &urlencoding::encode(query.trim()))
    }
}

pub const PROVIDERS: [GroceryProvider; 4] = [
    GroceryProvider {
        id: "blinkit",
        name: "Blinkit",
        search_template: "https://blinkit.com/s/?q={query}",
    },
    GroceryProvider {
        id: "zepto",
        name: "Zepto",
        search_template: "https://www.zeptonow.com/search?query={query}",
    },
    GroceryProvider {
        id: "instamart",
        name: "Swiggy Instamart",
        search_template: "https://www.swiggy.com/instamart/search?query={query}",
    },
    GroceryProvider {
        id: "amazon-fresh",
        name: "Amazon Fresh",
        search_template: "https://www.amazon.in/s?k={query}&i=nowstore",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderLink {
    pub provider: &'static str,
    pub name: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemLinks {
    pub item: String,
    pub links: Vec<ProviderLink>,
}

/// Links for every item, plus one search per provider for the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinks {
    pub items: Vec<ItemLinks>,
    pub whole_list: Vec<ProviderLink>,
}

fn links_for(query: &str) -> Vec<ProviderLink> {
    PROVIDERS
        .iter()
        .map(|p| ProviderLink {
            provider: p.id,
            name: p.name,
            url: p.search_url(query),
        })
        .collect()
}

pub fn order_links(items: &[String]) -> OrderLinks {
    let items: Vec<&str> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();

    OrderLinks {
        items: items
            .iter()
            .map(|item| ItemLinks {
                item: item.to_string(),
                links: links_for(item),
            })
            .collect(),
        whole_list: if items.is_empty() {
            Vec::new()
        } else {
            links_for(&items.join(", "))
        },
    }
}
