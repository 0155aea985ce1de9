//! Category catalog and typeahead matching.
//!
//! The catalog is read from the same JSON mapping the import pipeline uses: a
//! list of objects with `class`, `label`, `icon` and `matches`. Only the first
//! three matter to the client.

use crate::error::Result;
use crate::relevance::{calculate_relevance, RelevanceScore};
use fourmore_api_client::Category;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// Shown when the search box is empty
pub const POPULAR_CATEGORIES: [&str; 6] = ["restaurant", "cafe", "bar", "supermarket", "pharmacy", "park"];

/// Default number of category suggestions while typing
pub const DEFAULT_SUGGESTION_CAP: usize = 6;

const BUILTIN: &[(&str, &str, &str)] = &[
    ("restaurant", "Restaurant", "utensils"),
    ("cafe", "Café", "coffee"),
    ("bar", "Bar", "glass-martini"),
    ("pub", "Pub", "beer"),
    ("fast_food", "Fast Food", "hamburger"),
    ("ice_cream", "Ice Cream", "ice-cream"),
    ("bakery", "Bakery", "bread-slice"),
    ("supermarket", "Supermarket", "shopping-cart"),
    ("convenience", "Convenience Store", "store"),
    ("pharmacy", "Pharmacy", "prescription-bottle"),
    ("hospital", "Hospital", "hospital"),
    ("doctors", "Doctor", "user-md"),
    ("dentist", "Dentist", "tooth"),
    ("bank", "Bank", "university"),
    ("atm", "ATM", "money-bill"),
    ("fuel", "Gas Station", "gas-pump"),
    ("charging_station", "EV Charging", "charging-station"),
    ("parking", "Parking", "parking"),
    ("library", "Library", "book"),
    ("museum", "Museum", "landmark"),
    ("theatre", "Theater", "theater-masks"),
    ("cinema", "Cinema", "film"),
    ("park", "Park", "tree"),
    ("playground", "Playground", "child"),
    ("hotel", "Hotel", "bed"),
    ("post_office", "Post Office", "envelope"),
    ("place_of_worship", "Place of Worship", "place-of-worship"),
    ("fitness_centre", "Gym", "dumbbell"),
    ("hairdresser", "Hairdresser", "cut"),
    ("clothes", "Clothing Store", "tshirt"),
    ("books", "Bookstore", "book-open"),
    ("hardware", "Hardware Store", "tools"),
    ("bicycle", "Bike Shop", "bicycle"),
    ("toilets", "Restroom", "restroom"),
    ("viewpoint", "Viewpoint", "binoculars"),
];

static BUILTIN_CATALOG: Lazy<CategoryCatalog> = Lazy::new(|| {
    CategoryCatalog::from_categories(
        BUILTIN
            .iter()
            .map(|(class, label, icon)| Category {
                class: (*class).to_string(),
                label: (*label).to_string(),
                icon: Some((*icon).to_string()),
                matches: Vec::new(),
            })
            .collect(),
    )
});

/// Title-case a class name: `fast_food` becomes `Fast Food`
pub fn humanize_class(class: &str) -> String {
    class
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered category list with lookup by class
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
    by_class: HashMap<String, usize>,
}

impl CategoryCatalog {
    /// The catalog compiled into the client
    pub fn builtin() -> &'static CategoryCatalog {
        &BUILTIN_CATALOG
    }

    pub fn from_categories(categories: Vec<Category>) -> Self {
        let by_class = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.class.clone(), i))
            .collect();
        Self { categories, by_class }
    }

    /// Parse the JSON mapping format
    pub fn from_json(json: &str) -> Result<Self> {
        let categories: Vec<Category> = serde_json::from_str(json)?;
        Ok(Self::from_categories(categories))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn get(&self, class: &str) -> Option<&Category> {
        self.by_class.get(class).map(|&i| &self.categories[i])
    }

    /// Display label for a class, falling back to the humanized class name
    pub fn label_for(&self, class: &str) -> String {
        self.get(class)
            .map_or_else(|| humanize_class(class), |c| c.label.clone())
    }

    /// The fixed popular list, in order, skipping classes this catalog lacks
    pub fn popular(&self) -> Vec<&Category> {
        POPULAR_CATEGORIES.iter().filter_map(|class| self.get(class)).collect()
    }

    /// Category suggestions for the typeahead
    ///
    /// An empty query yields the popular list. Otherwise categories whose
    /// label or class contains the query are returned best match first,
    /// at most `cap` of them.
    pub fn suggest(&self, query: &str, cap: usize) -> Vec<&Category> {
        if query.trim().is_empty() {
            return self.popular();
        }

        let mut scored: Vec<(RelevanceScore, &Category)> = self
            .categories
            .iter()
            .filter_map(|category| {
                let score = calculate_relevance(&category.label, query)
                    .max(calculate_relevance(&humanize_class(&category.class), query));
                score.is_substring_match().then_some((score, category))
            })
            .collect();

        scored.sort_by(|(a_score, a), (b_score, b)| b_score.cmp(a_score).then_with(|| a.label.cmp(&b.label)));
        scored.into_iter().take(cap).map(|(_, c)| c).collect()
    }

    /// True if a category's label or class contains `query`
    pub fn matches(&self, class: &str, query: &str) -> bool {
        calculate_relevance(&self.label_for(class), query).is_substring_match()
            || calculate_relevance(&humanize_class(class), query).is_substring_match()
    }
}
