//! Category table: place-type filters grouped into human-facing categories,
//! and the marker color each category is drawn with.
//!
//! The table is static and hand-curated. A filter missing from it belongs to
//! no category and is drawn with [`DEFAULT_COLOR`].

use std::collections::HashSet;
use serde::Serialize;
use crate::ColorSpec;

/// Color for places whose types match no active filter.
pub const DEFAULT_COLOR: ColorSpec = ColorSpec {
    background: "#EA4335",
    border: "#B31412",
    glyph: "#FFFFFF",
};

/// A human-facing grouping of place-type filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    FoodAndDrink,
    Shopping,
    Entertainment,
    Lodging,
}

impl Category {
    /// All categories, in table order.
    pub const ALL: [Category; 4] = [
        Category::FoodAndDrink,
        Category::Shopping,
        Category::Entertainment,
        Category::Lodging,
    ];

    /// Label shown to users and accepted from them.
    pub fn label(self) -> &'static str {
        match self {
            Category::FoodAndDrink => "Food and Drink",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Lodging => "Lodging",
        }
    }

    /// Look up a category by label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Place-type filters belonging to this category, in table order.
    pub fn place_types(self) -> &'static [&'static str] {
        match self {
            Category::FoodAndDrink => &["restaurant", "bar", "cafe", "bakery"],
            Category::Shopping => &[
                "shopping_mall",
                "clothing_store",
                "department_store",
                "convenience_store",
                "book_store",
                "jewelry_store",
                "store",
                "florist",
            ],
            Category::Entertainment => &[
                "amusement_park",
                "aquarium",
                "art_gallery",
                "bowling_alley",
                "casino",
                "movie_theater",
                "museum",
                "night_club",
                "park",
                "stadium",
                "zoo",
                "gym",
                "tourist_attraction",
                "spa",
            ],
            Category::Lodging => &["hotel", "lodging", "rv_park", "campground"],
        }
    }

    pub fn color(self) -> ColorSpec {
        match self {
            Category::FoodAndDrink => ColorSpec {
                background: "#FB8C00",
                border: "#E65100",
                glyph: "#FFFFFF",
            },
            Category::Shopping => ColorSpec {
                background: "#8E24AA",
                border: "#4A148C",
                glyph: "#FFFFFF",
            },
            Category::Entertainment => ColorSpec {
                background: "#1E88E5",
                border: "#0D47A1",
                glyph: "#FFFFFF",
            },
            Category::Lodging => ColorSpec {
                background: "#43A047",
                border: "#1B5E20",
                glyph: "#FFFFFF",
            },
        }
    }
}

/// Category a place-type filter belongs to, if it is in the table.
pub fn category_of(place_type: &str) -> Option<Category> {
    Category::ALL
        .into_iter()
        .find(|c| c.place_types().iter().any(|t| *t == place_type))
}

/// Every place-type filter in the table, in table order.
pub fn all_place_types() -> impl Iterator<Item = &'static str> {
    Category::ALL.into_iter().flat_map(|c| c.place_types().iter().copied())
}

/// Expand category labels into their place-type filters.
///
/// Unknown labels contribute nothing. The output follows table order with
/// duplicates removed, so it is deterministic for a given input; callers that
/// want a randomized order shuffle it themselves.
///
/// # Example
/// ```
/// use route_poi::categories::expand;
///
/// let filters = expand(&["Lodging", "Not a category"]);
/// assert_eq!(filters, vec!["hotel", "lodging", "rv_park", "campground"]);
/// ```
pub fn expand<S: AsRef<str>>(categories: &[S]) -> Vec<String> {
    let wanted: HashSet<Category> = categories
        .iter()
        .filter_map(|label| Category::from_label(label.as_ref()))
        .collect();

    Category::ALL
        .into_iter()
        .filter(|c| wanted.contains(c))
        .flat_map(|c| c.place_types().iter().map(|t| t.to_string()))
        .collect()
}

/// Marker color for a place.
///
/// Walks the place's reported types in order and returns the color of the
/// category of the first one that is also an active filter. First match
/// wins; there is no weighting between conflicting memberships. Falls back
/// to [`DEFAULT_COLOR`] when nothing matches or the matching filter has no
/// category.
///
/// # Example
/// ```
/// use route_poi::categories::{color_for, Category, DEFAULT_COLOR};
///
/// let active = vec!["zoo".to_string()];
/// assert_eq!(color_for(&["zoo".to_string()], &active), Category::Entertainment.color());
/// assert_eq!(color_for(&["unknown_type".to_string()], &active), DEFAULT_COLOR);
/// ```
pub fn color_for(types: &[String], active_filters: &[String]) -> ColorSpec {
    types
        .iter()
        .find(|t| active_filters.contains(*t))
        .and_then(|t| category_of(t))
        .map_or(DEFAULT_COLOR, Category::color)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_every_filter_has_one_category() {
        let all: Vec<&str> = all_place_types().collect();
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
        assert_eq!(all.len(), 30);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Category::from_label("Shopping"), Some(Category::Shopping));
        assert_eq!(Category::from_label("  food and drink "), Some(Category::FoodAndDrink));
        assert_eq!(Category::from_label("Hardware"), None);
    }

    #[test]
    fn test_expand_shopping() {
        let filters = expand(&["Shopping"]);
        assert_eq!(filters, strings(Category::Shopping.place_types()));
    }

    #[test]
    fn test_expand_ignores_unknown_and_duplicates() {
        let filters = expand(&["Lodging", "Banks", "lodging"]);
        assert_eq!(filters, strings(&["hotel", "lodging", "rv_park", "campground"]));
        assert!(expand::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_color_for_matching_type() {
        let active = strings(&["zoo"]);
        assert_eq!(color_for(&strings(&["zoo"]), &active), Category::Entertainment.color());
    }

    #[test]
    fn test_color_for_unknown_type() {
        let active = strings(&["zoo"]);
        assert_eq!(color_for(&strings(&["unknown_type"]), &active), DEFAULT_COLOR);
    }

    #[test]
    fn test_color_for_first_match_wins() {
        let active = strings(&["cafe", "book_store"]);
        // Bookstore cafe: listed as book_store first
        let types = strings(&["point_of_interest", "book_store", "cafe"]);
        assert_eq!(color_for(&types, &active), Category::Shopping.color());

        let types = strings(&["cafe", "book_store"]);
        assert_eq!(color_for(&types, &active), Category::FoodAndDrink.color());
    }

    #[test]
    fn test_color_for_active_filter_outside_table() {
        let active = strings(&["car_wash"]);
        assert_eq!(color_for(&strings(&["car_wash"]), &active), DEFAULT_COLOR);
    }
}
