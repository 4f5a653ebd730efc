use serde::{Deserialize, Serialize};
use std::fmt;

/// Grocery-list category assigned by the meal planner.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GroceryCategory {
    Produce,
    Meat,
    Dairy,
    Pantry,
    Frozen,
    Bakery,
    #[default]
    #[serde(other)]
    Other,
}

/// Kroger taxonomy entries that count as non-food.
pub const NON_FOOD_CATEGORIES: &[&str] = &[
    "health & beauty",
    "personal care",
    "cleaning",
    "pet care",
    "baby",
    "pharmacy",
    "household",
    "office",
    "floral",
];

impl GroceryCategory {
    /// Kroger taxonomy substrings a good match should carry.
    pub fn expected_kroger_categories(self) -> &'static [&'static str] {
        match self {
            GroceryCategory::Produce => &["produce"],
            GroceryCategory::Meat => &["meat", "seafood"],
            GroceryCategory::Dairy => &["dairy", "eggs"],
            GroceryCategory::Pantry => &[
                "baking goods",
                "canned",
                "packaged",
                "condiments",
                "sauces",
                "pasta",
                "grains",
                "snacks",
                "breakfast",
                "spices",
            ],
            GroceryCategory::Frozen => &["frozen"],
            GroceryCategory::Bakery => &["bakery"],
            GroceryCategory::Other => &[],
        }
    }

    pub fn is_food(self) -> bool {
        !matches!(self, GroceryCategory::Other)
    }

    /// Raw-ingredient categories, where drinks and prepared foods are wrong matches.
    pub fn is_raw_ingredient(self) -> bool {
        matches!(
            self,
            GroceryCategory::Produce
                | GroceryCategory::Meat
                | GroceryCategory::Dairy
                | GroceryCategory::Pantry
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroceryCategory::Produce => "produce",
            GroceryCategory::Meat => "meat",
            GroceryCategory::Dairy => "dairy",
            GroceryCategory::Pantry => "pantry",
            GroceryCategory::Frozen => "frozen",
            GroceryCategory::Bakery => "bakery",
            GroceryCategory::Other => "other",
        }
    }
}

impl fmt::Display for GroceryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
