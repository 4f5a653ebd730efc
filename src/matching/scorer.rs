//! Heuristic match score between a grocery-list line and a catalog product.
//!
//! Higher is better. The score only ranks candidates returned by one search,
//! so the weights are relative: a non-SNAP product for a food line (-100)
//! must lose to almost anything, a junk keyword (-50) to any plausible food.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::category::{GroceryCategory, NON_FOOD_CATEGORIES};
use super::query::normalize_item_name;
use crate::kroger::models::Product;

const SNAP_PENALTY: i32 = -100;
const CATEGORY_MATCH_BONUS: i32 = 15;
const NON_FOOD_CATEGORY_PENALTY: i32 = -30;
const WORD_MATCH_BONUS: i32 = 10;
const FULL_NAME_BONUS: i32 = 20;
const PREFIX_BONUS: i32 = 10;
const JUNK_PENALTY: i32 = -50;
const BEVERAGE_PENALTY: i32 = -20;
const PRESERVED_PENALTY: i32 = -15;
const FRESH_BONUS: i32 = 10;
const PREPARED_PENALTY: i32 = -10;
const PRICED_BONUS: i32 = 5;

/// Sort key for candidates without a regular price.
pub const MISSING_PRICE: f64 = 999.0;

const JUNK_SIGNALS: &[&str] = &[
    "dog",
    "cat",
    "pet",
    "puppy",
    "kitten",
    "cleaner",
    "detergent",
    "soap",
    "shampoo",
    "conditioner",
    "hair",
    "beauty",
    "body wash",
    "lotion",
    "skincare",
    "cosmetic",
    "toothpaste",
    "mouthwash",
    "deodorant",
    "diaper",
    "formula",
    "supplement",
    "vitamin",
    "wellness shot",
    "protein shake",
];

const BEVERAGE_SIGNALS: &[&str] = &[
    "juice",
    "blend",
    "cold-pressed",
    "smoothie",
    "drink",
    "soda",
    "water",
    "tea",
    "coffee",
    "lemonade",
];

const PRESERVED_SIGNALS: &[&str] = &["freeze dried", "frozen", "canned", "dried"];

const PREPARED_SIGNALS: &[&str] = &[
    "cup",
    "cups",
    "kit",
    "meal kit",
    "seasoning mix",
    "frozen dinner",
    "tv dinner",
];

pub fn score_product(product: &Product, item_name: &str, category: GroceryCategory) -> i32 {
    let desc = product.description.as_deref().unwrap_or_default().to_lowercase();
    let brand = product.brand.as_deref().unwrap_or_default().to_lowercase();
    let kroger_cats: Vec<String> = product.categories.iter().map(|c| c.to_lowercase()).collect();
    let name_lower = item_name.to_lowercase();
    let name_clean = normalize_item_name(item_name);
    let name_words: Vec<&str> = name_clean.split_whitespace().collect();

    let mut score = 0;

    // SNAP eligibility is the strongest "is this food?" signal.
    if category.is_food() && product.snap_eligible == Some(false) {
        score += SNAP_PENALTY;
    }

    let expected = category.expected_kroger_categories();
    if !expected.is_empty()
        && kroger_cats
            .iter()
            .any(|kc| expected.iter().any(|exp| kc.contains(exp)))
    {
        score += CATEGORY_MATCH_BONUS;
    }
    for non_food in NON_FOOD_CATEGORIES {
        if kroger_cats.iter().any(|kc| kc.contains(non_food)) {
            score += NON_FOOD_CATEGORY_PENALTY;
        }
    }

    let matched_words = name_words.iter().filter(|w| desc.contains(*w)).count() as i32;
    score += matched_words * WORD_MATCH_BONUS;

    if desc.contains(&name_clean) {
        score += FULL_NAME_BONUS;
    }
    let starts_with_last_word = name_words.last().is_some_and(|w| desc.starts_with(w));
    if desc.starts_with(&name_clean) || starts_with_last_word {
        score += PREFIX_BONUS;
    }

    for junk in JUNK_SIGNALS {
        if desc.contains(junk) || brand.contains(junk) {
            score += JUNK_PENALTY;
        }
    }

    if category.is_raw_ingredient()
        && BEVERAGE_SIGNALS
            .iter()
            .any(|sig| desc.contains(sig) && !name_lower.contains(sig))
    {
        score += BEVERAGE_PENALTY;
    }

    if name_lower.contains("fresh") {
        if PRESERVED_SIGNALS.iter().any(|sig| desc.contains(sig)) && !name_lower.contains("dried") {
            score += PRESERVED_PENALTY;
        }
        if desc.contains("fresh") {
            score += FRESH_BONUS;
        }
    }

    if category.is_raw_ingredient() {
        for sig in PREPARED_SIGNALS {
            if desc.contains(sig) && !name_lower.contains(sig) {
                score += PREPARED_PENALTY;
            }
        }
    }

    let priced = product
        .first_item()
        .and_then(|item| item.price.regular)
        .is_some_and(|regular| regular > 0.0);
    if priced {
        score += PRICED_BONUS;
    }

    score
}

/// A scored catalog product, kept in the ranked list shown for review.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RankedCandidate {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub upc: String,
    pub description: String,
    pub brand: String,
    pub size: String,
    pub regular_price: Option<f64>,
    pub score: i32,
    #[serde(skip)]
    pub product: Product,
}

impl RankedCandidate {
    fn sort_price(&self) -> f64 {
        self.regular_price
            .filter(|price| *price > 0.0)
            .unwrap_or(MISSING_PRICE)
    }
}

/// Scores every in-stock candidate and orders them best first: score
/// descending, then cheaper regular price.
pub fn rank_candidates(
    products: &[Product],
    item_name: &str,
    category: GroceryCategory,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = products
        .iter()
        .filter_map(|product| {
            let item = product.first_item()?;
            if item.is_out_of_stock() {
                return None;
            }
            Some(RankedCandidate {
                product_id: product.product_id.clone(),
                upc: product.upc_or_id().to_string(),
                description: product.description.clone().unwrap_or_default(),
                brand: product.brand.clone().unwrap_or_default(),
                size: item.size.clone(),
                regular_price: item.price.regular,
                score: score_product(product, item_name, category),
                product: product.clone(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| {
            a.sort_price()
                .partial_cmp(&b.sort_price())
                .unwrap_or(Ordering::Equal)
        })
    });
    ranked
}
