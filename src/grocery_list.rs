use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::kroger::client::DEFAULT_SEARCH_LIMIT;
use crate::kroger::models::{CartItem, Fulfillment, Modality};
use crate::kroger::KrogerClient;
use crate::lenient;
use crate::matching::{clean_search_query, rank_candidates, GroceryCategory, RankedCandidate};

/// Pause between catalog searches; the product API allows 10k calls a day.
pub const SEARCH_DELAY: Duration = Duration::from_millis(300);

fn default_quantity() -> f64 {
    1.0
}

fn default_unit() -> String {
    "each".to_string()
}

/// One grocery-list line. Fields written by the model are read leniently and
/// keys this type doesn't model are kept in `extra`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroceryItem {
    pub item: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient::quantity")]
    pub quantity: f64,
    #[serde(default = "default_unit", deserialize_with = "unit_or_each")]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub category: GroceryCategory,
    #[serde(
        default,
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_price: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn unit_or_each<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let unit = lenient::text(deserializer)?;
    Ok(if unit.trim().is_empty() { default_unit() } else { unit })
}

impl GroceryItem {
    pub fn named(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            quantity: default_quantity(),
            unit: default_unit(),
            category: GroceryCategory::Other,
            estimated_price: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// A grocery-list entry as written by the planner: a full object or a bare name.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum GroceryEntry {
    Detailed(GroceryItem),
    Name(String),
}

impl From<GroceryEntry> for GroceryItem {
    fn from(entry: GroceryEntry) -> Self {
        match entry {
            GroceryEntry::Detailed(item) => item,
            GroceryEntry::Name(name) => GroceryItem::named(name),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct PlanGroceryList {
    #[serde(default, deserialize_with = "lenient::skip_invalid")]
    grocery_list: Vec<GroceryEntry>,
}

/// Reads the `grocery_list` of a meal plan file.
pub async fn load_plan_items(plan_path: &Path) -> Result<Vec<GroceryItem>> {
    let raw = tokio::fs::read_to_string(plan_path)
        .await
        .with_context(|| format!("Failed to read meal plan '{}'", plan_path.display()))?;
    let plan: PlanGroceryList = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse meal plan '{}'", plan_path.display()))?;
    Ok(plan.grocery_list.into_iter().map(GroceryItem::from).collect())
}

/// Parses a JSON array of item names, each becoming one unit of `other`.
pub fn items_from_names_json(items_json: &str) -> Result<Vec<GroceryItem>> {
    let names: Vec<String> =
        serde_json::from_str(items_json).context("--items must be a JSON array of strings")?;
    Ok(names.into_iter().map(GroceryItem::named).collect())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedProduct {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub upc: String,
    pub description: String,
    pub brand: String,
    pub size: String,
    pub regular_price: Option<f64>,
    pub promo_price: Option<f64>,
    pub effective_price: Option<f64>,
    pub in_stock: bool,
    pub fulfillment: Fulfillment,
    pub search_query: String,
    pub requested_quantity: f64,
    pub requested_unit: String,
    pub match_score: i32,
    pub category: GroceryCategory,
    pub cart_quantity: u32,
    /// Every scored candidate, best first, for manual review.
    #[serde(default)]
    pub candidates: Vec<RankedCandidate>,
}

impl ResolvedProduct {
    /// Builds the resolved line from the winner of a ranked list.
    pub fn from_ranking(item: &GroceryItem, ranked: Vec<RankedCandidate>) -> Option<Self> {
        let best = ranked.first()?.clone();
        let best_item = best.product.first_item().cloned().unwrap_or_default();
        Some(Self {
            product_id: best.product_id,
            upc: best.upc,
            description: best.description,
            brand: best.brand,
            size: best.size,
            regular_price: best_item.price.regular,
            promo_price: best_item.price.promo,
            effective_price: best_item.effective_price(),
            in_stock: true,
            fulfillment: best_item.fulfillment,
            search_query: item.item.clone(),
            requested_quantity: item.quantity,
            requested_unit: item.unit.clone(),
            match_score: best.score,
            category: item.category,
            cart_quantity: 1,
            candidates: ranked,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroceryCart {
    pub location_id: String,
    pub resolved_items: Vec<ResolvedProduct>,
    pub not_found: Vec<GroceryItem>,
    pub estimated_total: f64,
    pub item_count: usize,
    pub missing_count: usize,
}

impl GroceryCart {
    pub fn from_resolution(
        location_id: String,
        resolved_items: Vec<ResolvedProduct>,
        not_found: Vec<GroceryItem>,
    ) -> Self {
        let total: f64 = resolved_items
            .iter()
            .filter_map(|item| item.effective_price)
            .sum();
        Self {
            location_id,
            item_count: resolved_items.len(),
            missing_count: not_found.len(),
            estimated_total: (total * 100.0).round() / 100.0,
            resolved_items,
            not_found,
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read grocery cart '{}'", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse grocery cart '{}'", path.display()))
    }
}

/// Searches the catalog for one grocery line and picks the best product.
/// Search failures are logged and treated as "not found".
pub async fn resolve_grocery_item(
    client: &mut KrogerClient,
    item: &GroceryItem,
    location_id: &str,
) -> Option<ResolvedProduct> {
    let search_query = clean_search_query(&item.item);
    let products = match client
        .search_products(&search_query, location_id, DEFAULT_SEARCH_LIMIT, None)
        .await
    {
        Ok(response) => response.data,
        Err(e) => {
            warn!(item = %item.item, "search failed: {}", e);
            return None;
        }
    };
    let ranked = rank_candidates(&products, &item.item, item.category);
    ResolvedProduct::from_ranking(item, ranked)
}

/// Finds the first store near `zip_code`, returning its id and name.
pub async fn nearest_store(client: &mut KrogerClient, zip_code: &str) -> Result<(String, String)> {
    info!("Finding nearest Kroger to {}...", zip_code);
    let stores = client
        .find_stores(zip_code, crate::kroger::client::DEFAULT_STORE_RADIUS_MILES, 1)
        .await
        .with_context(|| format!("Store lookup failed for ZIP {}", zip_code))?;
    let store = stores
        .data
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No Kroger stores found near {}", zip_code))?;
    info!("Using store: {} (ID: {})", store.name, store.location_id);
    Ok((store.location_id, store.name))
}

/// Resolves every grocery line in order, pausing `delay` between searches.
pub async fn build_grocery_cart(
    client: &mut KrogerClient,
    items: &[GroceryItem],
    location_id: Option<String>,
    zip_code: &str,
    delay: Duration,
) -> Result<GroceryCart> {
    let location_id = match location_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => nearest_store(client, zip_code).await?.0,
    };

    let mut resolved = Vec::new();
    let mut not_found = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        info!("  [{}/{}] Searching: {}...", idx + 1, items.len(), item.item);
        match resolve_grocery_item(client, item, &location_id).await {
            Some(product) => resolved.push(product),
            None => not_found.push(item.clone()),
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(GroceryCart::from_resolution(location_id, resolved, not_found))
}

/// Cart lines for every resolved item not excluded by product id or UPC.
pub fn stage_cart_items(cart: &GroceryCart, exclude: &[String], modality: Modality) -> Vec<CartItem> {
    cart.resolved_items
        .iter()
        .filter(|item| {
            !exclude
                .iter()
                .any(|ex| ex == &item.product_id || ex == &item.upc)
        })
        .filter(|item| item.cart_quantity > 0)
        .map(|item| CartItem {
            upc: item.upc.clone(),
            quantity: item.cart_quantity,
            modality,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kroger::models::{Price, Product, ProductItem};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn resolved(id: &str, price: Option<f64>) -> ResolvedProduct {
        ResolvedProduct {
            product_id: id.to_string(),
            upc: format!("upc-{}", id),
            description: String::new(),
            brand: String::new(),
            size: String::new(),
            regular_price: price,
            promo_price: None,
            effective_price: price,
            in_stock: true,
            fulfillment: Fulfillment::default(),
            search_query: id.to_string(),
            requested_quantity: 1.0,
            requested_unit: "each".to_string(),
            match_score: 0,
            category: GroceryCategory::Other,
            cart_quantity: 1,
            candidates: Vec::new(),
        }
    }

    #[test]
    fn grocery_entries_accept_objects_and_names() {
        let raw = r#"[
            {"item": "chicken breast", "quantity": 3, "unit": "lb", "category": "meat", "estimated_price": 8.99},
            "broccoli"
        ]"#;
        let entries: Vec<GroceryEntry> = serde_json::from_str(raw).unwrap();
        let items: Vec<GroceryItem> = entries.into_iter().map(GroceryItem::from).collect();
        assert_eq!(items[0].category, GroceryCategory::Meat);
        assert_eq!(items[0].quantity, 3.0);
        assert_eq!(items[1], GroceryItem::named("broccoli"));
    }

    #[test]
    fn names_json_becomes_single_units() {
        let items = items_from_names_json(r#"["eggs", "milk"]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].unit, "each");
        assert!(items_from_names_json("{}").is_err());
    }

    #[tokio::test]
    async fn plan_items_load_from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"{{"meal_plan": [], "grocery_list": [{{"item": "rice", "category": "pantry"}}], "estimated_total": 10}}"#
        )?;
        let items = load_plan_items(file.path()).await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, GroceryCategory::Pantry);
        assert_eq!(items[0].quantity, 1.0);
        Ok(())
    }

    #[tokio::test]
    async fn loose_plan_lines_still_load() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"{{"grocery_list": [
                {{"item": "salt", "quantity": null, "unit": null, "category": null}},
                {{"item": "lettuce", "quantity": "1 head", "category": "produce", "estimated_price": "$2.49", "aisle": 4}},
                {{"quantity": 2}},
                "lemons"
            ]}}"#
        )?;
        let items = load_plan_items(file.path()).await?;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].quantity, 1.0);
        assert_eq!(items[0].unit, "each");
        assert_eq!(items[0].category, GroceryCategory::Other);
        assert_eq!(items[1].quantity, 1.0);
        assert_eq!(items[1].estimated_price, Some(2.49));
        assert_eq!(items[1].extra.get("aisle"), Some(&serde_json::json!(4)));
        assert_eq!(items[2], GroceryItem::named("lemons"));
        Ok(())
    }

    #[test]
    fn resolution_uses_winner_and_keeps_ranking() {
        let product = Product {
            product_id: "p1".to_string(),
            description: Some("Yellow Onion".to_string()),
            items: vec![ProductItem {
                size: "3 lb".to_string(),
                price: Price {
                    regular: Some(3.0),
                    promo: Some(2.5),
                },
                ..Default::default()
            }],
            ..Default::default()
        };
        let item = GroceryItem {
            quantity: 2.0,
            unit: "lb".to_string(),
            category: GroceryCategory::Produce,
            ..GroceryItem::named("yellow onion")
        };
        let ranked = rank_candidates(&[product], &item.item, item.category);
        let resolved = ResolvedProduct::from_ranking(&item, ranked).unwrap();
        assert_eq!(resolved.upc, "p1");
        assert_eq!(resolved.effective_price, Some(2.5));
        assert_eq!(resolved.requested_unit, "lb");
        assert_eq!(resolved.cart_quantity, 1);
        assert_eq!(resolved.candidates.len(), 1);

        assert!(ResolvedProduct::from_ranking(&item, Vec::new()).is_none());
    }

    #[test]
    fn cart_totals_round_to_cents() {
        let cart = GroceryCart::from_resolution(
            "014".to_string(),
            vec![resolved("a", Some(1.005)), resolved("b", Some(2.111)), resolved("c", None)],
            vec![GroceryItem::named("saffron")],
        );
        assert_eq!(cart.estimated_total, 3.12);
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.missing_count, 1);
    }

    #[test]
    fn staging_respects_exclusions() {
        let mut zero = resolved("zero", Some(1.0));
        zero.cart_quantity = 0;
        let cart = GroceryCart::from_resolution(
            "014".to_string(),
            vec![resolved("a", Some(1.0)), resolved("b", Some(1.0)), zero],
            Vec::new(),
        );
        let staged = stage_cart_items(&cart, &["upc-b".to_string()], Modality::Delivery);
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].upc, "upc-a");
        assert_eq!(staged[0].modality, Modality::Delivery);

        let staged = stage_cart_items(&cart, &["a".to_string()], Modality::Pickup);
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].upc, "upc-b");
    }
}
