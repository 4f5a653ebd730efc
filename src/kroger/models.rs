use serde::{Deserialize, Serialize};

pub const OUT_OF_STOCK: &str = "TEMPORARILY_OUT_OF_STOCK";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[serde(default)]
    pub regular: Option<f64>,
    #[serde(default)]
    pub promo: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(default)]
    pub stock_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curbside: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_store: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_to_home: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub fulfillment: Fulfillment,
}

impl ProductItem {
    pub fn is_out_of_stock(&self) -> bool {
        self.inventory.stock_level.as_deref() == Some(OUT_OF_STOCK)
    }

    /// Promo price when one is running, otherwise the regular price.
    pub fn effective_price(&self) -> Option<f64> {
        match self.price.promo {
            Some(promo) if promo > 0.0 => Some(promo),
            _ => self.price.regular,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Missing means eligible; the catalog omits the flag on most food.
    #[serde(default)]
    pub snap_eligible: Option<bool>,
    #[serde(default)]
    pub items: Vec<ProductItem>,
}

impl Product {
    pub fn first_item(&self) -> Option<&ProductItem> {
        self.items.first()
    }

    pub fn upc_or_id(&self) -> &str {
        self.upc.as_deref().unwrap_or(&self.product_id)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProductSearchResponse {
    #[serde(default)]
    pub data: Vec<Product>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProductDetailResponse {
    pub data: Product,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LocationSearchResponse {
    #[serde(default)]
    pub data: Vec<Location>,
}

/// One-line store view printed by `kroger stores`.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub location_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl From<&Location> for StoreSummary {
    fn from(location: &Location) -> Self {
        let addr = &location.address;
        Self {
            location_id: location.location_id.clone(),
            name: location.name.clone(),
            address: format!(
                "{}, {}, {} {}",
                addr.address_line1, addr.city, addr.state, addr.zip_code
            ),
            phone: location.phone.clone(),
        }
    }
}

/// Flattened product view printed by `kroger search`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProductSummary {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub upc: String,
    pub description: String,
    pub brand: String,
    pub size: String,
    pub regular_price: Option<f64>,
    pub promo_price: Option<f64>,
    pub in_stock: String,
    pub fulfillment: Fulfillment,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        let item = product.first_item().cloned().unwrap_or_default();
        Self {
            product_id: product.product_id.clone(),
            upc: product.upc_or_id().to_string(),
            description: product.description.clone().unwrap_or_default(),
            brand: product.brand.clone().unwrap_or_default(),
            size: item.size,
            regular_price: item.price.regular,
            promo_price: item.price.promo,
            in_stock: item.inventory.stock_level.unwrap_or_default(),
            fulfillment: item.fulfillment,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    #[default]
    Pickup,
    Delivery,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartItem {
    pub upc: String,
    pub quantity: u32,
    #[serde(default)]
    pub modality: Modality,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CartAddResult {
    pub status: String,
    pub items_added: usize,
}
