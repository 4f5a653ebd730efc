use reqwest::Client;
use tracing::{debug, info};

use super::auth::{KrogerAuth, PRODUCT_SCOPE};
use super::models::{
    CartAddResult, CartItem, LocationSearchResponse, Product, ProductDetailResponse,
    ProductSearchResponse,
};
use super::{ensure_success, KrogerError, API_BASE_URL, REQUEST_TIMEOUT};

pub const DEFAULT_STORE_RADIUS_MILES: u32 = 10;
pub const DEFAULT_STORE_LIMIT: u32 = 5;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// High-level Kroger API client: locations, products and cart.
pub struct KrogerClient {
    auth: KrogerAuth,
    http: Client,
    api_base: String,
}

impl KrogerClient {
    pub fn new(auth: KrogerAuth) -> Result<Self, KrogerError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            auth,
            http,
            api_base: API_BASE_URL.to_string(),
        })
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn auth(&self) -> &KrogerAuth {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut KrogerAuth {
        &mut self.auth
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &mut self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, KrogerError> {
        let token = self.auth.app_token(PRODUCT_SCOPE).await?;
        let response = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn find_stores(
        &mut self,
        zip_code: &str,
        radius_miles: u32,
        limit: u32,
    ) -> Result<LocationSearchResponse, KrogerError> {
        debug!(zip_code, radius_miles, limit, "searching stores");
        self.get_json(
            "/locations",
            &[
                ("filter.zipCode.near", zip_code.to_string()),
                ("filter.radiusInMiles", radius_miles.to_string()),
                ("filter.limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn search_products(
        &mut self,
        query: &str,
        location_id: &str,
        limit: u32,
        fulfillment: Option<&str>,
    ) -> Result<ProductSearchResponse, KrogerError> {
        let mut params = vec![
            ("filter.term", query.to_string()),
            ("filter.locationId", location_id.to_string()),
            ("filter.limit", limit.to_string()),
        ];
        if let Some(fulfillment) = fulfillment {
            params.push(("filter.fulfillment", fulfillment.to_string()));
        }
        debug!(query, location_id, "searching products");
        self.get_json("/products", &params).await
    }

    pub async fn get_product(
        &mut self,
        product_id: &str,
        location_id: &str,
    ) -> Result<Product, KrogerError> {
        let detail: ProductDetailResponse = self
            .get_json(
                &format!("/products/{}", product_id),
                &[("filter.locationId", location_id.to_string())],
            )
            .await?;
        Ok(detail.data)
    }

    /// Adds items to the authorized user's cart. The API answers 204 on success.
    pub async fn add_to_cart(&mut self, items: &[CartItem]) -> Result<CartAddResult, KrogerError> {
        let token = self.auth.user_token().await?;
        let payload = serde_json::json!({ "items": items });
        let response = self
            .http
            .put(format!("{}/cart/add", self.api_base))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;
        ensure_success(response).await?;
        info!(count = items.len(), "items added to cart");
        Ok(CartAddResult {
            status: "ok".to_string(),
            items_added: items.len(),
        })
    }
}
