//! Backend API seam and its HTTP implementation.
//!
//! The store talks to the backend only through [`NovelApi`], so the HTTP
//! client can be swapped for an in-memory one.

use crate::config::{ApiConfig, Endpoints};
use crate::error::StoreError;
use crate::models::{Cart, Novel, NovelList};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Calls exposed by the novel backend.
#[async_trait]
pub trait NovelApi: Send + Sync {
    /// Lists novels ranked for `year`.
    async fn list_novels(&self, year: &str) -> Result<Vec<Novel>, StoreError>;

    /// Fetches a single novel.
    async fn novel_detail(&self, novel_id: u64) -> Result<Novel, StoreError>;

    /// Adds `quantity` copies of a novel to the session cart.
    async fn add_cart_item(
        &self,
        novel_id: u64,
        quantity: u32,
        csrf_token: &str,
    ) -> Result<(), StoreError>;

    /// Fetches the session cart.
    async fn cart(&self) -> Result<Cart, StoreError>;

    /// Changes an item's quantity by `delta`. The backend drops items that reach zero.
    async fn update_cart_item(
        &self,
        item_id: u64,
        delta: i32,
        csrf_token: &str,
    ) -> Result<Cart, StoreError>;

    /// Removes an item from the cart.
    async fn remove_cart_item(&self, item_id: u64, csrf_token: &str) -> Result<Cart, StoreError>;

    /// Empties the cart.
    async fn clear_cart(&self, csrf_token: &str) -> Result<Cart, StoreError>;
}

#[derive(Debug, Serialize)]
struct AddItemRequest {
    novel_id: u64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct UpdateItemRequest {
    item_id: u64,
    quantity: i32,
}

/// [`NovelApi`] over HTTP with a shared cookie jar.
pub struct HttpNovelApi {
    client: Client,
    api: ApiConfig,
    endpoints: Endpoints,
    csrf_header: String,
}

impl HttpNovelApi {
    /// Creates a client sending cookies from `jar` with every request.
    pub fn new(
        api: ApiConfig,
        endpoints: Endpoints,
        csrf_header: impl Into<String>,
        jar: Arc<Jar>,
    ) -> Result<Self, StoreError> {
        let mut builder = Client::builder()
            .user_agent(concat!("novelshelf/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(jar);

        if let Some(timeout) = api.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?, api, endpoints, csrf_header))
    }

    /// Uses an already configured client.
    pub fn with_client(
        client: Client,
        api: ApiConfig,
        endpoints: Endpoints,
        csrf_header: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api,
            endpoints,
            csrf_header: csrf_header.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        self.api.api_url(path)
    }

    async fn json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, StoreError> {
        let response = check_response_status(response, context).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl NovelApi for HttpNovelApi {
    async fn list_novels(&self, year: &str) -> Result<Vec<Novel>, StoreError> {
        let url = self.url(&self.endpoints.novels);
        debug!(%url, year, "listing novels");

        let response = self.client.get(&url).query(&[("year", year)]).send().await?;
        let list: NovelList = Self::json(response, "Failed to fetch novels").await?;
        Ok(list.results)
    }

    async fn novel_detail(&self, novel_id: u64) -> Result<Novel, StoreError> {
        let url = self.url(&format!("{}{}/", self.endpoints.novels, novel_id));
        debug!(%url, "fetching novel detail");

        let response = self.client.get(&url).send().await?;
        Self::json(response, "Failed to fetch novel detail").await
    }

    async fn add_cart_item(
        &self,
        novel_id: u64,
        quantity: u32,
        csrf_token: &str,
    ) -> Result<(), StoreError> {
        let url = self.url(&self.endpoints.cart_add_item);
        debug!(%url, novel_id, quantity, "adding cart item");

        let response = self
            .client
            .post(&url)
            .header(self.csrf_header.as_str(), csrf_token)
            .json(&AddItemRequest { novel_id, quantity })
            .send()
            .await?;
        check_response_status(response, "Failed to add to cart").await?;
        Ok(())
    }

    async fn cart(&self) -> Result<Cart, StoreError> {
        let url = self.url(&self.endpoints.cart);
        debug!(%url, "fetching cart");

        let response = self.client.get(&url).send().await?;
        Self::json(response, "Failed to fetch cart").await
    }

    async fn update_cart_item(
        &self,
        item_id: u64,
        delta: i32,
        csrf_token: &str,
    ) -> Result<Cart, StoreError> {
        let url = self.url(&self.endpoints.cart_update_item);
        debug!(%url, item_id, delta, "updating cart item");

        let response = self
            .client
            .put(&url)
            .header(self.csrf_header.as_str(), csrf_token)
            .json(&UpdateItemRequest {
                item_id,
                quantity: delta,
            })
            .send()
            .await?;
        Self::json(response, "Failed to update cart item").await
    }

    async fn remove_cart_item(&self, item_id: u64, csrf_token: &str) -> Result<Cart, StoreError> {
        let url = self.url(&self.endpoints.cart_remove_item);
        debug!(%url, item_id, "removing cart item");

        let response = self
            .client
            .delete(&url)
            .query(&[("item_id", item_id)])
            .header(self.csrf_header.as_str(), csrf_token)
            .send()
            .await?;
        Self::json(response, "Failed to remove cart item").await
    }

    async fn clear_cart(&self, csrf_token: &str) -> Result<Cart, StoreError> {
        let url = self.url(&self.endpoints.cart_clear);
        debug!(%url, "clearing cart");

        let response = self
            .client
            .delete(&url)
            .header(self.csrf_header.as_str(), csrf_token)
            .send()
            .await?;
        Self::json(response, "Failed to clear cart").await
    }
}

/// Turns a non-success response into [`StoreError::Status`], keeping the body.
pub async fn check_response_status(
    response: Response,
    context: &str,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        context: context.to_string(),
        status,
        body,
    })
}
