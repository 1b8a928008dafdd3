//! Cart actions of the store.

use super::NovelStore;
use crate::error::StoreError;
use crate::models::Cart;
use crate::notify::NotificationKind;
use tracing::{error, info};

const ADDED_MESSAGE: &str = "Added to cart!";
const ADD_FAILED_MESSAGE: &str = "Failed to add to cart. Please try again later.";

impl NovelStore {
    /// Adds one copy of a novel to the session cart.
    ///
    /// Success is announced through the notifier and a cart event; failure
    /// through a blocking alert. Returns whether the item was added.
    pub async fn add_to_cart(&self, novel_id: u64) -> bool {
        let token = self.csrf_token();
        match self.inner.api.add_cart_item(novel_id, 1, &token).await {
            Ok(()) => {
                info!(novel_id, "added novel to cart");
                self.inner
                    .notifier
                    .notify(ADDED_MESSAGE, NotificationKind::Success);
                self.cart_changed();
                true
            }
            Err(e) => {
                error!(novel_id, error = %e, "failed to add novel to cart");
                self.inner.notifier.alert(ADD_FAILED_MESSAGE);
                false
            }
        }
    }

    /// Last cart returned by the backend.
    pub fn cart(&self) -> Option<Cart> {
        self.inner.read().cart.clone()
    }

    /// Fetches the cart and keeps it as the current snapshot.
    pub async fn fetch_cart(&self) -> Result<Cart, StoreError> {
        let result = self.inner.api.cart().await;
        self.store_cart(result, "fetch", false)
    }

    /// Changes an item's quantity by `delta`, which may be negative.
    pub async fn update_cart_item(&self, item_id: u64, delta: i32) -> Result<Cart, StoreError> {
        if delta == 0 {
            return Err(StoreError::InvalidQuantity);
        }
        let token = self.csrf_token();
        let result = self.inner.api.update_cart_item(item_id, delta, &token).await;
        self.store_cart(result, "update item in", true)
    }

    /// Removes an item from the cart.
    pub async fn remove_cart_item(&self, item_id: u64) -> Result<Cart, StoreError> {
        let token = self.csrf_token();
        let result = self.inner.api.remove_cart_item(item_id, &token).await;
        self.store_cart(result, "remove item from", true)
    }

    /// Empties the cart.
    pub async fn clear_cart(&self) -> Result<Cart, StoreError> {
        let token = self.csrf_token();
        let result = self.inner.api.clear_cart(&token).await;
        self.store_cart(result, "clear", true)
    }

    fn store_cart(
        &self,
        result: Result<Cart, StoreError>,
        action: &str,
        changed: bool,
    ) -> Result<Cart, StoreError> {
        match result {
            Ok(cart) => {
                self.inner.write().cart = Some(cart.clone());
                if changed {
                    self.cart_changed();
                }
                Ok(cart)
            }
            Err(e) => {
                error!(error = %e, "failed to {action} cart");
                Err(e)
            }
        }
    }
}
