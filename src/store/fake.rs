//! In-memory backend, token source and notifier for store tests.

use super::NovelStore;
use crate::api::NovelApi;
use crate::config::StoreConfig;
use crate::cookies::CsrfTokenProvider;
use crate::error::StoreError;
use crate::models::{Cart, CartItem, Novel};
use crate::notify::{NotificationKind, Notifier};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub(crate) fn novel(id: u64, rank: u32) -> Novel {
    Novel {
        id,
        name: format!("Novel {id}"),
        author: format!("Author {id}"),
        publisher: "Publisher".to_string(),
        rank,
        price: 10.0 + id as f64,
        year: None,
    }
}

/// Builds a store over `fake`, which also serves as the CSRF token source.
pub(crate) fn store_with(fake: FakeApi) -> (NovelStore, Arc<FakeApi>, Arc<RecordingNotifier>) {
    let fake = Arc::new(fake);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = NovelStore::new(
        fake.clone(),
        fake.clone(),
        notifier.clone(),
        &StoreConfig::default(),
    )
    .unwrap();
    (store, fake, notifier)
}

/// Lets a test hold a list request in flight.
#[derive(Default)]
pub(crate) struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CartCall {
    Add { novel_id: u64, quantity: u32, token: String },
    Update { item_id: u64, delta: i32, token: String },
    Remove { item_id: u64, token: String },
    Clear { token: String },
}

pub(crate) struct FakeApi {
    lists: Mutex<HashMap<String, Vec<Novel>>>,
    failing: AtomicBool,
    gate: Option<Gate>,
    requested: Mutex<Vec<String>>,
    calls: Mutex<Vec<CartCall>>,
    items: Mutex<Vec<CartItem>>,
    next_item_id: AtomicU64,
    token: Mutex<Option<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            lists: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            gate: None,
            requested: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            items: Mutex::new(Vec::new()),
            next_item_id: AtomicU64::new(1),
            token: Mutex::new(Some("test-token".to_string())),
        }
    }
}

impl FakeApi {
    pub fn with_list(year: &str, novels: Vec<Novel>) -> Self {
        let fake = Self::default();
        fake.set_list(year, novels);
        fake
    }

    pub fn failing() -> Self {
        let fake = Self::default();
        fake.set_failing(true);
        fake
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Gate::default());
        self
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("fake is not gated")
    }

    pub fn set_list(&self, year: &str, novels: Vec<Novel>) {
        self.lists.lock().unwrap().insert(year.to_string(), novels);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(str::to_string);
    }

    pub fn requested_years(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn cart_calls(&self) -> Vec<CartCall> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, context: &str) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(status_error(context, StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(())
    }

    fn find_novel(&self, novel_id: u64) -> Option<Novel> {
        self.lists
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|n| n.id == novel_id)
            .cloned()
    }

    fn record(&self, call: CartCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn snapshot(&self) -> Cart {
        let items = self.items.lock().unwrap().clone();
        Cart {
            id: 1,
            total_items: items.iter().map(|i| i.quantity).sum(),
            total_amount: items.iter().map(|i| i.subtotal).sum(),
            items,
        }
    }

    fn adjust(&self, item_id: u64, delta: i32) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap();
        let index = items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| status_error("Failed to update cart item", StatusCode::NOT_FOUND))?;

        let quantity = items[index].quantity as i64 + delta as i64;
        if quantity <= 0 {
            items.remove(index);
        } else {
            let item = &mut items[index];
            item.quantity = quantity as u32;
            item.subtotal = item.novel.price * item.quantity as f64;
        }
        Ok(())
    }
}

fn status_error(context: &str, status: StatusCode) -> StoreError {
    StoreError::Status {
        context: context.to_string(),
        status,
        body: String::new(),
    }
}

#[async_trait]
impl NovelApi for FakeApi {
    async fn list_novels(&self, year: &str) -> Result<Vec<Novel>, StoreError> {
        self.requested.lock().unwrap().push(year.to_string());
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.check("Failed to fetch novels")?;
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(year)
            .cloned()
            .unwrap_or_default())
    }

    async fn novel_detail(&self, novel_id: u64) -> Result<Novel, StoreError> {
        self.check("Failed to fetch novel detail")?;
        self.find_novel(novel_id)
            .ok_or_else(|| status_error("Failed to fetch novel detail", StatusCode::NOT_FOUND))
    }

    async fn add_cart_item(
        &self,
        novel_id: u64,
        quantity: u32,
        csrf_token: &str,
    ) -> Result<(), StoreError> {
        self.record(CartCall::Add {
            novel_id,
            quantity,
            token: csrf_token.to_string(),
        });
        self.check("Failed to add to cart")?;

        let novel = self
            .find_novel(novel_id)
            .ok_or_else(|| status_error("Failed to add to cart", StatusCode::NOT_FOUND))?;
        let mut items = self.items.lock().unwrap();
        match items.iter_mut().find(|i| i.novel.id == novel_id) {
            Some(item) => {
                item.quantity += quantity;
                item.subtotal = item.novel.price * item.quantity as f64;
            }
            None => items.push(CartItem {
                id: self.next_item_id.fetch_add(1, Ordering::SeqCst),
                subtotal: novel.price * quantity as f64,
                novel,
                quantity,
            }),
        }
        Ok(())
    }

    async fn cart(&self) -> Result<Cart, StoreError> {
        self.check("Failed to fetch cart")?;
        Ok(self.snapshot())
    }

    async fn update_cart_item(
        &self,
        item_id: u64,
        delta: i32,
        csrf_token: &str,
    ) -> Result<Cart, StoreError> {
        self.record(CartCall::Update {
            item_id,
            delta,
            token: csrf_token.to_string(),
        });
        self.check("Failed to update cart item")?;
        self.adjust(item_id, delta)?;
        Ok(self.snapshot())
    }

    async fn remove_cart_item(&self, item_id: u64, csrf_token: &str) -> Result<Cart, StoreError> {
        self.record(CartCall::Remove {
            item_id,
            token: csrf_token.to_string(),
        });
        self.check("Failed to remove cart item")?;
        self.items.lock().unwrap().retain(|i| i.id != item_id);
        Ok(self.snapshot())
    }

    async fn clear_cart(&self, csrf_token: &str) -> Result<Cart, StoreError> {
        self.record(CartCall::Clear {
            token: csrf_token.to_string(),
        });
        self.check("Failed to clear cart")?;
        self.items.lock().unwrap().clear();
        Ok(self.snapshot())
    }
}

impl CsrfTokenProvider for FakeApi {
    fn csrf_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notifications: Mutex<Vec<(String, NotificationKind)>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<(String, NotificationKind)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        self.notifications
            .lock()
            .unwrap()
            .push((message.to_string(), kind));
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}
