//! Session-scoped novel store.
//!
//! [`NovelStore`] owns the per-year novel lists and the selected year. It is a
//! cheap handle: clones share the same state, so one store can be passed to
//! every component of a session.

mod cart;
#[cfg(test)]
mod fake;

use crate::api::NovelApi;
use crate::config::StoreConfig;
use crate::cookies::CsrfTokenProvider;
use crate::error::{ConfigError, StoreError};
use crate::fallback::{FetchOutcome, resolve_display_list};
use crate::models::{Cart, CartEvent, Novel, YearEntry, YearStatus};
use crate::notify::Notifier;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

/// Capacity of the cart event channel.
const CART_EVENT_CAPACITY: usize = 16;

#[derive(Debug)]
struct StoreState {
    yearly_novels: HashMap<String, YearEntry>,
    years: Vec<String>,
    selected_year: String,
    cart: Option<Cart>,
}

struct Inner {
    api: Arc<dyn NovelApi>,
    csrf: Arc<dyn CsrfTokenProvider>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<StoreState>,
    cart_events: broadcast::Sender<CartEvent>,
}

impl Inner {
    // The lock is never held across an await, so a poisoned lock still holds
    // consistent state.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears a year's loading flag when dropped, including on cancellation.
struct LoadingGuard<'a> {
    inner: &'a Inner,
    year: &'a str,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.inner.write().yearly_novels.get_mut(self.year) {
            entry.loading = false;
        }
    }
}

/// Keyed store of novels per year, plus cart actions.
#[derive(Clone)]
pub struct NovelStore {
    inner: Arc<Inner>,
}

impl NovelStore {
    /// Creates a store with `config.default_year` selected.
    pub fn new(
        api: Arc<dyn NovelApi>,
        csrf: Arc<dyn CsrfTokenProvider>,
        notifier: Arc<dyn Notifier>,
        config: &StoreConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (cart_events, _) = broadcast::channel(CART_EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                api,
                csrf,
                notifier,
                state: RwLock::new(StoreState {
                    yearly_novels: HashMap::new(),
                    years: config.years.clone(),
                    selected_year: config.default_year.clone(),
                    cart: None,
                }),
                cart_events,
            }),
        })
    }

    /// Selectable years.
    pub fn years(&self) -> Vec<String> {
        self.inner.read().years.clone()
    }

    /// Currently selected year.
    pub fn selected_year(&self) -> String {
        self.inner.read().selected_year.clone()
    }

    /// Selects `year` if it is one of the known years; otherwise does nothing.
    ///
    /// Returns whether `year` is now selected.
    pub fn set_selected_year(&self, year: &str) -> bool {
        let mut state = self.inner.write();
        if state.years.iter().any(|y| y == year) {
            state.selected_year = year.to_string();
            true
        } else {
            false
        }
    }

    /// Snapshot of the entry for `year`, if it was ever fetched.
    pub fn year_entry(&self, year: &str) -> Option<YearEntry> {
        self.inner.read().yearly_novels.get(year).cloned()
    }

    /// Load status of `year`.
    pub fn year_status(&self, year: &str) -> YearStatus {
        YearStatus::from(self.inner.read().yearly_novels.get(year))
    }

    fn with_current<T>(&self, f: impl FnOnce(Option<&YearEntry>) -> T) -> T {
        let state = self.inner.read();
        f(state.yearly_novels.get(&state.selected_year))
    }

    /// Novels of the selected year, empty if not loaded.
    pub fn current_novels(&self) -> Vec<Novel> {
        self.with_current(|entry| entry.map(|e| e.novels.clone()).unwrap_or_default())
    }

    /// Whether the selected year is being fetched.
    pub fn current_loading(&self) -> bool {
        self.with_current(|entry| entry.is_some_and(|e| e.loading))
    }

    /// Error of the selected year's last fetch.
    pub fn current_error(&self) -> Option<String> {
        self.with_current(|entry| entry.and_then(|e| e.error.clone()))
    }

    /// The rank 1 novel of the selected year.
    pub fn first_place(&self) -> Option<Novel> {
        self.with_current(|entry| {
            entry.and_then(|e| e.novels.iter().find(|n| n.rank == 1).cloned())
        })
    }

    /// Novels ranked below first, in list order.
    pub fn other_places(&self) -> Vec<Novel> {
        self.with_current(|entry| {
            entry
                .map(|e| e.novels.iter().filter(|n| n.rank > 1).cloned().collect())
                .unwrap_or_default()
        })
    }

    /// Fetches the novels of `year`, or of the selected year when `None` or empty.
    ///
    /// Failures are recorded in the year's entry and never returned. Both a
    /// failure and an empty result leave the fallback list in place.
    pub async fn fetch_novels(&self, year: Option<&str>) {
        let target = match year {
            Some(year) if !year.is_empty() => year.to_string(),
            _ => self.selected_year(),
        };

        {
            let mut state = self.inner.write();
            let entry = state.yearly_novels.entry(target.clone()).or_default();
            entry.loading = true;
            entry.error = None;
        }
        let _guard = LoadingGuard {
            inner: &self.inner,
            year: &target,
        };

        debug!(year = %target, "fetching novels");
        let outcome = match self.inner.api.list_novels(&target).await {
            Ok(novels) => FetchOutcome::Loaded(novels),
            Err(e) => {
                warn!(year = %target, error = %e, "novel fetch failed, using fallback list");
                FetchOutcome::Failed(e.to_string())
            }
        };

        let mut state = self.inner.write();
        let entry = state.yearly_novels.entry(target.clone()).or_default();
        entry.error = outcome.error().map(str::to_string);
        entry.novels = resolve_display_list(&target, outcome);
        // `_guard` is dropped after `state`, so the lock is free by then.
    }

    /// Fetches one novel. Errors are logged and returned.
    pub async fn get_novel_detail(&self, novel_id: u64) -> Result<Novel, StoreError> {
        self.inner.api.novel_detail(novel_id).await.inspect_err(|e| {
            error!(novel_id, error = %e, "failed to fetch novel detail");
        })
    }

    /// Receives a [`CartEvent`] after every successful cart change.
    pub fn subscribe_cart_events(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.cart_events.subscribe()
    }

    fn csrf_token(&self) -> String {
        self.inner.csrf.csrf_token().unwrap_or_default()
    }

    fn cart_changed(&self) {
        // No subscribers is not an error.
        let _ = self.inner.cart_events.send(CartEvent::Updated);
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{FakeApi, Gate, RecordingNotifier, novel, store_with};
    use super::*;
    use crate::fallback::fallback_novels;

    #[test]
    fn test_new_rejects_unknown_default_year() {
        let config = StoreConfig {
            years: vec!["2024".to_string()],
            default_year: "2025".to_string(),
        };
        let result = NovelStore::new(
            Arc::new(FakeApi::default()),
            Arc::new(crate::cookies::StaticCsrfToken::default()),
            Arc::new(RecordingNotifier::default()),
            &config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_set_selected_year() {
        let (store, _, _) = store_with(FakeApi::default());
        assert_eq!(store.selected_year(), "2025");

        assert!(store.set_selected_year("2022"));
        assert_eq!(store.selected_year(), "2022");

        for bad in ["1999", "", "2025 ", "twenty"] {
            assert!(!store.set_selected_year(bad));
            assert_eq!(store.selected_year(), "2022");
        }
    }

    #[tokio::test]
    async fn test_fetch_stores_results_verbatim() {
        let novels = vec![novel(30, 3), novel(10, 1), novel(20, 2)];
        let (store, _, _) = store_with(FakeApi::with_list("2025", novels.clone()));

        store.fetch_novels(Some("2025")).await;

        assert_eq!(store.current_novels(), novels);
        assert_eq!(store.current_error(), None);
        assert!(!store.current_loading());
        assert_eq!(
            store.year_status("2025"),
            YearStatus::Loaded { error: None }
        );
    }

    #[tokio::test]
    async fn test_fetch_defaults_to_selected_year() {
        let novels = vec![novel(1, 1)];
        let (store, api, _) = store_with(FakeApi::with_list("2023", novels.clone()));
        store.set_selected_year("2023");

        store.fetch_novels(None).await;
        store.fetch_novels(Some("")).await;

        assert_eq!(api.requested_years(), vec!["2023", "2023"]);
        assert_eq!(store.current_novels(), novels);
    }

    #[tokio::test]
    async fn test_fetch_failure_uses_fallback() {
        for year in ["2025", "2021"] {
            let (store, _, _) = store_with(FakeApi::failing());

            store.fetch_novels(Some(year)).await;

            let entry = store.year_entry(year).unwrap();
            assert!(entry.error.is_some());
            assert_eq!(entry.novels, fallback_novels(year));
            assert!(!entry.loading);
        }
    }

    #[tokio::test]
    async fn test_empty_result_uses_fallback() {
        let (store, _, _) = store_with(FakeApi::with_list("2025", Vec::new()));

        store.fetch_novels(Some("2025")).await;

        assert_eq!(store.current_novels(), fallback_novels("2025"));
        assert_eq!(store.current_error(), None);
    }

    #[tokio::test]
    async fn test_fetch_clears_previous_error() {
        let (store, api, _) = store_with(FakeApi::failing());
        store.fetch_novels(None).await;
        assert!(store.current_error().is_some());

        api.set_list("2025", vec![novel(5, 1)]);
        api.set_failing(false);
        store.fetch_novels(None).await;
        assert_eq!(store.current_error(), None);
        assert_eq!(store.current_novels(), vec![novel(5, 1)]);
    }

    #[tokio::test]
    async fn test_loading_only_while_in_flight() {
        for failing in [false, true] {
            let fake = FakeApi::with_list("2024", vec![novel(1, 1)]).gated();
            fake.set_failing(failing);
            let (store, api, _) = store_with(fake);
            let gate: &Gate = api.gate();

            assert!(!store.year_entry("2024").is_some_and(|e| e.loading));
            assert_eq!(store.year_status("2024"), YearStatus::NotLoaded);

            let task_store = store.clone();
            let handle = tokio::spawn(async move { task_store.fetch_novels(Some("2024")).await });

            gate.entered.notified().await;
            assert_eq!(store.year_status("2024"), YearStatus::Loading);
            store.set_selected_year("2024");
            assert!(store.current_loading());

            gate.release.notify_one();
            handle.await.unwrap();
            assert!(!store.current_loading());
            assert_eq!(store.current_error().is_some(), failing);
        }
    }

    #[tokio::test]
    async fn test_cancelled_fetch_releases_loading() {
        let (store, api, _) = store_with(FakeApi::with_list("2025", vec![novel(1, 1)]).gated());

        let task_store = store.clone();
        let handle = tokio::spawn(async move { task_store.fetch_novels(None).await });
        api.gate().entered.notified().await;
        assert!(store.current_loading());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(!store.current_loading());
    }

    #[tokio::test]
    async fn test_first_and_other_places() {
        let novels = vec![novel(4, 3), novel(1, 1), novel(2, 2), novel(9, 2)];
        let (store, _, _) = store_with(FakeApi::with_list("2025", novels));

        assert_eq!(store.first_place(), None);
        assert!(store.other_places().is_empty());

        store.fetch_novels(None).await;

        assert_eq!(store.first_place().map(|n| n.id), Some(1));
        let others: Vec<u64> = store.other_places().iter().map(|n| n.id).collect();
        assert_eq!(others, vec![4, 2, 9]);
    }

    #[tokio::test]
    async fn test_first_place_missing() {
        let (store, _, _) = store_with(FakeApi::with_list("2025", vec![novel(2, 2)]));
        store.fetch_novels(None).await;
        assert_eq!(store.first_place(), None);
    }

    #[tokio::test]
    async fn test_getters_follow_selected_year() {
        let fake = FakeApi::with_list("2025", vec![novel(1, 1)]);
        fake.set_list("2024", vec![novel(7, 1)]);
        let (store, _, _) = store_with(fake);

        store.fetch_novels(Some("2025")).await;
        store.fetch_novels(Some("2024")).await;

        assert_eq!(store.first_place().map(|n| n.id), Some(1));
        store.set_selected_year("2024");
        assert_eq!(store.first_place().map(|n| n.id), Some(7));
        store.set_selected_year("2020");
        assert!(store.current_novels().is_empty());
        assert_eq!(store.year_status("2020"), YearStatus::NotLoaded);
    }

    #[tokio::test]
    async fn test_novel_detail() {
        let (store, _, _) = store_with(FakeApi::with_list("2025", vec![novel(3, 1)]));
        assert_eq!(store.get_novel_detail(3).await.unwrap().id, 3);

        let err = store.get_novel_detail(99).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_novel_detail_failure_propagates() {
        let (store, _, _) = store_with(FakeApi::failing());
        assert!(store.get_novel_detail(1).await.is_err());
    }
}
