//! Novelshelf - client-side store for a yearly novel ranking shop.
//!
//! This library provides functionality for:
//! - Fetching year-scoped novel rankings from the shop backend
//! - Falling back to built-in lists when the backend has nothing usable
//! - Adding novels to the session cart and managing its contents

pub mod api;
pub mod config;
pub mod console;
pub mod cookies;
pub mod error;
pub mod fallback;
pub mod logger;
pub mod models;
pub mod notify;
pub mod store;

// Re-export commonly used types
pub use api::{HttpNovelApi, NovelApi};
pub use config::Config;
pub use console::Console;
pub use cookies::{CsrfTokenProvider, JarCsrfToken, StaticCsrfToken};
pub use error::{ConfigError, LoggerError, StoreError};
pub use fallback::{FetchOutcome, fallback_novels, resolve_display_list};
pub use models::{Cart, CartEvent, CartItem, Novel, YearEntry, YearStatus};
pub use notify::{ConsoleNotifier, NotificationKind, Notifier};
pub use store::NovelStore;
