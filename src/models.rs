//! Data types shared by the store and the backend API.

use serde::{Deserialize, Deserializer, Serialize};

/// A ranked novel as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Novel {
    pub id: u64,
    pub name: String,
    pub author: String,
    pub publisher: String,
    /// Position within its year, 1 is first place.
    pub rank: u32,
    #[serde(deserialize_with = "decimal")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// Per-year bundle of novels, loading flag, and error message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearEntry {
    pub novels: Vec<Novel>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Load status of a single year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearStatus {
    /// No fetch has been started for this year.
    NotLoaded,
    /// A fetch is in flight.
    Loading,
    /// The last fetch finished, possibly with an error.
    Loaded { error: Option<String> },
}

impl From<Option<&YearEntry>> for YearStatus {
    fn from(entry: Option<&YearEntry>) -> Self {
        match entry {
            None => YearStatus::NotLoaded,
            Some(entry) if entry.loading => YearStatus::Loading,
            Some(entry) => YearStatus::Loaded {
                error: entry.error.clone(),
            },
        }
    }
}

/// Server-side cart contents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cart {
    pub id: u64,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default, deserialize_with = "decimal")]
    pub total_amount: f64,
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartItem {
    pub id: u64,
    pub novel: Novel,
    pub quantity: u32,
    #[serde(deserialize_with = "decimal")]
    pub subtotal: f64,
}

/// Response of the novel list endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct NovelList {
    #[serde(default)]
    pub results: Vec<Novel>,
}

/// Signal broadcast to other components when the cart changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    Updated,
}

/// Accepts decimals rendered either as JSON numbers or as strings like `"89.00"`.
fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
