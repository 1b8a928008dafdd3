//! Built-in novel lists shown when the backend returns nothing usable.

use crate::models::Novel;

/// Result of a list fetch, before fallback is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The backend answered with this list (possibly empty).
    Loaded(Vec<Novel>),
    /// The request failed with this message.
    Failed(String),
}

impl FetchOutcome {
    /// Returns the failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            FetchOutcome::Loaded(_) => None,
            FetchOutcome::Failed(message) => Some(message),
        }
    }
}

/// Picks the list to display for `year`.
///
/// Failures and empty successes both degrade to [`fallback_novels`].
pub fn resolve_display_list(year: &str, outcome: FetchOutcome) -> Vec<Novel> {
    match outcome {
        FetchOutcome::Loaded(novels) if !novels.is_empty() => novels,
        FetchOutcome::Loaded(_) | FetchOutcome::Failed(_) => fallback_novels(year),
    }
}

/// Returns the static list for `year`. Only 2025 has data.
pub fn fallback_novels(year: &str) -> Vec<Novel> {
    if year != "2025" {
        return Vec::new();
    }

    [
        (
            1,
            "負けヒロインが多すぎる！",
            "雨森たきび(著) / いみぎむる(イラスト)",
            "ガガガ文庫 / 小学館 (全8巻)",
            89.0,
        ),
        (2, "誰が勇者を殺したか", "駄犬", "KADOKAWA (スニーカー文庫)", 75.0),
        (
            3,
            "時々ボソッとロシア語でデレる隣のアーリャさん",
            "燦々SUN",
            "KADOKAWA (角川スニーカー文庫)",
            68.0,
        ),
        (4, "こちら、終末停滞委員会。", "逢縁奇演", "KADOKAWA (電撃文庫)", 59.0),
        (
            5,
            "お隣の天使様にいつの間にか駄目人間にされていた件",
            "佐伯さん",
            "SBクリエイティブ (GA文庫)",
            85.0,
        ),
    ]
    .into_iter()
    .map(|(rank, name, author, publisher, price)| Novel {
        id: u64::from(rank),
        name: name.to_string(),
        author: author.to_string(),
        publisher: publisher.to_string(),
        rank,
        price,
        year: None,
    })
    .collect()
}
