use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::utils::format::format_recency;

/// Kind of an insight, which also drives its colour on the AI panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    /// Something trending the wrong way.
    Warning,
    /// A suggested action.
    Recommendation,
    /// A threshold breach needing attention now.
    Alert,
    /// Neutral, informational news.
    Info,
}

impl InsightCategory {
    /// All categories, in the order the generator samples them.
    pub const ALL: [InsightCategory; 4] = [
        InsightCategory::Alert,
        InsightCategory::Warning,
        InsightCategory::Recommendation,
        InsightCategory::Info,
    ];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::Warning => "warning",
            InsightCategory::Recommendation => "recommendation",
            InsightCategory::Alert => "alert",
            InsightCategory::Info => "info",
        }
    }

    /// Icon key the panel shows for freshly generated insights of this kind.
    pub fn default_icon(&self) -> &'static str {
        match self {
            InsightCategory::Alert => "alert-triangle",
            InsightCategory::Warning => "clock",
            InsightCategory::Recommendation => "truck",
            InsightCategory::Info => "trending-up",
        }
    }
}

impl fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Insight Event
///
/// One entry of the AI insight panel. Never mutated after creation; the
/// ledger takes ownership once the event is emitted.
///
/// Field names on the wire follow the front end (`type`, `icon`, `timestamp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightEvent {
    /// Process-unique identifier. Consumers key UI tracking on it.
    pub id: String,
    /// Kind of insight.
    #[serde(rename = "type")]
    pub category: InsightCategory,
    /// Icon key, e.g. `alert-triangle`.
    #[serde(rename = "icon")]
    pub icon_key: String,
    /// Human readable message.
    pub message: String,
    /// Optional highlighted figure such as `₹ 18.5 Lakhs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Recency string at emission time, e.g. `Just now`.
    #[serde(rename = "timestamp")]
    pub emitted_at: String,
    /// When the insight was created.
    pub created_at: DateTime<Utc>,
}

impl InsightEvent {
    /// Re-renders the recency string relative to `now`.
    pub fn recency_at(&self, now: DateTime<Utc>) -> String {
        let elapsed = (now - self.created_at).to_std().unwrap_or_default();
        format_recency(elapsed)
    }

    /// Copy of this event with `emitted_at` refreshed relative to `now`.
    pub fn refreshed(&self, now: DateTime<Utc>) -> InsightEvent {
        InsightEvent {
            emitted_at: self.recency_at(now),
            ..self.clone()
        }
    }
}

/// Immutable, newest-first view of the insight ledger.
pub type InsightSnapshot = Arc<[InsightEvent]>;
