//! Metadata API response shape
//!
//! The upstream returns one flat object. The screenshot slots and genre
//! flags are a family of keys (`screenshot1`..`screenshot9`,
//! `genreRPG`, `genreAction`, ...) collected through `flatten`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of screenshot slots in a response
pub const SCREENSHOT_SLOTS: usize = 9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    /// Zero on success
    #[serde(default)]
    pub error: i64,
    #[serde(default)]
    pub error_desc: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub ps4_store_url: Option<String>,
    #[serde(default)]
    pub ps5_store_url: Option<String>,
    #[serde(default)]
    pub content_rating: Option<String>,
    #[serde(default)]
    pub ps4: serde_json::Value,
    #[serde(default)]
    pub ps5: serde_json::Value,
    #[serde(default)]
    pub ps4_size: serde_json::Value,
    #[serde(default)]
    pub ps5_size: serde_json::Value,
    /// Screenshot slots, genre flags and anything else
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl MetadataResponse {
    /// Non-empty screenshot URLs in slot order
    pub fn screenshots(&self) -> Vec<String> {
        (1..=SCREENSHOT_SLOTS)
            .filter_map(|slot| self.fields.get(&format!("screenshot{slot}")))
            .filter_map(|value| value.as_str())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Whether the `genre<label>` flag is set
    pub fn has_genre_flag(&self, label: &str) -> bool {
        self.fields
            .get(&format!("genre{label}"))
            .is_some_and(is_truthy)
    }
}

/// Flags arrive as booleans, numbers or strings depending on the field
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        ),
        _ => false,
    }
}

/// Install size in bytes; absent, zero or unparsable values are `None`
pub fn parse_size(value: &serde_json::Value) -> Option<i64> {
    let size = match value {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }?;

    (size > 0).then_some(size)
}
