use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One wallpaper as returned by the search endpoint. Values are kept exactly
/// as the server sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    pub short_url: String,
    pub views: u64,
    pub favorites: u64,
    pub source: String,
    pub purity: String,
    pub category: String,
    pub dimension_x: u32,
    pub dimension_y: u32,
    pub resolution: String,
    pub ratio: String,
    pub file_size: u64,
    pub file_type: String,
    pub created_at: String,
    pub colors: Vec<String>,
    /// Direct URL of the full-size asset.
    pub path: String,
    pub thumbs: ThumbnailSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSet {
    pub small: String,
    pub large: String,
    pub original: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbSize {
    #[default]
    Small,
    Large,
    Original,
}

impl ThumbnailSet {
    pub fn get(&self, size: ThumbSize) -> &str {
        match size {
            ThumbSize::Small => &self.small,
            ThumbSize::Large => &self.large,
            ThumbSize::Original => &self.original,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMeta {
    pub current_page: u32,
    pub last_page: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub per_page: u32,
    pub total: u64,
    #[serde(default, deserialize_with = "echoed_query")]
    pub query: Option<String>,
    /// Present when sorting is random; send it back to keep the order stable.
    #[serde(default)]
    pub seed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub data: Vec<ImageRecord>,
    pub meta: SearchMeta,
}

impl SearchResult {
    pub fn is_last_page(&self) -> bool {
        self.meta.current_page >= self.meta.last_page
    }

    pub fn find(&self, id: &str) -> Option<&ImageRecord> {
        self.data.iter().find(|record| record.id == id)
    }
}

// The live API sends `per_page` as "24" on some endpoints and 24 on others.
fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// Tag lookups echo `query` as an object ({"id": 1, "tag": "anime"}); keep its JSON text.
fn echoed_query<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
