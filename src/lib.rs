pub mod api;
pub mod commands;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod query;
pub mod settings;
pub mod state;

pub use api::{SearchClient, DEFAULT_API_BASE};
pub use error::{FetchError, SearchError, SettingsError};
pub use models::{ImageRecord, SearchMeta, SearchResult, ThumbSize, ThumbnailSet};
pub use query::{Categories, Order, Purity, SearchQuery, Sorting};
pub use state::BrowseState;
