use anyhow::{bail, Context as _, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::{SearchClient, DEFAULT_API_BASE};
use crate::error::SearchError;
use crate::fetcher;
use crate::models::{ImageRecord, SearchResult, ThumbSize};
use crate::query::{Categories, Order, Purity, SearchQuery, Sorting};
use crate::settings::{self, AppSettings};
use crate::state::BrowseState;

/// Everything a command needs: the loaded settings, where they live, and a
/// client pointed at the configured API base.
pub struct Session {
    pub settings: AppSettings,
    pub settings_path: PathBuf,
    pub client: SearchClient,
}

impl Session {
    pub fn load(settings_path: Option<PathBuf>) -> Result<Self> {
        let settings_path = match settings_path {
            Some(path) => path,
            None => settings::default_settings_path()?,
        };
        let settings = settings::load_settings(&settings_path)
            .with_context(|| format!("loading {}", settings_path.display()))?;
        // A broken stored base must not lock out `config set-base`.
        let client = match SearchClient::with_base(&settings.api_base) {
            Ok(client) => client,
            Err(err) => {
                log::warn!("{}, falling back to {}", err, DEFAULT_API_BASE);
                SearchClient::new()
            }
        };

        Ok(Self {
            settings,
            settings_path,
            client,
        })
    }

    /// Explicit key first, then the environment, then the stored key.
    pub fn api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.settings.effective_api_key())
    }
}

/// Search filters given on the command line; unset fields fall back to the
/// configured default query.
#[derive(Debug, Clone, Default)]
pub struct QueryOverrides {
    pub query: Option<String>,
    pub categories: Option<Categories>,
    pub purity: Option<Purity>,
    pub sorting: Option<Sorting>,
    pub order: Option<Order>,
    pub page: Option<u32>,
    pub seed: Option<String>,
}

impl QueryOverrides {
    pub fn apply(self, base: &SearchQuery) -> SearchQuery {
        SearchQuery {
            query: self.query.unwrap_or_else(|| base.query.clone()),
            categories: self.categories.unwrap_or(base.categories),
            purity: self.purity.unwrap_or(base.purity),
            sorting: self.sorting.unwrap_or(base.sorting),
            order: self.order.unwrap_or(base.order),
            page: self.page.unwrap_or(1),
            seed: self.seed,
        }
    }
}

/// Fetch `pages` consecutive pages starting at `query.page`, stopping early
/// at the last page.
pub async fn search_pages(
    client: &SearchClient,
    query: SearchQuery,
    api_key: Option<&str>,
    pages: u32,
) -> Result<Vec<SearchResult>> {
    let start = query.page;
    let mut state = BrowseState::new(query);
    let request = state.go_to(start).ok_or(SearchError::InvalidPage(start))?;

    let mut results = Vec::new();
    let mut result = client.search(&request, api_key).await?;
    loop {
        state.apply(&result);
        results.push(result);
        if (results.len() as u32) >= pages {
            break;
        }
        let Some(next) = state.next_page() else {
            break;
        };
        result = client.search(&next, api_key).await?;
    }

    Ok(results)
}

pub async fn run_search(
    session: &Session,
    overrides: QueryOverrides,
    api_key: Option<&str>,
    pages: u32,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let query = overrides.apply(&session.settings.default_query);
    let api_key = session.api_key(api_key);
    let results = search_pages(&session.client, query, api_key.as_deref(), pages.max(1)).await?;

    if json {
        // The document shape follows the request, not how many pages came back.
        let value = if pages <= 1 {
            serde_json::to_value(&results[0])?
        } else {
            serde_json::to_value(&results)?
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    for result in &results {
        for record in &result.data {
            writeln!(out, "{}", format_record(record))?;
        }
        writeln!(
            out,
            "-- page {} of {} ({} total)",
            result.meta.current_page, result.meta.last_page, result.meta.total
        )?;
    }
    Ok(())
}

/// What `run_save` should download from the searched page.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Bare ids or wallhaven URLs.
    pub ids: Vec<String>,
    pub all: bool,
    /// Save this thumbnail size instead of the full image.
    pub thumb: Option<ThumbSize>,
    pub dir: Option<PathBuf>,
}

/// Run the search and download the matching records of the returned page.
/// Returns the written paths.
pub async fn run_save(
    session: &Session,
    overrides: QueryOverrides,
    api_key: Option<&str>,
    options: SaveOptions,
    out: &mut impl Write,
) -> Result<Vec<PathBuf>> {
    if options.ids.is_empty() && !options.all {
        bail!("nothing to save: pass wallpaper ids or --all");
    }

    let wanted = options
        .ids
        .iter()
        .map(|input| {
            fetcher::wallpaper_id_from_input(input)
                .with_context(|| format!("{:?} is not a wallpaper id or url", input))
        })
        .collect::<Result<Vec<_>>>()?;

    let query = overrides.apply(&session.settings.default_query);
    let api_key = session.api_key(api_key);
    let result = session.client.search(&query, api_key.as_deref()).await?;

    for id in &wanted {
        if result.find(id).is_none() {
            writeln!(out, "{} is not on page {}, skipped", id, result.meta.current_page)?;
            log::warn!("{} not found in search results", id);
        }
    }

    let dir = options
        .dir
        .unwrap_or_else(|| session.settings.resolved_save_dir());
    let mut saved = Vec::new();
    for record in select_records(&result, &wanted, options.all) {
        let path = save_one(&session.client, record, options.thumb, &dir).await?;
        writeln!(out, "{} -> {}", record.id, path.display())?;
        saved.push(path);
    }
    Ok(saved)
}

async fn save_one(
    client: &SearchClient,
    record: &ImageRecord,
    thumb: Option<ThumbSize>,
    dir: &Path,
) -> Result<PathBuf> {
    let path = match thumb {
        Some(size) => fetcher::save_thumbnail(client.http(), record, size, dir).await?,
        None => fetcher::save_image(client.http(), record, dir).await?,
    };
    Ok(path)
}

/// Records of `result` to save, in server order.
pub fn select_records<'a>(result: &'a SearchResult, ids: &[String], all: bool) -> Vec<&'a ImageRecord> {
    result
        .data
        .iter()
        .filter(|record| all || ids.iter().any(|id| id == &record.id))
        .collect()
}

pub fn format_record(record: &ImageRecord) -> String {
    format!(
        "{}  {:>9}  {:<7}  {:<7}  {:>6} fav  {}",
        record.id,
        record.resolution,
        record.category,
        record.purity,
        record.favorites,
        record.short_url
    )
}

#[derive(Debug, Clone)]
pub enum ConfigAction {
    Show,
    SetKey(String),
    ClearKey,
    SetDir(PathBuf),
    SetBase(String),
    SetDefaults(QueryOverrides),
}

pub fn run_config(session: &mut Session, action: ConfigAction, out: &mut impl Write) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut shown = session.settings.clone();
            if let Some(key) = shown.api_key.as_mut() {
                *key = mask_key(key);
            }
            writeln!(out, "# {}", session.settings_path.display())?;
            writeln!(out, "{}", serde_json::to_string_pretty(&shown)?)?;
            return Ok(());
        }
        ConfigAction::SetKey(key) => {
            if key.is_empty() {
                bail!("API key must not be empty; use clear-key to remove it");
            }
            session.settings.api_key = Some(key);
        }
        ConfigAction::ClearKey => session.settings.api_key = None,
        ConfigAction::SetDir(dir) => session.settings.save_dir = Some(dir),
        ConfigAction::SetBase(base) => {
            session.client = SearchClient::with_base(&base)?;
            session.settings.api_base = base;
        }
        ConfigAction::SetDefaults(overrides) => {
            let current = session.settings.default_query.clone();
            session.settings.default_query = overrides.apply(&current);
            session.settings.default_query.seed = None;
        }
    }

    settings::save_settings(&session.settings_path, &session.settings)?;
    writeln!(out, "saved {}", session.settings_path.display())?;
    Ok(())
}

fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}…", visible)
}
