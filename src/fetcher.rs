use regex::Regex;
use reqwest::header;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;

use crate::api::USER_AGENT;
use crate::error::FetchError;
use crate::models::{ImageRecord, ThumbSize};

/// Download the bytes behind an asset URL (thumbnail or full-size image).
pub async fn fetch_bytes(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = http
        .get(url)
        .header(header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(FetchError::NoData(url.to_string()));
    }

    log::debug!("fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

/// File name for the full-size image: the last segment of `path`
/// (`wallhaven-94x38z.jpg`), or `<id>.<ext>` when the path has none.
pub fn file_name_for(record: &ImageRecord) -> Result<String, FetchError> {
    if let Some(name) = last_segment(&record.path) {
        return Ok(name.to_string());
    }

    if record.id.is_empty() || !is_safe_name(&record.id) {
        return Err(FetchError::InvalidPath(record.path.clone()));
    }
    Ok(format!("{}.{}", record.id, extension_for(&record.file_type)))
}

/// Download the full-size image into `dir` and return the written path.
pub async fn save_image(
    http: &reqwest::Client,
    record: &ImageRecord,
    dir: &Path,
) -> Result<PathBuf, FetchError> {
    let name = file_name_for(record)?;
    let bytes = fetch_bytes(http, &record.path).await?;
    let path = write_file(dir, &name, &bytes).await?;
    log::info!("saved {} to {}", record.id, path.display());
    Ok(path)
}

/// Download one of the record's thumbnails into `dir`. All sizes share
/// a file name on the server, so the size is prefixed locally.
pub async fn save_thumbnail(
    http: &reqwest::Client,
    record: &ImageRecord,
    size: ThumbSize,
    dir: &Path,
) -> Result<PathBuf, FetchError> {
    let url = record.thumbs.get(size);
    let name = last_segment(url).ok_or_else(|| FetchError::InvalidPath(url.to_string()))?;
    let prefix = match size {
        ThumbSize::Small => "small",
        ThumbSize::Large => "large",
        ThumbSize::Original => "original",
    };

    let bytes = fetch_bytes(http, url).await?;
    let path = write_file(dir, &format!("thumb-{}-{}", prefix, name), &bytes).await?;
    log::info!("saved {} thumbnail of {} to {}", prefix, record.id, path.display());
    Ok(path)
}

/// Accept a bare wallpaper id or any of the URL forms the site hands out:
/// `https://wallhaven.cc/w/<id>`, `https://whvn.cc/<id>` or a direct asset
/// URL ending in `wallhaven-<id>.<ext>`.
pub fn wallpaper_id_from_input(input: &str) -> Option<String> {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    let [bare, page, asset] = PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^[a-z0-9]{4,12}$").unwrap(),
            Regex::new(r"^(?:https?://)?(?:www\.)?(?:wallhaven\.cc/w|whvn\.cc)/([a-z0-9]+)/?(?:[?#].*)?$")
                .unwrap(),
            Regex::new(r"/wallhaven-([a-z0-9]+)\.[A-Za-z0-9]+(?:[?#].*)?$").unwrap(),
        ]
    });

    let input = input.trim();
    if bare.is_match(input) {
        return Some(input.to_string());
    }
    page.captures(input)
        .or_else(|| asset.captures(input))
        .map(|caps| caps[1].to_string())
}

async fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, FetchError> {
    fs::create_dir_all(dir).await.map_err(|source| FetchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(name);
    fs::write(&path, bytes).await.map_err(|source| FetchError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn last_segment(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && is_safe_name(name))
}

fn is_safe_name(name: &str) -> bool {
    name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn extension_for(file_type: &str) -> &str {
    match file_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        other => other
            .rsplit('/')
            .next()
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin"),
    }
}
