/*
 *  data_source.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cached HTTP data sources for JSON documents and files
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{debug, error, info};
use mini_moka::sync::Cache;
use reqwest::{header, Client};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;

use crate::constants::CACHE_FOLDER;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema mismatch: {0}")]
    Schema(String),
    #[error("cache I/O error: {0}")]
    Cache(#[from] io::Error),
    #[error("bad URL template: {0}")]
    Template(String),
}

/// Template arguments, `{name}` in the URL is replaced by the value
pub type UrlArgs<'a> = &'a [(&'a str, String)];

/// Required shape of a JSON document.
///
/// Only key presence is checked. A list schema applies its single element
/// schema to every item of the list.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Any,
    Object(Vec<(String, Schema)>),
    List(Box<Schema>),
}

impl Schema {
    pub fn object<'a>(fields: impl IntoIterator<Item = (&'a str, Schema)>) -> Self {
        Schema::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    pub fn list(item: Schema) -> Self {
        Schema::List(Box::new(item))
    }

    pub fn check(&self, data: &Value) -> Result<(), DataSourceError> {
        match self {
            Schema::Any => Ok(()),
            Schema::List(item) => {
                let items = data
                    .as_array()
                    .ok_or_else(|| DataSourceError::Schema(format!("expected a list: {}", data)))?;
                items.iter().try_for_each(|value| item.check(value))
            }
            Schema::Object(fields) => {
                for (name, sub) in fields {
                    let value = data
                        .get(name)
                        .ok_or_else(|| DataSourceError::Schema(format!("missing \"{}\" element", name)))?;
                    sub.check(value)?;
                }
                Ok(())
            }
        }
    }
}

/// Shared client with the request timeouts used by every data source
pub fn http_client() -> Result<Client, DataSourceError> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(20))
        .build()?)
}

/// URL template, request headers and the on-disk cache policy.
///
/// Cache frequency: `None` never caches, `Some(0)` keeps the first download
/// forever, otherwise files older than that many seconds are deleted and
/// fetched again.
#[derive(Debug, Clone)]
pub struct DataSource {
    name: String,
    url: Option<String>,
    user_agent: String,
    frequency: Option<u64>,
    cache_folder: PathBuf,
    client: Client,
}

impl DataSource {
    /// URL parts are joined with single slashes. No parts means callers pass
    /// the whole URL to each download.
    pub fn new(name: &str, client: Client, url_parts: &[&str]) -> Self {
        let url = (!url_parts.is_empty()).then(|| {
            url_parts
                .iter()
                .map(|part| part.strip_prefix('/').unwrap_or(*part))
                .collect::<Vec<_>>()
                .join("/")
        });
        Self {
            name: name.to_string(),
            url,
            user_agent: "Mozilla".to_string(),
            frequency: None,
            cache_folder: PathBuf::from(CACHE_FOLDER),
            client,
        }
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn frequency(mut self, secs: u64) -> Self {
        self.frequency = Some(secs);
        self
    }

    pub fn cache_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.cache_folder = folder.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Fill the template (or `url` when the source has none) from `args`
    pub fn resolve_url(&self, url: Option<&str>, args: UrlArgs<'_>) -> Result<String, DataSourceError> {
        let template = url
            .or(self.url.as_deref())
            .ok_or_else(|| DataSourceError::Template(format!("data source \"{}\" needs a URL", self.name)))?;
        let mut resolved = template.to_string();
        for (key, value) in args {
            resolved = resolved.replace(&format!("{{{}}}", key), value);
        }
        if let Some(start) = resolved.find('{') {
            let field: String = resolved[start..].chars().take_while(|&c| c != '}').collect();
            return Err(DataSourceError::Template(format!("unresolved field {}}} in {}", field, template)));
        }
        Ok(resolved)
    }

    /// Flat cache file path for `url`: scheme stripped, escaped, slashes
    /// replaced with underscores.
    pub fn cache_path(&self, url: &str, extension: &str) -> PathBuf {
        let normalized = reqwest::Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string());
        let stripped = match normalized.find("://") {
            Some(pos) => &normalized[pos + 3..],
            None => normalized.as_str(),
        };
        let name = quote(stripped).replace('/', "_");
        self.cache_folder.join(format!("{}{}", name, extension))
    }

    /// True when `path` holds a usable cache file. Expired files are removed.
    pub fn is_fresh(&self, path: &Path) -> bool {
        let Some(frequency) = self.frequency else {
            return false;
        };
        if !path.is_file() {
            return false;
        }
        if frequency > 0 && is_expired(path, frequency) {
            debug!("Cache expired: {}", path.display());
            remove_quietly(path);
            return false;
        }
        true
    }

    /// Cached bytes unless missing, expired or unreadable. Unreadable files
    /// are removed.
    pub fn load_cache(&self, path: &Path) -> Option<Vec<u8>> {
        if !self.is_fresh(path) {
            return None;
        }
        match fs::read(path) {
            Ok(data) => Some(data),
            Err(e) => {
                error!("Data source \"{}\" failed to load cache file \"{}\": {}", self.name, path.display(), e);
                remove_quietly(path);
                None
            }
        }
    }

    pub fn save_cache(&self, path: &Path, data: &[u8]) -> Result<(), DataSourceError> {
        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder)?;
        }
        fs::write(path, data).map_err(|e| {
            remove_quietly(path);
            DataSourceError::Cache(e)
        })
    }

    pub fn is_cached(&self) -> bool {
        self.frequency.is_some()
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, DataSourceError> {
        info!("Download: {}", url);
        let response = self
            .client
            .get(url)
            // NOAA requires a User-Agent, and Accept keeps observation times local
            .header(header::USER_AGENT, &self.user_agent)
            .header(header::ACCEPT, "*/*")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn is_expired(path: &Path, frequency: u64) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > Duration::from_secs(frequency))
}

fn remove_quietly(path: &Path) {
    if path.is_file() {
        let _ = fs::remove_file(path);
    }
}

/// Percent-escape everything but unreserved characters and '/'
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' | b'/' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// JSON REST source with schema check and an in-memory layer over the
/// disk cache.
#[derive(Clone)]
pub struct JsonDataSource {
    source: DataSource,
    schema: Schema,
    memory: Arc<Cache<PathBuf, (SystemTime, Value)>>,
}

impl JsonDataSource {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            schema: Schema::Any,
            memory: Arc::new(Cache::new(32)),
        }
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Document from the cache, or downloaded. Failures are logged and
    /// return None.
    pub async fn download(&self, args: UrlArgs<'_>) -> Option<Value> {
        let url = match self.source.resolve_url(None, args) {
            Ok(url) => url,
            Err(e) => {
                error!("Data source \"{}\": {}", self.source.name, e);
                return None;
            }
        };
        let path = self.source.cache_path(&url, ".json");
        if let Some(data) = self.load_cached(&path) {
            info!("Load cache: {}", path.display());
            return Some(data);
        }
        match self.download_fresh(&url, &path).await {
            Ok(data) => Some(data),
            Err(e) => {
                error!("Data source \"{}\" failed to download data from \"{}\": {}", self.source.name, url, e);
                None
            }
        }
    }

    /// Cached document, parsed once per file modification
    pub fn load_cached(&self, path: &Path) -> Option<Value> {
        if !self.source.is_fresh(path) {
            return None;
        }
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
        if let (Some((stamp, value)), Some(modified)) = (self.memory.get(&path.to_path_buf()), modified) {
            if stamp == modified {
                return Some(value);
            }
        }
        let bytes = self.source.load_cache(path)?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                if let Some(modified) = modified {
                    self.memory.insert(path.to_path_buf(), (modified, value.clone()));
                }
                Some(value)
            }
            Err(e) => {
                error!("Data source \"{}\" failed to load cache file \"{}\": {}", self.source.name, path.display(), e);
                remove_quietly(path);
                None
            }
        }
    }

    async fn download_fresh(&self, url: &str, path: &Path) -> Result<Value, DataSourceError> {
        let raw = self.source.fetch(url).await?;
        self.accept(&raw, path)
    }

    /// Parse, check and cache a downloaded document
    pub fn accept(&self, raw: &[u8], path: &Path) -> Result<Value, DataSourceError> {
        let value: Value = serde_json::from_slice(raw)?;
        self.schema.check(&value)?;
        if self.source.is_cached() {
            let pretty = serde_json::to_vec_pretty(&value)?;
            self.source.save_cache(path, &pretty)?;
        }
        Ok(value)
    }
}

/// Downloads files into the cache folder and hands back their path.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    source: DataSource,
    extension: String,
}

impl FileDataSource {
    pub fn new(source: DataSource, extension: &str) -> Self {
        Self { source, extension: extension.to_string() }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Local path of the file at `url` (or the source template), downloading
    /// it when not cached
    pub async fn download(&self, url: Option<&str>, args: UrlArgs<'_>) -> Option<PathBuf> {
        let url = match self.source.resolve_url(url, args) {
            Ok(url) => url,
            Err(e) => {
                error!("Data source \"{}\": {}", self.source.name, e);
                return None;
            }
        };
        let path = self.source.cache_path(&url, &self.extension);
        if self.source.is_fresh(&path) {
            info!("Load cache: {}", path.display());
            return Some(path);
        }
        let result = match self.source.fetch(&url).await {
            Ok(data) => self.source.save_cache(&path, &data),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => Some(path),
            Err(e) => {
                error!("Data source \"{}\" failed to download data from \"{}\": {}", self.source.name, url, e);
                None
            }
        }
    }
}
