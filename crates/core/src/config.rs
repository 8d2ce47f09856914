//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the clients,
//! the webhook service and the bulk synchronizer. Nothing below the entry points reads
//! process-wide environment variables; `SyncConfig::from_lookup` takes the lookup as a
//! function so tests can feed a plain map.

use crate::constants::{
    DEFAULT_ATTACHMENT_DELAY_MS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LISTEN_ADDR,
    DEFAULT_MEMOS_PAGE_SIZE, DEFAULT_NOTION_API_BASE, DEFAULT_NOTION_DELAY_MS,
};
use crate::{SyncError, SyncResult};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_MEMOS_API_BASE: &str = "MEMOS_API_BASE";
pub const ENV_MEMOS_API_TOKEN: &str = "MEMOS_API_TOKEN";
pub const ENV_NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const ENV_NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";
pub const ENV_NOTION_API_BASE: &str = "NOTION_API_BASE";
pub const ENV_R2_PUBLIC_DOMAIN: &str = "R2_PUBLIC_DOMAIN";
pub const ENV_MEMOS_FILTER: &str = "MEMOS_FILTER";
pub const ENV_MEMOS_PAGE_SIZE: &str = "MEMOS_PAGE_SIZE";
pub const ENV_NOTION_DELAY_MS: &str = "NOTION_DELAY_MS";
pub const ENV_NOTION_UPDATE_EXISTING: &str = "NOTION_UPDATE_EXISTING";
pub const ENV_WEBHOOK_ATTACHMENT_DELAY_MS: &str = "WEBHOOK_ATTACHMENT_DELAY_MS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_LISTEN_ADDR: &str = "MEMOSYNC_ADDR";

/// Connection settings for the Memos API, as configured (possibly incomplete).
#[derive(Clone, Debug, Default)]
pub struct MemosConfig {
    api_base: Option<String>,
    api_token: Option<String>,
}

/// A Memos configuration that passed [`MemosConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemosEndpoint {
    pub base: String,
    pub token: String,
}

impl MemosConfig {
    pub fn new(api_base: Option<String>, api_token: Option<String>) -> Self {
        Self {
            api_base: non_empty(api_base),
            api_token: non_empty(api_token),
        }
    }

    /// Check that the base URL is an http(s) URL and a token is present.
    ///
    /// Returns every problem found rather than stopping at the first, so callers can
    /// log the full picture when they skip a Memos call.
    pub fn validate(&self) -> Result<MemosEndpoint, Vec<String>> {
        let mut errors = Vec::new();

        match &self.api_base {
            None => errors.push(format!("missing {ENV_MEMOS_API_BASE}")),
            Some(base) if !(base.starts_with("http://") || base.starts_with("https://")) => {
                errors.push(format!("{ENV_MEMOS_API_BASE} must be an http/https URL"))
            }
            Some(_) => {}
        }
        if self.api_token.is_none() {
            errors.push(format!("missing {ENV_MEMOS_API_TOKEN}"));
        }

        match (&self.api_base, &self.api_token) {
            (Some(base), Some(token)) if errors.is_empty() => Ok(MemosEndpoint {
                base: trim_trailing_slash(base).to_string(),
                token: token.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Connection settings for the Notion API.
#[derive(Clone, Debug)]
pub struct NotionConfig {
    token: Option<String>,
    database_id: Option<String>,
    api_base: String,
}

impl NotionConfig {
    pub fn new(token: Option<String>, database_id: Option<String>, api_base: Option<String>) -> Self {
        let api_base = non_empty(api_base).unwrap_or_else(|| DEFAULT_NOTION_API_BASE.to_string());
        Self {
            token: non_empty(token),
            database_id: non_empty(database_id),
            api_base: trim_trailing_slash(&api_base).to_string(),
        }
    }

    pub fn token(&self) -> SyncResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| SyncError::InvalidConfig(format!("missing {ENV_NOTION_TOKEN}")))
    }

    pub fn database_id(&self) -> SyncResult<&str> {
        self.database_id
            .as_deref()
            .ok_or_else(|| SyncError::InvalidConfig(format!("missing {ENV_NOTION_DATABASE_ID}")))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

/// Options that only the bulk synchronizer uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkOptions {
    pub filter: Option<String>,
    pub page_size: u32,
    pub write_delay: Duration,
    pub update_existing: bool,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            filter: None,
            page_size: DEFAULT_MEMOS_PAGE_SIZE,
            write_delay: Duration::from_millis(DEFAULT_NOTION_DELAY_MS),
            update_existing: false,
        }
    }
}

/// Full configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub memos: MemosConfig,
    pub notion: NotionConfig,
    /// Public domain that R2 storage URLs are rewritten to.
    pub public_domain: Option<String>,
    pub bulk: BulkOptions,
    /// Wait before the webhook path re-fetches a memo's attachments.
    pub attachment_delay: Duration,
    pub http_timeout: Duration,
    pub listen_addr: String,
}

impl SyncConfig {
    /// Build the configuration from a key lookup (normally `std::env::var`).
    ///
    /// Empty values are treated as unset. Malformed numbers are rejected.
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bulk = BulkOptions {
            filter: non_empty(lookup(ENV_MEMOS_FILTER)),
            page_size: parse_number(&lookup, ENV_MEMOS_PAGE_SIZE, DEFAULT_MEMOS_PAGE_SIZE)?,
            write_delay: Duration::from_millis(parse_number(
                &lookup,
                ENV_NOTION_DELAY_MS,
                DEFAULT_NOTION_DELAY_MS,
            )?),
            update_existing: lookup(ENV_NOTION_UPDATE_EXISTING).as_deref() == Some("true"),
        };

        Ok(Self {
            memos: MemosConfig::new(lookup(ENV_MEMOS_API_BASE), lookup(ENV_MEMOS_API_TOKEN)),
            notion: NotionConfig::new(
                lookup(ENV_NOTION_TOKEN),
                lookup(ENV_NOTION_DATABASE_ID),
                lookup(ENV_NOTION_API_BASE),
            ),
            public_domain: non_empty(lookup(ENV_R2_PUBLIC_DOMAIN)),
            bulk,
            attachment_delay: Duration::from_millis(parse_number(
                &lookup,
                ENV_WEBHOOK_ATTACHMENT_DELAY_MS,
                DEFAULT_ATTACHMENT_DELAY_MS,
            )?),
            http_timeout: Duration::from_secs(parse_number(
                &lookup,
                ENV_HTTP_TIMEOUT_SECS,
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            listen_addr: non_empty(lookup(ENV_LISTEN_ADDR))
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> SyncResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup(key)) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| SyncError::InvalidConfig(format!("{key} must be a non-negative integer, got {raw:?}"))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}
