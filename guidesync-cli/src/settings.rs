//! Settings loading, command-line overrides and validation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use thiserror::Error;

use guidesync_client::{FlatRetry, HttpContentApi, ResilientClient};
use guidesync_core::config::{self, RemoteSettings};
use guidesync_core::{GroupId, Settings};
use guidesync_sync::{Mode, PublishOptions, SyncOptions};

/// Placeholder endpoint for print-only runs, which never issue a request.
const OFFLINE_URL: &str = "http://localhost";

/// Remote endpoint and credential flags shared by `sync` and `delete-all`.
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    /// Base url of the help center, e.g. https://example.zendesk.com.
    #[arg(long)]
    pub url: Option<String>,

    /// Account the API token belongs to.
    #[arg(long)]
    pub user: Option<String>,

    /// API token.
    #[arg(long, env = "GUIDESYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Attempts per remote operation before giving up on it.
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl RemoteArgs {
    pub fn apply(&self, remote: &mut RemoteSettings) {
        if let Some(url) = &self.url {
            remote.url = Some(url.clone());
        }
        if let Some(user) = &self.user {
            remote.user = Some(user.clone());
        }
        if let Some(token) = &self.token {
            remote.token = Some(token.clone());
        }
        if let Some(n) = self.max_attempts {
            remote.max_attempts = n;
        }
    }
}

/// The remote client could not be constructed from valid-looking settings.
#[derive(Debug, Error)]
#[error("cannot initialise remote client for '{url}': {reason}")]
pub struct ClientInitError {
    pub url: String,
    pub reason: String,
}

/// Load the explicit settings file, or `~/.guidesync/config.yaml` when none
/// is given.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => config::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => config::load().context("failed to load settings"),
    }
}

/// Check the remote settings. `needs_remote` is set for every run that
/// talks to the store.
pub fn validate(remote: &RemoteSettings, needs_remote: bool) -> Result<()> {
    if !remote.credentials_consistent() {
        bail!("url, user and token must be given together");
    }
    if needs_remote && !remote.is_configured() {
        bail!("url, user and token are required to publish, clean or delete");
    }
    if remote.max_attempts == 0 {
        bail!("max_attempts must be at least 1");
    }
    Ok(())
}

/// Log the settings a run uses. The token is masked by `RemoteSettings`'s
/// `Debug` impl.
pub fn log_effective(settings: &Settings) {
    tracing::info!("effective remote settings: {:?}", settings.remote);
    tracing::debug!("effective publish settings: {:?}", settings.publish);
    tracing::debug!("effective content settings: {:?}", settings.content);
}

/// Build the resilient HTTP client. Print-only runs without credentials get
/// a placeholder that is never called.
pub fn build_client(
    remote: &RemoteSettings,
    mode: Mode,
) -> Result<ResilientClient<HttpContentApi>, ClientInitError> {
    let (url, user, token) = match (&remote.url, &remote.user, &remote.token) {
        (Some(url), Some(user), Some(token)) => (url.as_str(), user.as_str(), token.as_str()),
        _ if mode == Mode::PrintOnly => (OFFLINE_URL, "", ""),
        _ => {
            return Err(ClientInitError {
                url: remote.url.clone().unwrap_or_default(),
                reason: "missing credentials".into(),
            })
        }
    };
    let url = url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ClientInitError {
            url: url.to_owned(),
            reason: "url must start with http:// or https://".into(),
        });
    }

    let api = HttpContentApi::new(url, user, token)
        .with_locale(&remote.locale)
        .with_timeout(Duration::from_secs(remote.timeout_secs));
    let policy = FlatRetry::new(remote.max_attempts)
        .with_default_wait(Duration::from_secs(remote.rate_limit_wait_secs));
    Ok(ResilientClient::new(Arc::new(api), policy))
}

/// Walk options for a sync run.
pub fn sync_options(
    settings: &Settings,
    mode: Mode,
    clean: bool,
    profile: Option<&str>,
) -> SyncOptions {
    SyncOptions {
        mode,
        clean,
        force_update: settings.publish.force_update,
        workers: settings.content.workers,
        extensions: settings.content.extensions.clone(),
        directive_file: settings.content.directive_file_name(profile),
        directive_keys: settings.directives.clone(),
        header_keys: settings.headers.clone(),
        publish: PublishOptions {
            permission_group_id: settings.publish.permission_group_id.map(GroupId),
            permission_group: settings.publish.permission_group.clone(),
            comments_disabled: settings.publish.comments_disabled,
            locale: settings.remote.locale.clone(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
