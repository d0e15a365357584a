//! YAML settings.
//!
//! # Storage layout
//!
//! ```text
//! ~/.guidesync/
//!   config.yaml
//! ```
//!
//! Every field carries a default, so a partial file (or none at all) is valid.
//! Command-line overrides are applied by the binary after loading.
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, ...)`: explicit home, used in tests with `TempDir`
//! - `fn(...)`: derives home from `dirs::home_dir()` and delegates to `_at`

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::directives::DirectiveKeys;
use crate::document::HeaderKeys;
use crate::error::{io_err, CoreError};

/// Root of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub publish: PublishSettings,
    pub content: ContentSettings,
    pub directives: DirectiveKeys,
    pub headers: HeaderKeys,
}

/// Remote endpoint, credentials and retry bounds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub url: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
    pub locale: String,
    pub max_attempts: u32,
    pub rate_limit_wait_secs: u64,
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            token: None,
            locale: "en-us".into(),
            max_attempts: 5,
            rate_limit_wait_secs: 60,
            timeout_secs: 30,
        }
    }
}

// Hand-written so the token never reaches a log line.
impl fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "********"))
            .field("locale", &self.locale)
            .field("max_attempts", &self.max_attempts)
            .field("rate_limit_wait_secs", &self.rate_limit_wait_secs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RemoteSettings {
    /// Url, user and token are either all set or all unset.
    pub fn credentials_consistent(&self) -> bool {
        let set = [&self.url, &self.user, &self.token]
            .iter()
            .filter(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
            .count();
        set == 0 || set == 3
    }

    /// All three of url, user and token are set.
    pub fn is_configured(&self) -> bool {
        [&self.url, &self.user, &self.token]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Values applied to articles on creation and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Permission group resolved by name for new articles.
    pub permission_group: Option<String>,
    /// Explicit permission group id; wins over `permission_group`.
    pub permission_group_id: Option<u64>,
    pub comments_disabled: bool,
    /// Overwrite existing categories and sections with local values.
    pub force_update: bool,
}

/// Local tree layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    pub extensions: Vec<String>,
    pub directive_file: String,
    /// Concurrent workers per directory level.
    pub workers: usize,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["adoc".into(), "asciidoc".into()],
            directive_file: ".properties".into(),
            workers: 4,
        }
    }
}

impl ContentSettings {
    /// Directive file name for an optional profile: `.properties.<profile>`.
    pub fn directive_file_name(&self, profile: Option<&str>) -> String {
        match profile.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => format!("{}.{}", self.directive_file, p),
            None => self.directive_file.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// `<home>/.guidesync/config.yaml`. No I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    home.join(".guidesync").join("config.yaml")
}

/// Load settings from an explicit file path.
///
/// Returns `CoreError::SettingsNotFound` if absent,
/// `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_from(path: &Path) -> Result<Settings, CoreError> {
    if !path.exists() {
        return Err(CoreError::SettingsNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `<home>/.guidesync/config.yaml`, falling back to defaults when the
/// file does not exist.
pub fn load_at(home: &Path) -> Result<Settings, CoreError> {
    match load_from(&settings_path_at(home)) {
        Err(CoreError::SettingsNotFound { path }) => {
            tracing::debug!("no settings at {}; using defaults", path.display());
            Ok(Settings::default())
        }
        other => other,
    }
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, CoreError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.remote.max_attempts, 5);
        assert_eq!(s.remote.rate_limit_wait_secs, 60);
        assert_eq!(s.remote.locale, "en-us");
        assert_eq!(s.content.directive_file, ".properties");
        assert_eq!(s.content.extensions, vec!["adoc", "asciidoc"]);
    }

    #[test]
    fn profile_suffixes_directive_file() {
        let c = ContentSettings::default();
        assert_eq!(c.directive_file_name(None), ".properties");
        assert_eq!(c.directive_file_name(Some("  ")), ".properties");
        assert_eq!(c.directive_file_name(Some("staging")), ".properties.staging");
    }

    #[test]
    fn credentials_must_be_all_or_nothing() {
        let mut r = RemoteSettings::default();
        assert!(r.credentials_consistent());
        assert!(!r.is_configured());

        r.url = Some("https://example.zendesk.com".into());
        assert!(!r.credentials_consistent());

        r.user = Some("me@example.com".into());
        r.token = Some("secret".into());
        assert!(r.credentials_consistent());
        assert!(r.is_configured());
    }

    #[test]
    fn debug_masks_token() {
        let r = RemoteSettings {
            token: Some("super-secret".into()),
            ..RemoteSettings::default()
        };
        let dbg = format!("{r:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("********"));
    }
}
