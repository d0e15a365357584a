//! [`ContentApi`] over the help-center REST API, using a blocking `ureq` agent.
//!
//! Every request authenticates with an API token (`{user}/token:{token}` as
//! HTTP Basic). Listings follow `next_page` links until exhausted; a failure
//! on any page fails the whole listing.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use guidesync_core::{
    Article, ArticleId, Category, CategoryDraft, CategoryId, PermissionGroup, Section,
    SectionDraft, SectionId, Translation,
};

use crate::api::ContentApi;
use crate::error::RemoteError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_PAGES: usize = 1_000;

/// Blocking REST implementation of [`ContentApi`].
#[derive(Clone)]
pub struct HttpContentApi {
    agent: ureq::Agent,
    base_url: String,
    locale: String,
    authorization: String,
}

impl std::fmt::Debug for HttpContentApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContentApi")
            .field("base_url", &self.base_url)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

/// One page of a listing: the entity array under its collection key plus the
/// link to the following page.
#[derive(Deserialize)]
struct Page {
    next_page: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl HttpContentApi {
    pub fn new(base_url: &str, user: &str, token: &str) -> Self {
        let credentials = STANDARD.encode(format!("{user}/token:{token}"));
        Self {
            agent: build_agent(DEFAULT_TIMEOUT),
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
            locale: "en-us".into(),
            authorization: format!("Basic {credentials}"),
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.trim().to_lowercase();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn localized(&self, path: &str) -> String {
        self.url(&format!("help_center/{}/{path}", self.locale))
    }

    // -- request helpers ----------------------------------------------------

    fn get(&self, url: &str) -> Result<ureq::Response, RemoteError> {
        tracing::trace!("GET {url}");
        self.agent
            .get(url)
            .set("Authorization", &self.authorization)
            .set("Accept", "application/json")
            .call()
            .map_err(map_error)
    }

    fn send<B: Serialize>(
        &self,
        method: &str,
        url: &str,
        body: &B,
    ) -> Result<ureq::Response, RemoteError> {
        tracing::trace!("{method} {url}");
        let payload = serde_json::to_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        self.agent
            .request(method, url)
            .set("Authorization", &self.authorization)
            .set("Accept", "application/json")
            .send_json(payload)
            .map_err(map_error)
    }

    /// Collect every page of a listing, reading entities from `key`.
    fn list<T: DeserializeOwned>(&self, first: String, key: &str) -> Result<Vec<T>, RemoteError> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;
        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(RemoteError::Decode(format!(
                    "listing {key} exceeded {MAX_PAGES} pages"
                )));
            }
            let mut page: Page = decode(self.get(&url)?)?;
            items.extend(take_entity::<Vec<T>>(&mut page.rest, key)?);
            next = page.next_page.filter(|n| !n.is_empty());
        }
        Ok(items)
    }

    /// Send `{key: body}` and read the entity back from `key`.
    fn write<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        key: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let entity = serde_json::to_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let mut envelope = Map::new();
        envelope.insert(key.to_owned(), entity);
        let mut response: Map<String, Value> = decode(self.send(method, url, &envelope)?)?;
        take_entity(&mut response, key)
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("guidesync/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, RemoteError> {
    response
        .into_json()
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

fn take_entity<T: DeserializeOwned>(
    envelope: &mut Map<String, Value>,
    key: &str,
) -> Result<T, RemoteError> {
    let value = envelope
        .remove(key)
        .ok_or_else(|| RemoteError::Decode(format!("response has no `{key}` field")))?;
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(format!("{key}: {e}")))
}

/// 429 becomes [`RemoteError::RateLimited`] carrying the `Retry-After` value.
fn map_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(429, response) => RemoteError::RateLimited {
            retry_after: response.header("Retry-After").map(str::to_owned),
        },
        ureq::Error::Status(status, response) => {
            let text = response.status_text().to_owned();
            RemoteError::Status {
                status,
                text,
                body: response.into_string().ok().filter(|b| !b.is_empty()),
            }
        }
        ureq::Error::Transport(t) => RemoteError::Transport(t.to_string()),
    }
}

impl ContentApi for HttpContentApi {
    fn list_categories(&self) -> Result<Vec<Category>, RemoteError> {
        self.list(self.localized("categories.json"), "categories")
    }

    fn create_category(&self, draft: &CategoryDraft) -> Result<Category, RemoteError> {
        self.write("POST", &self.localized("categories.json"), "category", draft)
    }

    fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RemoteError> {
        let url = self.url(&format!("help_center/categories/{id}.json"));
        self.write("PUT", &url, "category", draft)
    }

    fn list_sections(&self, category: CategoryId) -> Result<Vec<Section>, RemoteError> {
        let url = self.localized(&format!("categories/{category}/sections.json"));
        self.list(url, "sections")
    }

    fn create_section(&self, draft: &SectionDraft) -> Result<Section, RemoteError> {
        let url = self.localized(&format!("categories/{}/sections.json", draft.category_id));
        self.write("POST", &url, "section", draft)
    }

    fn update_section(&self, id: SectionId, draft: &SectionDraft) -> Result<Section, RemoteError> {
        let url = self.url(&format!("help_center/sections/{id}.json"));
        self.write("PUT", &url, "section", draft)
    }

    fn list_articles(&self, section: SectionId) -> Result<Vec<Article>, RemoteError> {
        let url = self.localized(&format!("sections/{section}/articles.json"));
        self.list(url, "articles")
    }

    fn list_all_articles(&self) -> Result<Vec<Article>, RemoteError> {
        self.list(self.localized("articles.json"), "articles")
    }

    fn create_article(&self, article: &Article) -> Result<Article, RemoteError> {
        let url = self.localized(&format!("sections/{}/articles.json", article.section_id));
        let body = json!({ "article": article, "notify_subscribers": false });
        let mut response: Map<String, Value> = decode(self.send("POST", &url, &body)?)?;
        take_entity(&mut response, "article")
    }

    fn update_article(&self, article: &Article) -> Result<Article, RemoteError> {
        let id = article
            .id
            .ok_or_else(|| RemoteError::Decode("cannot update an article without id".into()))?;
        let url = self.url(&format!("help_center/articles/{id}.json"));
        self.write("PUT", &url, "article", article)
    }

    fn delete_article(&self, id: ArticleId) -> Result<(), RemoteError> {
        let url = self.url(&format!("help_center/articles/{id}.json"));
        tracing::trace!("DELETE {url}");
        self.agent
            .delete(&url)
            .set("Authorization", &self.authorization)
            .call()
            .map(|_| ())
            .map_err(map_error)
    }

    fn list_translations(&self, article: ArticleId) -> Result<Vec<Translation>, RemoteError> {
        let url = self.url(&format!("help_center/articles/{article}/translations.json"));
        self.list(url, "translations")
    }

    fn update_translation(
        &self,
        article: ArticleId,
        translation: &Translation,
    ) -> Result<Translation, RemoteError> {
        let url = self.url(&format!(
            "help_center/articles/{article}/translations/{}.json",
            translation.locale
        ));
        self.write("PUT", &url, "translation", translation)
    }

    fn list_permission_groups(&self) -> Result<Vec<PermissionGroup>, RemoteError> {
        self.list(self.url("guide/permission_groups.json"), "permission_groups")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
