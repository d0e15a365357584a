//! In-memory [`ContentApi`] with call recording and fault injection, plus a
//! simulated clock. Compiled for tests and under the `testing` feature.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use guidesync_core::{
    Article, ArticleId, Category, CategoryDraft, CategoryId, GroupId, PermissionGroup, Section,
    SectionDraft, SectionId, Translation,
};

use crate::api::ContentApi;
use crate::error::RemoteError;
use crate::retry::Sleeper;

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

/// Simulated clock: records requested sleeps instead of blocking.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Simulated time elapsed so far.
    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

// ---------------------------------------------------------------------------
// InMemoryContentApi
// ---------------------------------------------------------------------------

/// One recorded call: the [`ContentApi`] method name and a short detail
/// (usually the entity name or id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub op: &'static str,
    pub detail: String,
}

#[derive(Default)]
struct State {
    next_id: u64,
    categories: Vec<Category>,
    sections: Vec<Section>,
    articles: Vec<Article>,
    translations: BTreeMap<ArticleId, Vec<Translation>>,
    groups: Vec<PermissionGroup>,
    calls: Vec<ApiCall>,
    scripted: HashMap<&'static str, VecDeque<RemoteError>>,
    broken: HashMap<&'static str, RemoteError>,
}

impl State {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A complete, thread-safe store living in memory.
pub struct InMemoryContentApi {
    locale: String,
    state: Mutex<State>,
}

fn not_found(what: impl std::fmt::Display) -> RemoteError {
    RemoteError::Status {
        status: 404,
        text: "Not Found".into(),
        body: Some(format!("{what} not found")),
    }
}

impl Default for InMemoryContentApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryContentApi {
    pub fn new() -> Self {
        Self {
            locale: "en-us".into(),
            state: Mutex::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, then return the injected error for `op`, if any.
    fn enter(
        &self,
        op: &'static str,
        detail: impl Into<String>,
    ) -> Result<MutexGuard<'_, State>, RemoteError> {
        let mut state = self.lock();
        state.calls.push(ApiCall {
            op,
            detail: detail.into(),
        });
        if let Some(err) = state.scripted.get_mut(op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if let Some(err) = state.broken.get(op) {
            return Err(err.clone());
        }
        Ok(state)
    }

    // -- fault injection ----------------------------------------------------

    /// The next calls to `op` fail with `errors`, in order.
    pub fn fail_next(&self, op: &'static str, errors: impl IntoIterator<Item = RemoteError>) {
        self.lock().scripted.entry(op).or_default().extend(errors);
    }

    /// Every call to `op` fails with `error` until [`Self::heal`].
    pub fn fail_always(&self, op: &'static str, error: RemoteError) {
        self.lock().broken.insert(op, error);
    }

    pub fn heal(&self, op: &'static str) {
        self.lock().broken.remove(op);
    }

    // -- seeding ------------------------------------------------------------

    pub fn seed_category(&self, name: &str, description: &str, position: i64) -> Category {
        let mut state = self.lock();
        let category = Category {
            id: CategoryId(state.id()),
            name: name.into(),
            description: description.into(),
            position,
        };
        state.categories.push(category.clone());
        category
    }

    pub fn seed_section(&self, category: &Category, name: &str) -> Section {
        let mut state = self.lock();
        let section = Section {
            id: SectionId(state.id()),
            category_id: category.id,
            name: name.into(),
            description: String::new(),
            position: 0,
        };
        state.sections.push(section.clone());
        section
    }

    pub fn seed_article(&self, section: &Section, title: &str) -> Article {
        let mut state = self.lock();
        let id = ArticleId(state.id());
        let article = Article {
            id: Some(id),
            title: title.into(),
            body: format!("<p>{title}</p>"),
            position: 0,
            draft: false,
            promoted: false,
            label_names: vec![],
            section_id: section.id,
            permission_group_id: None,
            user_segment_id: None,
            comments_disabled: false,
            locale: Some(self.locale.clone()),
        };
        state.translations.insert(
            id,
            vec![Translation {
                locale: self.locale.clone(),
                title: article.title.clone(),
                body: article.body.clone(),
                draft: false,
            }],
        );
        state.articles.push(article.clone());
        article
    }

    pub fn seed_permission_group(&self, name: &str) -> PermissionGroup {
        let mut state = self.lock();
        let group = PermissionGroup {
            id: GroupId(state.id()),
            name: name.into(),
        };
        state.groups.push(group.clone());
        group
    }

    // -- inspection ---------------------------------------------------------

    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    pub fn sections(&self) -> Vec<Section> {
        self.lock().sections.clone()
    }

    pub fn articles(&self) -> Vec<Article> {
        self.lock().articles.clone()
    }

    pub fn translations(&self, article: ArticleId) -> Vec<Translation> {
        self.lock()
            .translations
            .get(&article)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Calls other than listings and lookups, in order.
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| !c.op.starts_with("list_"))
            .collect()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }
}

impl ContentApi for InMemoryContentApi {
    fn list_categories(&self) -> Result<Vec<Category>, RemoteError> {
        Ok(self.enter("list_categories", "")?.categories.clone())
    }

    fn create_category(&self, draft: &CategoryDraft) -> Result<Category, RemoteError> {
        let mut state = self.enter("create_category", draft.name.clone())?;
        let category = Category {
            id: CategoryId(state.id()),
            name: draft.name.clone(),
            description: draft.description.clone(),
            position: draft.position,
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RemoteError> {
        let mut state = self.enter("update_category", format!("{id}:{}", draft.name))?;
        let category = state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found(format!("category {id}")))?;
        category.name = draft.name.clone();
        category.description = draft.description.clone();
        category.position = draft.position;
        Ok(category.clone())
    }

    fn list_sections(&self, category: CategoryId) -> Result<Vec<Section>, RemoteError> {
        let state = self.enter("list_sections", category.to_string())?;
        Ok(state
            .sections
            .iter()
            .filter(|s| s.category_id == category)
            .cloned()
            .collect())
    }

    fn create_section(&self, draft: &SectionDraft) -> Result<Section, RemoteError> {
        let mut state = self.enter("create_section", draft.name.clone())?;
        if !state.categories.iter().any(|c| c.id == draft.category_id) {
            return Err(not_found(format!("category {}", draft.category_id)));
        }
        let section = Section {
            id: SectionId(state.id()),
            category_id: draft.category_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            position: draft.position,
        };
        state.sections.push(section.clone());
        Ok(section)
    }

    fn update_section(&self, id: SectionId, draft: &SectionDraft) -> Result<Section, RemoteError> {
        let mut state = self.enter("update_section", format!("{id}:{}", draft.name))?;
        let section = state
            .sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found(format!("section {id}")))?;
        section.name = draft.name.clone();
        section.description = draft.description.clone();
        section.position = draft.position;
        Ok(section.clone())
    }

    fn list_articles(&self, section: SectionId) -> Result<Vec<Article>, RemoteError> {
        let state = self.enter("list_articles", section.to_string())?;
        Ok(state
            .articles
            .iter()
            .filter(|a| a.section_id == section)
            .cloned()
            .collect())
    }

    fn list_all_articles(&self) -> Result<Vec<Article>, RemoteError> {
        Ok(self.enter("list_all_articles", "")?.articles.clone())
    }

    fn create_article(&self, article: &Article) -> Result<Article, RemoteError> {
        let mut state = self.enter("create_article", article.title.clone())?;
        if !state.sections.iter().any(|s| s.id == article.section_id) {
            return Err(not_found(format!("section {}", article.section_id)));
        }
        let id = ArticleId(state.id());
        let locale = article.locale.clone().unwrap_or_else(|| self.locale.clone());
        let created = Article {
            id: Some(id),
            locale: Some(locale.clone()),
            ..article.clone()
        };
        state.translations.insert(
            id,
            vec![Translation {
                locale,
                title: created.title.clone(),
                body: created.body.clone(),
                draft: created.draft,
            }],
        );
        state.articles.push(created.clone());
        Ok(created)
    }

    fn update_article(&self, article: &Article) -> Result<Article, RemoteError> {
        let id = article
            .id
            .ok_or_else(|| RemoteError::Decode("article without id".into()))?;
        let mut state = self.enter("update_article", format!("{id}:{}", article.title))?;
        let stored = state
            .articles
            .iter_mut()
            .find(|a| a.id == Some(id))
            .ok_or_else(|| not_found(format!("article {id}")))?;
        *stored = article.clone();
        Ok(stored.clone())
    }

    fn delete_article(&self, id: ArticleId) -> Result<(), RemoteError> {
        let mut state = self.enter("delete_article", id.to_string())?;
        let before = state.articles.len();
        state.articles.retain(|a| a.id != Some(id));
        if state.articles.len() == before {
            return Err(not_found(format!("article {id}")));
        }
        state.translations.remove(&id);
        Ok(())
    }

    fn list_translations(&self, article: ArticleId) -> Result<Vec<Translation>, RemoteError> {
        let state = self.enter("list_translations", article.to_string())?;
        Ok(state.translations.get(&article).cloned().unwrap_or_default())
    }

    fn update_translation(
        &self,
        article: ArticleId,
        translation: &Translation,
    ) -> Result<Translation, RemoteError> {
        let mut state = self.enter(
            "update_translation",
            format!("{article}:{}", translation.locale),
        )?;
        let stored = state
            .translations
            .get_mut(&article)
            .and_then(|ts| ts.iter_mut().find(|t| t.locale == translation.locale))
            .ok_or_else(|| not_found(format!("translation {article}/{}", translation.locale)))?;
        *stored = translation.clone();
        Ok(stored.clone())
    }

    fn list_permission_groups(&self) -> Result<Vec<PermissionGroup>, RemoteError> {
        Ok(self.enter("list_permission_groups", "")?.groups.clone())
    }
}
