//! [`ResilientClient`]: fail-soft facade over a [`ContentApi`].
//!
//! Every operation runs inside the configured [`RetryPolicy`]. Nothing here
//! returns an error: an exhausted operation yields `None`, `false` or
//! [`Lookup::Unavailable`], and the cause has already been logged.

use std::sync::Arc;

use guidesync_core::{
    names_match, Article, ArticleId, Category, CategoryDraft, CategoryId, GroupId,
    PermissionGroup, Section, SectionDraft, SectionId,
};

use crate::api::ContentApi;
use crate::retry::{FlatRetry, RetryPolicy};

/// Result of a by-name lookup.
///
/// `Missing` means the listing succeeded and nothing matched; `Unavailable`
/// means the listing itself could not be fetched, so the caller cannot tell
/// whether the entity exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Lookup::Unavailable)
    }

    fn from_listing(listing: Option<Vec<T>>, matches: impl Fn(&T) -> bool) -> Self {
        match listing {
            None => Lookup::Unavailable,
            Some(items) => items
                .into_iter()
                .find(|item| matches(item))
                .map_or(Lookup::Missing, Lookup::Found),
        }
    }
}

/// Retrying client shared by every worker of a run.
#[derive(Debug)]
pub struct ResilientClient<A: ContentApi, P: RetryPolicy = FlatRetry> {
    api: Arc<A>,
    policy: P,
}

impl<A: ContentApi, P: RetryPolicy> ResilientClient<A, P> {
    pub fn new(api: Arc<A>, policy: P) -> Self {
        Self { api, policy }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    // -- categories ---------------------------------------------------------

    /// First category whose name matches `name`, ignoring case.
    pub fn find_category_by_name(&self, name: &str) -> Lookup<Category> {
        let listing = self.policy.execute(&format!("find category '{name}'"), &mut || {
            self.api.list_categories()
        });
        Lookup::from_listing(listing, |c| names_match(&c.name, name))
    }

    pub fn create_category(&self, draft: &CategoryDraft) -> Option<Category> {
        self.policy
            .execute(&format!("create category '{}'", draft.name), &mut || {
                self.api.create_category(draft)
            })
    }

    pub fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Option<Category> {
        self.policy
            .execute(&format!("update category '{}'", draft.name), &mut || {
                self.api.update_category(id, draft)
            })
    }

    // -- sections -----------------------------------------------------------

    /// First section of `category` whose name matches `name`, ignoring case.
    pub fn find_section(&self, category: CategoryId, name: &str) -> Lookup<Section> {
        let listing = self.policy.execute(&format!("find section '{name}'"), &mut || {
            self.api.list_sections(category)
        });
        Lookup::from_listing(listing, |s| names_match(&s.name, name))
    }

    pub fn create_section(&self, draft: &SectionDraft) -> Option<Section> {
        self.policy
            .execute(&format!("create section '{}'", draft.name), &mut || {
                self.api.create_section(draft)
            })
    }

    pub fn update_section(&self, id: SectionId, draft: &SectionDraft) -> Option<Section> {
        self.policy
            .execute(&format!("update section '{}'", draft.name), &mut || {
                self.api.update_section(id, draft)
            })
    }

    // -- articles -----------------------------------------------------------

    pub fn list_articles(&self, section: SectionId) -> Option<Vec<Article>> {
        self.policy
            .execute(&format!("list articles of section {section}"), &mut || {
                self.api.list_articles(section)
            })
    }

    pub fn list_all_articles(&self) -> Option<Vec<Article>> {
        self.policy
            .execute("list all articles", &mut || self.api.list_all_articles())
    }

    /// First article of `section` whose title matches `title`, ignoring case.
    pub fn find_article_by_title(&self, section: SectionId, title: &str) -> Lookup<Article> {
        let listing = self.policy.execute(&format!("find article '{title}'"), &mut || {
            self.api.list_articles(section)
        });
        Lookup::from_listing(listing, |a| names_match(&a.title, title))
    }

    pub fn create_article(&self, article: &Article) -> Option<Article> {
        self.policy
            .execute(&format!("create article '{}'", article.title), &mut || {
                self.api.create_article(article)
            })
    }

    /// Update the article, then its first translation (title, body, draft),
    /// within the same attempt. A translation failure retries both.
    pub fn update_article(&self, article: &Article) -> Option<Article> {
        let Some(id) = article.id else {
            tracing::warn!("article '{}' has no id; cannot update", article.title);
            return None;
        };
        self.policy
            .execute(&format!("update article '{}'", article.title), &mut || {
                let updated = self.api.update_article(article)?;
                if let Some(mut translation) = self.api.list_translations(id)?.into_iter().next() {
                    translation.title = article.title.clone();
                    translation.body = article.body.clone();
                    translation.draft = article.draft;
                    self.api.update_translation(id, &translation)?;
                }
                Ok(updated)
            })
    }

    pub fn delete_article(&self, id: ArticleId) -> bool {
        self.policy
            .execute(&format!("delete article {id}"), &mut || {
                self.api.delete_article(id)
            })
            .is_some()
    }

    // -- permission groups --------------------------------------------------

    pub fn list_permission_groups(&self) -> Option<Vec<PermissionGroup>> {
        self.policy
            .execute("list permission groups", &mut || {
                self.api.list_permission_groups()
            })
    }

    /// Id of the permission group named `name`, ignoring case.
    pub fn permission_group_id(&self, name: &str) -> Option<GroupId> {
        self.list_permission_groups()?
            .into_iter()
            .find(|g| names_match(&g.name, name))
            .map(|g| g.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::RemoteError;
    use crate::memory::{InMemoryContentApi, RecordingSleeper};

    fn client(max: u32) -> (ResilientClient<InMemoryContentApi>, Arc<RecordingSleeper>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = Arc::new(RecordingSleeper::default());
        let api = Arc::new(InMemoryContentApi::new());
        let policy = FlatRetry::new(max).with_sleeper(clock.clone());
        (ResilientClient::new(api, policy), clock)
    }

    fn server_error() -> RemoteError {
        RemoteError::Status {
            status: 503,
            text: "Service Unavailable".into(),
            body: None,
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let (client, _) = client(3);
        let seeded = client.api().seed_category("Getting Started", "", 0);
        assert_eq!(
            client.find_category_by_name("getting started"),
            Lookup::Found(seeded)
        );
        assert_eq!(client.find_category_by_name("Other"), Lookup::Missing);
    }

    #[test]
    fn exhausted_lookup_is_unavailable_not_missing() {
        let (client, _) = client(3);
        client
            .api()
            .fail_always("list_categories", server_error());
        assert_eq!(client.find_category_by_name("A"), Lookup::Unavailable);
        assert_eq!(client.api().call_count("list_categories"), 3);
    }

    #[test]
    fn create_succeeds_after_transient_failures() {
        let (client, _) = client(5);
        client
            .api()
            .fail_next("create_category", [server_error(), server_error()]);
        let draft = CategoryDraft {
            name: "A".into(),
            description: String::new(),
            position: 0,
        };
        let created = client.create_category(&draft).expect("created");
        assert_eq!(created.name, "A");
        assert_eq!(client.api().call_count("create_category"), 3);
        assert_eq!(client.api().categories().len(), 1);
    }

    #[test]
    fn rate_limit_suspends_the_caller() {
        let (client, clock) = client(3);
        client.api().fail_next(
            "list_permission_groups",
            [RemoteError::RateLimited {
                retry_after: Some("12".into()),
            }],
        );
        let group = client.api().seed_permission_group("Agents");
        assert_eq!(client.permission_group_id("AGENTS"), Some(group.id));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(12)]);
    }

    #[test]
    fn update_article_also_updates_translation() {
        let (client, _) = client(3);
        let api = client.api();
        let cat = api.seed_category("C", "", 0);
        let sec = api.seed_section(&cat, "S");
        let mut article = api.seed_article(&sec, "Old");
        article.title = "New".into();
        article.body = "<p>new</p>".into();

        let updated = client.update_article(&article).expect("updated");
        assert_eq!(updated.title, "New");
        let translations = api.translations(article.id.unwrap());
        assert_eq!(translations[0].title, "New");
        assert_eq!(translations[0].body, "<p>new</p>");
    }

    #[test]
    fn delete_reports_false_when_exhausted() {
        let (client, _) = client(2);
        assert!(!client.delete_article(ArticleId(999)));
        assert_eq!(client.api().call_count("delete_article"), 2);
    }

    #[test]
    fn article_lookup_within_section() {
        let (client, _) = client(1);
        let api = client.api();
        let cat = api.seed_category("C", "", 0);
        let a = api.seed_section(&cat, "A");
        let b = api.seed_section(&cat, "B");
        api.seed_article(&a, "Intro");
        assert!(client.find_article_by_title(a.id, "intro").found().is_some());
        assert_eq!(client.find_article_by_title(b.id, "Intro"), Lookup::Missing);
    }
}
