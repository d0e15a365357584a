//! Article reconciliation: create, update or print one document.

use std::sync::OnceLock;

use guidesync_client::{ContentApi, Lookup, ResilientClient, RetryPolicy};
use guidesync_core::{Article, Document, GroupId, Outcome, Section};

use crate::sink::PrintSink;

/// What the reconciler does with a rendered document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Publish,
    PrintOnly,
}

/// Values applied to newly created articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    /// Explicit permission group; wins over `permission_group`.
    pub permission_group_id: Option<GroupId>,
    /// Permission group resolved by name on first create.
    pub permission_group: Option<String>,
    pub comments_disabled: bool,
    pub locale: String,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            permission_group_id: None,
            permission_group: None,
            comments_disabled: false,
            locale: "en-us".into(),
        }
    }
}

pub struct ArticleReconciler<'c, A: ContentApi, P: RetryPolicy> {
    client: &'c ResilientClient<A, P>,
    sink: &'c dyn PrintSink,
    mode: Mode,
    options: PublishOptions,
    resolved_group: OnceLock<GroupId>,
}

impl<'c, A: ContentApi, P: RetryPolicy> ArticleReconciler<'c, A, P> {
    pub fn new(
        client: &'c ResilientClient<A, P>,
        sink: &'c dyn PrintSink,
        mode: Mode,
        options: PublishOptions,
    ) -> Self {
        Self {
            client,
            sink,
            mode,
            options,
            resolved_group: OnceLock::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Reconcile a rendered `document` against `section`.
    pub fn reconcile(&self, document: &Document, section: &Section) -> Outcome {
        let Some(body) = document.rendered_body().filter(|b| !b.trim().is_empty()) else {
            tracing::warn!("document '{}' has no rendered body", document.title);
            return Outcome::PublishFailed;
        };

        if self.mode == Mode::PrintOnly {
            return match self.sink.emit(document, body) {
                Ok(()) => Outcome::Printed,
                Err(e) => {
                    tracing::warn!("could not print '{}': {e}", document.title);
                    Outcome::PublishFailed
                }
            };
        }

        let request_title = document.lookup_title();
        let existing = match self.client.find_article_by_title(section.id, request_title) {
            Lookup::Missing if request_title != document.title => {
                // A previous run may already have completed the rename.
                self.client.find_article_by_title(section.id, &document.title)
            }
            other => other,
        };

        let processed = match existing {
            Lookup::Unavailable => {
                tracing::warn!("could not list articles of section '{}'", section.name);
                None
            }
            Lookup::Found(article) => {
                tracing::debug!("updating existing article '{}'", article.title);
                let updated = updated_article(article, document, body);
                self.client.update_article(&updated)
            }
            Lookup::Missing => {
                if document.old_title.is_some() {
                    tracing::warn!(
                        "neither '{}' nor '{}' found in section '{}'; creating a new article",
                        request_title,
                        document.title,
                        section.name
                    );
                }
                tracing::debug!("creating new article '{}'", document.title);
                let article = self.new_article(document, section, body);
                self.client.create_article(&article)
            }
        };

        match processed {
            None => {
                tracing::warn!("could not create or update article '{}'", document.title);
                Outcome::PublishFailed
            }
            Some(_) if document.draft => Outcome::PublishedDraft,
            Some(_) => Outcome::Published,
        }
    }

    fn new_article(&self, document: &Document, section: &Section, body: &str) -> Article {
        Article {
            id: None,
            title: document.title.clone(),
            body: body.to_owned(),
            position: document.position,
            draft: document.draft,
            promoted: document.promoted,
            label_names: document.tags.iter().cloned().collect(),
            section_id: section.id,
            permission_group_id: self.permission_group(),
            user_segment_id: None,
            comments_disabled: self.options.comments_disabled,
            locale: Some(self.options.locale.clone()),
        }
    }

    fn permission_group(&self) -> Option<GroupId> {
        if let Some(id) = self.options.permission_group_id {
            return Some(id);
        }
        if let Some(id) = self.resolved_group.get() {
            return Some(*id);
        }
        let name = self.options.permission_group.as_deref()?;
        match self.client.permission_group_id(name) {
            Some(id) => Some(*self.resolved_group.get_or_init(|| id)),
            None => {
                tracing::warn!("permission group '{name}' not found");
                None
            }
        }
    }
}

/// Overwrite the locally owned fields of a fetched article.
fn updated_article(mut article: Article, document: &Document, body: &str) -> Article {
    article.title = document.title.clone();
    article.body = body.to_owned();
    article.draft = document.draft;
    article.promoted = document.promoted;
    article.position = document.position;
    article.label_names = document.tags.iter().cloned().collect();
    article
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use guidesync_client::memory::InMemoryContentApi;
    use guidesync_client::{FlatRetry, RemoteError};
    use guidesync_core::{HeaderKeys, HierarchyContext};

    use super::*;
    use crate::error::SyncError;

    #[derive(Default)]
    struct CapturingSink(Mutex<Vec<String>>);

    impl PrintSink for CapturingSink {
        fn emit(&self, document: &Document, body: &str) -> Result<(), SyncError> {
            self.0
                .lock()
                .unwrap()
                .push(format!("{}|{body}", document.title));
            Ok(())
        }
    }

    fn setup() -> (ResilientClient<InMemoryContentApi>, Section) {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = Arc::new(InMemoryContentApi::new());
        let cat = api.seed_category("C", "", 0);
        let section = api.seed_section(&cat, "S");
        (ResilientClient::new(api, FlatRetry::new(2)), section)
    }

    fn doc(headers: &str) -> Document {
        Document::parse(
            Path::new("doc.adoc"),
            headers,
            &HierarchyContext::new(),
            &HeaderKeys::default(),
        )
        .unwrap()
        .with_rendered_body("<p>body</p>".into())
    }

    #[test]
    fn rename_updates_instead_of_creating() {
        let (client, section) = setup();
        let bar = client.api().seed_article(&section, "Bar");
        let sink = CapturingSink::default();
        let r = ArticleReconciler::new(&client, &sink, Mode::Publish, PublishOptions::default());

        let outcome = r.reconcile(&doc("// title: Foo\n// title-old: Bar\n"), &section);

        assert_eq!(outcome, Outcome::Published);
        assert_eq!(client.api().call_count("update_article"), 1);
        assert_eq!(client.api().call_count("create_article"), 0);
        let articles = client.api().articles();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, bar.id);
        assert_eq!(articles[0].title, "Foo");
    }

    #[test]
    fn completed_rename_falls_back_to_current_title() {
        let (client, section) = setup();
        client.api().seed_article(&section, "Foo");
        let sink = CapturingSink::default();
        let r = ArticleReconciler::new(&client, &sink, Mode::Publish, PublishOptions::default());

        assert_eq!(
            r.reconcile(&doc("// title: Foo\n// title-old: Bar\n"), &section),
            Outcome::Published
        );
        assert_eq!(client.api().call_count("list_articles"), 2);
        assert_eq!(client.api().call_count("create_article"), 0);
    }

    #[test]
    fn new_article_carries_publish_options() {
        let (client, section) = setup();
        let group = client.api().seed_permission_group("Editors");
        let sink = CapturingSink::default();
        let options = PublishOptions {
            permission_group: Some("editors".into()),
            comments_disabled: true,
            locale: "de".into(),
            ..PublishOptions::default()
        };
        let r = ArticleReconciler::new(&client, &sink, Mode::Publish, options);

        let outcome = r.reconcile(&doc("// title: New\n// draft\n// tags: x, y\n"), &section);

        assert_eq!(outcome, Outcome::PublishedDraft);
        let articles = client.api().articles();
        let created = &articles[0];
        assert_eq!(created.permission_group_id, Some(group.id));
        assert!(created.comments_disabled);
        assert_eq!(created.locale.as_deref(), Some("de"));
        assert_eq!(created.label_names, vec!["x", "y"]);
        assert_eq!(created.user_segment_id, None);

        r.reconcile(&doc("// title: Other\n"), &section);
        assert_eq!(
            client.api().call_count("list_permission_groups"),
            1,
            "group id is resolved once"
        );
    }

    #[test]
    fn explicit_group_id_wins() {
        let (client, section) = setup();
        let sink = CapturingSink::default();
        let options = PublishOptions {
            permission_group_id: Some(GroupId(77)),
            permission_group: Some("ignored".into()),
            ..PublishOptions::default()
        };
        let r = ArticleReconciler::new(&client, &sink, Mode::Publish, options);
        r.reconcile(&doc("// title: New\n"), &section);
        assert_eq!(client.api().articles()[0].permission_group_id, Some(GroupId(77)));
        assert_eq!(client.api().call_count("list_permission_groups"), 0);
    }

    #[test]
    fn print_only_makes_no_remote_calls() {
        let (client, section) = setup();
        let sink = CapturingSink::default();
        let r = ArticleReconciler::new(&client, &sink, Mode::PrintOnly, PublishOptions::default());

        assert_eq!(r.reconcile(&doc("// title: P\n"), &section), Outcome::Printed);
        assert!(client.api().calls().is_empty());
        assert_eq!(*sink.0.lock().unwrap(), vec!["P|<p>body</p>".to_string()]);
    }

    #[test]
    fn exhausted_create_is_publish_failure() {
        let (client, section) = setup();
        client
            .api()
            .fail_always("create_article", RemoteError::Transport("down".into()));
        let sink = CapturingSink::default();
        let r = ArticleReconciler::new(&client, &sink, Mode::Publish, PublishOptions::default());
        assert_eq!(r.reconcile(&doc("// title: X\n"), &section), Outcome::PublishFailed);
        assert_eq!(client.api().call_count("create_article"), 2);
    }

    #[test]
    fn unavailable_listing_does_not_create() {
        let (client, section) = setup();
        client
            .api()
            .fail_always("list_articles", RemoteError::Transport("down".into()));
        let sink = CapturingSink::default();
        let r = ArticleReconciler::new(&client, &sink, Mode::Publish, PublishOptions::default());
        assert_eq!(r.reconcile(&doc("// title: X\n"), &section), Outcome::PublishFailed);
        assert_eq!(client.api().call_count("create_article"), 0);
    }

    #[test]
    fn unrendered_document_fails() {
        let (client, section) = setup();
        let sink = CapturingSink::default();
        let r = ArticleReconciler::new(&client, &sink, Mode::Publish, PublishOptions::default());
        let raw = Document::parse(
            Path::new("a.adoc"),
            "// title: A\n",
            &HierarchyContext::new(),
            &HeaderKeys::default(),
        )
        .unwrap();
        assert_eq!(r.reconcile(&raw, &section), Outcome::PublishFailed);
        assert!(client.api().calls().is_empty());
    }
}
