//! The remote content-store capability contract.

use guidesync_core::{
    Article, ArticleId, Category, CategoryDraft, CategoryId, PermissionGroup, Section,
    SectionDraft, SectionId, Translation,
};

use crate::error::RemoteError;

/// Raw remote operations. Each call is a single attempt and may fail.
///
/// Implementations must be shareable across worker threads.
pub trait ContentApi: Send + Sync {
    fn list_categories(&self) -> Result<Vec<Category>, RemoteError>;
    fn create_category(&self, draft: &CategoryDraft) -> Result<Category, RemoteError>;
    fn update_category(&self, id: CategoryId, draft: &CategoryDraft)
        -> Result<Category, RemoteError>;

    fn list_sections(&self, category: CategoryId) -> Result<Vec<Section>, RemoteError>;
    fn create_section(&self, draft: &SectionDraft) -> Result<Section, RemoteError>;
    fn update_section(&self, id: SectionId, draft: &SectionDraft) -> Result<Section, RemoteError>;

    fn list_articles(&self, section: SectionId) -> Result<Vec<Article>, RemoteError>;
    /// Every article in the store, across all sections.
    fn list_all_articles(&self) -> Result<Vec<Article>, RemoteError>;
    fn create_article(&self, article: &Article) -> Result<Article, RemoteError>;
    /// `article.id` must be set.
    fn update_article(&self, article: &Article) -> Result<Article, RemoteError>;
    fn delete_article(&self, id: ArticleId) -> Result<(), RemoteError>;

    fn list_translations(&self, article: ArticleId) -> Result<Vec<Translation>, RemoteError>;
    fn update_translation(
        &self,
        article: ArticleId,
        translation: &Translation,
    ) -> Result<Translation, RemoteError>;

    fn list_permission_groups(&self) -> Result<Vec<PermissionGroup>, RemoteError>;
}
