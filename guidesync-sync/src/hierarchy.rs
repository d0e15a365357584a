//! Hierarchy resolution: make the remote category and section named by a
//! directory's directives exist, and point the branch's
//! [`HierarchyContext`] at them.

use std::path::Path;

use guidesync_client::{ContentApi, Lookup, ResilientClient, RetryPolicy};
use guidesync_core::directives::{read_directives, DirectiveKeys};
use guidesync_core::{
    names_match, Category, CategoryDraft, CategoryId, HierarchyContext, LocalDirectiveSet,
    Section, SectionDraft, SectionId,
};

/// Declared values for one hierarchy level.
struct Level<'d> {
    name: &'d str,
    old_name: Option<&'d str>,
    description: &'d str,
    position: i64,
}

impl Level<'_> {
    /// Name to search the remote for: the old name while a rename is pending.
    fn lookup_name(&self) -> &str {
        self.old_name.unwrap_or(self.name)
    }
}

/// Resolves [`LocalDirectiveSet`]s against the remote store.
///
/// An offline resolver never calls the remote: declared levels become local
/// placeholders with id `0`. Print-only runs use it.
pub struct HierarchyResolver<'c, A: ContentApi, P: RetryPolicy> {
    client: &'c ResilientClient<A, P>,
    force_update: bool,
    offline: bool,
}

impl<'c, A: ContentApi, P: RetryPolicy> HierarchyResolver<'c, A, P> {
    pub fn new(client: &'c ResilientClient<A, P>, force_update: bool) -> Self {
        Self {
            client,
            force_update,
            offline: false,
        }
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Apply `directives` to `ctx`.
    ///
    /// A set declaring neither name leaves `ctx` untouched and succeeds. On
    /// failure `ctx` keeps whatever earlier steps already changed.
    pub fn resolve(&self, ctx: &mut HierarchyContext, directives: &LocalDirectiveSet) -> bool {
        if directives.is_empty() {
            tracing::debug!("no hierarchy declared; inheriting parent context");
            return true;
        }

        if directives.section_name.is_none() {
            ctx.clear_section();
        }

        if let Some(name) = directives.category_name.as_deref() {
            let current = ctx.category().map(|c| c.name.as_str());
            if !current.is_some_and(|c| names_match(c, name)) {
                let level = Level {
                    name,
                    old_name: directives.category_old_name.as_deref(),
                    description: &directives.category_description,
                    position: directives.category_position,
                };
                match self.resolve_category(&level) {
                    Some(category) => ctx.set_category(category),
                    None => {
                        tracing::warn!("could not load category '{}'", level.lookup_name());
                        return false;
                    }
                }
            }
        }

        if let Some(name) = directives.section_name.as_deref() {
            let current = ctx.section().map(|s| s.name.as_str());
            if !current.is_some_and(|s| names_match(s, name)) {
                let Some(category_id) = ctx.category().map(|c| c.id) else {
                    tracing::warn!("section '{name}' declared without a category");
                    return false;
                };
                let level = Level {
                    name,
                    old_name: directives.section_old_name.as_deref(),
                    description: &directives.section_description,
                    position: directives.section_position,
                };
                match self.resolve_section(category_id, &level) {
                    Some(section) => {
                        ctx.set_section(section);
                    }
                    None => {
                        tracing::warn!("could not load section '{}'", level.lookup_name());
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Per-file fallback for a context that lacks a category or section:
    /// apply the grandparent's then the parent's directives of `file`.
    pub fn resolve_for_file(
        &self,
        ctx: &mut HierarchyContext,
        file: &Path,
        directive_file: &str,
        keys: &DirectiveKeys,
    ) -> bool {
        let parent = file.parent();
        let grandparent = parent.and_then(Path::parent);
        for dir in [grandparent, parent].into_iter().flatten() {
            let map = read_directives(dir, directive_file);
            let directives = match LocalDirectiveSet::from_map(&map, keys) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("{}: {e}", dir.display());
                    return false;
                }
            };
            if !self.resolve(ctx, &directives) {
                return false;
            }
        }
        ctx.is_complete()
    }

    fn resolve_category(&self, level: &Level<'_>) -> Option<Category> {
        if let Some(old) = level.old_name.filter(|o| *o != level.name) {
            tracing::warn!("renaming category '{old}' -> '{}'", level.name);
        }
        let draft = CategoryDraft {
            name: level.name.to_owned(),
            description: level.description.to_owned(),
            position: level.position,
        };
        if self.offline {
            return Some(Category {
                id: CategoryId(0),
                name: draft.name,
                description: draft.description,
                position: draft.position,
            });
        }
        let found = find_by_names(level, |name| self.client.find_category_by_name(name))?;
        match found {
            Some(existing) if self.force_update => {
                if existing.name == draft.name
                    && existing.description == draft.description
                    && existing.position == draft.position
                {
                    tracing::info!("category '{}' not changed, no update needed", draft.name);
                    return Some(existing);
                }
                tracing::debug!("updating category #{}: {}", existing.id, draft.name);
                self.client.update_category(existing.id, &draft)
            }
            Some(existing) => {
                tracing::debug!("category found: #{} '{}'", existing.id, existing.name);
                Some(existing)
            }
            None => {
                tracing::info!("creating category '{}'", draft.name);
                self.client.create_category(&draft)
            }
        }
    }

    fn resolve_section(&self, category: CategoryId, level: &Level<'_>) -> Option<Section> {
        if let Some(old) = level.old_name.filter(|o| *o != level.name) {
            tracing::warn!("renaming section '{old}' -> '{}'", level.name);
        }
        let draft = SectionDraft {
            category_id: category,
            name: level.name.to_owned(),
            description: level.description.to_owned(),
            position: level.position,
        };
        if self.offline {
            return Some(Section {
                id: SectionId(0),
                category_id: draft.category_id,
                name: draft.name,
                description: draft.description,
                position: draft.position,
            });
        }
        let found = find_by_names(level, |name| self.client.find_section(category, name))?;
        match found {
            Some(existing) if self.force_update => {
                if existing.name == draft.name
                    && existing.description == draft.description
                    && existing.position == draft.position
                {
                    tracing::info!("section '{}' not changed, no update needed", draft.name);
                    return Some(existing);
                }
                tracing::debug!("updating section #{}: {}", existing.id, draft.name);
                self.client.update_section(existing.id, &draft)
            }
            Some(existing) => {
                tracing::debug!("section found: #{} '{}'", existing.id, existing.name);
                Some(existing)
            }
            None => {
                tracing::info!("creating section '{}'", draft.name);
                self.client.create_section(&draft)
            }
        }
    }
}

/// Look up by old name, then by current name.
///
/// Outer `None`: the remote could not be listed. Inner `None`: neither name
/// exists.
fn find_by_names<T>(level: &Level<'_>, lookup: impl Fn(&str) -> Lookup<T>) -> Option<Option<T>> {
    let mut names = vec![level.lookup_name()];
    if level.lookup_name() != level.name {
        names.push(level.name);
    }
    for name in names {
        match lookup(name) {
            Lookup::Found(entity) => return Some(Some(entity)),
            Lookup::Missing => continue,
            Lookup::Unavailable => return None,
        }
    }
    Some(None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
