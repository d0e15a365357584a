//! Domain types for the remote help-center hierarchy.
//!
//! Entities mirror the remote wire shape closely enough to be serialized
//! directly with serde; missing optional fields fall back to defaults.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

remote_id!(
    /// Remote identifier of a category.
    CategoryId
);
remote_id!(
    /// Remote identifier of a section.
    SectionId
);
remote_id!(
    /// Remote identifier of an article.
    ArticleId
);
remote_id!(
    /// Remote identifier of a permission group.
    GroupId
);

// The remote sends `null` for empty descriptions and bodies.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Hierarchy entities
// ---------------------------------------------------------------------------

/// Top level of the remote hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub position: i64,
}

/// Fields submitted when creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    pub position: i64,
}

/// Second level of the remote hierarchy, owned by a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub position: i64,
}

/// Fields submitted when creating or updating a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDraft {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub position: i64,
}

/// A published (or to-be-published) article.
///
/// `id` is `None` only for an article constructed locally for creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ArticleId>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub promoted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label_names: Vec<String>,
    pub section_id: SectionId,
    #[serde(default)]
    pub permission_group_id: Option<GroupId>,
    /// `None` serializes as `null`, which the remote reads as "visible to everyone".
    #[serde(default)]
    pub user_segment_id: Option<u64>,
    #[serde(default)]
    pub comments_disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// A localized variant of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub locale: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default)]
    pub draft: bool,
}

/// Named group controlling who may edit an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub id: GroupId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// HierarchyContext
// ---------------------------------------------------------------------------

/// The `(category, section)` pair a directory-walk branch is publishing into.
///
/// Each branch owns its own copy; children receive a clone. A section is
/// only ever held together with the category that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyContext {
    category: Option<Category>,
    section: Option<Section>,
}

impl HierarchyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    pub fn section(&self) -> Option<&Section> {
        self.section.as_ref()
    }

    /// Both levels resolved, so articles can be published.
    pub fn is_complete(&self) -> bool {
        self.category.is_some() && self.section.is_some()
    }

    /// Replace the category. A held section that belongs to a different
    /// category is dropped.
    pub fn set_category(&mut self, category: Category) {
        if self
            .section
            .as_ref()
            .is_some_and(|s| s.category_id != category.id)
        {
            self.section = None;
        }
        self.category = Some(category);
    }

    /// Replace the section. Returns `false` (and leaves the context
    /// untouched) when no owning category is held.
    pub fn set_section(&mut self, section: Section) -> bool {
        match &self.category {
            Some(category) if category.id == section.category_id => {
                self.section = Some(section);
                true
            }
            _ => false,
        }
    }

    pub fn clear_section(&mut self) {
        self.section = None;
    }
}

/// Whether two category, section or article names denote the same entity.
/// Comparison is case-insensitive over the full Unicode range.
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
