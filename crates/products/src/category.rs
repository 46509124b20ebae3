//! Product category tree.

use serde::{Deserialize, Serialize};

use pricebook_core::{DomainError, DomainResult, Entity};

use crate::ids::CategoryId;
use crate::store::CatalogReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    View,
    #[default]
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    pub parent: Option<CategoryId>,
    pub kind: CategoryKind,
}

impl ProductCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            parent: None,
            kind: CategoryKind::Normal,
        }
    }

    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_kind(mut self, kind: CategoryKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Entity for ProductCategory {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// `category` followed by its ancestors, nearest first.
pub fn category_ancestors<S>(store: &S, category: CategoryId) -> DomainResult<Vec<ProductCategory>>
where
    S: CatalogReader + ?Sized,
{
    let mut chain: Vec<ProductCategory> = Vec::new();
    let mut next = Some(category);
    while let Some(id) = next {
        if chain.iter().any(|c| c.id == id) {
            return Err(DomainError::invariant("recursive product categories are not allowed"));
        }
        let current = store
            .category(id)
            .ok_or_else(|| DomainError::not_found(format!("category {id}")))?;
        next = current.parent;
        chain.push(current);
    }
    Ok(chain)
}

/// Reject a parent assignment that would make `category` its own ancestor.
pub fn check_category_recursion<S>(store: &S, category: CategoryId, parent: Option<CategoryId>) -> DomainResult<()>
where
    S: CatalogReader + ?Sized,
{
    let Some(parent) = parent else {
        return Ok(());
    };
    if parent == category {
        return Err(DomainError::invariant("a category cannot be its own parent"));
    }
    let ancestors = category_ancestors(store, parent)?;
    if ancestors.iter().any(|c| c.id == category) {
        return Err(DomainError::invariant("recursive product categories are not allowed"));
    }
    Ok(())
}

/// Full path name, root first: `All / Saleable / Office`.
pub fn category_display_name<S>(store: &S, category: CategoryId) -> DomainResult<String>
where
    S: CatalogReader + ?Sized,
{
    let mut names: Vec<String> = category_ancestors(store, category)?
        .into_iter()
        .map(|c| c.name)
        .collect();
    names.reverse();
    Ok(names.join(" / "))
}
