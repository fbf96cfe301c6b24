use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, Entity, SoftDeletes, Timestamps};

record_id!(CategoryId);

/// Node of the category tree (`parent_id` points at another category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCategory {
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    pub is_active: bool,
}

impl Category {
    pub fn create(id: CategoryId, new: NewCategory, now: DateTime<Utc>) -> Self {
        Self {
            id,
            parent_id: new.parent_id,
            name: new.name,
            slug: new.slug,
            description: new.description,
            sort_order: new.sort_order,
            is_active: new.is_active,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }

    /// Ids from the root down to `id`, following `parent_id` links in `all`.
    ///
    /// Stops at a missing parent or a cycle.
    pub fn ancestry(id: CategoryId, all: &[Category]) -> Vec<CategoryId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = all
            .iter()
            .find(|c| c.id == current)
            .and_then(|c| c.parent_id)
        {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &CategoryId {
        &self.id
    }
}

impl SoftDeletes for Category {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
