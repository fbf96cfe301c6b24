use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, Entity, SoftDeletes, Timestamps};

record_id!(BrandId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBrand {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
}

impl Brand {
    pub fn create(id: BrandId, new: NewBrand, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            slug: new.slug,
            description: new.description,
            logo_url: new.logo_url,
            website: new.website,
            is_active: new.is_active,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }
}

impl Entity for Brand {
    type Id = BrandId;

    fn id(&self) -> &BrandId {
        &self.id
    }
}

impl SoftDeletes for Brand {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
