//! `tradeerp-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod enums;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod pagination;
pub mod value_object;

pub use entity::{Entity, SoftDeletes, Timestamps};
pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
pub use lifecycle::{Lifecycle, StatusChange};
pub use pagination::{Page, PageRequest, SortDirection};
pub use value_object::{Money, Slug, ValueObject};
