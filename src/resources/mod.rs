//! Read-side resource layer.
//!
//! One module per entity, each owning its query, filtering, and projection
//! logic. Every module composes the same two pieces: the pagination envelope
//! from `pagination` and the typed error/identifier handling from `error`.
//! There is no shared resource trait; the per-entity shapes differ too much
//! for one to pay its way.

mod error;
mod filters;
mod money;
mod pagination;

mod catalog;
mod clients;
mod dashboard;
mod invoices;
mod media;
mod notes;
mod posts;
mod projects;
mod quotes;
mod social;
mod stakeholders;
mod tasks;
mod taxonomy;

#[cfg(test)]
pub(crate) mod fixtures;

#[cfg(test)]
mod invoices_test;
#[cfg(test)]
mod notes_test;
#[cfg(test)]
mod projects_test;
#[cfg(test)]
mod social_test;

pub use error::{ResourceError, ResourceResult, validate_id};
pub use pagination::{DEFAULT_PER_PAGE, MAX_PER_PAGE, Page, PageRequest, Pagination};

pub use catalog::{
    CatalogCategoryFilters, CatalogCategoryResource, CatalogItemFilters, CatalogItemResource,
};
pub use clients::{ClientFilters, ClientResource};
pub use dashboard::DashboardResource;
pub use invoices::{InvoiceFilters, InvoiceResource};
pub use media::{MediaFilters, MediaResource};
pub use notes::{MAX_TREE_DEPTH, NoteFilters, NoteResource, NoteSearchFilters, SEARCH_LIMIT};
pub use posts::{PostFilters, PostResource};
pub use projects::{ProjectFilters, ProjectResource};
pub use quotes::{QuoteFilters, QuoteResource};
pub use social::{
    SocialConnectionFilters, SocialConnectionResource, SocialPostFilters, SocialPostResource,
};
pub use stakeholders::{StakeholderFilters, StakeholderResource};
pub use tasks::{TaskFilters, TaskResource};
pub use taxonomy::{CategoryResource, TagResource, TaxonomyFilters};
