#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Client-side core of the control panel.
//!
//! Layout:
//! - `api/`: HTTP client, per-resource wrappers, auth endpoints
//! - `resource.rs`: resource descriptors (controllers, event types, events)
//! - `query.rs`: paging, sorting and filter parameters
//! - `list.rs`: generic paginated list controller
//! - `form/`: generic create/edit form controller and field schemas
//! - `session.rs` / `store.rs`: session state and token persistence
//! - `health.rs`: startup health probe
//! - `routes.rs`: screen routes
//! - `stats.rs`: per-day statistics grouping

pub mod api;
pub mod error;
pub mod form;
pub mod health;
pub mod list;
pub mod query;
pub mod resource;
pub mod routes;
pub mod session;
pub mod stats;
pub mod store;

pub use api::{ApiClient, ApiConfig, AuthClient, DEFAULT_API_URL, ResourceClient};
pub use error::{ApiError, ErrorInfo, ErrorKind, UNKNOWN_ERROR_CODE};
pub use form::{EventFormOptions, FieldKind, FieldSpec, FormController, FormError, FormResource};
pub use health::{HEALTH_TIMEOUT, HealthStatus, probe, probe_with_timeout};
pub use list::{DeleteOutcome, FetchOutcome, FetchTicket, ListController, ListError, ListSource};
pub use query::{DEFAULT_PAGE_SIZE, ListQuery, PAGE_SIZES, Sort, SortDirection};
pub use resource::{Controllers, EventTypes, Events, Resource, ResourceKind};
pub use routes::Route;
pub use session::{LogoutOutcome, SessionError, SessionSlot, SessionState, SessionStore};
pub use stats::group_by_day;
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TOKEN_STORAGE_KEY, TokenStore};
