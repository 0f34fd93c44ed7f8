//! Generic create/edit form controller.
//!
//! # Design
//! - One workflow for create and edit; the only difference is whether an id
//!   is bound.
//! - Required fields are checked locally before any request; every other
//!   validation is left to the backend and surfaced verbatim.
//! - Backend failures are recorded in `error` and returned; the form keeps
//!   its values so the operator can correct and resubmit.

pub mod datetime;
pub mod schema;

use ctrlpanel_api_models::{Controller, EntityId, EventType};
use thiserror::Error;

use crate::api::ResourceClient;
use crate::error::ErrorInfo;
use crate::query::ListQuery;
use crate::resource::Events;
use crate::routes::Route;

pub use schema::{FieldKind, FieldSpec, FieldValues, FormResource};

/// Size of the option lists offered by the event form.
pub const OPTION_LIST_SIZE: u32 = 100;

/// Form failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    /// A required field was empty; nothing was sent.
    #[error("{field} is required")]
    MissingField {
        /// Wire name of the field.
        field: String,
    },
    /// The resource has no such field.
    #[error("unknown field '{field}'")]
    UnknownField {
        /// Rejected name.
        field: String,
    },
    /// A value could not be converted to its wire type.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Wire name of the field.
        field: String,
        /// What was wrong.
        reason: String,
    },
    /// The backend rejected or failed the request.
    #[error("{0}")]
    Backend(ErrorInfo),
}

/// Option lists for the event form's reference fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFormOptions {
    /// Selectable event types.
    pub event_types: Vec<EventType>,
    /// Selectable controllers.
    pub controllers: Vec<Controller>,
}

/// State and operations of one create or edit screen.
#[derive(Debug)]
pub struct FormController<R: FormResource> {
    client: ResourceClient<R>,
    id: Option<EntityId>,
    fields: FieldValues,
    loading: bool,
    error: Option<ErrorInfo>,
}

impl<R: FormResource> FormController<R> {
    /// Empty form with every declared field present.
    #[must_use]
    pub fn new(client: ResourceClient<R>) -> Self {
        let fields = R::fields()
            .iter()
            .map(|spec| (spec.name.to_string(), String::new()))
            .collect();
        Self {
            client,
            id: None,
            fields,
            loading: false,
            error: None,
        }
    }

    /// Bound entity id; `None` for a create form.
    #[must_use]
    pub const fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Screen this form is displayed on.
    #[must_use]
    pub const fn route(&self) -> Route {
        match self.id {
            Some(id) => Route::Edit(R::KIND, id),
            None => Route::Create(R::KIND),
        }
    }

    /// Field schema.
    #[must_use]
    pub fn specs(&self) -> &'static [FieldSpec] {
        R::fields()
    }

    /// Current values.
    #[must_use]
    pub const fn fields(&self) -> &FieldValues {
        &self.fields
    }

    /// Current value of `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last backend error, until dismissed.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Clear the displayed error.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Bind `id` and populate the fields from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Backend`] when the entity cannot be fetched; the
    /// fields are left unchanged.
    pub async fn load(&mut self, id: EntityId) -> Result<(), FormError> {
        self.id = Some(id);
        self.loading = true;
        let result = self.client.get(id).await;
        self.loading = false;
        match result {
            Ok(item) => {
                self.fields.extend(R::to_fields(&item));
                self.error = None;
                tracing::debug!(kind = ?R::KIND, id, "form loaded");
                Ok(())
            }
            Err(err) => Err(self.record(err.info(&format!(
                "Error loading {}",
                R::KIND.item_label()
            )))),
        }
    }

    /// Update one field.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] when the schema has no such field.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        if !R::fields().iter().any(|spec| spec.name == name) {
            return Err(FormError::UnknownField {
                field: name.to_string(),
            });
        }
        self.fields.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Required fields that are currently empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        R::fields()
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| self.field(spec.name).is_none_or(|value| value.trim().is_empty()))
            .map(|spec| spec.name)
            .collect()
    }

    /// Validate, convert and create or update. On success returns the list
    /// screen to navigate to.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingField`] or [`FormError::InvalidField`]
    /// without contacting the backend, or [`FormError::Backend`] when the
    /// backend rejects the payload.
    pub async fn submit(&mut self) -> Result<Route, FormError> {
        if let Some(field) = self.missing_fields().first() {
            return Err(FormError::MissingField {
                field: (*field).to_string(),
            });
        }
        let draft = R::to_draft(&self.fields)?;

        self.loading = true;
        let result = match self.id {
            Some(id) => self.client.update(id, &draft).await,
            None => self.client.create(&draft).await,
        };
        self.loading = false;

        match result {
            Ok(()) => {
                tracing::info!(kind = ?R::KIND, id = ?self.id, "form saved");
                self.error = None;
                Ok(Route::List(R::KIND))
            }
            Err(err) => Err(self.record(err.info(&format!(
                "Error saving {}",
                R::KIND.item_label()
            )))),
        }
    }

    fn record(&mut self, info: ErrorInfo) -> FormError {
        tracing::warn!(kind = ?R::KIND, error = %info, "form request failed");
        self.error = Some(info.clone());
        FormError::Backend(info)
    }
}

impl FormController<Events> {
    /// Load the event type and controller option lists (first 100 of each,
    /// backend order).
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Backend`] when either list cannot be loaded.
    pub async fn load_options(&mut self) -> Result<EventFormOptions, FormError> {
        let query = ListQuery::first_page(OPTION_LIST_SIZE);
        let types_client = self.client.api().event_types();
        let controllers_client = self.client.api().controllers();
        let (event_types, controllers) = tokio::join!(
            types_client.list(&query),
            controllers_client.list(&query)
        );

        let event_types = event_types
            .map_err(|err| self.record(err.info("Error loading event types")))?
            .content;
        let controllers = controllers
            .map_err(|err| self.record(err.info("Error loading controllers")))?
            .content;
        Ok(EventFormOptions {
            event_types,
            controllers,
        })
    }
}
