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
//! Shared HTTP DTOs for the control panel backend.
//!
//! Field names follow the backend's camelCase JSON contract. Read models
//! (`Controller`, `EventType`, `Event`) carry the backend identifier; drafts
//! are the write payloads accepted by `POST` and `PUT`.
use serde::{Deserialize, Serialize};

/// Backend-assigned entity identifier.
pub type EntityId = i64;

/// Structured error body returned by the backend on failed requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Machine-readable error code (for example `DUPLICATE_GUID`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Paginated envelope wrapping every list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    /// Items on the requested page.
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Total number of pages for the current query.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of matching items, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
    /// Zero-based page index echoed by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Page size echoed by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl<T> PageEnvelope<T> {
    /// Envelope with no content and no pages.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_pages: 0,
            total_elements: None,
            number: None,
            size: None,
        }
    }
}

/// A physical controller registered with the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    /// Backend identifier.
    pub id: EntityId,
    /// Serial number, unique per backend.
    pub serial_number: String,
    /// Controller GUID; events reference controllers by this value.
    #[serde(default)]
    pub guid: Option<String>,
    /// Vehicle registration number the controller is installed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
}

/// Write payload for creating or updating a controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDraft {
    /// Serial number (required).
    pub serial_number: String,
    /// Optional GUID.
    pub guid: Option<String>,
    /// Optional vehicle registration number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
}

/// Event classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    /// Backend identifier.
    pub id: EntityId,
    /// Event code (required).
    pub event_code: String,
    /// Optional description.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Write payload for creating or updating an event type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeDraft {
    /// Event code (required).
    pub event_code: String,
    /// Optional description.
    pub comment: Option<String>,
}

/// An event reported by a controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Backend identifier.
    pub id: EntityId,
    /// Event classification.
    pub event_type: EventType,
    /// Reporting controller.
    pub controller: Controller,
    /// Local time the event happened, as sent by the backend.
    pub event_time: String,
    /// Time the backend recorded the event (read-only).
    #[serde(default)]
    pub server_time: Option<String>,
    /// Optional operator comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Write payload for creating or updating an event.
///
/// References are flattened: the event type by id, the controller by GUID,
/// and `event_time` uses the space-separated `YYYY-MM-DD HH:MM` form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    /// Referenced event type id.
    pub event_type: EntityId,
    /// Referenced controller GUID.
    pub controller: String,
    /// Event time in wire form.
    pub event_time: String,
    /// Optional operator comment.
    pub comment: Option<String>,
}

/// Credentials posted to the login and registration endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Opaque bearer token.
    pub token: String,
}

/// Number of events recorded on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatisticsBucket {
    /// Day in `YYYY-MM-DD` form.
    pub date: String,
    /// Events recorded on that day.
    pub count: u64,
}
