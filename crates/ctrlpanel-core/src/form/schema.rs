//! Field schemas binding each resource to its editable form.

use std::collections::BTreeMap;

use ctrlpanel_api_models::{
    Controller, ControllerDraft, EntityId, Event, EventDraft, EventType, EventTypeDraft,
};

use crate::form::FormError;
use crate::form::datetime::{to_local_input, to_wire};
use crate::resource::{Controllers, EventTypes, Events, Resource};

/// How a field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Local date and time (`YYYY-MM-DDTHH:MM`).
    DateTime,
    /// Reference to another entity, picked from an option list.
    Reference,
}

/// One editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name.
    pub name: &'static str,
    /// Label shown to the operator.
    pub label: &'static str,
    /// Must be non-empty before submit.
    pub required: bool,
    /// Editing widget.
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn text(name: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            name,
            label,
            required,
            kind: FieldKind::Text,
        }
    }
}

/// Field values keyed by wire name.
pub type FieldValues = BTreeMap<String, String>;

/// A resource editable through the generic form.
pub trait FormResource: Resource {
    /// Fields in display order.
    fn fields() -> &'static [FieldSpec];

    /// Editable values of a loaded entity.
    fn to_fields(item: &Self::Item) -> FieldValues;

    /// Write payload built from validated values.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidField`] when a value cannot be converted.
    fn to_draft(values: &FieldValues) -> Result<Self::Draft, FormError>;
}

fn value<'a>(values: &'a FieldValues, name: &str) -> &'a str {
    values.get(name).map_or("", |value| value.trim())
}

fn optional(values: &FieldValues, name: &str) -> Option<String> {
    let value = value(values, name);
    (!value.is_empty()).then(|| value.to_string())
}

fn entries<const N: usize>(pairs: [(&str, Option<&str>); N]) -> FieldValues {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.unwrap_or_default().to_string()))
        .collect()
}

const CONTROLLER_FIELDS: [FieldSpec; 3] = [
    FieldSpec::text("serialNumber", "Serial number", true),
    FieldSpec::text("guid", "GUID", false),
    FieldSpec::text("vehicleNumber", "Vehicle number", false),
];

impl FormResource for Controllers {
    fn fields() -> &'static [FieldSpec] {
        &CONTROLLER_FIELDS
    }

    fn to_fields(item: &Controller) -> FieldValues {
        entries([
            ("serialNumber", Some(item.serial_number.as_str())),
            ("guid", item.guid.as_deref()),
            ("vehicleNumber", item.vehicle_number.as_deref()),
        ])
    }

    fn to_draft(values: &FieldValues) -> Result<ControllerDraft, FormError> {
        Ok(ControllerDraft {
            serial_number: value(values, "serialNumber").to_string(),
            guid: optional(values, "guid"),
            vehicle_number: optional(values, "vehicleNumber"),
        })
    }
}

const EVENT_TYPE_FIELDS: [FieldSpec; 2] = [
    FieldSpec::text("eventCode", "Event code", true),
    FieldSpec::text("comment", "Comment", false),
];

impl FormResource for EventTypes {
    fn fields() -> &'static [FieldSpec] {
        &EVENT_TYPE_FIELDS
    }

    fn to_fields(item: &EventType) -> FieldValues {
        entries([
            ("eventCode", Some(item.event_code.as_str())),
            ("comment", item.comment.as_deref()),
        ])
    }

    fn to_draft(values: &FieldValues) -> Result<EventTypeDraft, FormError> {
        Ok(EventTypeDraft {
            event_code: value(values, "eventCode").to_string(),
            comment: optional(values, "comment"),
        })
    }
}

const EVENT_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        name: "eventType",
        label: "Event type",
        required: true,
        kind: FieldKind::Reference,
    },
    FieldSpec {
        name: "controller",
        label: "Controller",
        required: true,
        kind: FieldKind::Reference,
    },
    FieldSpec {
        name: "eventTime",
        label: "Event time",
        required: true,
        kind: FieldKind::DateTime,
    },
    FieldSpec::text("comment", "Comment", false),
];

impl FormResource for Events {
    fn fields() -> &'static [FieldSpec] {
        &EVENT_FIELDS
    }

    fn to_fields(item: &Event) -> FieldValues {
        let event_type = item.event_type.id.to_string();
        let event_time = to_local_input(&item.event_time);
        entries([
            ("eventType", Some(event_type.as_str())),
            ("controller", item.controller.guid.as_deref()),
            ("eventTime", Some(event_time.as_str())),
            ("comment", item.comment.as_deref()),
        ])
    }

    fn to_draft(values: &FieldValues) -> Result<EventDraft, FormError> {
        let event_type = value(values, "eventType")
            .parse::<EntityId>()
            .map_err(|_| FormError::InvalidField {
                field: "eventType".to_string(),
                reason: "must be an event type id".to_string(),
            })?;
        Ok(EventDraft {
            event_type,
            controller: value(values, "controller").to_string(),
            event_time: to_wire(value(values, "eventTime")),
            comment: optional(values, "comment"),
        })
    }
}
